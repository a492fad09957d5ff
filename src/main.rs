use sonar_harvest::cli;
use sonar_harvest::ui::output;

fn main() {
    if let Err(err) = cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(cli::exit_code(&err));
    }
}
