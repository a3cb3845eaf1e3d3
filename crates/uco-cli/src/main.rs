use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = uco_cli::command().get_matches();
    uco_cli::init_tracing(matches.get_flag("log-json"));

    match uco_cli::run(&matches) {
        Ok(outcome) => {
            if let Some(text) = outcome.output {
                println!("{text}");
            }
            if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
