use std::process::ExitCode;

use dualsearch::Error;

fn main() -> ExitCode {
    match dualsearch::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<Error>() {
            // Input problems get a one-line message; everything else keeps
            // its full context chain.
            Some(core) if core.is_user_error() => {
                eprintln!("error: {core}");
                ExitCode::from(2)
            }
            _ => {
                eprintln!("error: {err:#}");
                ExitCode::from(1)
            }
        },
    }
}
