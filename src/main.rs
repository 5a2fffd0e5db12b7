use std::process::ExitCode;

fn main() -> ExitCode {
    match log_filter::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
