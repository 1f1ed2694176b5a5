use std::process::ExitCode;

fn main() -> ExitCode {
    dicey_cli::run()
}
