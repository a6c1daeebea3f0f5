use std::process::ExitCode;

fn main() -> ExitCode {
    revive_cli::run()
}
