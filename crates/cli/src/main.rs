use std::process::ExitCode;

fn main() -> ExitCode {
    freshprice_cli::run()
}
