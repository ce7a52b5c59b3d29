use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use syncbench::{suite, Options, Sink};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = Options::parse();
    log::debug!("{:?}", options);

    let sink = Sink::stdout();
    match suite::run_all(&options, &sink) {
        Ok(reports) => {
            log::debug!("ran {} benchmarks", reports.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.source() {
                Some(source) => log::error!("benchmark aborted: {}: {}", err, source),
                None => log::error!("benchmark aborted: {}", err),
            }
            ExitCode::FAILURE
        }
    }
}
