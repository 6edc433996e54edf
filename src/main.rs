use dotenv::dotenv;
use env_logger;
use log::{error, info};
use std::env;
use std::process::ExitCode;

use eps_momentum_dashboard::config::Config;
use eps_momentum_dashboard::routes::{dispatch, parse_args};

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting eps-dashboard...");

    let result = Config::from_env().and_then(|config| {
        let command = parse_args(env::args().skip(1))?;
        dispatch(command, &config)
    });

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:?} error: {}", e.kind, e.message);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
