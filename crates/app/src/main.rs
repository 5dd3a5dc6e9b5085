//! sct: drag out a screen region and save it as a PNG

mod clipboard;
mod config;
mod session;
mod state;
mod watchdog;

use clap::Parser;
use config::{Cli, Config};
use session::CaptureSession;
use watchdog::Watchdog;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_cli(Cli::parse())?;
    log::debug!("Config: {:?}", config);

    let mut session = CaptureSession::new(config);
    let watchdog = session
        .config()
        .timeout
        .map(|timeout| Watchdog::arm(timeout, session.cancel_token()));

    let result = session.run();
    drop(watchdog);

    match result {
        Ok(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
