//! netband - standalone ban list daemon.
//!
//! Sweeps expired bans on a fixed cadence and reads console commands from
//! stdin. The ban list is replayed at startup and saved on exit.

use netban::ban::{Clock, NetBan, SystemClock};
use netban::config::{self, Config};
use netban::console::{Console, save_bans};
use netban::{metrics, telemetry};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "netban.toml".to_string());

    let config = Config::load_or_default(&config_path)?;

    // Initialize tracing
    telemetry::init_tracing(&config.log);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(path = %config_path, code = e.error_code(), error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            errors.len()
        ));
    }

    metrics::init();

    let mut netban = NetBan::new(SystemClock);
    let console = Console::new(&config);
    let loaded = console.load(&mut netban, &config.bans.file)?;

    info!(
        config = %config_path,
        bans_file = %config.bans.file.display(),
        loaded,
        "Starting netband"
    );

    let mut sweep = tokio::time::interval(config.bans.sweep_interval());
    sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = sweep.tick() => {
                let _span = telemetry::spans::sweep(netban.now()).entered();
                netban.update();
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => run_line(&console, &mut netban, &line),
                    Ok(None) => {
                        info!("Console closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read console input");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    if config.bans.save_on_exit {
        match save_bans(&netban, &config.bans.file) {
            Ok(count) => info!(count, path = %config.bans.file.display(), "Saved ban list"),
            Err(e) => error!(error = %e, path = %config.bans.file.display(), "Failed to save ban list"),
        }
    }

    info!("netband stopped");
    Ok(())
}

fn run_line<C: Clock>(console: &Console, netban: &mut NetBan<C>, line: &str) {
    match console.execute(netban, line) {
        Ok(reply) => {
            for out in reply {
                println!("{out}");
            }
        }
        Err(e) => {
            warn!(code = e.error_code(), error = %e, "Console command failed");
            println!("{e}");
        }
    }
}
