use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use fas_shm::config::Config;
use fas_shm::FAS::supervisor::{Outcome, Supervisor};
use fas_shm::FAS::ChannelBuilder;

#[derive(Debug, Parser)]
#[command(
    name = "supervisor",
    version,
    about = "Collects feedback arc sets from generators and keeps the smallest. Takes no arguments."
)]
struct Opts {}

fn main() -> Result<()> {
    Opts::parse();

    let config = Config::from_env()?;
    fas_shm::logging::init(config.log_level).context("Failed to initialize logger")?;

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::Release);
    })
    .context("Error setting termination signal handler")?;

    let mut consumer = ChannelBuilder::from_config(&config)
        .build_consumer()
        .context("Failed to set up shared resources")?;
    debug!("{:?}", consumer);

    let mut supervisor = Supervisor::new(io::stdout()).with_poll_interval(config.poll_interval);
    let outcome = supervisor.run(&mut consumer, &running);

    // Release shared resources whether or not the loop failed.
    let closed = consumer.close();
    let exiting = writeln!(io::stdout(), "\nExiting...");

    match outcome? {
        Outcome::Acyclic => info!("graph is acyclic"),
        Outcome::Stopped => match supervisor.best().get() {
            Some(best) => info!(
                "stopped after {} candidates, best has {} edges",
                supervisor.received(),
                best.len()
            ),
            None => info!("stopped before any candidate arrived"),
        },
    }
    closed?;
    exiting.context("Failed to write to stdout")?;
    Ok(())
}
