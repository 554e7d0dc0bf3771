use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};

use fas_shm::config::{Config, MIN_EDGES};
use fas_shm::error::Error;
use fas_shm::FAS::generator::{Generator, Graph};
use fas_shm::FAS::Structs::Edge;
use fas_shm::FAS::ChannelBuilder;

#[derive(Debug, Parser)]
#[command(
    name = "generator",
    version,
    about = "Publishes random feedback arc sets of a graph to a running supervisor."
)]
struct Opts {
    /// Graph edges, each written as <int>-<int> (e.g. 0-1). At least three.
    #[arg(value_name = "EDGE", required = true)]
    edges: Vec<Edge>,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    if opts.edges.len() < MIN_EDGES {
        Opts::command()
            .error(
                clap::error::ErrorKind::TooFewValues,
                Error::TooFewEdges(opts.edges.len()),
            )
            .exit();
    }

    let config = Config::from_env()?;
    fas_shm::logging::init(config.log_level).context("Failed to initialize logger")?;

    let mut producer = ChannelBuilder::from_config(&config)
        .build_producer()
        .context("Is a supervisor running?")?;
    debug!("{:?}", producer);

    let rng = match config.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let mut generator = Generator::new(Graph::new(opts.edges), rng);
    info!(
        "generating for {} edges over {} vertices",
        generator.graph().edges().len(),
        generator.graph().vertices().len()
    );

    let stats = generator.run(&mut producer)?;
    info!(
        "supervisor finished: {} iterations, {} published, {} too large",
        stats.iterations, stats.published, stats.oversized
    );

    producer.close()?;
    Ok(())
}
