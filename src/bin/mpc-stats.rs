use clap::Parser;
use log::info;
use mpc_stats::{config::load_task_request, Channel, Context, MPCExecutor, Result, TripleProvider};
use std::path::PathBuf;

/// Run the secure statistics demo for one party.
#[derive(Debug, Parser)]
#[command(name = "mpc-stats", version, about)]
struct Cli {
    /// Task configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the local party, overrides the configuration
    #[arg(short, long)]
    party: Option<String>,

    /// Number of columns
    #[arg(long, default_value_t = 10)]
    len: u32,

    /// Number of rounds
    #[arg(long, default_value_t = 1)]
    loops: usize,
}

fn round<C: Channel, T: TripleProvider>(
    executor: &mut MPCExecutor<C, T>,
    round: usize,
    len: u32,
) -> Result<()> {
    let input_data = (1..=len).collect::<Vec<u32>>();
    let col_rows = vec![2u32; input_data.len()];

    info!("avg {round} origin data: {input_data:?}");
    let result = executor.avg(&input_data, &col_rows)?;
    info!("avg {round} result data: {result:?}");

    info!("sum {round} origin data: {input_data:?}");
    let result = executor.sum(&input_data)?;
    info!("sum {round} result data: {result:?}");

    info!("max {round} origin data: {input_data:?}");
    let result = executor.max(&input_data)?;
    info!("max {round} result data: {result:?}");

    info!("min {round} origin data: {input_data:?}");
    let result = executor.min(&input_data)?;
    info!("min {round} result data: {result:?}");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let request = load_task_request(cli.config.as_deref(), cli.party.as_deref())?;
    let context = Context::new(request)?;
    info!("request id: {}", context.request_id());
    info!("party name: {}", context.party_name());

    let mut executor = MPCExecutor::connect(&context.message()?)?;
    for i in 0..cli.loops {
        round(&mut executor, i, cli.len)?;
    }
    executor.shutdown()
}
