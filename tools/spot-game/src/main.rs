use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use dslab_spot::tables::{read_tables_from_dir, write_tables};
use dslab_spot::{Game, GameConfig, GameError, InstanceGenerator};

fn init_logger() {
    use env_logger::Builder;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Solves the spot VM market game between an IaaS provider and SaaS tenants
struct Args {
    /// Path to YAML file with game configuration
    #[arg(short, long)]
    config: Option<String>,

    /// Seed used to generate the problem instance
    #[arg(short, long, default_value_t = 123)]
    seed: u64,

    /// Number of workers (overrides the value from config)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Directory with parameter tables to load the instance from instead of generating it
    #[arg(long)]
    params_dir: Option<PathBuf>,

    /// Directory to save parameter tables of the generated instance to
    #[arg(long)]
    save_params: Option<PathBuf>,

    /// Path to produced results file
    #[arg(short, long, default_value = "results.txt")]
    output: PathBuf,

    /// Path to produced JSON file with per-tenant totals
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), GameError> {
    let config = match &args.config {
        Some(path) => GameConfig::from_file(path)?,
        None => GameConfig::default(),
    };
    let workers = args.workers.unwrap_or(config.workers);

    let mut game: Game = match &args.params_dir {
        Some(dir) => read_tables_from_dir(dir)?,
        None => InstanceGenerator::new(args.seed, config).generate(),
    };
    if let Some(dir) = &args.save_params {
        write_tables(&game, dir)?;
        info!("Parameters saved to {}", dir.display());
    }

    let stats = game.run(workers)?;
    println!("The time required to solve the IaaS problem is: {:.2?}", stats.duration);
    println!("Clearing rounds: {}", stats.rounds);

    let mut out = BufWriter::new(File::create(&args.output)?);
    game.print(&mut out)?;
    out.flush()?;

    if let Some(path) = &args.summary {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &game.summary())?;
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logger();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(GameError::InsufficientResources { demand, capacity }) => {
            eprintln!("Insufficient resources: {} VMs requested, {} available", demand, capacity);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
