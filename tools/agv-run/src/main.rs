use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;

use agv_sim::run::run;
use agv_sim::scheduler::SimConfig;

fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

/// Runs the AGV fleet simulation and writes the trajectory log.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Path to the map CSV file.
    #[arg(short, long)]
    map: PathBuf,

    /// Path to the task CSV file.
    #[arg(short, long)]
    tasks: PathBuf,

    /// Path of the trajectory CSV file to write.
    #[arg(short, long, default_value = "agv_trajectory.csv")]
    output: PathBuf,

    /// Tick ceiling before the run is aborted as deadlocked.
    #[arg(long, default_value_t = 400)]
    max_steps: u64,
}

fn main() {
    init_logger();

    let args = Args::parse();
    let config = SimConfig {
        max_timestamp: args.max_steps,
        ..SimConfig::default()
    };

    let simulation_start = Instant::now();
    match run(&args.map, &args.tasks, &args.output, config) {
        Ok(summary) => {
            println!(
                "Completed {} tasks in {} ticks, {} trajectory records written to {}",
                summary.completed_tasks,
                summary.ticks,
                summary.records,
                args.output.display()
            );
            println!("Simulation process time {:.2?}", simulation_start.elapsed());
        }
        Err(error) => {
            eprintln!("Simulation failed: {error}");
            process::exit(1);
        }
    }
}
