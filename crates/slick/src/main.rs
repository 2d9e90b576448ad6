use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;

use slick::scenario::ScenarioExecutorConfig;
use slick::{RunConfig, ScenarioDefinition, ScenarioExecutor};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (RON)
    scenario: PathBuf,

    /// Run at most this many steps
    #[arg(long)]
    steps: Option<usize>,

    /// Report output path (default: <output.directory>/<scenario name>.ron)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Skip writing the report
    #[arg(long)]
    no_report: bool,

    /// Exit with an error if any verification fails
    #[arg(long)]
    check: bool,

    /// Run config file (default: slick.ron in the working directory)
    #[arg(long, default_value = "slick")]
    config: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = RunConfig::load_from(&args.config)?;
    let scenario = ScenarioDefinition::from_file(&args.scenario)?;
    log::info!(
        "Loaded scenario '{}' from {}",
        scenario.name,
        args.scenario.display()
    );

    let mut executor_config = ScenarioExecutorConfig::from(&config);
    executor_config.max_steps = args.steps;
    let mut executor = ScenarioExecutor::with_config(executor_config);
    let report = executor
        .execute_scenario(&scenario)
        .with_context(|| format!("Scenario '{}' failed", scenario.name))?;

    println!("{}", report.mass_budget.summary());
    for failure in &report.verification_failures {
        println!("FAILED: {}", failure.message);
    }

    if config.output.write_report && !args.no_report {
        let path = args.output.unwrap_or_else(|| {
            PathBuf::from(&config.output.directory)
                .join(format!("{}.ron", file_stem(&scenario.name)))
        });
        report.save_ron(&path)?;
        log::info!("Report written to {}", path.display());
    }

    if args.check && !report.passed {
        bail!(
            "{} verification(s) failed for scenario '{}'",
            report.verification_failures.len(),
            scenario.name
        );
    }

    Ok(())
}

/// Scenario name reduced to a safe file name
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
