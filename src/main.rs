use std::path::PathBuf;

use bubblechart::generate::Job;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod server;

/// Lay out a CSV file as a force-directed bubble chart.
#[derive(Parser)]
#[command(name = "bubblechart")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input data file (.csv or .json) - used when no subcommand specified
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Output directory for the generated chart
    #[arg(short, long, global = true, default_value = "output")]
    output: PathBuf,

    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options shared by `generate` and `serve`
#[derive(Args, Debug)]
struct ChartArgs {
    /// Input data file (.csv or .json)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the generated chart
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Chart configuration (.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output formats, comma separated (html, svg, json)
    #[arg(short, long, value_delimiter = ',', default_value = "html")]
    format: Vec<String>,

    /// Seed for initial positions, for reproducible layouts
    #[arg(long)]
    seed: Option<u64>,

    /// Show the resting layout without replaying the animation
    #[arg(long = "static")]
    no_animation: bool,
}

impl ChartArgs {
    fn job(self) -> Job {
        Job {
            input: self.input,
            output: self.output,
            config: self.config,
            formats: self.format,
            seed: self.seed,
            animate: !self.no_animation,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the chart (default behavior)
    Generate(ChartArgs),
    /// Start development server with hot reload
    Serve {
        #[command(flatten)]
        chart: ChartArgs,

        /// Port to run the server on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "bubblechart=debug" } else { "bubblechart=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn generate(job: &Job) -> anyhow::Result<()> {
    let outcome = job.run()?;
    println!(
        "Generated '{}' ({} bubbles, {} ticks) in {}",
        outcome.title,
        outcome.bubbles,
        outcome.ticks,
        job.output.display()
    );
    if outcome.skipped > 0 {
        println!("Skipped {} rows without a numeric size", outcome.skipped);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Generate(args)) => {
            generate(&args.job())?;
        }
        Some(Commands::Serve { chart, port }) => {
            server::serve(chart.job(), port).await?;
        }
        None => {
            // Default behavior: generate if input provided
            if let Some(input) = cli.input {
                generate(&Job::new(input, cli.output))?;
            } else {
                println!("bubblechart: no input specified. Use --help for usage.");
            }
        }
    }

    Ok(())
}
