//! Ghost CRO CLI - migrations and offline tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ghost-cli migrate
//!
//! # Revenue opportunity against a category benchmark
//! ghost-cli opportunity --visitors 20000 --conversion-rate 0.012 --aov 85 --category fashion
//!
//! # Percentile for a Ghost Score
//! ghost-cli percentile 72
//!
//! # Preview a theme injection
//! ghost-cli inject --file theme.liquid --id trust-badges --kind liquid --content-file badges.liquid
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ghost_cro_core::sandbox::InjectionKind;

mod commands;

use commands::calc::BenchmarkSource;

#[derive(Parser)]
#[command(name = "ghost-cli")]
#[command(author, version, about = "Ghost CRO CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Estimate revenue opportunity versus a benchmark conversion rate
    Opportunity {
        /// Monthly visitors
        #[arg(long)]
        visitors: f64,

        /// Current conversion rate as a fraction (0.012 = 1.2%)
        #[arg(long)]
        conversion_rate: f64,

        /// Average order value
        #[arg(long)]
        aov: f64,

        /// Benchmark conversion rate as a fraction
        #[arg(long, conflicts_with = "category", required_unless_present = "category")]
        benchmark: Option<f64>,

        /// Store category whose benchmark to use
        #[arg(long)]
        category: Option<String>,
    },
    /// Percentile rank of a Ghost Score
    Percentile {
        /// Ghost Score (0-100)
        score: f64,
    },
    /// Inject a block into a theme file
    Inject {
        /// Theme file to inject into
        #[arg(long)]
        file: PathBuf,

        /// Block id ([A-Za-z0-9_-], at most 64 chars)
        #[arg(long)]
        id: String,

        #[arg(long, value_enum)]
        kind: Kind,

        /// File holding the block content
        #[arg(long)]
        content_file: PathBuf,

        /// Rewrite the theme file instead of printing the result
        #[arg(long)]
        in_place: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Liquid,
    Css,
    Js,
}

impl From<Kind> for InjectionKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Liquid => Self::Liquid,
            Kind::Css => Self::Css,
            Kind::Js => Self::Js,
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Opportunity {
            visitors,
            conversion_rate,
            aov,
            benchmark,
            category,
        } => {
            let source = match (benchmark, category) {
                (Some(rate), _) => BenchmarkSource::Rate(rate),
                (None, Some(name)) => BenchmarkSource::Category(name),
                (None, None) => BenchmarkSource::Category("general".to_string()),
            };
            commands::calc::print_opportunity(visitors, conversion_rate, aov, &source)?;
        }
        Commands::Percentile { score } => commands::calc::print_percentile(score)?,
        Commands::Inject {
            file,
            id,
            kind,
            content_file,
            in_place,
        } => commands::inject::run(&file, id, kind.into(), &content_file, in_place)?,
    }
    Ok(())
}
