use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "profit-engine")]
#[command(about = "Computes profitability and sales commission for a course-delivery quote")]
pub struct CliArgs {
    /// Path to the engine TOML configuration
    #[arg(short, long, default_value = "profit-engine.toml")]
    pub config: PathBuf,

    /// Path to the project TOML file
    #[arg(short, long)]
    pub project: PathBuf,

    /// Extra cost lines in CSV (concept,amount,applies_vat,applies_withholding)
    #[arg(long)]
    pub costs_csv: Option<PathBuf>,

    /// Override the manual commission percentage from the project file
    #[arg(long)]
    pub manual_commission: Option<Decimal>,

    /// Print the snapshot as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
