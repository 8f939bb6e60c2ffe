mod acquire;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::acquire::{AcquireArgs, ProductArgs};

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(about = "Find and store catalog product images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the search query built for a product
    Query {
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Search for product images and materialize them into a sink
    Acquire(AcquireArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Query { product } => {
            println!("{}", vitrine_core::build_query(&product.descriptor()));
        }
        Commands::Acquire(args) => {
            acquire::acquire(args).await?;
        }
    }

    Ok(())
}
