use alanmath::args::Args;
use alanmath::db::{establish_connection, run_migrations};
use alanmath::server::app::run_server;
use alanmath::telemetry::init_tracing;

use clap::Parser;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(default_value = "serve")]
    runner: Runner,

    #[clap(flatten)]
    args: Args,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Runner {
    Serve,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let pool = establish_connection(&cli.args.db_path).await?;
    tracing::info!("Running db migrations...");
    run_migrations(&pool).await?;

    match cli.runner {
        Runner::Serve => run_server(pool, cli.args).await?,
        Runner::Migrate => tracing::info!("Migrations applied"),
    };
    Ok(())
}
