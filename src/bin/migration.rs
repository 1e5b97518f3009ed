use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use supplier_service::{config, db, migrator::Migrator};

#[derive(Parser)]
#[command(name = "migration", about = "Manage the supplier/item schema", version)]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Up {
        #[arg(long, help = "Apply at most this many migrations")]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back")]
        steps: u32,
    },
    /// Drop every table and re-apply all migrations
    Fresh,
    /// Show which migrations are applied
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let mut db_cfg = db::DbConfig::from(&cfg);
    if let Some(url) = cli.database_url {
        db_cfg.url = url;
    }
    info!("Connecting to database for migrations");
    let pool = db::establish_connection_with_config(&db_cfg).await?;

    match cli.command {
        Commands::Up { steps } => {
            Migrator::up(&pool, steps).await?;
            info!("Migrations applied");
        }
        Commands::Down { steps } => {
            Migrator::down(&pool, Some(steps)).await?;
            info!("Rolled back {} migration(s)", steps);
        }
        Commands::Fresh => {
            Migrator::fresh(&pool).await?;
            info!("Schema recreated");
        }
        Commands::Status => Migrator::status(&pool).await?,
    }

    db::close_pool(pool).await?;
    Ok(())
}
