//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;
use fastexit_server::db::Persistence;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Insert the sample users when the table is empty
    #[arg(long)]
    pub seed: bool,

    /// Persistence driver: sqlx, sea-orm or memory (overrides DATABASE_DRIVER)
    #[arg(long)]
    pub driver: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let settings = super::load_settings(args.driver.as_deref())?;
    let persistence = Persistence::connect(&settings)
        .await
        .context("Failed to connect to the database")?;

    persistence.migrate().await.context("Migration failed")?;
    println!("Schema ready ({})", settings.driver);

    if args.seed {
        let inserted = persistence
            .user_service()
            .seed_sample_users()
            .await
            .context("Seeding failed")?;
        if inserted == 0 {
            println!("Users already present, nothing seeded");
        } else {
            println!("Seeded {inserted} sample users");
        }
    }

    persistence.close().await;
    Ok(())
}
