use sea_orm::Database;
use sea_orm_migration::prelude::*;

const USAGE: &str = "Usage: cargo run -p migration -- [up|down|fresh|refresh|status]";

enum Command {
    Up,
    Down,
    Fresh,
    Refresh,
    Status,
}

impl Command {
    fn parse(arg: Option<String>) -> Option<Self> {
        match arg.as_deref().unwrap_or("up") {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "fresh" => Some(Self::Fresh),
            "refresh" => Some(Self::Refresh),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(command) = Command::parse(std::env::args().nth(1)) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./merch_store.db?mode=rwc".to_string());
    let db = Database::connect(&db_url).await?;

    match command {
        // `down` only reverts the latest migration, like the sea-orm CLI.
        Command::Down => migration::Migrator::down(&db, Some(1)).await?,
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Refresh => migration::Migrator::refresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
