//! Wiring & DI. Entry point: bootstrap the SQLite store, inject into the
//! category service, print a user's category boards. No business logic here.

use boardhub::adapters::persistence::SqliteStore;
use boardhub::ports::CategoryStore;
use boardhub::shared::config::AppConfig;
use boardhub::usecases::CategoryBoardsService;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (user_id, team_id) = match (args.next(), args.next()) {
        (Some(user_id), Some(team_id)) => (user_id, team_id),
        _ => anyhow::bail!("usage: boardhub <user_id> <team_id>"),
    };

    let cfg = AppConfig::load().unwrap_or_default();
    let data_dir = PathBuf::from(cfg.data_dir_or_default());

    let store = SqliteStore::connect(&data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?;
    info!(path = %store.db_path().display(), "category store ready");
    let store: Arc<dyn CategoryStore> = Arc::new(store);
    let service = CategoryBoardsService::new(store);

    let category_boards = service
        .get_user_category_boards(&user_id, &team_id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", serde_json::to_string_pretty(&category_boards)?);

    Ok(())
}
