pub mod device_info;
pub mod models;
pub mod test_utils;


use sea_orm::{Database, DatabaseConnection, DbErr};
use std::path::Path;
use util::config::AppConfig;

/// Turns `DATABASE_PATH` into a connection URL.
///
/// A value that is already a DSN is used as-is; anything else is treated as a SQLite
/// file path, created on first use.
pub fn database_url(path_or_url: &str) -> String {
    if path_or_url.starts_with("sqlite:")
        || path_or_url.starts_with("postgres://")
        || path_or_url.starts_with("mysql://")
    {
        return path_or_url.to_owned();
    }

    // SQLite won't create intermediate dirs.
    if let Some(parent) = Path::new(path_or_url).parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(
                path = %parent.display(),
                error = %e,
                "could not create database directory"
            );
        }
    }
    format!("sqlite://{path_or_url}?mode=rwc")
}

pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = AppConfig::global().database_path.clone();
    let url = database_url(&path_or_url);
    tracing::info!(url = %url, "connecting to database");
    Database::connect(&url).await
}
