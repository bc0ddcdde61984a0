// SQLite connection pool for the durable key/value backend.

use crate::db::INIT_SCHEMA;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite};
use tracing::info;

pub async fn establish_connection(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");

    let pool = if in_memory {
        // Every connection to :memory: is a separate database, so pin a single one.
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await?
    } else {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            Sqlite::create_database(database_url).await?;
        }
        let pool = SqlitePoolOptions::new().connect(database_url).await?;

        // Enable WAL mode for better concurrency
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        pool
    };

    sqlx::query(INIT_SCHEMA).execute(&pool).await?;
    info!("Database connection established: {}", database_url);

    Ok(pool)
}
