//! Database Infrastructure
//!
//! Connection pooling and schema initialization for the sqlite store.

pub mod schema;

pub use schema::initialize_schema;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::time::Duration;

/// Creates the sqlite connection pool.
///
/// In-memory databases exist per connection, so they get a single
/// never-recycled connection; everything else pools normally.
pub async fn create_pool(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
    let options = if database_url.contains(":memory:") {
        options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options.max_connections(8)
    };
    options.connect(database_url).await
}
