/// Shared test helpers for database tests
use super::types::{Database, NewLogRecord};
use sqlx::sqlite::SqlitePoolOptions;

/// Set up an in-memory test database with the schema applied. Capped to a
/// single connection: each `sqlite::memory:` connection would otherwise
/// get its own empty database.
pub async fn setup_test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::raw_sql(include_str!("../../migrations/0001_schema.sql"))
        .execute(&pool)
        .await
        .expect("Migration failed");

    Database { pool }
}

/// Inserts one log row with the common fields; `user_id`/`request_id`
/// stay NULL.
pub async fn seed_log(db: &Database, timestamp: i64, level: &str, service: &str, message: &str) {
    db.insert_log(&NewLogRecord {
        timestamp,
        level: level.to_string(),
        service: service.to_string(),
        message: message.to_string(),
        user_id: None,
        request_id: None,
    })
    .await
    .expect("seed insert failed");
}
