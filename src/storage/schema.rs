//! Database schema definitions for the credential store

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per API key; pool is 'active' or 'cooling_down'
CREATE TABLE IF NOT EXISTS credentials (
    key TEXT PRIMARY KEY,
    pool TEXT NOT NULL,
    position INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_credentials_pool ON credentials(pool, position);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
