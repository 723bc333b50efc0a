use anyhow::Result;
use sqlx::SqlitePool;

/// Create the favorites schema. Safe to run on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Snapshot columns are nullable: id-only favorites are valid rows.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorite_characters (
            id INTEGER PRIMARY KEY,
            name TEXT,
            status TEXT,
            species TEXT,
            type TEXT,
            gender TEXT,
            origin TEXT,
            location TEXT,
            image TEXT,
            episodes TEXT,
            url TEXT,
            created TEXT,
            added_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_favorite_characters_added_at ON favorite_characters(added_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
