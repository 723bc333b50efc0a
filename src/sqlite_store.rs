//! SQLite-backed [`FavoriteStore`] implementation.
//!
//! Favorites live in the `favorite_characters` table created by
//! [`migrate`](crate::migrate). Each row holds the id, `added_at` and an
//! optional denormalized snapshot of the character; the episode list is
//! stored as JSON text.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use tokio::sync::{watch, Mutex};

use rickdex_core::models::{Character, FavoriteRecord, Gender, Status};

use crate::error::Result;
use crate::store::{check_snapshot, next_added_at, now_millis, FavoriteStore, Toggled};

const SELECT_FAVORITES: &str = r#"
    SELECT id, name, status, species, type, gender, origin, location, image,
           episodes, url, created, added_at
    FROM favorite_characters
    ORDER BY added_at DESC, id DESC
"#;

/// SQLite implementation of the [`FavoriteStore`] trait.
///
/// Writes are serialized by an in-process lock and run in a single
/// transaction each. The live list is read back inside that transaction
/// and published after commit, before [`toggle`](FavoriteStore::toggle)
/// returns.
pub struct SqliteFavoriteStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
    tx: watch::Sender<Vec<FavoriteRecord>>,
}

impl SqliteFavoriteStore {
    /// Wrap a migrated pool and load the current favorites.
    pub async fn open(pool: SqlitePool) -> Result<Self> {
        let current = load_all(&pool).await?;
        let (tx, _rx) = watch::channel(current);
        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
            tx,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn load_all<'e, E>(executor: E) -> Result<Vec<FavoriteRecord>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(SELECT_FAVORITES).fetch_all(executor).await?;
    let records = rows.iter().map(row_to_record).collect::<sqlx::Result<Vec<_>>>()?;
    Ok(records)
}

fn row_to_record(row: &SqliteRow) -> sqlx::Result<FavoriteRecord> {
    let id: i64 = row.try_get("id")?;
    let added_at: i64 = row.try_get("added_at")?;
    let name: Option<String> = row.try_get("name")?;

    let snapshot = match name {
        Some(name) => {
            let text = |col: &str| -> sqlx::Result<String> {
                Ok(row.try_get::<Option<String>, _>(col)?.unwrap_or_default())
            };
            Some(Character {
                id,
                name,
                status: Status::parse(&text("status")?),
                species: text("species")?,
                kind: text("type")?,
                gender: Gender::parse(&text("gender")?),
                origin: text("origin")?,
                origin_url: None,
                location: text("location")?,
                location_url: None,
                image: text("image")?,
                episodes: decode_episodes(&text("episodes")?),
                url: text("url")?,
                created: text("created")?,
            })
        }
        None => None,
    };

    Ok(FavoriteRecord {
        id,
        snapshot,
        added_at,
    })
}

pub(crate) fn encode_episodes(episodes: &[String]) -> String {
    serde_json::to_string(episodes).unwrap_or_else(|_| "[]".to_string())
}

/// Malformed or missing JSON decodes to an empty list.
pub(crate) fn decode_episodes(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[async_trait]
impl FavoriteStore for SqliteFavoriteStore {
    async fn is_favorite(&self, id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM favorite_characters WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn toggle(&self, id: i64, snapshot: Option<&Character>) -> Result<Toggled> {
        check_snapshot(id, snapshot)?;
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM favorite_characters WHERE id = ?)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let outcome = if exists {
            sqlx::query("DELETE FROM favorite_characters WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Toggled::Removed
        } else {
            let newest: Option<i64> =
                sqlx::query_scalar("SELECT MAX(added_at) FROM favorite_characters")
                    .fetch_one(&mut *tx)
                    .await?;
            let added_at = next_added_at(now_millis(), newest);

            sqlx::query(
                r#"
                INSERT INTO favorite_characters (id, name, status, species, type, gender,
                                                 origin, location, image, episodes, url,
                                                 created, added_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(snapshot.map(|c| c.name.as_str()))
            .bind(snapshot.map(|c| c.status.as_str()))
            .bind(snapshot.map(|c| c.species.as_str()))
            .bind(snapshot.map(|c| c.kind.as_str()))
            .bind(snapshot.map(|c| c.gender.as_str()))
            .bind(snapshot.map(|c| c.origin.as_str()))
            .bind(snapshot.map(|c| c.location.as_str()))
            .bind(snapshot.map(|c| c.image.as_str()))
            .bind(snapshot.map(|c| encode_episodes(&c.episodes)))
            .bind(snapshot.map(|c| c.url.as_str()))
            .bind(snapshot.map(|c| c.created.as_str()))
            .bind(added_at)
            .execute(&mut *tx)
            .await?;
            Toggled::Added
        };

        // Read the new list inside the transaction: an unreadable table
        // rolls the toggle back instead of committing it unpublished.
        let current = load_all(&mut *tx).await?;
        tx.commit().await?;

        self.tx.send_replace(current);
        Ok(outcome)
    }

    async fn favorite_ids(&self) -> Result<Vec<i64>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM favorite_characters ORDER BY added_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    async fn favorites(&self) -> Result<Vec<FavoriteRecord>> {
        load_all(&self.pool).await
    }

    fn subscribe(&self) -> watch::Receiver<Vec<FavoriteRecord>> {
        self.tx.subscribe()
    }
}
