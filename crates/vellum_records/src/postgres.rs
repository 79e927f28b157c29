//! PostgreSQL metadata store.
//!
//! Diesel is synchronous, so every call checks a connection out of the r2d2
//! pool inside `spawn_blocking`. Updates lock the row with
//! `SELECT ... FOR UPDATE` so the version check and the write are atomic.

use crate::schema::asset_records;
use crate::{Entity, Fields, MetadataStore};
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use serde_json::Value;
use vellum_error::{MetadataError, MetadataErrorKind, MetadataResult};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Connection pool type used by [`PostgresMetadataStore`].
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Build a connection pool for `database_url`.
///
/// # Errors
///
/// Returns an error if the pool cannot open its initial connections.
pub fn establish_pool(database_url: &str) -> MetadataResult<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .map_err(|e| MetadataError::new(MetadataErrorKind::Connection(e.to_string())))
}

/// Apply pending schema migrations.
pub fn run_migrations(conn: &mut PgConnection) -> MetadataResult<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|applied| {
            tracing::info!(count = applied.len(), "Applied metadata migrations");
        })
        .map_err(|e| MetadataError::new(MetadataErrorKind::Migration(e.to_string())))
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = asset_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AssetRecordRow {
    id: String,
    owner_id: String,
    version: i64,
    fields: Value,
    updated_at: DateTime<Utc>,
}

impl AssetRecordRow {
    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id().clone(),
            owner_id: entity.owner_id().clone(),
            version: *entity.version() as i64,
            fields: Value::Object(entity.fields().clone()),
            updated_at: *entity.updated_at(),
        }
    }

    fn into_entity(self) -> MetadataResult<Entity> {
        let Value::Object(fields) = self.fields else {
            return Err(MetadataError::new(MetadataErrorKind::Serialization(format!(
                "fields of record {} is not a JSON object",
                self.id
            ))));
        };
        Ok(Entity::from_parts(
            self.id,
            self.owner_id,
            self.version.max(0) as u64,
            fields,
            self.updated_at,
        ))
    }
}

/// Metadata store backed by the `asset_records` table.
#[derive(Clone)]
pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> MetadataResult<T>
    where
        F: FnOnce(&mut PgConnection) -> MetadataResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| MetadataError::new(MetadataErrorKind::Connection(e.to_string())))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| MetadataError::new(MetadataErrorKind::Query(e.to_string())))?
    }
}

#[async_trait::async_trait]
impl MetadataStore for PostgresMetadataStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    #[tracing::instrument(skip(self, fields))]
    async fn create_entity(
        &self,
        id: &str,
        owner_id: &str,
        fields: Fields,
    ) -> MetadataResult<Entity> {
        let entity = Entity::new(id, owner_id, fields);
        let row = AssetRecordRow::from_entity(&entity);
        let id = id.to_string();

        self.with_conn(move |conn| {
            diesel::insert_into(asset_records::table)
                .values(&row)
                .execute(conn)
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => MetadataError::new(MetadataErrorKind::AlreadyExists(id)),
                    other => MetadataError::from(other),
                })
        })
        .await?;

        Ok(entity)
    }

    async fn get_entity(&self, id: &str) -> MetadataResult<Entity> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            asset_records::table
                .find(&id)
                .select(AssetRecordRow::as_select())
                .first::<AssetRecordRow>(conn)
                .optional()?
                .ok_or_else(|| MetadataError::new(MetadataErrorKind::NotFound(id.clone())))?
                .into_entity()
        })
        .await
    }

    #[tracing::instrument(skip(self, patch), fields(fields = patch.len()))]
    async fn update_entity(
        &self,
        id: &str,
        patch: Fields,
        expected_version: Option<u64>,
    ) -> MetadataResult<Entity> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.transaction::<_, MetadataError, _>(|conn| {
                let mut entity = asset_records::table
                    .find(&id)
                    .for_update()
                    .select(AssetRecordRow::as_select())
                    .first::<AssetRecordRow>(conn)
                    .optional()?
                    .ok_or_else(|| MetadataError::new(MetadataErrorKind::NotFound(id.clone())))?
                    .into_entity()?;

                entity.apply(patch, expected_version)?;

                diesel::update(asset_records::table.find(&id))
                    .set((
                        asset_records::version.eq(*entity.version() as i64),
                        asset_records::fields.eq(Value::Object(entity.fields().clone())),
                        asset_records::updated_at.eq(*entity.updated_at()),
                    ))
                    .execute(conn)?;

                tracing::debug!(id = %id, version = *entity.version(), "Updated record");
                Ok(entity)
            })
        })
        .await
    }

    async fn list_entities(&self, owner_id: &str) -> MetadataResult<Vec<Entity>> {
        let owner_id = owner_id.to_string();
        self.with_conn(move |conn| {
            asset_records::table
                .filter(asset_records::owner_id.eq(&owner_id))
                .order(asset_records::id.asc())
                .select(AssetRecordRow::as_select())
                .load::<AssetRecordRow>(conn)?
                .into_iter()
                .map(AssetRecordRow::into_entity)
                .collect()
        })
        .await
    }
}
