//! Metadata type catalog lookup.

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::debug;

use mediacat_core::{Error, MetadataTypeMap, MetadataTypeRepository, Result};

const FETCH_ALL_SQL: &str =
    "SELECT md_type_name, md_type_id::int4 AS md_type_id FROM mediaserver.MetaDataType";

/// Read the full name → identifier mapping on an existing connection.
pub async fn fetch_metadata_types(conn: &mut PgConnection) -> Result<MetadataTypeMap> {
    let rows = sqlx::query(FETCH_ALL_SQL)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::Database)?;

    let mut mapping = MetadataTypeMap::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("md_type_name").map_err(Error::Database)?;
        let id: i32 = row.try_get("md_type_id").map_err(Error::Database)?;
        mapping.insert(name, id);
    }

    debug!(
        subsystem = "db",
        component = "metadata_types",
        op = "fetch_all",
        type_count = mapping.len(),
        "Fetched metadata type catalog"
    );
    Ok(mapping)
}

/// PostgreSQL implementation of MetadataTypeRepository.
#[derive(Clone)]
pub struct PgMetadataTypeRepository {
    pool: Pool<Postgres>,
}

impl PgMetadataTypeRepository {
    /// Create a new PgMetadataTypeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataTypeRepository for PgMetadataTypeRepository {
    async fn fetch_all(&self) -> Result<MetadataTypeMap> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        fetch_metadata_types(&mut conn).await
    }
}
