//! Record catalog using PostgreSQL.
//!
//! Each shot is one row keyed by its record id, with the full
//! [`StoredRecord`] document held as JSONB. Channel merges are done inside the
//! database so that concurrent ingests of the same shot never overwrite a
//! channel that is already stored, and an insert never touches an existing row.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use shot_common::{ShotError, ShotResult, StoredChannel, StoredRecord};

/// Database connection pool and catalog operations.
pub struct RecordCatalog {
    pool: PgPool,
}

impl RecordCatalog {
    /// Create a new catalog connection from database URL.
    pub async fn connect(database_url: &str, max_connections: u32) -> ShotResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| ShotError::DatabaseError(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> ShotResult<()> {
        for statement in schema_statements() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| ShotError::DatabaseError(format!("Migration failed: {}", e)))?;
        }

        Ok(())
    }

    /// Find the record sharing a timestamp or a shot number with the given identity.
    ///
    /// A timestamp match is preferred over a shot number match.
    #[instrument(skip(self))]
    pub async fn find_by_identity(
        &self,
        shotnum: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> ShotResult<Option<StoredRecord>> {
        let shotnum = shotnum.map(to_db_shotnum).transpose()?;

        let row = sqlx::query_as::<_, (Json<StoredRecord>,)>(
            "SELECT document FROM records \
             WHERE timestamp = $2 OR ($1::BIGINT IS NOT NULL AND shotnum = $1) \
             ORDER BY (timestamp = $2) DESC, updated_at DESC LIMIT 1",
        )
        .bind(shotnum)
        .bind(timestamp)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ShotError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|(Json(document),)| document))
    }

    /// Insert a new record.
    ///
    /// Fails with [`ShotError::RecordExists`] when the id is already taken,
    /// whether by the same shot ingested concurrently or by a different shot
    /// within the same second. The stored row is never modified.
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn insert_record(&self, record: &StoredRecord) -> ShotResult<()> {
        let shotnum = record.metadata.shotnum.map(to_db_shotnum).transpose()?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO records (record_id, shotnum, timestamp, document, ingested_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (record_id) DO NOTHING
            "#,
        )
        .bind(&record.id)
        .bind(shotnum)
        .bind(record.metadata.timestamp)
        .bind(Json(record))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| ShotError::DatabaseError(format!("Insert failed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(ShotError::RecordExists(record.id.clone()));
        }

        info!(channels = record.channels.len(), "Inserted record");
        Ok(())
    }

    /// Add channels of `record` to the existing record with the same id.
    ///
    /// Channels already present in the stored document are left untouched.
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn merge_channels(&self, record: &StoredRecord) -> ShotResult<()> {
        let channels: &BTreeMap<String, StoredChannel> = &record.channels;

        let result = sqlx::query(
            r#"
            UPDATE records SET
                document = jsonb_set(document, '{channels}', $2::jsonb || (document -> 'channels')),
                updated_at = $3
            WHERE record_id = $1
            "#,
        )
        .bind(&record.id)
        .bind(Json(channels))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| ShotError::DatabaseError(format!("Update failed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(ShotError::RecordNotFound(record.id.clone()));
        }

        debug!(channels = channels.len(), "Merged channels into record");
        Ok(())
    }
}

fn to_db_shotnum(shotnum: u64) -> ShotResult<i64> {
    i64::try_from(shotnum).map_err(|_| {
        ShotError::InvalidDocument(format!("shotnum {} exceeds the catalog range", shotnum))
    })
}

fn schema_statements() -> impl Iterator<Item = &'static str> {
    SCHEMA_SQL
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
}

/// Database schema SQL.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    record_id VARCHAR(32) PRIMARY KEY,
    shotnum BIGINT,
    timestamp TIMESTAMPTZ NOT NULL,
    document JSONB NOT NULL,
    ingested_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_records_shotnum ON records(shotnum);
CREATE INDEX IF NOT EXISTS idx_records_timestamp ON records(timestamp)
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements() {
        let statements: Vec<_> = schema_statements().collect();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS records"));
    }

    #[test]
    fn test_shotnum_range() {
        assert_eq!(to_db_shotnum(366_372).unwrap(), 366_372);
        assert!(matches!(
            to_db_shotnum(u64::MAX),
            Err(ShotError::InvalidDocument(_))
        ));
    }
}
