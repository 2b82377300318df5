//! Tenement repository for PostgreSQL.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Pool, Postgres, QueryBuilder};
use tenement_core::error::AppError;
use tenement_core::models::{Jurisdiction, NewTenement, TenementRecord};
use uuid::Uuid;

/// Column list for SELECT queries. Must remain a const literal since
/// `format!()` bypasses sqlx compile-time validation.
const TENEMENT_COLUMNS: &str = "id, jurisdiction, number, tenement_type, status, holder_name, area_ha, grant_date, application_date, expiry_date, latitude, longitude, source_wfs_ref, source_mto_ref, last_sync_at";

/// Bound parameters per inserted row.
const BINDS_PER_ROW: usize = 15;

/// Rows per INSERT statement, keeping each statement under the PostgreSQL
/// limit of 65535 bind parameters.
const MAX_ROWS_PER_STATEMENT: usize = 65535 / BINDS_PER_ROW;

/// Repository for tenement persistence in PostgreSQL.
///
/// # Examples
///
/// ```no_run
/// use sqlx::postgres::PgPoolOptions;
/// use tenement_db::TenementRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPoolOptions::new()
///     .max_connections(5)
///     .connect("postgresql://localhost/tenements")
///     .await?;
///
/// let repo = TenementRepository::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TenementRepository {
    pool: Pool<Postgres>,
}

impl TenementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or updates a batch of tenements in one transaction.
    ///
    /// Conflicts on `id` overwrite every column except `created_at`. When the
    /// batch holds the same id twice, the later record wins. Returns the
    /// number of rows written.
    pub async fn upsert_batch(&self, records: &[TenementRecord]) -> Result<u64, AppError> {
        if records.is_empty() {
            return Ok(0);
        }

        let rows = dedup_by_id(records);
        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;
        let mut written = 0;

        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO tenements (id, jurisdiction, number, tenement_type, status, holder_name, area_ha, grant_date, application_date, expiry_date, latitude, longitude, source_wfs_ref, source_mto_ref, last_sync_at) ",
            );
            qb.push_values(chunk, |mut b, r| {
                let t = &r.tenement;
                b.push_bind(r.id)
                    .push_bind(t.jurisdiction.code())
                    .push_bind(t.number.as_str())
                    .push_bind(t.tenement_type.as_deref())
                    .push_bind(t.status.as_deref())
                    .push_bind(t.holder_name.as_deref())
                    .push_bind(t.area_ha)
                    .push_bind(t.grant_date)
                    .push_bind(t.application_date)
                    .push_bind(t.expiry_date)
                    .push_bind(t.latitude)
                    .push_bind(t.longitude)
                    .push_bind(t.source_wfs_ref.as_deref())
                    .push_bind(t.source_mto_ref.as_deref())
                    .push_bind(r.last_sync_at);
            });
            qb.push(
                r#"
                ON CONFLICT (id)
                DO UPDATE SET
                    jurisdiction = EXCLUDED.jurisdiction,
                    number = EXCLUDED.number,
                    tenement_type = EXCLUDED.tenement_type,
                    status = EXCLUDED.status,
                    holder_name = EXCLUDED.holder_name,
                    area_ha = EXCLUDED.area_ha,
                    grant_date = EXCLUDED.grant_date,
                    application_date = EXCLUDED.application_date,
                    expiry_date = EXCLUDED.expiry_date,
                    latitude = EXCLUDED.latitude,
                    longitude = EXCLUDED.longitude,
                    source_wfs_ref = EXCLUDED.source_wfs_ref,
                    source_mto_ref = EXCLUDED.source_mto_ref,
                    last_sync_at = EXCLUDED.last_sync_at
                "#,
            );

            let result = qb
                .build()
                .execute(&mut *tx)
                .await
                .map_err(AppError::DatabaseError)?;
            written += result.rows_affected();
        }

        tx.commit().await.map_err(AppError::DatabaseError)?;
        Ok(written)
    }

    /// Retrieves a tenement by its derived id.
    pub async fn get(&self, id: Uuid) -> Result<Option<TenementRecord>, AppError> {
        let query = format!("SELECT {} FROM tenements WHERE id = $1", TENEMENT_COLUMNS);
        let row = sqlx::query_as::<_, TenementRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        row.map(TenementRow::into_record).transpose()
    }

    /// Counts stored tenements, optionally for one jurisdiction.
    pub async fn count(&self, jurisdiction: Option<Jurisdiction>) -> Result<u64, AppError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM tenements
            WHERE $1::text IS NULL OR jurisdiction = $1
            "#,
        )
        .bind(jurisdiction.map(|j| j.code()))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(count.0.max(0) as u64)
    }

    /// Most recent `last_sync_at` for a jurisdiction, if any rows exist.
    pub async fn last_sync_at(
        &self,
        jurisdiction: Jurisdiction,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let row: (Option<DateTime<Utc>>,) =
            sqlx::query_as("SELECT MAX(last_sync_at) FROM tenements WHERE jurisdiction = $1")
                .bind(jurisdiction.code())
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::DatabaseError)?;

        Ok(row.0)
    }

    /// Checks database connectivity by executing a simple query.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(())
    }
}

/// Keeps the last record per id, in first-seen order.
fn dedup_by_id(records: &[TenementRecord]) -> Vec<&TenementRecord> {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(records.len());
    let mut rows: Vec<&TenementRecord> = Vec::with_capacity(records.len());

    for record in records {
        match index.get(&record.id) {
            Some(&i) => rows[i] = record,
            None => {
                index.insert(record.id, rows.len());
                rows.push(record);
            }
        }
    }

    if rows.len() < records.len() {
        tracing::debug!(
            duplicates = records.len() - rows.len(),
            "Collapsed duplicate tenement ids within batch"
        );
    }
    rows
}

/// Helper struct for deserializing tenement rows
#[derive(sqlx::FromRow)]
struct TenementRow {
    id: Uuid,
    jurisdiction: String,
    number: String,
    tenement_type: Option<String>,
    status: Option<String>,
    holder_name: Option<String>,
    area_ha: Option<f64>,
    grant_date: Option<NaiveDate>,
    application_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    source_wfs_ref: Option<String>,
    source_mto_ref: Option<String>,
    last_sync_at: DateTime<Utc>,
}

impl TenementRow {
    fn into_record(self) -> Result<TenementRecord, AppError> {
        let jurisdiction: Jurisdiction = self.jurisdiction.parse()?;
        Ok(TenementRecord {
            id: self.id,
            tenement: NewTenement {
                jurisdiction,
                number: self.number,
                tenement_type: self.tenement_type,
                status: self.status,
                holder_name: self.holder_name,
                area_ha: self.area_ha,
                grant_date: self.grant_date,
                application_date: self.application_date,
                expiry_date: self.expiry_date,
                latitude: self.latitude,
                longitude: self.longitude,
                source_wfs_ref: self.source_wfs_ref,
                source_mto_ref: self.source_mto_ref,
            },
            last_sync_at: self.last_sync_at,
        })
    }
}

// =============================================================================
// Trait Implementation: TenementStore
// =============================================================================

impl tenement_core::traits::TenementStore for TenementRepository {
    async fn upsert_batch(&self, records: &[TenementRecord]) -> Result<u64, AppError> {
        TenementRepository::upsert_batch(self, records).await
    }

    async fn count(&self, jurisdiction: Option<Jurisdiction>) -> Result<u64, AppError> {
        TenementRepository::count(self, jurisdiction).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        TenementRepository::health_check(self).await
    }
}
