//! Scan ledger: append-only verification attempts plus the dashboard reads.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use crate::domain::model::{Scan, VerificationResult};

pub async fn has_prior_scan(pool: &PgPool, tag_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM scans WHERE tag_id = $1)")
        .bind(tag_id)
        .fetch_one(pool)
        .await
}

/// Every verification attempt lands here, whatever its outcome. Rows are
/// never updated or deleted.
pub async fn insert(
    pool: &PgPool,
    tag_id: i64,
    user_id: Option<i64>,
    location: Option<&str>,
    result: VerificationResult,
) -> Result<Scan, sqlx::Error> {
    sqlx::query_as::<_, Scan>(
        "INSERT INTO scans (tag_id, user_id, location, verification_result) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(tag_id)
    .bind(user_id)
    .bind(location)
    .bind(result)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScanFilter {
    pub product_id: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

fn push_filter(qb: &mut QueryBuilder<'_, sqlx::Postgres>, manufacturer_id: i64, filter: &ScanFilter) {
    qb.push(" FROM scans s JOIN tags t ON t.id = s.tag_id JOIN products p ON p.id = t.product_id WHERE p.manufacturer_id = ");
    qb.push_bind(manufacturer_id);
    if let Some(product_id) = filter.product_id {
        qb.push(" AND p.id = ").push_bind(product_id);
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND s.timestamp >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND s.timestamp <= ").push_bind(end);
    }
}

pub async fn total_for_manufacturer(
    pool: &PgPool,
    manufacturer_id: i64,
    filter: &ScanFilter,
) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT count(*)");
    push_filter(&mut qb, manufacturer_id, filter);
    let total: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(total)
}

#[derive(Debug, sqlx::FromRow, serde::Serialize, utoipa::ToSchema)]
pub struct MonthlyCount {
    pub month: String,
    pub scan_count: i64,
}

pub async fn monthly_for_manufacturer(
    pool: &PgPool,
    manufacturer_id: i64,
    filter: &ScanFilter,
) -> Result<Vec<MonthlyCount>, sqlx::Error> {
    let mut qb =
        QueryBuilder::new("SELECT to_char(s.timestamp, 'YYYY-MM') AS month, count(*) AS scan_count");
    push_filter(&mut qb, manufacturer_id, filter);
    qb.push(" GROUP BY month ORDER BY month");
    qb.build_query_as::<MonthlyCount>().fetch_all(pool).await
}

/// Scan row joined with the tag and product fields the dashboard shows.
#[derive(Debug, sqlx::FromRow)]
pub struct ScanDetail {
    pub id: i64,
    pub tag_id: i64,
    pub verification_result: VerificationResult,
    pub location: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub tag_code: String,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_category: String,
    pub product_image_url: String,
}

pub async fn list_for_manufacturer(
    pool: &PgPool,
    manufacturer_id: i64,
    filter: &ScanFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<ScanDetail>, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT s.id, s.tag_id, s.verification_result, s.location, s.timestamp, \
                t.tag_code, p.name AS product_name, p.description AS product_description, \
                p.category AS product_category, p.image_url AS product_image_url",
    );
    push_filter(&mut qb, manufacturer_id, filter);
    qb.push(" ORDER BY s.timestamp DESC OFFSET ")
        .push_bind(offset)
        .push(" LIMIT ")
        .push_bind(limit);
    qb.build_query_as::<ScanDetail>().fetch_all(pool).await
}
