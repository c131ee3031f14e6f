//! Tag/batch ledger.

use sqlx::{PgPool, QueryBuilder, Row};

use crate::domain::model::{Batch, MintType, Tag, TagStatus};
use crate::infra::chain::token_id_hex;

pub async fn insert_batch(
    pool: &PgPool,
    product_id: Option<i64>,
    manufacturer_id: i64,
    count: i32,
    mint_type: MintType,
) -> Result<Batch, sqlx::Error> {
    sqlx::query_as::<_, Batch>(
        "INSERT INTO batches (product_id, manufacturer_id, count, status, mint_type) \
         VALUES ($1, $2, $3, 'pending', $4) RETURNING *",
    )
    .bind(product_id)
    .bind(manufacturer_id)
    .bind(count)
    .bind(mint_type)
    .fetch_one(pool)
    .await
}

pub async fn mark_batch_failed(pool: &PgPool, batch_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE batches SET status = 'failed' WHERE id = $1")
        .bind(batch_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Postgres caps a statement at 65535 bind parameters; at six binds per tag
/// row, large batches must be split across statements.
const INSERT_CHUNK_ROWS: usize = 1000;

/// Flips the batch to `minted` and materializes its tag rows in one
/// transaction: tags exist iff the batch is minted.
pub async fn finalize_minted_batch(
    pool: &PgPool,
    batch_id: i64,
    tx_hash: &str,
    tag_codes: &[String],
    tag_status: TagStatus,
    product_id: Option<i64>,
) -> Result<Batch, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let batch = sqlx::query_as::<_, Batch>(
        "UPDATE batches SET status = 'minted', tx_hash = $2 WHERE id = $1 RETURNING *",
    )
    .bind(batch_id)
    .bind(tx_hash)
    .fetch_one(&mut *tx)
    .await?;

    for chunk in tag_codes.chunks(INSERT_CHUNK_ROWS) {
        let mut qb = QueryBuilder::new(
            "INSERT INTO tags (tag_code, token_id, tx_hash, status, product_id, batch_id) ",
        );
        qb.push_values(chunk, |mut row, code| {
            row.push_bind(code)
                .push_bind(token_id_hex(code))
                .push_bind(tx_hash)
                .push_bind(tag_status)
                .push_bind(product_id)
                .push_bind(batch_id);
        });
        qb.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(batch)
}

/// Tag row joined with the public-facing fields of its product. Product
/// columns are nullable: unused pool tags have no product yet.
#[derive(Debug, sqlx::FromRow)]
pub struct TagWithProduct {
    pub id: i64,
    pub tag_code: String,
    pub token_id: String,
    pub status: TagStatus,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_category: Option<String>,
    pub product_image_url: Option<String>,
}

pub async fn find_by_code_with_product(
    pool: &PgPool,
    tag_code: &str,
) -> Result<Option<TagWithProduct>, sqlx::Error> {
    sqlx::query_as::<_, TagWithProduct>(
        "SELECT t.id, t.tag_code, t.token_id, t.status, t.product_id, \
                p.name AS product_name, p.description AS product_description, \
                p.category AS product_category, p.image_url AS product_image_url \
         FROM tags t LEFT JOIN products p ON p.id = t.product_id \
         WHERE t.tag_code = $1",
    )
    .bind(tag_code)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_batch(pool: &PgPool, batch_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE batch_id = $1 ORDER BY id")
        .bind(batch_id)
        .fetch_all(pool)
        .await
}

/// Tamper detection is sticky: once an on-chain owner mismatch is observed the
/// tag can no longer verify from its stored status.
pub async fn flag_tag(pool: &PgPool, tag_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tags SET status = 'flagged' WHERE id = $1")
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub enum AssignOutcome {
    Assigned(Vec<String>),
    Insufficient { available: i64 },
}

/// Draws `count` tags from the unused pool and links them to the product,
/// all-or-nothing.
///
/// The draw and the update are one statement over a locked candidate set
/// (`FOR UPDATE SKIP LOCKED`, oldest first), so two manufacturers assigning
/// concurrently can never claim the same tag or starve on each other's locks.
/// If fewer rows come back than requested the transaction is rolled back and
/// nothing changes state.
pub async fn assign_unused_tags(
    pool: &PgPool,
    product_id: i64,
    count: i64,
) -> Result<AssignOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE tags SET status = 'active', product_id = $1 \
         WHERE id IN ( \
             SELECT id FROM tags WHERE status = 'unused' \
             ORDER BY id ASC LIMIT $2 \
             FOR UPDATE SKIP LOCKED \
         ) \
         RETURNING tag_code",
    )
    .bind(product_id)
    .bind(count)
    .fetch_all(&mut *tx)
    .await?;

    if (rows.len() as i64) < count {
        tx.rollback().await?;
        let available: i64 =
            sqlx::query_scalar("SELECT count(*) FROM tags WHERE status = 'unused'")
                .fetch_one(pool)
                .await?;
        return Ok(AssignOutcome::Insufficient { available });
    }

    tx.commit().await?;

    let codes = rows
        .into_iter()
        .map(|row| row.try_get::<String, _>("tag_code"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AssignOutcome::Assigned(codes))
}
