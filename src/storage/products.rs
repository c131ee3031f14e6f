//! Catalog store. Every lookup that backs a mutation is scoped by
//! `id AND manufacturer_id`, so a non-owned row is indistinguishable from a
//! missing one.

use sqlx::{PgPool, QueryBuilder};

use crate::domain::model::{Product, ProductStatus};

pub async fn insert(
    pool: &PgPool,
    manufacturer_id: i64,
    name: &str,
    description: Option<&str>,
    category: &str,
    meta_data: Option<&serde_json::Value>,
    image_url: &str,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "INSERT INTO products (manufacturer_id, name, description, category, meta_data, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(manufacturer_id)
    .bind(name)
    .bind(description)
    .bind(category)
    .bind(meta_data)
    .bind(image_url)
    .fetch_one(pool)
    .await
}

pub async fn list_owned(
    pool: &PgPool,
    manufacturer_id: i64,
    status: Option<ProductStatus>,
    category: Option<&str>,
) -> Result<Vec<Product>, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT * FROM products WHERE manufacturer_id = ");
    qb.push_bind(manufacturer_id);
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(category) = category {
        qb.push(" AND category = ").push_bind(category);
    }
    qb.push(" ORDER BY created_at DESC");
    qb.build_query_as::<Product>().fetch_all(pool).await
}

pub async fn find_owned(
    pool: &PgPool,
    id: i64,
    manufacturer_id: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND manufacturer_id = $2")
        .bind(id)
        .bind(manufacturer_id)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Default)]
pub struct ProductChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub meta_data: Option<&'a serde_json::Value>,
    pub image_url: Option<&'a str>,
}

pub async fn update_owned(
    pool: &PgPool,
    id: i64,
    manufacturer_id: i64,
    changes: ProductChanges<'_>,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "UPDATE products SET \
            name = COALESCE($3, name), \
            description = COALESCE($4, description), \
            category = COALESCE($5, category), \
            meta_data = COALESCE($6, meta_data), \
            image_url = COALESCE($7, image_url) \
         WHERE id = $1 AND manufacturer_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(manufacturer_id)
    .bind(changes.name)
    .bind(changes.description)
    .bind(changes.category)
    .bind(changes.meta_data)
    .bind(changes.image_url)
    .fetch_optional(pool)
    .await
}

/// Soft delete: the row and its tag linkages persist for audit.
pub async fn soft_delete(
    pool: &PgPool,
    id: i64,
    manufacturer_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET status = 'inactive' WHERE id = $1 AND manufacturer_id = $2",
    )
    .bind(id)
    .bind(manufacturer_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
