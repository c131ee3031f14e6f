//! Product catalog: multipart create/update, list, get, soft delete.
//!
//! Every handler is scoped to the authenticated manufacturer; a product owned
//! by someone else looks exactly like a missing one.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::storage::products::{self, ProductChanges};
use crate::transport::http::error::ApiError;
use crate::transport::http::extract::{require_manufacturer, AuthUser};
use crate::transport::http::types::{
    AppState, ErrorResponse, ListProductsQuery, ProductMetadata, ProductResponse,
};

/// Collected multipart fields. `image` is the original filename plus the
/// bytes; metadata arrives as a JSON string field.
#[derive(Default)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    meta_data: Option<serde_json::Value>,
    image: Option<(String, Vec<u8>)>,
}

async fn read_form(mut multipart: Multipart) -> Result<ProductForm, ApiError> {
    let mut form = ProductForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "name" => form.name = Some(text(field).await?),
            "description" => form.description = Some(text(field).await?),
            "category" => form.category = Some(text(field).await?),
            "meta_data" => {
                let raw = text(field).await?;
                let parsed: ProductMetadata = serde_json::from_str(&raw)
                    .map_err(|e| ApiError::Validation(format!("invalid meta_data: {e}")))?;
                let value = serde_json::to_value(parsed)
                    .map_err(|e| ApiError::Internal(e.into()))?;
                form.meta_data = Some(value);
            }
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("could not read image: {e}")))?;
                let ext = match content_type.as_str() {
                    "image/png" => "png",
                    "image/jpeg" => "jpg",
                    other => {
                        return Err(ApiError::Validation(format!(
                            "unsupported image type '{other}', expected image/png or image/jpeg"
                        )))
                    }
                };
                form.image = Some((format!("{}.{ext}", Uuid::new_v4()), bytes.to_vec()));
            }
            other => {
                warn!(field = other, "ignoring unknown multipart field");
            }
        }
    }
    Ok(form)
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart field: {e}")))
}

/// Writes the uploaded image under the static dir and returns its public URL.
async fn store_image(state: &AppState, file_name: &str, bytes: &[u8]) -> Result<String, ApiError> {
    let dir = &state.settings.static_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    tokio::fs::write(format!("{dir}/{file_name}"), bytes)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(format!("/static/{file_name}"))
}

/// Best-effort removal of a replaced image; a missing file is not an error.
async fn remove_image(state: &AppState, image_url: &str) {
    if let Some(file_name) = image_url.strip_prefix("/static/") {
        let path = format!("{}/{file_name}", state.settings.static_dir);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path, error = %e, "could not remove replaced image");
        }
    }
}

#[utoipa::path(
    post,
    path = "/products",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Missing field or bad image", body = ErrorResponse),
        (status = 403, description = "Manufacturers only", body = ErrorResponse)
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    require_manufacturer(&user, "Only manufacturers can create products")?;

    let form = read_form(multipart).await?;
    let name = form
        .name
        .ok_or_else(|| ApiError::Validation("name is required".to_string()))?;
    let category = form
        .category
        .ok_or_else(|| ApiError::Validation("category is required".to_string()))?;
    let (file_name, bytes) = form
        .image
        .ok_or_else(|| ApiError::Validation("image is required".to_string()))?;

    let image_url = store_image(&state, &file_name, &bytes).await?;
    let inserted = products::insert(
        &state.pool,
        user.id,
        &name,
        form.description.as_deref(),
        &category,
        form.meta_data.as_ref(),
        &image_url,
    )
    .await;
    let product = match inserted {
        Ok(product) => product,
        Err(e) => {
            // The file was written before the row; do not leave it orphaned.
            remove_image(&state, &image_url).await;
            return Err(e.into());
        }
    };

    info!(product_id = product.id, manufacturer_id = user.id, "product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

#[utoipa::path(
    get,
    path = "/products",
    security(("bearer" = [])),
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Owned products", body = [ProductResponse])
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    require_manufacturer(&user, "Only manufacturers can list products")?;
    let items = products::list_owned(&state.pool, user.id, query.status, query.category.as_deref())
        .await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/products/{product_id}",
    security(("bearer" = [])),
    params(("product_id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Not found or not owned", body = ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    require_manufacturer(&user, "Only manufacturers can view products")?;
    let product = products::find_owned(&state.pool, product_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("Product not found"))?;
    Ok(Json(product.into()))
}

#[utoipa::path(
    put,
    path = "/products/{product_id}",
    security(("bearer" = [])),
    params(("product_id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Updated product", body = ProductResponse),
        (status = 404, description = "Not found or not owned", body = ErrorResponse)
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, ApiError> {
    require_manufacturer(&user, "Only manufacturers can update products")?;

    let existing = products::find_owned(&state.pool, product_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("Product not found"))?;

    let form = read_form(multipart).await?;
    let new_image_url = match form.image {
        Some((file_name, bytes)) => Some(store_image(&state, &file_name, &bytes).await?),
        None => None,
    };

    let updated = products::update_owned(
        &state.pool,
        product_id,
        user.id,
        ProductChanges {
            name: form.name.as_deref(),
            description: form.description.as_deref(),
            category: form.category.as_deref(),
            meta_data: form.meta_data.as_ref(),
            image_url: new_image_url.as_deref(),
        },
    )
    .await;
    let updated = match updated {
        Ok(Some(product)) => product,
        Ok(None) => {
            if let Some(url) = &new_image_url {
                remove_image(&state, url).await;
            }
            return Err(ApiError::NotFound("Product not found"));
        }
        Err(e) => {
            if let Some(url) = &new_image_url {
                remove_image(&state, url).await;
            }
            return Err(e.into());
        }
    };

    if new_image_url.is_some() {
        remove_image(&state, &existing.image_url).await;
    }

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/products/{product_id}",
    security(("bearer" = [])),
    params(("product_id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 404, description = "Not found or not owned", body = ErrorResponse)
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_manufacturer(&user, "Only manufacturers can delete products")?;
    let deleted = products::soft_delete(&state.pool, product_id, user.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Product not found"));
    }
    info!(product_id, manufacturer_id = user.id, "product deactivated");
    Ok(StatusCode::NO_CONTENT)
}
