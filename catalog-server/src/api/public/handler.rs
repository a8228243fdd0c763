//! Public catalog handlers

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::catalog::query::ProductFilters;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};
use shared::models::{Product, PublicProductPage, PublicProductView};

#[derive(Debug, Default, Deserialize)]
pub struct PublicListQuery {
    #[serde(flatten)]
    pub filters: ProductFilters,
    #[serde(alias = "excludeDuplicates")]
    pub exclude_duplicates: Option<String>,
}

impl PublicListQuery {
    /// Defaults to true; only an explicit false-like value disables filtering
    fn exclude_duplicates(&self) -> bool {
        !matches!(
            self.exclude_duplicates
                .as_deref()
                .map(|s| s.trim().to_ascii_lowercase())
                .as_deref(),
            Some("false" | "0" | "no")
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RelatedQuery {
    pub limit: Option<String>,
}

/// GET /api/public/products
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PublicListQuery>,
) -> AppResult<ApiResponse<PublicProductPage>> {
    let page = state
        .products()
        .public_search(&query.filters, query.exclude_duplicates())
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/public/products/{id}/{slug}
///
/// A stale slug still resolves; the view carries `redirect` and the canonical URL.
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path((id, slug)): Path<(i64, String)>,
) -> AppResult<ApiResponse<PublicProductView>> {
    let view = state.products().find_public(id, &slug).await?;
    Ok(ApiResponse::success(view))
}

/// GET /api/public/products/{id}/related?limit=4
pub async fn related(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<RelatedQuery>,
) -> AppResult<ApiResponse<Vec<Product>>> {
    let limit = query.limit.as_deref().and_then(|s| s.trim().parse().ok());
    let items = state.products().related(id, limit).await?;
    Ok(ApiResponse::success(items))
}
