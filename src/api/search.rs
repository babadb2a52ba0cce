//! Search API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::models::Restaurant;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
}

/// Single search result item.
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub restaurant: Restaurant,
    pub score: f32,
}

/// Maximum number of search results returned.
const SEARCH_LIMIT: usize = 5;

/// GET /api/search - Full-text search over restaurants.
pub async fn search_restaurants(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Vec<SearchResultItem>> {
    let hits = state.search.search(&params.q, SEARCH_LIMIT)?;

    // Hits whose restaurant disappeared from the store are skipped
    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        if let Some(restaurant) = state.repo.get_restaurant(&hit.restaurant_id).await? {
            results.push(SearchResultItem {
                restaurant,
                score: hit.score,
            });
        }
    }

    success(results)
}
