//! Restaurant API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{
    CreateRestaurantRequest, Flash, NearbyRestaurant, Restaurant, RestaurantDraft,
    RestaurantPage, TagCount, TopRestaurant, UpdateRestaurantRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Tag histogram plus the restaurants matching the selected tag.
#[derive(Debug, Serialize)]
pub struct TagPage {
    pub tag: String,
    pub tags: Vec<TagCount>,
    pub restaurants: Vec<Restaurant>,
}

/// GET /api/restaurants - List one page of restaurants.
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> ApiResult<RestaurantPage> {
    success(state.repo.list_restaurants(params.page).await?)
}

/// GET /api/restaurants/:id - Get a single restaurant.
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Restaurant> {
    match state.repo.get_restaurant(&id).await? {
        Some(restaurant) => success(restaurant),
        None => Err(AppError::NotFound(format!("Restaurant {} not found", id))),
    }
}

/// GET /api/restaurants/slug/:slug - Get a restaurant by slug.
pub async fn get_restaurant_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Restaurant> {
    match state.repo.get_restaurant_by_slug(&slug).await? {
        Some(restaurant) => success(restaurant),
        None => Err(AppError::NotFound(format!("Restaurant {} not found", slug))),
    }
}

/// POST /api/restaurants - Create a restaurant authored by the session user.
pub async fn create_restaurant(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateRestaurantRequest>,
) -> ApiResult<Restaurant> {
    let draft = RestaurantDraft::from_request(&request, &current.user.id)?;
    let restaurant = state.repo.create_restaurant(&draft).await?;

    if let Err(e) = state.search.index_restaurant(&restaurant).await {
        tracing::warn!("Failed to index restaurant: {}", e);
    }
    state
        .repo
        .push_flash(
            &current.session_token,
            &Flash::success(format!(
                "Successfully created {}. Care to leave a review?",
                restaurant.name
            )),
        )
        .await?;

    tracing::info!(
        "Restaurant {} ({}) created by {}",
        restaurant.id,
        restaurant.slug,
        current.user.id
    );
    success(restaurant)
}

/// PUT /api/restaurants/:id - Update a restaurant owned by the session user.
pub async fn update_restaurant(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateRestaurantRequest>,
) -> ApiResult<Restaurant> {
    let restaurant = state
        .repo
        .update_restaurant(&id, &request, &current.user.id)
        .await?;

    if let Err(e) = state.search.index_restaurant(&restaurant).await {
        tracing::warn!("Failed to re-index restaurant: {}", e);
    }
    state
        .repo
        .push_flash(
            &current.session_token,
            &Flash::success(format!("Successfully updated {}.", restaurant.name)),
        )
        .await?;

    success(restaurant)
}

/// GET /api/restaurants/near - Restaurants close to a point.
pub async fn near_restaurants(
    State(state): State<AppState>,
    Query(params): Query<NearQuery>,
) -> ApiResult<Vec<NearbyRestaurant>> {
    if !(-90.0..=90.0).contains(&params.lat) || !(-180.0..=180.0).contains(&params.lng) {
        return Err(AppError::Validation(
            "lat must be within [-90, 90] and lng within [-180, 180]".to_string(),
        ));
    }
    success(state.repo.find_near(params.lng, params.lat).await?)
}

/// GET /api/tags - Tag histogram.
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Vec<TagCount>> {
    success(state.repo.get_tags_list().await?)
}

/// GET /api/tags/:tag - Histogram plus restaurants with the tag.
pub async fn restaurants_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<TagPage> {
    let tags = state.repo.get_tags_list().await?;
    let restaurants = state.repo.list_restaurants_by_tag(Some(&tag)).await?;
    success(TagPage {
        tag,
        tags,
        restaurants,
    })
}

/// GET /api/top - Best rated restaurants.
pub async fn top_restaurants(State(state): State<AppState>) -> ApiResult<Vec<TopRestaurant>> {
    success(state.repo.get_top_list().await?)
}
