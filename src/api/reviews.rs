//! Review submission endpoint.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Redirect,
    Json,
};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{Flash, NewReview, ReviewPayload};
use crate::AppState;

/// POST /api/reviews/:id - Add a review to a restaurant.
///
/// Identity fields come from the session and the route, never from the body.
/// Answers with a redirect back to the referring page and queues a flash.
pub async fn add_review(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(restaurant_id): Path<String>,
    headers: HeaderMap,
    Json(mut payload): Json<ReviewPayload>,
) -> Result<Redirect, AppError> {
    payload.author = Some(current.user.id.clone());
    payload.restaurant = Some(restaurant_id);

    let review = state
        .repo
        .create_review(&NewReview::from_payload(payload))
        .await?;
    tracing::info!(
        "Review {} added to {} by {}",
        review.id,
        review.restaurant,
        review.author
    );

    state
        .repo
        .push_flash(&current.session_token, &Flash::success("Thanks! Review added!"))
        .await?;

    let back = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/");
    Ok(Redirect::to(back))
}
