//! Restaurant model and its save-time normalization rules.

use serde::{Deserialize, Serialize};

use super::Review;
use crate::errors::AppError;

/// GeoJSON-style point with a postal address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    pub address: String,
}

impl Location {
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// A restaurant with its reviews attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub author: String,
    /// Filled by the eager review join on every read
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// Location as submitted by a client; every part may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationInput {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Vec<f64>>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Request body for creating a new restaurant.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRestaurantRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: LocationInput,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Request body for updating an existing restaurant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRestaurantRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub location: Option<LocationInput>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// A restaurant ready to be written: normalized and validated, slug not yet resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantDraft {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: String,
}

impl RestaurantDraft {
    /// Build a draft from a create request and the authenticated author.
    pub fn from_request(request: &CreateRestaurantRequest, author: &str) -> Result<Self, AppError> {
        let draft = Self {
            name: request.name.trim().to_string(),
            description: normalize_text(request.description.as_deref()),
            tags: normalize_tags(&request.tags),
            location: normalize_location(&request.location)?,
            photo: normalize_text(request.photo.as_deref()),
            author: author.trim().to_string(),
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Apply an update on top of an existing restaurant.
    pub fn merged(existing: &Restaurant, request: &UpdateRestaurantRequest) -> Result<Self, AppError> {
        let location = match &request.location {
            Some(input) => normalize_location(input)?,
            None => existing.location.clone(),
        };
        let draft = Self {
            name: request
                .name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.name)
                .to_string(),
            description: match &request.description {
                Some(d) => normalize_text(Some(d)),
                None => existing.description.clone(),
            },
            tags: request
                .tags
                .as_ref()
                .map(|t| normalize_tags(t))
                .unwrap_or_else(|| existing.tags.clone()),
            location,
            photo: match &request.photo {
                Some(p) => normalize_text(Some(p)),
                None => existing.photo.clone(),
            },
            author: existing.author.clone(),
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Required-field checks run before every insert or update.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.is_empty() {
            return Err(AppError::Validation(
                "Please enter a restaurant name".to_string(),
            ));
        }
        if self.location.address.is_empty() {
            return Err(AppError::Validation("We need an address!".to_string()));
        }
        if self.author.is_empty() {
            return Err(AppError::Validation(
                "You must supply an author".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trim free text; blank becomes absent.
fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trim tags, drop blanks and repeated entries, keep first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn normalize_location(input: &LocationInput) -> Result<Location, AppError> {
    let coordinates = match input.coordinates.as_deref() {
        Some([lng, lat]) => [*lng, *lat],
        _ => {
            return Err(AppError::Validation(
                "You must give a location".to_string(),
            ))
        }
    };
    if !coordinates.iter().all(|c| c.is_finite())
        || !(-180.0..=180.0).contains(&coordinates[0])
        || !(-90.0..=90.0).contains(&coordinates[1])
    {
        return Err(AppError::Validation(
            "Coordinates must be [longitude, latitude]".to_string(),
        ));
    }

    Ok(Location {
        kind: input
            .kind
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or("Point")
            .to_string(),
        coordinates,
        address: input.address.as_deref().unwrap_or("").trim().to_string(),
    })
}

/// One bucket of the tag histogram.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Projection returned by the top-rated list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopRestaurant {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub average_rating: Option<f64>,
    pub reviews: Vec<Review>,
}

/// One page of restaurants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantPage {
    pub restaurants: Vec<Restaurant>,
    pub page: i64,
    pub pages: i64,
    pub count: i64,
}

/// Restaurant found by a proximity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRestaurant {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub distance_meters: f64,
}
