//! Review model.

use serde::{Deserialize, Serialize};

/// A stored review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub author: String,
    /// Display name of the author, joined at read time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub restaurant: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    pub created_at: String,
}

/// Review payload as posted by a client.
///
/// `author` and `restaurant` are accepted so that clients sending them do not
/// fail to parse, but the submission handler always overwrites both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub restaurant: Option<String>,
}

/// A review about to be inserted. Constraint checks are left to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub author: String,
    pub restaurant: String,
    pub text: Option<String>,
    pub rating: Option<i64>,
}

impl NewReview {
    /// Build the insertable record; identity fields must already be server-assigned.
    pub fn from_payload(payload: ReviewPayload) -> Self {
        Self {
            author: payload.author.unwrap_or_default(),
            restaurant: payload.restaurant.unwrap_or_default(),
            text: payload.text.map(|t| t.trim().to_string()),
            rating: payload.rating,
        }
    }
}
