//! Database repository for restaurants, reviews and accounts.
//!
//! Aggregations run as SQL inside SQLite; the eager review join is an explicit
//! second query issued after every restaurant read.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::geo;
use crate::models::{
    Flash, Location, NearbyRestaurant, NewReview, Restaurant, RestaurantDraft, RestaurantPage,
    Review, TagCount, TopRestaurant, UpdateRestaurantRequest, User, UserCredentials,
};
use crate::slug::{resolve_slug, slugify};

/// Restaurants per page in the paged listing.
pub const PAGE_SIZE: i64 = 6;
/// Minimum number of reviews to appear in the top list.
pub const TOP_LIST_MIN_REVIEWS: i64 = 2;
/// Maximum entries in the top list.
pub const TOP_LIST_LIMIT: i64 = 8;
/// Search radius for the proximity query.
pub const NEAR_RADIUS_METERS: f64 = 10_000.0;
/// Maximum entries returned by the proximity query.
pub const NEAR_LIMIT: usize = 10;
/// Lifetime of a password reset token.
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

const RESTAURANT_COLUMNS: &str = "id, name, slug, description, tags, created_at, location_type, longitude, latitude, address, photo, author_id";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== RESTAURANT OPERATIONS ====================

    /// Get a restaurant by ID, reviews attached.
    pub async fn get_restaurant(&self, id: &str) -> Result<Option<Restaurant>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM restaurants WHERE id = ?",
            RESTAURANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_reviews(vec![restaurant_from_row(&row)]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Get a restaurant by slug, reviews attached.
    pub async fn get_restaurant_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM restaurants WHERE slug = ? ORDER BY created_at LIMIT 1",
            RESTAURANT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_reviews(vec![restaurant_from_row(&row)]).await?.pop()),
            None => Ok(None),
        }
    }

    /// List one page of restaurants, newest first.
    ///
    /// Out-of-range pages are clamped to the first or last page.
    pub async fn list_restaurants(&self, page: i64) -> Result<RestaurantPage, AppError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM restaurants")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let pages = (count + PAGE_SIZE - 1) / PAGE_SIZE;
        let page = page.clamp(1, pages.max(1));

        let rows = sqlx::query(&format!(
            "SELECT {} FROM restaurants ORDER BY created_at DESC, name LIMIT ? OFFSET ?",
            RESTAURANT_COLUMNS
        ))
        .bind(PAGE_SIZE)
        .bind((page - 1) * PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        let restaurants = self
            .with_reviews(rows.iter().map(restaurant_from_row).collect())
            .await?;

        Ok(RestaurantPage {
            restaurants,
            page,
            pages,
            count,
        })
    }

    /// Every restaurant without reviews attached, used to rebuild the search index.
    pub async fn list_all_restaurants(&self) -> Result<Vec<Restaurant>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM restaurants ORDER BY created_at",
            RESTAURANT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(restaurant_from_row).collect())
    }

    /// Restaurants carrying `tag`; without a tag, every restaurant that has any tag.
    pub async fn list_restaurants_by_tag(
        &self,
        tag: Option<&str>,
    ) -> Result<Vec<Restaurant>, AppError> {
        let rows = match tag {
            Some(tag) => {
                sqlx::query(&format!(
                    "SELECT {} FROM restaurants r WHERE EXISTS (SELECT 1 FROM json_each(r.tags) t WHERE t.value = ?) ORDER BY created_at DESC",
                    RESTAURANT_COLUMNS
                ))
                .bind(tag)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM restaurants WHERE json_array_length(tags) > 0 ORDER BY created_at DESC",
                    RESTAURANT_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.with_reviews(rows.iter().map(restaurant_from_row).collect())
            .await
    }

    /// Create a restaurant from a validated draft.
    pub async fn create_restaurant(&self, draft: &RestaurantDraft) -> Result<Restaurant, AppError> {
        draft.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let slug = self.unique_slug(&draft.name, &id).await?;
        let tags_json = serde_json::to_string(&draft.tags)?;

        sqlx::query(
            "INSERT INTO restaurants (id, name, slug, description, tags, created_at, location_type, longitude, latitude, address, photo, author_id) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&slug)
        .bind(&draft.description)
        .bind(&tags_json)
        .bind(&now)
        .bind(&draft.location.kind)
        .bind(draft.location.longitude())
        .bind(draft.location.latitude())
        .bind(&draft.location.address)
        .bind(&draft.photo)
        .bind(&draft.author)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Created restaurant {} with slug {}", id, slug);

        Ok(Restaurant {
            id,
            name: draft.name.clone(),
            slug,
            description: draft.description.clone(),
            tags: draft.tags.clone(),
            created_at: now,
            location: draft.location.clone(),
            photo: draft.photo.clone(),
            author: draft.author.clone(),
            reviews: Vec::new(),
        })
    }

    /// Update a restaurant owned by `editor_id`. The slug only changes with the name.
    pub async fn update_restaurant(
        &self,
        id: &str,
        request: &UpdateRestaurantRequest,
        editor_id: &str,
    ) -> Result<Restaurant, AppError> {
        let existing = self
            .get_restaurant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", id)))?;

        if existing.author != editor_id {
            return Err(AppError::Forbidden(
                "You must own a restaurant in order to edit it!".to_string(),
            ));
        }

        let draft = RestaurantDraft::merged(&existing, request)?;
        let slug = if draft.name != existing.name {
            self.unique_slug(&draft.name, id).await?
        } else {
            existing.slug.clone()
        };
        let tags_json = serde_json::to_string(&draft.tags)?;

        sqlx::query(
            "UPDATE restaurants SET name = ?, slug = ?, description = ?, tags = ?, location_type = ?, longitude = ?, latitude = ?, address = ?, photo = ? WHERE id = ?"
        )
        .bind(&draft.name)
        .bind(&slug)
        .bind(&draft.description)
        .bind(&tags_json)
        .bind(&draft.location.kind)
        .bind(draft.location.longitude())
        .bind(draft.location.latitude())
        .bind(&draft.location.address)
        .bind(&draft.photo)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Restaurant {
            id: id.to_string(),
            name: draft.name,
            slug,
            description: draft.description,
            tags: draft.tags,
            created_at: existing.created_at,
            location: draft.location,
            photo: draft.photo,
            author: existing.author,
            reviews: existing.reviews,
        })
    }

    /// Derive the slug for `name`, numbering it past any existing variants.
    ///
    /// Not transactional: two concurrent saves of the same name can both
    /// observe the same collision count.
    async fn unique_slug(&self, name: &str, exclude_id: &str) -> Result<String, AppError> {
        let base = slugify(name);

        let taken: Vec<String> = sqlx::query("SELECT slug FROM restaurants WHERE slug LIKE ? AND id != ?")
            .bind(format!("{}%", base))
            .bind(exclude_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.get("slug"))
            .collect();

        Ok(resolve_slug(&base, taken.iter().map(String::as_str)))
    }

    /// Tag histogram: one row per distinct tag, most used first.
    pub async fn get_tags_list(&self) -> Result<Vec<TagCount>, AppError> {
        let rows = sqlx::query(
            "SELECT t.value AS tag, COUNT(*) AS count FROM restaurants r, json_each(r.tags) t GROUP BY t.value ORDER BY count DESC, tag ASC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| TagCount {
                tag: row.get("tag"),
                count: row.get("count"),
            })
            .collect())
    }

    /// Best rated restaurants with enough reviews to be meaningful.
    pub async fn get_top_list(&self) -> Result<Vec<TopRestaurant>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.slug, r.photo, AVG(v.rating) AS average_rating
            FROM restaurants r
            JOIN reviews v ON v.restaurant_id = r.id
            GROUP BY r.id
            HAVING COUNT(v.id) >= ?
            ORDER BY average_rating DESC, r.name ASC
            LIMIT ?
            "#,
        )
        .bind(TOP_LIST_MIN_REVIEWS)
        .bind(TOP_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<String> = rows.iter().map(|row| row.get("id")).collect();
        let mut reviews = self.reviews_for(&ids).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                TopRestaurant {
                    reviews: reviews.remove(&id).unwrap_or_default(),
                    id,
                    name: row.get("name"),
                    slug: row.get("slug"),
                    photo: row.get("photo"),
                    average_rating: row.get("average_rating"),
                }
            })
            .collect())
    }

    /// Restaurants within [`NEAR_RADIUS_METERS`] of a point, closest first.
    pub async fn find_near(
        &self,
        longitude: f64,
        latitude: f64,
    ) -> Result<Vec<NearbyRestaurant>, AppError> {
        let center = (longitude, latitude);
        // Slightly wider than the radius so the box never clips the circle
        let bbox = geo::bounding_box(center, NEAR_RADIUS_METERS * 1.01);

        let [(first_min, first_max), (second_min, second_max)] = bbox.longitude_ranges();

        let rows = sqlx::query(&format!(
            "SELECT {} FROM restaurants WHERE latitude BETWEEN ? AND ? AND (longitude BETWEEN ? AND ? OR longitude BETWEEN ? AND ?)",
            RESTAURANT_COLUMNS
        ))
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(first_min)
        .bind(first_max)
        .bind(second_min)
        .bind(second_max)
        .fetch_all(&self.pool)
        .await?;

        let mut nearby: Vec<NearbyRestaurant> = rows
            .iter()
            .map(restaurant_from_row)
            .filter_map(|r| {
                let distance = geo::distance_meters(
                    center,
                    (r.location.longitude(), r.location.latitude()),
                );
                (distance <= NEAR_RADIUS_METERS).then(|| NearbyRestaurant {
                    id: r.id,
                    name: r.name,
                    slug: r.slug,
                    description: r.description,
                    location: r.location,
                    photo: r.photo,
                    distance_meters: distance,
                })
            })
            .collect();

        nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        nearby.truncate(NEAR_LIMIT);
        Ok(nearby)
    }

    /// Attach reviews to each restaurant.
    async fn with_reviews(
        &self,
        mut restaurants: Vec<Restaurant>,
    ) -> Result<Vec<Restaurant>, AppError> {
        if restaurants.is_empty() {
            return Ok(restaurants);
        }

        let ids: Vec<String> = restaurants.iter().map(|r| r.id.clone()).collect();
        let mut reviews = self.reviews_for(&ids).await?;
        for restaurant in &mut restaurants {
            restaurant.reviews = reviews.remove(&restaurant.id).unwrap_or_default();
        }
        Ok(restaurants)
    }

    // ==================== REVIEW OPERATIONS ====================

    /// Reviews for the given restaurants, grouped by restaurant id, newest first.
    async fn reviews_for(&self, ids: &[String]) -> Result<HashMap<String, Vec<Review>>, AppError> {
        let mut grouped: HashMap<String, Vec<Review>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }

        let rows = sqlx::query(
            r#"
            SELECT v.id, v.author_id, u.name AS author_name, v.restaurant_id, v.text, v.rating, v.created_at
            FROM reviews v
            LEFT JOIN users u ON u.id = v.author_id
            WHERE v.restaurant_id IN (SELECT value FROM json_each(?))
            ORDER BY v.created_at DESC
            "#,
        )
        .bind(serde_json::to_string(ids)?)
        .fetch_all(&self.pool)
        .await?;

        for review in rows.iter().map(review_from_row) {
            grouped
                .entry(review.restaurant.clone())
                .or_default()
                .push(review);
        }
        Ok(grouped)
    }

    /// Get a review by ID.
    pub async fn get_review(&self, id: &str) -> Result<Option<Review>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT v.id, v.author_id, u.name AS author_name, v.restaurant_id, v.text, v.rating, v.created_at
            FROM reviews v
            LEFT JOIN users u ON u.id = v.author_id
            WHERE v.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(review_from_row))
    }

    /// Insert a review. Text, rating range and the restaurant reference are
    /// enforced by table constraints and surface as validation errors.
    pub async fn create_review(&self, review: &NewReview) -> Result<Review, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO reviews (id, author_id, restaurant_id, text, rating, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&review.author)
        .bind(&review.restaurant)
        .bind(&review.text)
        .bind(review.rating)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_review(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Review {} vanished after insert", id)))
    }

    // ==================== ACCOUNT OPERATIONS ====================

    /// Create a user. A duplicate email fails the unique constraint.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
        })
    }

    /// Find a user and their password hash by email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, created_at, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserCredentials {
            user: user_from_row(&row),
            password_hash: row.get("password_hash"),
        }))
    }

    /// Store a password reset token for a user.
    pub async fn set_reset_token(&self, user_id: &str, token: &str) -> Result<(), AppError> {
        let expires = (Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS)).to_rfc3339();

        sqlx::query(
            "UPDATE users SET reset_password_token = ?, reset_password_expires = ? WHERE id = ?",
        )
        .bind(token)
        .bind(&expires)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find the user owning an unexpired reset token.
    pub async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, created_at, reset_password_expires FROM users WHERE reset_password_token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires: Option<String> = row.get("reset_password_expires");
        let still_valid = expires
            .as_deref()
            .and_then(|e| DateTime::parse_from_rfc3339(e).ok())
            .is_some_and(|e| e > Utc::now());

        Ok(still_valid.then(|| user_from_row(&row)))
    }

    /// Replace a user's password hash and clear any reset token.
    pub async fn update_password(&self, user_id: &str, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, reset_password_token = NULL, reset_password_expires = NULL WHERE id = ?",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    /// Open a session for a user and return its token.
    pub async fn create_session(&self, user_id: &str) -> Result<String, AppError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(token)
    }

    /// Resolve a session token to its user.
    pub async fn find_session_user(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT u.id, u.name, u.email, u.created_at FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Queue a flash message on a session.
    ///
    /// The append happens inside a single UPDATE so concurrent requests on one
    /// session cannot drop each other's flashes.
    pub async fn push_flash(&self, token: &str, flash: &Flash) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET flash = json_insert(flash, '$[#]', json(?)) WHERE token = ?")
            .bind(serde_json::to_string(flash)?)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Return and clear the queued flash messages of a session.
    ///
    /// The clear only applies if the queue still holds what was read, so a
    /// flash pushed in between is kept for the next read.
    pub async fn take_flashes(&self, token: &str) -> Result<Vec<Flash>, AppError> {
        loop {
            let raw: Option<String> = sqlx::query("SELECT flash FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?
                .map(|row| row.get("flash"));

            let Some(raw) = raw else {
                return Ok(Vec::new());
            };
            let flashes: Vec<Flash> = serde_json::from_str(&raw)?;
            if flashes.is_empty() {
                return Ok(flashes);
            }

            let cleared = sqlx::query("UPDATE sessions SET flash = '[]' WHERE token = ? AND flash = ?")
                .bind(token)
                .bind(&raw)
                .execute(&self.pool)
                .await?;
            if cleared.rows_affected() > 0 {
                return Ok(flashes);
            }
        }
    }
}

// ==================== ROW MAPPING ====================

fn restaurant_from_row(row: &sqlx::sqlite::SqliteRow) -> Restaurant {
    let tags_str: String = row.get("tags");
    Restaurant {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        tags: parse_json_array(&tags_str),
        created_at: row.get("created_at"),
        location: Location {
            kind: row.get("location_type"),
            coordinates: [row.get("longitude"), row.get("latitude")],
            address: row.get("address"),
        },
        photo: row.get("photo"),
        author: row.get("author_id"),
        reviews: Vec::new(),
    }
}

fn review_from_row(row: &sqlx::sqlite::SqliteRow) -> Review {
    Review {
        id: row.get("id"),
        author: row.get("author_id"),
        author_name: row.get("author_name"),
        restaurant: row.get("restaurant_id"),
        text: row.get("text"),
        rating: row.get("rating"),
        created_at: row.get("created_at"),
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
