//! Restaurant Repository
//!
//! The catalog is seeded by the scheduling pipeline; the booking core only
//! reads display fields from it.

use sqlx::SqlitePool;
use uuid::Uuid;

use super::RepoResult;

#[derive(Clone)]
pub struct RestaurantRepository {
    pool: SqlitePool,
}

impl RestaurantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Restaurant display name, if the restaurant exists
    pub async fn find_name(&self, restaurant_id: Uuid) -> RepoResult<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM restaurants WHERE restaurant_id = ?")
                .bind(restaurant_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(name)
    }
}
