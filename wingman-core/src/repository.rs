use async_trait::async_trait;

use crate::flight::{FlightKey, FlightRecord, NewFlight};

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
}

/// Repository trait for saved flights
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<FlightRecord>>;

    /// Insert without any duplicate check.
    async fn insert(&self, user_id: i64, flight: &NewFlight) -> RepoResult<FlightRecord>;

    /// Delete every row matching the key. Returns how many rows went away,
    /// which may be zero.
    async fn delete_matching(&self, key: &FlightKey) -> RepoResult<u64>;
}

/// Repository trait for user lookups
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}
