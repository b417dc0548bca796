use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{NationalPark, Trail, User};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryRepository, InMemoryUserStore};
pub use postgres::{PostgresParkRepository, PostgresTrailRepository, PostgresUserStore};

/// CatalogResource
///
/// What a catalog record must expose for the generic repository contract:
/// a store-assigned immutable id and a name unique within its type.
pub trait CatalogResource: Clone + Send + Sync + 'static {
    /// Human-readable type name used in log lines and error messages.
    const KIND: &'static str;

    fn id(&self) -> i32;
    /// Only the store (on create) assigns ids.
    fn set_id(&mut self, id: i32);
    fn name(&self) -> &str;
    /// Copies the mutable attributes of `changes` onto `self`; id and creation
    /// timestamps are left untouched.
    fn apply_changes(&mut self, changes: &Self);
}

impl CatalogResource for NationalPark {
    const KIND: &'static str = "National Park";

    fn id(&self) -> i32 {
        self.id
    }
    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn apply_changes(&mut self, changes: &Self) {
        self.name = changes.name.clone();
        self.state = changes.state.clone();
        self.established = changes.established;
    }
}

impl CatalogResource for Trail {
    const KIND: &'static str = "Trail";

    fn id(&self) -> i32 {
        self.id
    }
    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn apply_changes(&mut self, changes: &Self) {
        self.name = changes.name.clone();
        self.distance = changes.distance;
        self.elevation = changes.elevation;
        self.difficulty = changes.difficulty;
        self.national_park_id = changes.national_park_id;
    }
}

/// Key for `CatalogRepository::exists`: create checks by name, delete/update by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Id(i32),
    Name(&'a str),
}

/// Names compare case-insensitively, ignoring surrounding whitespace.
/// Mirrors the `LOWER(TRIM(name))` unique indexes in the schema.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// CatalogRepository
///
/// The uniform contract every catalog resource type satisfies. Failures are logged and
/// reported as `false`/`None`; nothing here panics. The `exists(name)` check before
/// `create` is done by the caller and is not atomic with it; the schema's unique index
/// is the real enforcement, so a lost race shows up as `create == false`.
#[async_trait]
pub trait CatalogRepository<R: CatalogResource>: Send + Sync {
    async fn list(&self) -> Vec<R>;
    async fn get_by_id(&self, id: i32) -> Option<R>;
    async fn exists(&self, key: Lookup<'_>) -> bool;
    /// On success the store-assigned id is written into `resource`.
    async fn create(&self, resource: &mut R) -> bool;
    /// Updates mutable attributes of the record with `resource.id()`; never changes the id.
    async fn update(&self, resource: &R) -> bool;
    async fn delete(&self, resource: &R) -> bool;
}

/// TrailRepository
///
/// Trails additionally support listing by their parent park.
#[async_trait]
pub trait TrailRepository: CatalogRepository<Trail> {
    async fn list_in_park(&self, national_park_id: i32) -> Vec<Trail>;
}

/// UserStore
///
/// The credential store boundary. Only the `Authenticator` touches it.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive username match.
    async fn find_by_username(&self, username: &str) -> Option<User>;
    /// Returns the committed record (with its assigned id), or `None` if nothing was
    /// committed, including when the username is already taken.
    async fn insert(&self, user: User) -> Option<User>;
}

pub type ParkRepositoryState = Arc<dyn CatalogRepository<NationalPark>>;
pub type TrailRepositoryState = Arc<dyn TrailRepository>;
pub type UserStoreState = Arc<dyn UserStore>;
