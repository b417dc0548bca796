use async_trait::async_trait;
use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicI32, Ordering},
};

use super::{CatalogRepository, CatalogResource, Lookup, TrailRepository, UserStore, normalize_name};
use crate::models::{Trail, User};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// InMemoryRepository
///
/// A `CatalogRepository` over a `Vec`, used by tests and local tooling in place of
/// Postgres. It enforces the same normalised-name uniqueness as the schema's unique
/// index, and `set_fail_writes(true)` makes every write report failure.
pub struct InMemoryRepository<R> {
    records: Mutex<Vec<R>>,
    next_id: AtomicI32,
    fail_writes: AtomicBool,
}

impl<R: CatalogResource> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CatalogResource> InMemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Seeds records as-is; ids continue after the largest seeded id.
    pub fn with_records(records: Vec<R>) -> Self {
        let next = records.iter().map(|r| r.id()).max().unwrap_or(0) + 1;
        Self {
            records: Mutex::new(records),
            next_id: AtomicI32::new(next),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn writes_failing(&self) -> bool {
        let failing = self.fail_writes.load(Ordering::SeqCst);
        if failing {
            tracing::error!("{} write rejected by in-memory store", R::KIND);
        }
        failing
    }
}

#[async_trait]
impl<R: CatalogResource> CatalogRepository<R> for InMemoryRepository<R> {
    async fn list(&self) -> Vec<R> {
        lock(&self.records).clone()
    }

    async fn get_by_id(&self, id: i32) -> Option<R> {
        lock(&self.records).iter().find(|r| r.id() == id).cloned()
    }

    async fn exists(&self, key: Lookup<'_>) -> bool {
        let records = lock(&self.records);
        match key {
            Lookup::Id(id) => records.iter().any(|r| r.id() == id),
            Lookup::Name(name) => {
                let wanted = normalize_name(name);
                records.iter().any(|r| normalize_name(r.name()) == wanted)
            }
        }
    }

    async fn create(&self, resource: &mut R) -> bool {
        if self.writes_failing() {
            return false;
        }
        let mut records = lock(&self.records);
        let wanted = normalize_name(resource.name());
        if records.iter().any(|r| normalize_name(r.name()) == wanted) {
            tracing::warn!("create {} rejected by unique name", R::KIND);
            return false;
        }
        resource.set_id(self.next_id.fetch_add(1, Ordering::SeqCst));
        records.push(resource.clone());
        true
    }

    async fn update(&self, resource: &R) -> bool {
        if self.writes_failing() {
            return false;
        }
        let mut records = lock(&self.records);
        let wanted = normalize_name(resource.name());
        if records
            .iter()
            .any(|r| r.id() != resource.id() && normalize_name(r.name()) == wanted)
        {
            tracing::warn!("update {} rejected by unique name", R::KIND);
            return false;
        }
        match records.iter_mut().find(|r| r.id() == resource.id()) {
            Some(stored) => {
                stored.apply_changes(resource);
                true
            }
            None => false,
        }
    }

    async fn delete(&self, resource: &R) -> bool {
        if self.writes_failing() {
            return false;
        }
        let mut records = lock(&self.records);
        let before = records.len();
        records.retain(|r| r.id() != resource.id());
        records.len() < before
    }
}

#[async_trait]
impl TrailRepository for InMemoryRepository<Trail> {
    async fn list_in_park(&self, national_park_id: i32) -> Vec<Trail> {
        lock(&self.records)
            .iter()
            .filter(|t| t.national_park_id == national_park_id)
            .cloned()
            .collect()
    }
}

/// InMemoryUserStore
///
/// `UserStore` over a `Vec`. Rejects duplicate usernames like the `users.username`
/// unique constraint does.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    next_id: AtomicI32,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        lock(&self.users).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Option<User> {
        lock(&self.users)
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    async fn insert(&self, mut user: User) -> Option<User> {
        let mut users = lock(&self.users);
        if users.iter().any(|u| u.username == user.username) {
            tracing::warn!("insert user rejected by unique username");
            return None;
        }
        user.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        user.token = None;
        users.push(user.clone());
        Some(user)
    }
}
