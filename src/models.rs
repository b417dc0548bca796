use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents an account record from the `users` table.
/// While inside the store layer `password` carries the argon2 PHC hash; every
/// value handed back by the `Authenticator` has it cleared, and it is never serialized.
#[derive(Debug, Clone, Serialize, FromRow, Default, PartialEq)]
pub struct User {
    pub id: i32,
    // Unique across all accounts (exact match).
    pub username: String,

    /// Maps SQL column "password_hash" to Rust field "password".
    #[sqlx(rename = "password_hash")]
    #[serde(skip_serializing)]
    pub password: String,

    // The RBAC field. Every registered account currently receives "Admin".
    pub role: String,

    // Signed JWT, populated only by a successful authentication.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// NationalPark
///
/// A park record from the `national_parks` table. The same shape is accepted as the
/// request body for create (the `id` is ignored) and update (the `id` must match the path).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct NationalPark {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    pub state: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub established: DateTime<Utc>,
}

/// Difficulty
///
/// Trail grading. Stored as an INTEGER column, sent as its name in JSON.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum Difficulty {
    #[default]
    Easy = 0,
    Moderate = 1,
    Difficult = 2,
    Expert = 3,
}

/// Trail
///
/// A trail record from the `trails` table. Each trail belongs to one national park.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct Trail {
    pub id: i32,
    pub name: String,
    pub distance: f64,
    pub elevation: f64,
    pub difficulty: Difficulty,
    // FK to national_parks.id. Deleting the park does not cascade.
    pub national_park_id: i32,
    pub date_created: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// Credentials
///
/// Input payload for both `POST /api/users/authenticate` and `POST /api/users/register`.
/// Transient: never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// TrailCreateRequest
///
/// Input payload for `POST /api/trails`. The id and creation date are assigned server-side.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrailCreateRequest {
    pub name: String,
    pub distance: f64,
    pub elevation: f64,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub national_park_id: i32,
}

impl From<TrailCreateRequest> for Trail {
    fn from(req: TrailCreateRequest) -> Self {
        Trail {
            id: 0,
            name: req.name,
            distance: req.distance,
            elevation: req.elevation,
            difficulty: req.difficulty,
            national_park_id: req.national_park_id,
            date_created: Utc::now(),
        }
    }
}

/// TrailUpdateRequest
///
/// Input payload for `PATCH /api/trails/{id}`. `id` must equal the path id.
/// `date_created` is not updatable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrailUpdateRequest {
    pub id: i32,
    pub name: String,
    pub distance: f64,
    pub elevation: f64,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub national_park_id: i32,
}

impl From<TrailUpdateRequest> for Trail {
    fn from(req: TrailUpdateRequest) -> Self {
        Trail {
            id: req.id,
            name: req.name,
            distance: req.distance,
            elevation: req.elevation,
            difficulty: req.difficulty,
            national_park_id: req.national_park_id,
            date_created: DateTime::<Utc>::default(),
        }
    }
}
