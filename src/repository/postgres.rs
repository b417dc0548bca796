use async_trait::async_trait;
use sqlx::PgPool;

use super::{CatalogRepository, CatalogResource, Lookup, TrailRepository, UserStore};
use crate::models::{NationalPark, Trail, User};

const PARK_COLUMNS: &str = "id, name, state, created, established";
const TRAIL_COLUMNS: &str =
    "id, name, distance, elevation, difficulty, national_park_id, date_created";

/// Logs a failed write. Unique violations are expected under the create race and
/// are logged at a lower level than real store failures.
fn log_write_error(operation: &str, kind: &str, e: &sqlx::Error) {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            tracing::warn!("{} {} rejected by unique constraint: {}", operation, kind, db)
        }
        _ => tracing::error!("{} {} error: {:?}", operation, kind, e),
    }
}

/// Shared existence check. `table` is always one of our own table names, never input.
async fn exists_in(pool: &PgPool, table: &str, kind: &str, key: Lookup<'_>) -> bool {
    let result = match key {
        Lookup::Id(id) => {
            let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
            sqlx::query_scalar::<_, bool>(&sql)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        Lookup::Name(name) => {
            let sql = format!(
                "SELECT EXISTS(SELECT 1 FROM {table} WHERE LOWER(TRIM(name)) = LOWER(TRIM($1)))"
            );
            sqlx::query_scalar::<_, bool>(&sql)
                .bind(name)
                .fetch_one(pool)
                .await
        }
    };

    result.unwrap_or_else(|e| {
        tracing::error!("{} exists error: {:?}", kind, e);
        false
    })
}

async fn delete_from(pool: &PgPool, table: &str, kind: &str, id: i32) -> bool {
    let sql = format!("DELETE FROM {table} WHERE id = $1");
    match sqlx::query(&sql).bind(id).execute(pool).await {
        Ok(res) => res.rows_affected() > 0,
        Err(e) => {
            log_write_error("delete", kind, &e);
            false
        }
    }
}

// --- Credential Store ---

/// PostgresUserStore
///
/// `UserStore` backed by the `users` table.
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_username(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_by_username error: {:?}", e);
            None
        })
    }

    async fn insert(&self, user: User) -> Option<User> {
        let result = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, password_hash, role)
               VALUES ($1, $2, $3)
               RETURNING id, username, password_hash, role"#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Some(created),
            Err(e) => {
                log_write_error("insert", "user", &e);
                None
            }
        }
    }
}

// --- National Parks ---

/// PostgresParkRepository
///
/// `CatalogRepository<NationalPark>` backed by the `national_parks` table.
pub struct PostgresParkRepository {
    pool: PgPool,
}

impl PostgresParkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository<NationalPark> for PostgresParkRepository {
    async fn list(&self) -> Vec<NationalPark> {
        let sql = format!("SELECT {PARK_COLUMNS} FROM national_parks ORDER BY id");
        sqlx::query_as::<_, NationalPark>(&sql)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list national parks error: {:?}", e);
                vec![]
            })
    }

    async fn get_by_id(&self, id: i32) -> Option<NationalPark> {
        let sql = format!("SELECT {PARK_COLUMNS} FROM national_parks WHERE id = $1");
        sqlx::query_as::<_, NationalPark>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get national park error: {:?}", e);
                None
            })
    }

    async fn exists(&self, key: Lookup<'_>) -> bool {
        exists_in(&self.pool, "national_parks", NationalPark::KIND, key).await
    }

    async fn create(&self, park: &mut NationalPark) -> bool {
        let result = sqlx::query_scalar::<_, i32>(
            r#"INSERT INTO national_parks (name, state, created, established)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(&park.name)
        .bind(&park.state)
        .bind(park.created)
        .bind(park.established)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => {
                park.set_id(id);
                true
            }
            Err(e) => {
                log_write_error("create", NationalPark::KIND, &e);
                false
            }
        }
    }

    async fn update(&self, park: &NationalPark) -> bool {
        let result = sqlx::query(
            "UPDATE national_parks SET name = $2, state = $3, established = $4 WHERE id = $1",
        )
        .bind(park.id)
        .bind(&park.name)
        .bind(&park.state)
        .bind(park.established)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                log_write_error("update", NationalPark::KIND, &e);
                false
            }
        }
    }

    /// Fails (returns false) while trails still reference the park.
    async fn delete(&self, park: &NationalPark) -> bool {
        delete_from(&self.pool, "national_parks", NationalPark::KIND, park.id).await
    }
}

// --- Trails ---

/// PostgresTrailRepository
///
/// `TrailRepository` backed by the `trails` table.
pub struct PostgresTrailRepository {
    pool: PgPool,
}

impl PostgresTrailRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository<Trail> for PostgresTrailRepository {
    async fn list(&self) -> Vec<Trail> {
        let sql = format!("SELECT {TRAIL_COLUMNS} FROM trails ORDER BY id");
        sqlx::query_as::<_, Trail>(&sql)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list trails error: {:?}", e);
                vec![]
            })
    }

    async fn get_by_id(&self, id: i32) -> Option<Trail> {
        let sql = format!("SELECT {TRAIL_COLUMNS} FROM trails WHERE id = $1");
        sqlx::query_as::<_, Trail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get trail error: {:?}", e);
                None
            })
    }

    async fn exists(&self, key: Lookup<'_>) -> bool {
        exists_in(&self.pool, "trails", Trail::KIND, key).await
    }

    async fn create(&self, trail: &mut Trail) -> bool {
        let result = sqlx::query_scalar::<_, i32>(
            r#"INSERT INTO trails (name, distance, elevation, difficulty, national_park_id, date_created)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(&trail.name)
        .bind(trail.distance)
        .bind(trail.elevation)
        .bind(trail.difficulty)
        .bind(trail.national_park_id)
        .bind(trail.date_created)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => {
                trail.set_id(id);
                true
            }
            Err(e) => {
                // Also covers a national_park_id that does not reference a park.
                log_write_error("create", Trail::KIND, &e);
                false
            }
        }
    }

    async fn update(&self, trail: &Trail) -> bool {
        let result = sqlx::query(
            r#"UPDATE trails
               SET name = $2, distance = $3, elevation = $4, difficulty = $5, national_park_id = $6
               WHERE id = $1"#,
        )
        .bind(trail.id)
        .bind(&trail.name)
        .bind(trail.distance)
        .bind(trail.elevation)
        .bind(trail.difficulty)
        .bind(trail.national_park_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                log_write_error("update", Trail::KIND, &e);
                false
            }
        }
    }

    async fn delete(&self, trail: &Trail) -> bool {
        delete_from(&self.pool, "trails", Trail::KIND, trail.id).await
    }
}

#[async_trait]
impl TrailRepository for PostgresTrailRepository {
    async fn list_in_park(&self, national_park_id: i32) -> Vec<Trail> {
        let sql = format!("SELECT {TRAIL_COLUMNS} FROM trails WHERE national_park_id = $1 ORDER BY id");
        sqlx::query_as::<_, Trail>(&sql)
            .bind(national_park_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list trails in park error: {:?}", e);
                vec![]
            })
    }
}
