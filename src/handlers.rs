use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    models::{
        Credentials, NationalPark, Trail, TrailCreateRequest, TrailUpdateRequest, User,
    },
    repository::{CatalogRepository, CatalogResource, Lookup},
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

const PARKS_PATH: &str = "/api/nationalparks";
const TRAILS_PATH: &str = "/api/trails";

// --- Shared Resource Flows ---
//
// Parks and trails run the same precondition/write sequences against their repository.
// `exists(name)` and `create` are two separate store round-trips.

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    Ok(())
}

async fn fetch_resource<R, Repo>(repo: &Repo, id: i32) -> Result<R, ApiError>
where
    R: CatalogResource,
    Repo: CatalogRepository<R> + ?Sized,
{
    repo.get_by_id(id).await.ok_or(ApiError::NotFound(R::KIND))
}

/// 409 when the name is taken, 500 when the write does not commit, otherwise
/// 201 with a `Location` header for the store-assigned id.
async fn create_resource<R, Repo>(repo: &Repo, mut resource: R, base_path: &str) -> Result<Response, ApiError>
where
    R: CatalogResource + Serialize,
    Repo: CatalogRepository<R> + ?Sized,
{
    require_name(resource.name())?;

    if repo.exists(Lookup::Name(resource.name())).await {
        return Err(ApiError::Conflict(R::KIND));
    }

    if !repo.create(&mut resource).await {
        return Err(ApiError::Persistence(format!(
            "saving the record {}",
            resource.name()
        )));
    }

    tracing::info!(id = resource.id(), "{} created", R::KIND);
    let location = format!("{}/{}", base_path, resource.id());
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(resource)).into_response())
}

/// 400 on a path/body id mismatch, 404 for an unknown id, 500 when the write fails.
async fn update_resource<R, Repo>(repo: &Repo, path_id: i32, resource: R) -> Result<StatusCode, ApiError>
where
    R: CatalogResource,
    Repo: CatalogRepository<R> + ?Sized,
{
    if resource.id() != path_id {
        return Err(ApiError::BadRequest("id in body does not match path".to_string()));
    }
    require_name(resource.name())?;

    if !repo.exists(Lookup::Id(path_id)).await {
        return Err(ApiError::NotFound(R::KIND));
    }

    if !repo.update(&resource).await {
        return Err(ApiError::Persistence(format!(
            "updating the record {}",
            resource.name()
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Unknown ids are rejected before any write reaches the store.
async fn delete_resource<R, Repo>(repo: &Repo, id: i32) -> Result<StatusCode, ApiError>
where
    R: CatalogResource,
    Repo: CatalogRepository<R> + ?Sized,
{
    if !repo.exists(Lookup::Id(id)).await {
        return Err(ApiError::NotFound(R::KIND));
    }

    let resource = fetch_resource::<R, Repo>(repo, id).await?;

    if !repo.delete(&resource).await {
        return Err(ApiError::Persistence(format!(
            "deleting the record {}",
            resource.name()
        )));
    }

    tracing::info!(id, "{} deleted", R::KIND);
    Ok(StatusCode::NO_CONTENT)
}

// --- Users ---

fn require_credentials(payload: &Credentials) -> Result<(), ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".to_string(),
        ));
    }
    Ok(())
}

/// authenticate
///
/// [Public Route] Exchanges credentials for the identity plus a signed token.
/// Wrong password and unknown user produce the same 400 body.
pub async fn authenticate(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<Json<User>, ApiError> {
    require_credentials(&payload)?;
    let user = state
        .accounts
        .authenticate(&payload.username, &payload.password)
        .await?;
    Ok(Json(user))
}

/// register
///
/// [Public Route] Creates an account. No token is issued; clients authenticate next.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<StatusCode, ApiError> {
    require_credentials(&payload)?;

    if !state.accounts.is_unique_username(&payload.username).await {
        return Err(ApiError::DuplicateUsername);
    }

    state
        .accounts
        .register(&payload.username, &payload.password)
        .await?;

    Ok(StatusCode::OK)
}

// --- National Parks ---

/// [Public Route] Lists every national park.
pub async fn get_national_parks(State(state): State<AppState>) -> Json<Vec<NationalPark>> {
    Json(state.parks.list().await)
}

/// get_national_park
///
/// [Authenticated Route] Any valid token may read a single park.
pub async fn get_national_park(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<NationalPark>, ApiError> {
    let park = fetch_resource(state.parks.as_ref(), id).await?;
    Ok(Json(park))
}

/// [Admin Route]
pub async fn create_national_park(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NationalPark>,
) -> Result<Response, ApiError> {
    if payload.state.trim().is_empty() {
        return Err(ApiError::BadRequest("state is required".to_string()));
    }
    create_resource(state.parks.as_ref(), payload, PARKS_PATH).await
}

/// [Admin Route]
pub async fn update_national_park(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<NationalPark>,
) -> Result<StatusCode, ApiError> {
    update_resource(state.parks.as_ref(), id, payload).await
}

/// [Admin Route] Fails with 500 while trails still reference the park.
pub async fn delete_national_park(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    delete_resource::<NationalPark, _>(state.parks.as_ref(), id).await
}

// --- Trails ---

/// [Public Route] Lists every trail.
pub async fn get_trails(State(state): State<AppState>) -> Json<Vec<Trail>> {
    Json(state.trails.list().await)
}

/// [Public Route] Lists the trails of one park; an unknown park yields an empty list.
pub async fn get_trails_in_national_park(
    State(state): State<AppState>,
    ApiPath(national_park_id): ApiPath<i32>,
) -> Json<Vec<Trail>> {
    Json(state.trails.list_in_park(national_park_id).await)
}

/// get_trail
///
/// [Admin Route] Reading a single trail is restricted by role; the admin gate answers
/// 403 for any other role before this runs.
pub async fn get_trail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Trail>, ApiError> {
    let trail = fetch_resource(state.trails.as_ref(), id).await?;
    Ok(Json(trail))
}

/// [Admin Route]
pub async fn create_trail(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TrailCreateRequest>,
) -> Result<Response, ApiError> {
    create_resource(state.trails.as_ref(), Trail::from(payload), TRAILS_PATH).await
}

/// [Admin Route]
pub async fn update_trail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<TrailUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    update_resource(state.trails.as_ref(), id, Trail::from(payload)).await
}

/// [Admin Route]
pub async fn delete_trail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    delete_resource::<Trail, _>(state.trails.as_ref(), id).await
}
