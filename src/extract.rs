use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// ApiJson
///
/// `axum::Json` whose rejection (malformed body, wrong content type, missing field)
/// is reported as a 400 `ApiError` with the usual `{"message"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// ApiPath
///
/// `axum::extract::Path` with the same rejection shape as `ApiJson`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
