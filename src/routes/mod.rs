/// Router Module Index
///
/// Routing is split by access tier so the authorization gate is applied at the router
/// layer, not remembered per handler.

/// Routes open to anonymous clients: health, account endpoints and catalog listings.
pub mod public;

/// Routes behind the authentication layer. Any valid token passes.
pub mod authenticated;

/// Routes behind the admin gate layer: the "Admin" role is required (403 otherwise).
pub mod admin;
