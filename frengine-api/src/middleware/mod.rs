/// Middleware for the API server
///
/// Identity resolution lives in `frengine_shared::auth::middleware`; this
/// module holds the response-side layers.

pub mod security;
