/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and identity echo
/// - `projects`: Project CRUD
/// - `revisions`: Latest revision read and append

pub mod auth;
pub mod health;
pub mod projects;
pub mod revisions;
