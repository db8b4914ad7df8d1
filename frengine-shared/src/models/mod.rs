/// Database models for Frengine
///
/// Plain row types shared by both storage backends. Persistence lives in
/// [`crate::store`]; these types carry no queries of their own.
///
/// # Models
///
/// - `account`: Registered users and their password hashes
/// - `project`: Owned, soft-deletable projects
/// - `revision`: Append-only content snapshots of a project

pub mod account;
pub mod project;
pub mod revision;
