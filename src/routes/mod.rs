/// Router Module Index
///
/// Routing is split by who may reach a surface:
/// - `public`: read-only content API plus the sign-in endpoints.
/// - `admin`: the admin write API, each handler demanding an `AdminSession`.
/// - `shell`: server-rendered admin pages under the admin prefix, guarded by
///   the edge gate layered in `create_router` and by a per-page render gate.

/// Content API and auth endpoints, open to anonymous callers.
pub mod public;

/// Admin write API, nested under `/api/admin`.
pub mod admin;

/// Admin HTML pages.
pub mod shell;
