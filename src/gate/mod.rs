//! Access control for the admin area.
//!
//! Two independent gates enforce "no protected content without a live session":
//! the edge gate intercepts HTTP requests before any page is produced, and the
//! render gate withholds a rendered subtree until a session check confirms access.
//! Both consume the same `ProtectedRoutes` predicate and the same identity service.

pub mod edge;
pub mod render;
pub mod route;

pub use edge::{AccessGate, edge_gate};
pub use render::{GatePhase, GateView, Navigator, RenderGate};
pub use route::ProtectedRoutes;
