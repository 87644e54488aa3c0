// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: none (/, /health, /routes/resolve)
pub mod routes;
pub mod system;

pub use routes::resolve_route;
pub use system::{health, root};
