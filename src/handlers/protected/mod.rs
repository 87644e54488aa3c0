// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware → validate_user_middleware, which injects
// the `Viewer` (profile + cached roles) every handler here extracts.
pub mod billing;
pub mod bulletins;
pub mod expenses;
pub mod forms;
pub mod managers;
pub mod me;
pub mod metrics;
pub mod profiles;
pub mod realtime;
pub mod teams;
