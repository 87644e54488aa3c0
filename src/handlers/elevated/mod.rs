// handlers/elevated/mod.rs - Elevated handlers (system_admin required)
//
// Route Prefix: /api/admin/*
// Middleware: protected stack + require_roles(ADMIN_ROLES)
pub mod roles;
pub mod users;
