// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Functions (bearer passthrough) → Protected (JWT + profile)
// → Elevated (system_admin)
pub mod elevated;
pub mod functions;
pub mod protected;
pub mod public;
