pub mod config;
pub mod roles;
pub mod team;
pub mod token;
