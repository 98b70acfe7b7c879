pub mod roles;
pub mod setup;
