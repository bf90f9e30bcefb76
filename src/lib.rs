pub mod access;
pub mod accounts;
pub mod attendance;
pub mod auth;
pub mod core;
pub mod handlers;
pub mod models;
pub mod store;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;
