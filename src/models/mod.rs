pub mod account;
pub mod api;
pub mod attendance;
pub mod identity;
