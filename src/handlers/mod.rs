pub mod admin;
pub mod attendance;
pub mod fallback;
pub mod health;
pub mod session;
