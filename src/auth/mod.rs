pub mod password;
pub mod resolver;
pub mod session;
