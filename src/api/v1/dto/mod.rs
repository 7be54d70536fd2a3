pub mod session;
pub mod users;
