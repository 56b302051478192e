pub mod admin;
pub mod attendance;
pub mod branches;
pub mod holidays;
