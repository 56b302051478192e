//! Data models shared across database access and API handlers.

pub mod attendance;
pub mod branch;
pub mod holiday;
pub mod leave_request;
pub mod user;
