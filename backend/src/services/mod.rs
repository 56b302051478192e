pub mod attendance_cache;
pub mod geo;
pub mod notifier;
pub mod status;
