pub mod absentee;
pub mod auto_checkout;
pub mod scheduler;
pub mod store;

pub use absentee::AbsenteeSummary;
pub use auto_checkout::AutoCheckoutSummary;
pub use scheduler::Scheduler;
pub use store::{AbsenteeStore, AutoCheckoutStore, PgJobStore};
