pub mod attendance;
pub mod branch;
pub mod holiday;
pub mod leave_request;
pub mod user;

pub use attendance::{AttendanceRepository, AttendanceRepositoryTrait};
pub use branch::BranchRepository;
pub use holiday::HolidayRepository;
pub use leave_request::LeaveRequestRepository;
pub use user::UserRepository;
