pub mod attendance;
pub mod office;
pub mod report;
