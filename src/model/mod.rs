pub mod attendance;
pub mod directory;
pub mod role;
