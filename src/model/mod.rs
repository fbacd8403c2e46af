pub mod attendance;
pub mod operator;
pub mod student;
