pub mod account;
pub mod attendance;
pub mod classes;
pub mod reports;
pub mod students;
pub mod teachers;
