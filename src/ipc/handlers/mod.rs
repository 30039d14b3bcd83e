pub mod absence;
pub mod core;
pub mod history;
pub mod roster;
pub mod session;
pub mod students;
