pub mod absence;
pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod ipc;
pub mod model;
pub mod roster;
pub mod session;
