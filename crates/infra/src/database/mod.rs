//! Database implementations

pub mod manager;
pub mod retry_queue;
pub mod workout_backend;

pub use manager::*;
pub use retry_queue::*;
pub use workout_backend::*;
