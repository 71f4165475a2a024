//! Client data layer for the task API.

pub mod board;
pub mod task_client;

pub use board::{Notice, TaskBoard};
pub use task_client::{ClientError, TaskClient};
