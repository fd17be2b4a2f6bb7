pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod task;
pub mod task_board;
pub mod ui;
