//! Per-job pipeline and the host handler

pub mod augment;
pub mod handler;

pub use handler::{Worker, handler};
