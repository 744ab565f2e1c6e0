//! Worker module for consuming and processing genome tasks
//!
//! This module provides:
//! - TaskRunner: Main consumer loop (connect, consume, dispatch, ack)
//! - Dispatcher: Routes each task to its handler
//! - WorkerConfig: Configuration for the worker

pub mod config;
pub mod dispatcher;
pub mod task_runner;

pub use config::{WorkerConfig, WorkerConfigBuilder, PREFETCH_COUNT};
pub use dispatcher::Dispatcher;
pub use task_runner::{setup_signal_handler, TaskRunner};
