// Library surface for headless/integration tests and the binary.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod exercise;
pub mod logging;
pub mod presenter;
pub mod provider;
pub mod runtime;
pub mod selector;
pub mod session;
pub mod session_log;
pub mod stats;
pub mod summary;
pub mod timer;
pub mod ui;
pub mod worker;
