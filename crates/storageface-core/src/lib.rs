pub mod config;
pub mod logging;

pub mod driver;
pub mod error;
pub mod hub;
pub mod job;
pub mod progress;
pub mod retry;
pub mod scan;
pub mod tasks;
pub mod tree;
pub mod uploader;
