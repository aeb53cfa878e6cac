// FormRelay - relays form submissions to a workflow engine and renders the result
// License: Apache-2.0

pub mod config;
pub mod content;
pub mod error;
pub mod logger;
pub mod render;
pub mod upstream;
pub mod web;
pub mod workflow;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
