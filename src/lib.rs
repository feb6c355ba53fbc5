//! Real-time router access log dashboard
//!
//! Router log lines are piped in on stdin, parsed into structured entries,
//! and aggregated in a time-windowed store. A terminal dashboard polls the
//! store on a refresh interval and supports drill-down filtering by host
//! or client IP.

pub mod args;
pub mod config;
pub mod logging;
pub mod parser;
pub mod store;
pub mod tui;

pub use args::Args;
pub use config::{Config, load_config_with_fallback};
pub use parser::Entry;
pub use store::Store;
