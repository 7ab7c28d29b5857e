//! Utilities shared by the XCS crates: configuration, secret redaction,
//! HTTP body parsing, date formatting and text rendering of view models.

pub mod config;
pub mod date_handling;
pub mod http;
pub mod path_processing;
pub mod render;
pub mod text_processing;

pub use config::{ConfigError, XcsConfig, default_config_path};
pub use date_handling::{DateWindow, format_timestamp_millis, now_millis};
pub use path_processing::{expand_tilde, xcs_config_dir};
pub use text_processing::{ellipsize_middle_if_sha_like, last_path_segment, redact_sensitive};
