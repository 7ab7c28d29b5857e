//! Create/edit/delete managers for the container host, image hubs and images.
//!
//! Each manager follows the same shape: list, build a table, validate a
//! form all-or-nothing, submit, and report which views need a refresh.
//! Destructive operations expose their confirmation text separately so the
//! caller can ask before submitting.

pub mod hosts;
pub mod hubs;
pub mod images;
