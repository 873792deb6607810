//! CLI command implementations.

pub mod init;
pub mod input;
pub mod render;
pub mod room;
pub mod status;
