//! HTTP handlers.

pub mod ask;
pub mod system;
