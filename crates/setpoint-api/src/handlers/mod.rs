//! Request handlers, grouped by resource.

pub mod app;
pub mod settings;
