//! Core types and trait definitions for the Setpoint settings keeper.
//!
//! This crate is deliberately free of database, HTTP, and runtime
//! dependencies. It describes the settings snapshot, the dosing-engine
//! projection of it, and the narrow interfaces of every external
//! collaborator the settings manager talks to.

pub mod device;
pub mod error;
pub mod legacy;
pub mod overrides;
pub mod permissions;
pub mod providers;
pub mod schedule;
pub mod settings;
pub mod store;
pub mod units;

pub use error::{Error, Result};
