//! Fluent connect builder
//!
//! `core` holds the builder state and option methods, `methods` the
//! terminal operations that run the connect.

pub mod core;
pub mod methods;

pub use core::ConnectBuilder;
