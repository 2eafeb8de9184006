//! Exports consumed by the mobile app through uniffi-generated bindings.

pub mod errors;
pub mod logging;
pub mod objects;
pub mod session;
