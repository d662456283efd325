//! Application-level helpers.

pub mod logging;
