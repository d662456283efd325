//! Invoice synchronization: ports, pipeline and dispatch.

pub mod dispatch;
pub mod pipeline;
pub mod ports;
