//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements the I/O boundary traits and store sinks, and wires up services.

pub mod di;
pub mod error;
pub mod sink;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use sink::{FileSink, MemorySink};
