//! Logging for ingestion, drags and compute cascades.
//!
//! With the `tracing` feature the graph logs through `tracing`: `debug` for
//! structural changes, `trace` for every compute step and `warn` for rejected
//! computes or runaway cascades. Without it every macro compiles to nothing,
//! so call them as statements only.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, trace, warn};
