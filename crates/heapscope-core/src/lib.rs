//! # heapscope-core - Core Domain Types
//!
//! Foundation crate for heapscope. Provides the heap domain types returned by
//! the instrumentation agent, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Heap Types (`heap`)
//! - [`HeapObjectSummary`] - A live instance found by a class search
//! - [`IvarDump`], [`IvarValue`] - Instance-variable snapshot of one object
//! - [`MethodList`], [`MethodSignature`] - Methods of an object's class
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use heapscope_core::prelude::*;
//! ```

pub mod error;
pub mod heap;
pub mod logging;

/// Prelude for common imports used throughout all heapscope crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use heap::{
    takes_arguments, HeapObjectSummary, IvarDump, IvarValue, MethodList, MethodSignature,
};
