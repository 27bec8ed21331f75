//! Result types
//!
//! Key labels and the estimate returned to callers.

pub mod result;
