//! Shared test support: an in-memory [`NativeLoader`](crate::NativeLoader)
//! and leaked descriptor fixtures.
pub mod common;
