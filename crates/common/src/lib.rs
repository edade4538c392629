//! Common runtime plumbing for node binaries.
//!
//! The validator daemon that embeds the checkpoint driver lives in a
//! separate deployment repo; it calls [`logging::init`] at startup
//! before constructing the driver. Nothing in the library crates logs
//! through anything but `tracing`, so they stay agnostic of the
//! subscriber set up here.

pub mod logging;
