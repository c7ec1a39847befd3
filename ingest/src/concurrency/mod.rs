//! Concurrency utilities for coordinating pipeline operations.
//!
//! This module provides the concurrency primitives used by the ingestion pipeline to
//! group rows into batches and to stop gracefully at batch boundaries.
//!
//! The [`shutdown`] module implements a broadcast-based shutdown pattern where a single
//! signal can stop every subscribed stage, and cleanup happens at the next safe boundary
//! rather than mid-batch. The [`stream`] module implements the batching stream adapter
//! that integrates that signal into stream processing.

pub mod shutdown;
pub mod stream;
