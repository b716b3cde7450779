//! # Sluice Core
//!
//! Core traits, types, and streaming vocabulary for the sluice DEFLATE
//! decoder.
//!
//! ## Design Philosophy
//!
//! - **Resumable**: every call returns exact byte accounting and can be
//!   continued with more input or output space
//! - **Explicit status**: suspension is a [`Status`], malformed data is an
//!   [`Error`]
//! - **Configurable**: window size and decode strategy come from a
//!   serializable [`StreamConfig`]
//!
//! ## Core Traits
//!
//! - [`Decompressor`] - One-shot decompression operations
//! - [`StreamingDecompressor`] - Incremental decompression
//! - [`DictionaryDecompressor`] - Decompression with preset history
//!
//! ## Example
//!
//! ```ignore
//! use sluice_core::{Flush, Status, StreamingDecompressor};
//! use sluice_inflate::Inflater;
//!
//! let mut inflater = Inflater::new();
//! let progress = inflater.decompress_chunk(&compressed, &mut out, Flush::None)?;
//! assert_eq!(progress.status, Status::StreamEnd);
//! ```

pub mod error;
pub mod stats;
pub mod stream;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use stats::InflateStats;
pub use stream::{Flush, Progress, Status, StreamConfig, StreamState};
pub use traits::{Decompressor, DictionaryDecompressor, StreamingDecompressor};
pub use types::WindowSize;
