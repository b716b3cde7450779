//! # Sluice Inflate
//!
//! Streaming, resumable raw DEFLATE (RFC 1951) decompression with an
//! Adler-32 (RFC 1950) accumulator.
//!
//! The decoder never blocks and never needs the whole stream: hand it any
//! amount of input and output space and it reports exactly how much of each
//! it used. Container formats (zlib, gzip) frame this decoder and check the
//! trailing checksum against [`Inflater::checksum`].
//!
//! ## Layers
//!
//! - [`adler32`]: checksum of emitted bytes
//! - [`huffman`]: canonical Huffman decode tables, fixed tables shared
//! - [`window`]: circular history buffer with overlapping copies
//! - [`codes`]: literal/length/distance decoding, with a fast loop
//! - [`blocks`]: stored, fixed and dynamic block state machine
//! - [`Inflater`]: the streaming driver
//!
//! ## Example
//!
//! ```ignore
//! use sluice_core::{Decompressor, Flush, Status};
//! use sluice_inflate::{DeflateDecompressor, Inflater};
//!
//! // One shot
//! let data = DeflateDecompressor::new().decompress(&compressed)?;
//!
//! // Streaming
//! let mut inflater = Inflater::new();
//! let progress = inflater.inflate(&chunk, &mut buffer, Flush::None)?;
//! if progress.status == Status::StreamEnd {
//!     inflater.verify_checksum(expected_adler)?;
//! }
//! ```

pub mod adler32;
pub mod blocks;
pub mod codec;
pub mod codes;
pub mod context;
mod fast;
pub mod huffman;
pub mod inflate;
pub mod inflater;
pub mod window;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types
pub use adler32::{adler32, Adler32};
pub use codec::DeflateDecompressor;
pub use inflate::{inflate, inflate_to, inflate_to_with_config, inflate_with_config};
pub use inflater::Inflater;
pub use window::SlidingWindow;
