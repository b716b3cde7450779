//! Streaming DEFLATE decoder.
//!
//! [`Inflater`] owns everything one compressed stream needs: the block
//! machine, the bit accumulator, the sliding window and the running
//! Adler-32. Each call to [`Inflater::inflate`] takes whatever input and
//! output space the caller has and reports exactly how much of each it
//! used.
//!
//! ## Example
//!
//! ```
//! use sluice_core::{Flush, Status};
//! use sluice_inflate::Inflater;
//!
//! // A single stored block containing "Hello".
//! let compressed = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
//! let mut output = [0u8; 16];
//!
//! let mut inflater = Inflater::new();
//! let progress = inflater.inflate(&compressed, &mut output, Flush::None).unwrap();
//! assert_eq!(progress.status, Status::StreamEnd);
//! assert_eq!(&output[..progress.produced], b"Hello");
//! ```

use sluice_core::{
    DictionaryDecompressor, Error, Flush, InflateStats, Progress, Result, Status, StreamConfig,
    StreamState, StreamingDecompressor,
};
use tracing::debug;

use crate::adler32::{adler32, Adler32};
use crate::blocks::{BlockDecoder, BlockState, RunOptions, Signal, Sink};
use crate::context::{BitBuffer, DecodeContext};
use crate::window::SlidingWindow;

/// Resumable raw DEFLATE decoder.
#[derive(Debug)]
pub struct Inflater {
    config: StreamConfig,
    blocks: BlockDecoder,
    bits: BitBuffer,
    window: SlidingWindow,
    adler: Adler32,
    total_in: u64,
    total_out: u64,
    stats: InflateStats,
}

impl Inflater {
    /// Create a decoder with a 32 KB window.
    pub fn new() -> Self {
        Self::build(StreamConfig::default())
    }

    /// Create a decoder from a configuration.
    pub fn with_config(config: StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StreamConfig) -> Self {
        Self {
            window: SlidingWindow::new(config.window_size),
            config,
            blocks: BlockDecoder::new(),
            bits: BitBuffer::new(),
            adler: Adler32::new(),
            total_in: 0,
            total_out: 0,
            stats: InflateStats::new(),
        }
    }

    /// The configuration this decoder was built with.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Decode as much as `input` and `output` allow.
    ///
    /// Unconsumed input must be supplied again on the next call. Malformed
    /// data returns [`Error::CorruptedData`] and stops the stream for good;
    /// with [`Flush::Finish`], running out of input before the end returns
    /// [`Error::UnexpectedEof`] and the stream may still be continued.
    ///
    /// An error can arrive after this call has already written decoded
    /// bytes to the front of `output`. Those bytes are valid and are counted
    /// by [`total_out`](Self::total_out) (and [`total_in`](Self::total_in)
    /// for input), so the difference in totals across the call gives their
    /// number.
    pub fn inflate(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Progress> {
        let options = RunOptions {
            fast_path: self.config.fast_path,
            stop_at_block: flush == Flush::Block,
        };

        let mut ctx = DecodeContext::new(input, output, &mut self.bits);
        let mut sink = Sink {
            window: &mut self.window,
            adler: &mut self.adler,
            stats: &mut self.stats,
        };
        let result = self.blocks.run(&mut ctx, &mut sink, options);
        if matches!(result, Ok(Signal::NeedInput) | Ok(Signal::BlockEnd)) {
            sink.window.flush(&mut ctx, sink.adler);
        }
        let pending = sink.window.pending();
        let consumed = ctx.consumed();
        let produced = ctx.produced();

        self.total_in += consumed as u64;
        self.total_out += produced as u64;
        self.stats.input_bytes = self.total_in;
        self.stats.output_bytes = self.total_out;
        self.stats.checksum = self.adler.value();

        let status = match result? {
            Signal::StreamEnd => Status::StreamEnd,
            Signal::BlockEnd => Status::Ok,
            Signal::NeedOutput => Status::NeedMoreOutput,
            Signal::NeedInput if pending > 0 => Status::NeedMoreOutput,
            Signal::NeedInput => {
                if flush == Flush::Finish {
                    debug!(total_in = self.total_in, "input ended before end of stream");
                    return Err(Error::unexpected_eof(self.total_in));
                }
                Status::NeedMoreInput
            }
        };

        let status = if consumed == 0 && produced == 0 && status.is_suspended() {
            Status::BufferError
        } else {
            status
        };
        Ok(Progress::new(status, consumed, produced))
    }

    /// Seed the window with a preset dictionary.
    ///
    /// Only allowed before any input has been decoded. Returns the
    /// dictionary's Adler-32, the value a zlib header's DICTID carries.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<u32> {
        let state = self.state();
        if state != StreamState::Initial {
            return Err(Error::invalid_state(StreamState::Initial.name(), state.name()));
        }
        self.window.set_dictionary(dictionary);
        let id = adler32(1, dictionary);
        debug!(
            len = dictionary.len(),
            kept = self.window.history(),
            id,
            "preset dictionary installed"
        );
        Ok(id)
    }

    /// Check if the decoder sits at a block boundary.
    pub fn is_sync_point(&self) -> bool {
        self.blocks.is_sync_point()
    }

    /// Adler-32 of every byte emitted so far.
    pub fn checksum(&self) -> u32 {
        self.adler.value()
    }

    /// Compare the running checksum with the one carried by the container.
    pub fn verify_checksum(&self, expected: u32) -> Result<()> {
        let actual = self.checksum();
        if actual != expected {
            return Err(Error::checksum_mismatch(expected, actual));
        }
        Ok(())
    }

    /// Total input bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total output bytes produced.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Diagnostic message of the error that stopped the stream.
    pub fn message(&self) -> Option<&str> {
        self.blocks.message()
    }

    /// Coarse stream state.
    pub fn state(&self) -> StreamState {
        match self.blocks.state() {
            BlockState::Done => StreamState::Finished,
            BlockState::Error => StreamState::Error,
            BlockState::ReadingType if self.total_in == 0 && self.bits.count() == 0 => {
                StreamState::Initial
            }
            _ => StreamState::Active,
        }
    }

    /// Check if the stream has ended.
    pub fn is_finished(&self) -> bool {
        self.blocks.is_done()
    }

    /// Counters for this stream.
    pub fn stats(&self) -> &InflateStats {
        &self.stats
    }

    /// Start over with a new stream. The window allocation and
    /// configuration are kept.
    pub fn reset(&mut self) {
        self.blocks.reset();
        self.bits.clear();
        self.window.reset();
        self.adler.reset();
        self.total_in = 0;
        self.total_out = 0;
        self.stats = InflateStats::new();
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingDecompressor for Inflater {
    fn begin(&mut self) -> Result<()> {
        self.reset();
        Ok(())
    }

    fn decompress_chunk(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
    ) -> Result<Progress> {
        self.inflate(input, output, flush)
    }

    fn is_finished(&self) -> bool {
        Inflater::is_finished(self)
    }

    fn reset(&mut self) {
        Inflater::reset(self);
    }
}

impl DictionaryDecompressor for Inflater {
    fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<u32> {
        Inflater::set_dictionary(self, dictionary)
    }
}
