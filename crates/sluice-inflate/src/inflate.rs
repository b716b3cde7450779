//! One-shot DEFLATE decompression (inflate).
//!
//! Convenience wrappers around [`Inflater`] for callers holding the whole
//! compressed stream in memory. Bytes after the end of the stream are
//! ignored.

use sluice_core::{Error, Flush, InflateStats, Result, Status, StreamConfig};

use crate::inflater::Inflater;

/// Inflate (decompress) a raw DEFLATE stream, appending to `output`.
pub fn inflate(input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    inflate_with_config(input, output, &StreamConfig::default()).map(|_| ())
}

/// Inflate with an explicit configuration, appending to `output`.
///
/// On error `output` keeps only what it held before the call plus the
/// chunks completed before the failure.
pub fn inflate_with_config(
    input: &[u8],
    output: &mut Vec<u8>,
    config: &StreamConfig,
) -> Result<InflateStats> {
    let mut inflater = Inflater::with_config(config.clone())?;
    let chunk = config.output_chunk_size;
    let mut pos = 0;

    loop {
        let start = output.len();
        output.resize(start + chunk, 0);
        let progress = match inflater.inflate(&input[pos..], &mut output[start..], Flush::Finish) {
            Ok(progress) => progress,
            Err(err) => {
                output.truncate(start);
                return Err(err);
            }
        };
        output.truncate(start + progress.produced);
        pos += progress.consumed;

        match progress.status {
            Status::StreamEnd => break,
            Status::Ok | Status::NeedMoreOutput => continue,
            Status::NeedMoreInput | Status::BufferError => {
                return Err(Error::unexpected_eof(inflater.total_in()))
            }
        }
    }

    Ok(inflater.stats().clone())
}

/// Inflate into a caller-provided buffer. Returns the number of bytes
/// written.
///
/// If the stream does not fit, the rest is decoded to find the size and
/// [`Error::BufferTooSmall`] reports it.
pub fn inflate_to(input: &[u8], output: &mut [u8]) -> Result<usize> {
    inflate_to_with_config(input, output, &StreamConfig::default())
}

/// Inflate into a caller-provided buffer with an explicit configuration.
pub fn inflate_to_with_config(
    input: &[u8],
    output: &mut [u8],
    config: &StreamConfig,
) -> Result<usize> {
    let mut inflater = Inflater::with_config(config.clone())?;
    let progress = inflater.inflate(input, output, Flush::Finish)?;
    if progress.status == Status::StreamEnd {
        return Ok(progress.produced);
    }

    let mut scratch = vec![0u8; config.output_chunk_size];
    let mut pos = progress.consumed;
    loop {
        let progress = inflater.inflate(&input[pos..], &mut scratch, Flush::Finish)?;
        pos += progress.consumed;
        match progress.status {
            Status::StreamEnd => break,
            Status::Ok | Status::NeedMoreOutput => continue,
            Status::NeedMoreInput | Status::BufferError => {
                return Err(Error::unexpected_eof(inflater.total_in()))
            }
        }
    }

    Err(Error::buffer_too_small(
        inflater.total_out() as usize,
        output.len(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn reference_deflate(input: &[u8], level: u32) -> Vec<u8> {
        let mut c = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(level));
        c.write_all(input).unwrap();
        c.finish().unwrap()
    }

    #[test]
    fn test_inflate_stored() {
        // Stored block: BFINAL=1, BTYPE=00, LEN=5, NLEN=~5, "Hello"
        let data = [
            0b00000001, // BFINAL=1, BTYPE=00
            5, 0,       // LEN = 5
            250, 255,   // NLEN = !5
            b'H', b'e', b'l', b'l', b'o',
        ];

        let mut output = Vec::new();
        inflate(&data, &mut output).unwrap();
        assert_eq!(&output, b"Hello");
    }

    #[test]
    fn test_inflate_fixed_literal() {
        let compressed = reference_deflate(b"A", 6);
        let mut output = Vec::new();
        inflate(&compressed, &mut output).unwrap();
        assert_eq!(&output, b"A");
    }

    #[test]
    fn test_inflate_repetitive() {
        let input = b"AAAAAAAAAAAAAAAAAAAA"; // 20 A's
        let compressed = reference_deflate(input, 6);
        let mut output = Vec::new();
        inflate(&compressed, &mut output).unwrap();
        assert_eq!(&output, input);
    }

    #[test]
    fn test_inflate_mixed() {
        let input = b"Hello, World! This is a test of DEFLATE compression.";
        let compressed = reference_deflate(input, 6);
        let mut output = Vec::new();
        inflate(&compressed, &mut output).unwrap();
        assert_eq!(&output, input);
    }

    #[test]
    fn test_inflate_appends() {
        let compressed = reference_deflate(b"world", 6);
        let mut output = b"hello ".to_vec();
        inflate(&compressed, &mut output).unwrap();
        assert_eq!(&output, b"hello world");
    }

    #[test]
    fn test_small_chunks_and_stats() {
        let input: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let compressed = reference_deflate(&input, 9);
        let config = StreamConfig {
            output_chunk_size: 100,
            ..Default::default()
        };
        let mut output = Vec::new();
        let stats = inflate_with_config(&compressed, &mut output, &config).unwrap();
        assert_eq!(output, input);
        assert_eq!(stats.output_bytes, input.len() as u64);
        assert_eq!(stats.input_bytes, compressed.len() as u64);
        assert!(stats.blocks() >= 1);
    }

    #[test]
    fn test_inflate_to_exact_and_too_small() {
        let input = vec![b'z'; 1000];
        let compressed = reference_deflate(&input, 6);

        let mut exact = vec![0u8; 1000];
        assert_eq!(inflate_to(&compressed, &mut exact).unwrap(), 1000);
        assert_eq!(exact, input);

        let mut small = vec![0u8; 10];
        match inflate_to(&compressed, &mut small) {
            Err(Error::BufferTooSmall { required, provided }) => {
                assert_eq!(required, 1000);
                assert_eq!(provided, 10);
            }
            other => panic!("expected BufferTooSmall, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_stream() {
        let compressed = reference_deflate(b"truncated stream test data", 6);
        let mut output = Vec::new();
        let err = inflate(&compressed[..compressed.len() - 2], &mut output).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut compressed = reference_deflate(b"payload", 6);
        compressed.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let mut output = Vec::new();
        inflate(&compressed, &mut output).unwrap();
        assert_eq!(&output, b"payload");
    }
}
