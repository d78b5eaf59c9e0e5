/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Callback driven decompression for one-shot jobs.
//!
//! [`InflateBack`] decodes a bare deflate stream using a caller supplied
//! window as its output buffer: input arrives through a pull callback,
//! finished output leaves through a push callback in whole window
//! chunks. Useful for file to file decompression where neither side
//! needs random access to the other.

use crate::constants::DEFLATE_MAX_WINDOW_SIZE;
use crate::decoder::{DeflateOptions, InflateStream, Wrap};
use crate::enums::{InflateFlush, StreamStatus};
use crate::errors::DecodeErrorStatus;

/// Source of compressed bytes.
pub trait BackInput
{
    /// Produce the next chunk of input.
    ///
    /// An empty slice means the input is exhausted; the chunk is
    /// borrowed only until the next call.
    fn fill(&mut self) -> &[u8];
}

/// Sink for decompressed bytes.
pub trait BackOutput
{
    /// Receive a run of decompressed bytes.
    ///
    /// Returning false aborts decompression.
    fn write(&mut self, data: &[u8]) -> bool;
}

/// A raw deflate decoder that writes into a borrowed window.
///
/// The window length must be a power of two between 256 and 32768 and
/// at least as large as the window the stream was compressed with.
pub struct InflateBack<'w>
{
    window: &'w mut [u8],
}

impl<'w> InflateBack<'w>
{
    pub fn new(window: &'w mut [u8]) -> Result<InflateBack<'w>, DecodeErrorStatus>
    {
        let len = window.len();

        if !(256..=DEFLATE_MAX_WINDOW_SIZE).contains(&len) || !len.is_power_of_two()
        {
            return Err(DecodeErrorStatus::Generic(
                "window must be a power of two between 256 and 32768",
            ));
        }
        Ok(InflateBack { window })
    }

    /// Decode one complete raw deflate stream.
    ///
    /// Runs until the final block is done, the input callback runs dry
    /// ([`DecodeErrorStatus::InsufficientData`]) or the output callback
    /// refuses data.
    pub fn decompress<I, O>(&mut self, input: &mut I, output: &mut O)
        -> Result<(), DecodeErrorStatus>
    where
        I: BackInput,
        O: BackOutput,
    {
        let window_bits = self.window.len().trailing_zeros() as usize;

        let mut stream = InflateStream::new_internal(
            Wrap::Raw,
            DeflateOptions::default().set_window_bits(window_bits),
        )?;

        let wsize = self.window.len();
        let mut wpos = 0_usize;

        'chunks: loop
        {
            let chunk = input.fill();
            let eof = chunk.is_empty();
            let mut in_pos = 0_usize;

            loop
            {
                let result = stream.decompress(
                    &chunk[in_pos..],
                    &mut self.window[wpos..],
                    InflateFlush::Finish,
                )?;

                in_pos += result.read;
                wpos += result.written;

                match result.status
                {
                    StreamStatus::StreamEnd =>
                    {
                        if wpos > 0 && !output.write(&self.window[..wpos])
                        {
                            return Err(DecodeErrorStatus::Generic(
                                "output callback refused data",
                            ));
                        }
                        return Ok(());
                    }
                    StreamStatus::NeedDict(adler) =>
                    {
                        return Err(DecodeErrorStatus::NeedsDictionary(adler));
                    }
                    StreamStatus::Ok | StreamStatus::BufError =>
                    {
                        if wpos == wsize
                        {
                            // window full, push it out and start over
                            if !output.write(&self.window[..])
                            {
                                return Err(DecodeErrorStatus::Generic(
                                    "output callback refused data",
                                ));
                            }
                            wpos = 0;
                            continue;
                        }
                        if in_pos == chunk.len()
                        {
                            if eof
                            {
                                return Err(DecodeErrorStatus::InsufficientData);
                            }
                            continue 'chunks;
                        }
                        if result.read == 0 && result.written == 0
                        {
                            // neither side moved, the stream is stuck
                            return Err(DecodeErrorStatus::CorruptData);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::io::Write;

    use super::*;

    struct SliceInput<'a>
    {
        chunks: std::vec::IntoIter<&'a [u8]>,
    }

    impl<'a> BackInput for SliceInput<'a>
    {
        fn fill(&mut self) -> &[u8]
        {
            self.chunks.next().unwrap_or(&[])
        }
    }

    struct VecOutput
    {
        data: Vec<u8>,
    }

    impl BackOutput for VecOutput
    {
        fn write(&mut self, data: &[u8]) -> bool
        {
            self.data.extend_from_slice(data);
            true
        }
    }

    /// Accepts a fixed number of pushes, then refuses.
    struct RefusingOutput
    {
        data:   Vec<u8>,
        accept: usize,
    }

    impl BackOutput for RefusingOutput
    {
        fn write(&mut self, data: &[u8]) -> bool
        {
            if self.accept == 0
            {
                return false;
            }
            self.accept -= 1;
            self.data.extend_from_slice(data);
            true
        }
    }

    fn raw_deflate(data: &[u8]) -> Vec<u8>
    {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(6));

        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn round_trip_through_callbacks()
    {
        let data: Vec<u8> = (0..100_000_u32).map(|i| (i * 7 + i / 300) as u8).collect();
        let compressed = raw_deflate(&data);

        let mut window = vec![0_u8; 32768];
        let mut back = InflateBack::new(&mut window).unwrap();

        let chunks: Vec<&[u8]> = compressed.chunks(977).collect();
        let mut input = SliceInput {
            chunks: chunks.into_iter(),
        };
        let mut output = VecOutput { data: Vec::new() };

        back.decompress(&mut input, &mut output).unwrap();

        assert_eq!(output.data, data);
    }

    #[test]
    fn truncated_input_is_reported()
    {
        let compressed = raw_deflate(b"some data worth compressing, repeated a few times over");
        let truncated = &compressed[..compressed.len() - 5];

        let mut window = vec![0_u8; 4096];
        let mut back = InflateBack::new(&mut window).unwrap();

        let mut input = SliceInput {
            chunks: vec![truncated].into_iter(),
        };
        let mut output = VecOutput { data: Vec::new() };

        let err = back.decompress(&mut input, &mut output);

        assert!(matches!(err, Err(DecodeErrorStatus::InsufficientData)));
    }

    #[test]
    fn output_refusal_stops_decompression()
    {
        let data: Vec<u8> = (0..100_000_u32).map(|i| (i / 5) as u8).collect();
        let compressed = raw_deflate(&data);

        let mut window = vec![0_u8; 32768];
        let mut back = InflateBack::new(&mut window).unwrap();

        let mut input = SliceInput {
            chunks: vec![&compressed[..]].into_iter(),
        };
        // take two whole windows, refuse the third
        let mut output = RefusingOutput {
            data:   Vec::new(),
            accept: 2,
        };

        let err = back.decompress(&mut input, &mut output).unwrap_err();

        assert!(
            format!("{:?}", err).contains("output callback refused data"),
            "{err:?}"
        );
        assert_eq!(output.data.len(), 2 * 32768);
        assert_eq!(&output.data[..], &data[..2 * 32768]);

        // refusing the final, partial push is reported the same way
        let compressed = raw_deflate(b"short stream, one partial push");

        let mut window = vec![0_u8; 4096];
        let mut back = InflateBack::new(&mut window).unwrap();

        let mut input = SliceInput {
            chunks: vec![&compressed[..]].into_iter(),
        };
        let mut output = RefusingOutput {
            data:   Vec::new(),
            accept: 0,
        };

        let err = back.decompress(&mut input, &mut output).unwrap_err();

        assert!(
            format!("{:?}", err).contains("output callback refused data"),
            "{err:?}"
        );
        assert!(output.data.is_empty());
    }

    #[test]
    fn rejects_bad_window_sizes()
    {
        let mut window = vec![0_u8; 1000];
        assert!(InflateBack::new(&mut window).is_err());

        let mut window = vec![0_u8; 128];
        assert!(InflateBack::new(&mut window).is_err());
    }
}
