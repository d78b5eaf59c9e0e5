//! An incredibly spiffy deflate compressor and decompressor.
//!
//! This crate implements the deflate compressed data format together
//! with its two standard framings, zlib and gzip, in pure safe Rust,
//! both as one-shot buffer to buffer calls and as suspendable streams
//! over caller supplied buffers.
//!
//! # One-shot usage
//!
//! Decoding zlib data
//! ```no_run
//! use zune_deflate::DeflateDecoder;
//! let totally_valid_data = [0;23];
//! let mut decoder = DeflateDecoder::new(&totally_valid_data);
//!
//! let decompressed = decoder.decode_zlib();
//! ```
//!
//! Encoding zlib data
//! ```
//! use zune_deflate::DeflateEncoder;
//! let mut encoder = DeflateEncoder::new(b"Hello, world!");
//!
//! let compressed = encoder.encode_zlib().unwrap();
//! ```
//!
//! # Streaming usage
//!
//! ```
//! use zune_deflate::{DeflateStream, DeflateEncodingOptions, InflateStream};
//! use zune_deflate::{DeflateFlush, InflateFlush};
//!
//! let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();
//! let mut compressed = [0_u8; 256];
//! let result = enc
//!     .compress(b"chunk of data", &mut compressed, DeflateFlush::Finish)
//!     .unwrap();
//!
//! let mut dec = InflateStream::new();
//! let mut out = [0_u8; 64];
//! let decoded = dec
//!     .decompress(&compressed[..result.written], &mut out, InflateFlush::Finish)
//!     .unwrap();
//!
//! assert_eq!(&out[..decoded.written], b"chunk of data");
//! ```
//!
//! Decoding zlib data without confirming the adler32 checksum
//! ```no_run
//! use zune_deflate::DeflateDecoder;
//! use zune_deflate::DeflateOptions;
//! let totally_valid_data = [0;23];
//! let mut options = DeflateOptions::default()
//!                     .set_confirm_checksum(false);
//! let decoder = DeflateDecoder::new_with_options(&totally_valid_data, options);
//! ```
pub use crate::adler::{adler32, adler32_combine, ADLER_INIT};
pub use crate::crc32::{crc32, crc32_combine, Crc32Combine, CRC_INIT};
pub use crate::decoder::{DeflateDecoder, DeflateOptions, InflateStream};
pub use crate::encoder::{DeflateEncoder, DeflateEncodingOptions, DeflateStream};
pub use crate::enums::{
    DataType, DeflateFlush, DeflateStrategy, InflateFlush, StreamResult, StreamStatus,
};
#[cfg(feature = "gzip")]
pub use crate::gzip::GzipHeader;
pub use crate::inflate_back::{BackInput, BackOutput, InflateBack};

mod adler;
mod bitstream;
mod constants;
mod crc32;
mod decoder;
mod encoder;
mod enums;
pub mod errors;
mod gzip;
mod huffman;
mod inflate_back;
mod trees;
mod utils;
mod window;
