/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The gzip framing, RFC 1952.
//!
//! A member is a fixed ten byte header, optional extra/name/comment/
//! header-crc fields, the raw deflate stream, then a CRC-32 and the
//! uncompressed length modulo 2^32, both little endian. Files may hold
//! any number of members back to back.

use bitflags::bitflags;

use crate::crc32::{crc32, CRC_INIT};

/// gzip magic plus the deflate compression method byte.
pub(crate) const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];

/// OS code for "unknown", the neutral default.
pub(crate) const GZIP_OS_UNKNOWN: u8 = 255;

bitflags! {
    /// The FLG byte of a member header.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub(crate) struct GzipFlags: u8
    {
        const TEXT    = 0b0000_0001;
        const HCRC    = 0b0000_0010;
        const EXTRA   = 0b0000_0100;
        const NAME    = 0b0000_1000;
        const COMMENT = 0b0001_0000;
    }
}

/// Metadata carried by a gzip member header.
///
/// The decoder fills one of these in as it parses; the encoder accepts
/// one in its options and writes the corresponding fields.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GzipHeader
{
    /// Modification time, seconds since the epoch, zero when unknown.
    pub mtime:   u32,
    /// Operating system the stream was produced on, 255 when unknown.
    pub os:      u8,
    /// The extra field, without its length prefix.
    pub extra:   Option<Vec<u8>>,
    /// Original file name, without the terminating NUL.
    pub name:    Option<Vec<u8>>,
    /// Comment, without the terminating NUL.
    pub comment: Option<Vec<u8>>,
    /// Whether the header carries (or should carry) a CRC16 of itself.
    pub hcrc:    bool,
    /// Hint that the data is probably text.
    pub text:    bool,
}

impl Default for GzipHeader
{
    fn default() -> GzipHeader
    {
        GzipHeader {
            mtime:   0,
            os:      GZIP_OS_UNKNOWN,
            extra:   None,
            name:    None,
            comment: None,
            hcrc:    false,
            text:    false,
        }
    }
}

impl GzipHeader
{
    /// Serialize the header, `xfl` being the compression level hint the
    /// encoder wants advertised (2 = slowest, 4 = fastest, 0 otherwise).
    pub(crate) fn write(&self, pending: &mut Vec<u8>, xfl: u8)
    {
        let start = pending.len();

        let mut flags = GzipFlags::empty();

        flags.set(GzipFlags::TEXT, self.text);
        flags.set(GzipFlags::HCRC, self.hcrc);
        flags.set(GzipFlags::EXTRA, self.extra.is_some());
        flags.set(GzipFlags::NAME, self.name.is_some());
        flags.set(GzipFlags::COMMENT, self.comment.is_some());

        pending.extend_from_slice(&GZIP_MAGIC);
        pending.push(flags.bits());
        pending.extend_from_slice(&self.mtime.to_le_bytes());
        pending.push(xfl);
        pending.push(self.os);

        if let Some(extra) = &self.extra
        {
            pending.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            pending.extend_from_slice(extra);
        }
        if let Some(name) = &self.name
        {
            pending.extend_from_slice(name);
            pending.push(0);
        }
        if let Some(comment) = &self.comment
        {
            pending.extend_from_slice(comment);
            pending.push(0);
        }
        if self.hcrc
        {
            let crc = crc32(CRC_INIT, &pending[start..]);

            pending.extend_from_slice(&((crc & 0xFFFF) as u16).to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn bare_header_is_ten_bytes()
    {
        let mut out = vec![];

        GzipHeader::default().write(&mut out, 0);

        assert_eq!(out.len(), 10);
        assert_eq!(&out[..4], &[0x1F, 0x8B, 0x08, 0x00]);
        assert_eq!(out[9], GZIP_OS_UNKNOWN);
    }

    #[test]
    fn optional_fields_in_order()
    {
        let header = GzipHeader {
            extra: Some(vec![1, 2, 3]),
            name: Some(b"file.txt".to_vec()),
            comment: Some(b"hello".to_vec()),
            hcrc: true,
            ..GzipHeader::default()
        };

        let mut out = vec![];
        header.write(&mut out, 2);

        assert_eq!(out[3], 0b0001_1110);
        // XLEN then payload
        assert_eq!(&out[10..12], &[3, 0]);
        assert_eq!(&out[12..15], &[1, 2, 3]);
        // NUL terminated name and comment
        assert_eq!(&out[15..24], b"file.txt\0");
        assert_eq!(&out[24..30], b"hello\0");
        // two CRC16 bytes close the header
        assert_eq!(out.len(), 32);

        let expected = crc32(CRC_INIT, &out[..30]) & 0xFFFF;
        assert_eq!(u16::from_le_bytes([out[30], out[31]]), expected as u16);
    }
}
