//! Bit-exact format checks and malformed-stream handling, with a tiny
//! LSB-first bit packer to hand craft deflate streams.

use zune_deflate::errors::DecodeErrorStatus;
use zune_deflate::{DeflateDecoder, DeflateEncoder, DeflateOptions};

/// Pack bits the way deflate stores them: LSB first within each byte.
struct BitSink
{
    bytes: Vec<u8>,
    acc:   u64,
    n:     u8,
}

impl BitSink
{
    fn new() -> BitSink
    {
        BitSink {
            bytes: Vec::new(),
            acc:   0,
            n:     0,
        }
    }

    fn push(&mut self, value: u64, width: u8)
    {
        self.acc |= value << self.n;
        self.n += width;

        while self.n >= 8
        {
            self.bytes.push(self.acc as u8);
            self.acc >>= 8;
            self.n -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8>
    {
        if self.n > 0
        {
            self.bytes.push(self.acc as u8);
        }
        self.bytes
    }
}

fn error_text(data: &[u8]) -> String
{
    let err = DeflateDecoder::new(data).decode_deflate().unwrap_err();

    format!("{:?}", err)
}

#[test]
fn empty_zlib_stream_is_the_canonical_eight_bytes()
{
    let out = DeflateEncoder::new(b"").encode_zlib().unwrap();

    assert_eq!(out, [0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01]);

    let decoded = DeflateDecoder::new(&out).decode_zlib().unwrap();

    assert!(decoded.is_empty());
}

#[test]
fn zlib_header_validation()
{
    // FCHECK broken: 78 9D is not a multiple of 31
    let err = DeflateDecoder::new(&[0x78, 0x9D, 0, 0, 0, 0, 0, 0])
        .decode_zlib()
        .unwrap_err();

    assert!(format!("{:?}", err).contains("FCHECK"));

    // compression method 7 is not deflate
    let err = DeflateDecoder::new(&[0x77, 0x01, 0, 0, 0, 0, 0, 0])
        .decode_zlib()
        .unwrap_err();

    assert!(format!("{:?}", err).contains("compression method"));
}

#[test]
fn reserved_block_type_is_rejected()
{
    // BFINAL=0, BTYPE=11
    let mut sink = BitSink::new();

    sink.push(0, 1);
    sink.push(3, 2);

    let text = error_text(&sink.finish());

    assert!(text.contains("invalid block type"), "{text}");
}

#[test]
fn stored_block_length_mismatch()
{
    let mut data = vec![0x00_u8]; // BFINAL=0, stored

    data.extend_from_slice(&[0x01, 0x00, 0xFF, 0xFF]); // LEN=1, NLEN=!0

    let text = error_text(&data);

    assert!(text.contains("invalid stored block lengths"), "{text}");
}

#[test]
fn dynamic_header_with_too_many_symbols()
{
    let mut sink = BitSink::new();

    sink.push(1, 1); // last
    sink.push(2, 2); // dynamic
    sink.push(30, 5); // nlen = 257 + 30 = 287, over the limit
    sink.push(0, 5);
    sink.push(0, 4);

    let text = error_text(&sink.finish());

    assert!(text.contains("too many length or distance symbols"), "{text}");
}

#[test]
fn repeat_before_any_length_is_rejected()
{
    let mut sink = BitSink::new();

    sink.push(1, 1); // last
    sink.push(2, 2); // dynamic
    sink.push(0, 5); // nlen = 257
    sink.push(0, 5); // ndist = 1
    sink.push(0, 4); // ncode = 4: lengths for precode symbols 16,17,18,0

    // symbol 16 and symbol 0 get one-bit codewords
    sink.push(1, 3);
    sink.push(0, 3);
    sink.push(0, 3);
    sink.push(1, 3);

    // first main symbol: codeword 1 = symbol 16, "repeat previous",
    // with nothing before it
    sink.push(1, 1);
    sink.push(0, 2);

    let text = error_text(&sink.finish());

    assert!(text.contains("invalid bit length repeat"), "{text}");
}

#[test]
fn missing_end_of_block_length_is_rejected()
{
    let mut sink = BitSink::new();

    sink.push(1, 1); // last
    sink.push(2, 2); // dynamic
    sink.push(0, 5); // nlen = 257
    sink.push(0, 5); // ndist = 1
    sink.push(0, 4); // ncode = 4

    // symbol 18 and symbol 0 get one-bit codewords
    sink.push(0, 3);
    sink.push(0, 3);
    sink.push(1, 3);
    sink.push(1, 3);

    // zero out all 258 lengths: 130 zeros then 128 zeros
    sink.push(1, 1);
    sink.push(119, 7);
    sink.push(1, 1);
    sink.push(117, 7);

    let text = error_text(&sink.finish());

    assert!(text.contains("missing end-of-block"), "{text}");
}

#[test]
fn oversubscribed_precode_is_rejected()
{
    let mut sink = BitSink::new();

    sink.push(1, 1);
    sink.push(2, 2);
    sink.push(0, 5);
    sink.push(0, 5);
    sink.push(0, 4);

    // four one-bit codewords cannot coexist
    for _ in 0..4
    {
        sink.push(1, 3);
    }

    let text = error_text(&sink.finish());

    assert!(text.contains("invalid code lengths set"), "{text}");
}

/// A static block holding literal 'a' then a length-3 match at distance
/// five, which reaches past the single byte of history.
fn too_far_stream() -> Vec<u8>
{
    let mut sink = BitSink::new();

    sink.push(1, 1); // last
    sink.push(1, 2); // static

    // literal 'a': codeword 0x30 + 97, 8 bits, sent bit-reversed
    sink.push(u64::from((0x30_u16 + 97).reverse_bits() >> 8), 8);
    // length symbol 257 (3 bytes): codeword 0000001, reversed
    sink.push(0b100_0000, 7);
    // distance symbol 4: base 5, one extra bit
    sink.push(u64::from((4_u16).reverse_bits() >> 11), 5);
    sink.push(0, 1);
    // end of block
    sink.push(0, 7);

    sink.finish()
}

#[test]
fn distance_past_history_is_rejected()
{
    let text = error_text(&too_far_stream());

    assert!(text.contains("invalid distance too far back"), "{text}");
}

#[test]
fn distance_past_history_reads_zeros_when_tolerated()
{
    let options = DeflateOptions::default().set_sane(false);
    let decoded = DeflateDecoder::new_with_options(&too_far_stream(), options)
        .decode_deflate()
        .unwrap();

    assert_eq!(decoded, [b'a', 0, 0, 0]);
}

#[test]
fn gzip_magic_is_checked()
{
    let mut compressed = DeflateEncoder::new(b"x").encode_gzip().unwrap();

    compressed[1] = 0x8C;

    // a decoder told to expect gzip rejects the magic outright
    let mut stream = zune_deflate::InflateStream::new_gzip();
    let mut out = [0_u8; 16];
    let err = stream
        .decompress(&compressed, &mut out, zune_deflate::InflateFlush::Finish)
        .unwrap_err();

    assert!(format!("{:?}", err).contains("incorrect header check"));
}

#[test]
fn corrupted_zlib_checksum_is_reported()
{
    let mut compressed = DeflateEncoder::new(b"checksummed payload").encode_zlib().unwrap();

    let n = compressed.len();

    compressed[n - 1] ^= 0x55;

    let err = DeflateDecoder::new(&compressed).decode_zlib().unwrap_err();

    assert!(
        matches!(err.error, DecodeErrorStatus::MismatchedAdler(_, _)),
        "{:?}",
        err
    );
    assert!(format!("{:?}", err).contains("incorrect data check"));

    // checksum confirmation can be waived
    let options = DeflateOptions::default().set_confirm_checksum(false);
    let decoded = DeflateDecoder::new_with_options(&compressed, options)
        .decode_zlib()
        .unwrap();

    assert_eq!(decoded, b"checksummed payload");
}

#[test]
fn corrupted_gzip_trailer_is_reported()
{
    let data = b"gzip trailer checks";
    let compressed = DeflateEncoder::new(data).encode_gzip().unwrap();
    let n = compressed.len();

    // flip a CRC byte
    let mut bad_crc = compressed.clone();

    bad_crc[n - 8] ^= 0x01;

    let err = DeflateDecoder::new(&bad_crc).decode_gzip().unwrap_err();

    assert!(
        matches!(err.error, DecodeErrorStatus::MismatchedCRC(_, _)),
        "{:?}",
        err
    );

    // flip an ISIZE byte
    let mut bad_len = compressed;

    bad_len[n - 1] ^= 0x01;

    let err = DeflateDecoder::new(&bad_len).decode_gzip().unwrap_err();

    assert!(format!("{:?}", err).contains("incorrect length check"));
}

#[test]
fn truncated_stream_reports_insufficient_data()
{
    let compressed = DeflateEncoder::new(&b"truncate me ".repeat(50)).encode_zlib().unwrap();

    let err = DeflateDecoder::new(&compressed[..compressed.len() / 2])
        .decode_zlib()
        .unwrap_err();

    assert!(matches!(err.error, DecodeErrorStatus::InsufficientData));
}

#[test]
fn output_limit_is_enforced()
{
    let data = vec![7_u8; 100_000];
    let compressed = DeflateEncoder::new(&data).encode_zlib().unwrap();

    let options = DeflateOptions::default().set_limit(1000);
    let err = DeflateDecoder::new_with_options(&compressed, options)
        .decode_zlib()
        .unwrap_err();

    assert!(matches!(
        err.error,
        DecodeErrorStatus::OutputLimitExceeded(_, _)
    ));
}
