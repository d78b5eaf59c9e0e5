//! Streaming behaviours: flush markers, dictionaries, mid-stream
//! parameter changes, resets and multi-member gzip.

use zune_deflate::{
    adler32, DeflateDecoder, DeflateEncoder, DeflateEncodingOptions, DeflateFlush,
    DeflateStrategy, DeflateStream, GzipHeader, InflateFlush, InflateStream, StreamStatus,
    ADLER_INIT,
};

fn compress_all(stream: &mut DeflateStream, input: &[u8], flush: DeflateFlush) -> Vec<u8>
{
    let mut out = Vec::new();
    let mut buf = vec![0_u8; 4096];
    let mut pos = 0;

    loop
    {
        let result = stream.compress(&input[pos..], &mut buf, flush).unwrap();

        pos += result.read;
        out.extend_from_slice(&buf[..result.written]);

        if result.status == StreamStatus::StreamEnd
        {
            break;
        }
        if pos == input.len() && result.written == 0 && flush != DeflateFlush::Finish
        {
            break;
        }
    }
    out
}

fn decompress_all(stream: &mut InflateStream, input: &[u8]) -> Vec<u8>
{
    let mut out = Vec::new();
    let mut buf = vec![0_u8; 4096];
    let mut pos = 0;

    loop
    {
        let result = stream
            .decompress(&input[pos..], &mut buf, InflateFlush::None)
            .unwrap();

        pos += result.read;
        out.extend_from_slice(&buf[..result.written]);

        if result.status == StreamStatus::StreamEnd
        {
            break;
        }
        if result.written == 0 && pos == input.len()
        {
            break;
        }
    }
    out
}

#[test]
fn sync_flush_aligns_and_stays_decodable()
{
    let part1 = b"first part of the stream, ".repeat(30);
    let part2 = b"and the rest of it.".repeat(30);

    let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();

    let chunk1 = compress_all(&mut enc, &part1, DeflateFlush::Sync);

    // byte aligned resynchronization marker
    assert_eq!(&chunk1[chunk1.len() - 4..], &[0x00, 0x00, 0xFF, 0xFF]);
    assert_eq!(enc.pending(), (0, 0));

    // everything up to the sync point decodes without the rest
    let mut dec = InflateStream::new();
    let decoded = decompress_all(&mut dec, &chunk1);

    assert_eq!(decoded, part1);

    // and the stream continues cleanly
    let chunk2 = compress_all(&mut enc, &part2, DeflateFlush::Finish);
    let decoded2 = decompress_all(&mut dec, &chunk2);

    assert_eq!(decoded2, part2);
    assert!(dec.is_finished());
}

#[test]
fn full_flush_allows_restarting_mid_stream()
{
    let part1 = b"independent prefix ".repeat(50);
    let part2 = b"independent suffix ".repeat(50);

    let mut enc = DeflateStream::new_raw(DeflateEncodingOptions::default()).unwrap();

    let chunk1 = compress_all(&mut enc, &part1, DeflateFlush::Full);
    let chunk2 = compress_all(&mut enc, &part2, DeflateFlush::Finish);

    // the whole stream decodes
    let mut dec = InflateStream::new_raw(15).unwrap();
    let mut whole = decompress_all(&mut dec, &chunk1);

    whole.extend(decompress_all(&mut dec, &chunk2));
    assert_eq!(whole, [part1.clone(), part2.clone()].concat());

    // a decoder dropped into the stream right after the full flush can
    // decode the tail on its own
    let mut fresh = InflateStream::new_raw(15).unwrap();
    let tail = decompress_all(&mut fresh, &chunk2);

    assert_eq!(tail, part2);
    assert!(fresh.is_finished());
}

#[test]
fn partial_flush_keeps_the_stream_valid()
{
    let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();
    let mut compressed = compress_all(&mut enc, b"alpha beta", DeflateFlush::Partial);

    compressed.extend(compress_all(&mut enc, b" gamma delta", DeflateFlush::Finish));

    let decoded = DeflateDecoder::new(&compressed).decode_zlib().unwrap();

    assert_eq!(decoded, b"alpha beta gamma delta");
}

#[test]
fn preset_dictionary_round_trip()
{
    let dict = b"the dictionary holds common phrases the data repeats";
    let data = b"common phrases the data repeats, common phrases again".to_vec();

    let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();

    enc.set_dictionary(dict).unwrap();

    let compressed = compress_all(&mut enc, &data, DeflateFlush::Finish);

    // a decoder without the dictionary must ask for it, naming its id
    let mut dec = InflateStream::new();
    let mut buf = vec![0_u8; 256];
    let result = dec.decompress(&compressed, &mut buf, InflateFlush::None).unwrap();

    assert_eq!(
        result.status,
        StreamStatus::NeedDict(adler32(ADLER_INIT, dict))
    );
    assert_eq!(result.written, 0);

    dec.set_dictionary(dict).unwrap();

    let decoded = decompress_all(&mut dec, &compressed[result.read..]);

    assert_eq!(decoded, data);
    assert!(dec.is_finished());
}

#[test]
fn wrong_dictionary_is_rejected()
{
    let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();

    enc.set_dictionary(b"the right dictionary").unwrap();

    let compressed = compress_all(&mut enc, b"payload", DeflateFlush::Finish);

    let mut dec = InflateStream::new();
    let mut buf = vec![0_u8; 64];

    dec.decompress(&compressed, &mut buf, InflateFlush::None)
        .unwrap();
    assert!(dec.set_dictionary(b"the wrong dictionary").is_err());
}

#[test]
fn params_switch_mid_stream()
{
    let part1 = b"stored fast part ".repeat(100);
    let part2 = b"and a slower tail ".repeat(100);

    let options = DeflateEncodingOptions::default().set_level(1);
    let mut enc = DeflateStream::new(options).unwrap();

    let mut compressed = compress_all(&mut enc, &part1, DeflateFlush::None);

    enc.params(9, DeflateStrategy::Default).unwrap();

    compressed.extend(compress_all(&mut enc, &part2, DeflateFlush::Finish));

    let decoded = DeflateDecoder::new(&compressed).decode_zlib().unwrap();

    assert_eq!(decoded, [part1, part2].concat());
}

#[test]
fn tune_overrides_are_accepted()
{
    let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();

    enc.tune(4, 8, 16, 32);

    let data = b"tuned stream ".repeat(64);
    let compressed = compress_all(&mut enc, &data, DeflateFlush::Finish);
    let decoded = DeflateDecoder::new(&compressed).decode_zlib().unwrap();

    assert_eq!(decoded, data);
}

#[test]
fn encoder_reset_reproduces_output()
{
    let data = b"identical streams after reset ".repeat(20);

    let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();
    let first = compress_all(&mut enc, &data, DeflateFlush::Finish);

    enc.reset();

    let second = compress_all(&mut enc, &data, DeflateFlush::Finish);

    assert_eq!(first, second);
}

#[test]
fn decoder_reset_allows_reuse()
{
    let compressed = DeflateEncoder::new(b"first stream").encode_zlib().unwrap();

    let mut dec = InflateStream::new();

    assert_eq!(decompress_all(&mut dec, &compressed), b"first stream");

    dec.reset();

    let compressed = DeflateEncoder::new(b"second stream").encode_zlib().unwrap();

    assert_eq!(decompress_all(&mut dec, &compressed), b"second stream");
}

#[test]
fn buf_error_is_transient()
{
    let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();
    let mut out = vec![0_u8; 128];

    // absorb the header first
    let first = enc.compress(&[], &mut out, DeflateFlush::None).unwrap();

    assert!(first.written > 0);

    // nothing to do now
    let stuck = enc.compress(&[], &mut out, DeflateFlush::None).unwrap();

    assert_eq!(stuck.status, StreamStatus::BufError);

    // providing data recovers
    let result = enc
        .compress(b"recovered", &mut out, DeflateFlush::Finish)
        .unwrap();

    assert_eq!(result.status, StreamStatus::StreamEnd);
}

#[test]
fn multi_member_gzip_concatenation()
{
    let s1 = b"first member ".repeat(40);
    let s2 = b"second member ".repeat(40);

    let mut g1 = DeflateEncoder::new(&s1).encode_gzip().unwrap();
    let g2 = DeflateEncoder::new(&s2).encode_gzip().unwrap();

    g1.extend_from_slice(&g2);

    // the streaming auto decoder spans the member boundary
    let mut dec = InflateStream::new_auto();
    let decoded = decompress_all(&mut dec, &g1);

    assert_eq!(decoded, [s1.clone(), s2.clone()].concat());
    assert!(dec.is_finished());

    // so does the one-shot path
    let decoded = DeflateDecoder::new(&g1).decode_gzip().unwrap();

    assert_eq!(decoded, [s1, s2].concat());
}

#[test]
fn gzip_metadata_round_trips()
{
    let header = GzipHeader {
        mtime:   1_234_567,
        os:      3,
        extra:   Some(vec![4, 5, 6, 7]),
        name:    Some(b"data.bin".to_vec()),
        comment: Some(b"compressed for testing".to_vec()),
        hcrc:    true,
        text:    false,
    };

    let options = DeflateEncodingOptions::default().set_gzip_header(header.clone());
    let compressed = DeflateEncoder::new_with_options(b"payload bytes", options)
        .encode_gzip()
        .unwrap();

    let mut dec = InflateStream::new_gzip();
    let decoded = decompress_all(&mut dec, &compressed);

    assert_eq!(decoded, b"payload bytes");

    let parsed = dec.gzip_header().unwrap();

    assert_eq!(parsed, &header);
}

#[test]
fn auto_mode_detects_zlib()
{
    let compressed = DeflateEncoder::new(b"zlib stream under auto").encode_zlib().unwrap();

    let mut dec = InflateStream::new_auto();
    let decoded = decompress_all(&mut dec, &compressed);

    assert_eq!(decoded, b"zlib stream under auto");
}

#[test]
fn dictionary_export_matches_history()
{
    let data = b"recent history should be exportable as a dictionary".to_vec();
    let compressed = DeflateEncoder::new(&data).encode_zlib().unwrap();

    let mut dec = InflateStream::new();

    decompress_all(&mut dec, &compressed);

    let mut exported = vec![0_u8; data.len()];
    let n = dec.dictionary(&mut exported);

    assert_eq!(&exported[..n], &data[..]);
}

#[test]
fn block_flush_stops_at_boundaries()
{
    // multiple blocks: a sync flush forces a boundary mid-stream
    let mut enc = DeflateStream::new(DeflateEncodingOptions::default()).unwrap();
    let mut compressed = compress_all(&mut enc, b"block one data", DeflateFlush::Sync);

    compressed.extend(compress_all(&mut enc, b" block two data", DeflateFlush::Finish));

    let mut dec = InflateStream::new();
    let mut out = vec![0_u8; 1024];
    let mut pos = 0;
    let mut written = 0;
    let mut stops = 0;

    loop
    {
        let result = dec
            .decompress(&compressed[pos..], &mut out[written..], InflateFlush::Block)
            .unwrap();

        pos += result.read;
        written += result.written;
        stops += 1;

        if result.status == StreamStatus::StreamEnd
        {
            break;
        }
        assert!(stops < 64, "no forward progress");
    }

    // more than one return means it did pause at boundaries
    assert!(stops > 1);
    assert_eq!(&out[..written], b"block one data block two data");
}
