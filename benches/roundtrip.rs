use std::io::{Cursor, Read, Write};
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn test_data() -> Vec<u8>
{
    // repetitive but not degenerate: match heavy with literal runs
    let mut data = Vec::with_capacity(8 << 20);

    while data.len() < (8 << 20)
    {
        data.extend_from_slice(b"A quick brown fox, a lazy dog, and eight megabytes of them. ");
        data.push((data.len() % 251) as u8);
    }
    data
}

fn encode_writer_flate(bytes: &[u8]) -> Vec<u8>
{
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::new(6));

    encoder.write_all(bytes).unwrap();

    encoder.finish().unwrap()
}

fn encode_writer_zune(bytes: &[u8]) -> Vec<u8>
{
    let mut encoder = zune_deflate::DeflateEncoder::new(bytes);

    encoder.encode_zlib().unwrap()
}

fn decode_writer_flate(bytes: &[u8]) -> Vec<u8>
{
    let mut writer = Vec::new();

    let mut deflater = flate2::read::ZlibDecoder::new(Cursor::new(bytes));

    deflater.read_to_end(&mut writer).unwrap();

    writer
}

fn decode_writer_zune(bytes: &[u8]) -> Vec<u8>
{
    let mut deflater = zune_deflate::DeflateDecoder::new(bytes);

    deflater.decode_zlib().unwrap()
}

fn encode_test(c: &mut Criterion)
{
    let data = test_data();

    let mut group = c.benchmark_group("ZLIB encoding");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("FLATE-[miniz-oxide]", |b| {
        b.iter(|| black_box(encode_writer_flate(data.as_slice())))
    });

    group.bench_function("ZUNE", |b| {
        b.iter(|| black_box(encode_writer_zune(data.as_slice())))
    });
}

fn decode_test(c: &mut Criterion)
{
    let compressed = encode_writer_flate(&test_data());

    let mut group = c.benchmark_group("ZLIB decoding");
    group.throughput(Throughput::Bytes(compressed.len() as u64));

    group.bench_function("FLATE-[miniz-oxide]", |b| {
        b.iter(|| black_box(decode_writer_flate(compressed.as_slice())))
    });

    group.bench_function("ZUNE", |b| {
        b.iter(|| black_box(decode_writer_zune(compressed.as_slice())))
    });
}

criterion_group!(name=benches;
      config={
      let c = Criterion::default();
        c.measurement_time(Duration::from_secs(20))
      };
    targets=encode_test,decode_test);

criterion_main!(benches);
