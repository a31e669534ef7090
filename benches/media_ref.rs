use criterion::{Criterion, black_box, criterion_group, criterion_main};
use spotify_code::decoder::crc::{CrcModel, check_spotify_crc};
use spotify_code::{CodeSequence, decode_sequence, encode_media_ref, spotify_bar_decode};

const DATA_LEVELS: [u8; 20] = [5, 7, 4, 1, 4, 6, 6, 0, 2, 4, 3, 4, 6, 7, 5, 5, 6, 0, 5, 0];

fn bench_bar_decode(c: &mut Criterion) {
    c.bench_function("spotify_bar_decode", |b| {
        b.iter(|| spotify_bar_decode(black_box(&DATA_LEVELS)))
    });
}

fn bench_sequence_decode(c: &mut Criterion) {
    let sequence = CodeSequence::parse("05120643716777731637070")
        .ok()
        .flatten()
        .expect("fixture is a valid sequence");
    c.bench_function("decode_sequence", |b| {
        b.iter(|| decode_sequence(black_box(&sequence)))
    });
}

fn bench_encode(c: &mut Criterion) {
    c.bench_function("encode_media_ref", |b| {
        b.iter(|| encode_media_ref(black_box(75845227563)))
    });
}

fn bench_crc(c: &mut Criterion) {
    let data: Vec<u8> = (0..=255u8).collect();
    c.bench_function("crc8_256_bytes", |b| {
        b.iter(|| CrcModel::SPOTIFY.checksum(black_box(&data)))
    });
    c.bench_function("check_spotify_crc", |b| {
        b.iter(|| check_spotify_crc(black_box(0x1234_5678_9abc)))
    });
}

criterion_group!(
    benches,
    bench_bar_decode,
    bench_sequence_decode,
    bench_encode,
    bench_crc
);
criterion_main!(benches);
