use kernel_inflate::{InflateError, InflateStatus, inflate};
use miniz_oxide::deflate::compress_to_vec;

/// Deterministic, poorly compressible bytes.
fn noise(len: usize) -> Vec<u8> {
    let mut x: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x.to_le_bytes()[0]
        })
        .collect()
}

fn text(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog; "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

fn roundtrip(data: &[u8], level: u8) {
    let packed = compress_to_vec(data, level);
    let mut out = vec![0u8; data.len()];
    let n = inflate(&mut out, &packed).unwrap();
    assert_eq!(n, data.len(), "level {level}");
    assert_eq!(out, data, "level {level}");
}

#[test]
fn decodes_what_a_reference_encoder_produces() {
    let data = text(10_000);
    // 0 emits stored blocks, 1 favours fixed codes, 9 dynamic trees.
    for level in [0, 1, 6, 9] {
        roundtrip(&data, level);
    }
}

#[test]
fn long_runs_replicate_overlapping_references() {
    roundtrip(&vec![b'a'; 100_000], 9);
}

#[test]
fn incompressible_input_spans_several_stored_blocks() {
    roundtrip(&noise(200_000), 0);
    roundtrip(&noise(70_000), 6);
}

#[test]
fn multi_megabyte_streams() {
    let noisy = noise(4 * 1024 * 1024);
    let zeros = vec![0u8; 3 * 1024 * 1024];
    for level in [0, 1, 6, 9] {
        roundtrip(&noisy, level);
        roundtrip(&zeros, level);
    }
}

#[test]
fn empty_input_from_a_reference_encoder() {
    for level in [0, 1, 6, 9] {
        roundtrip(&[], level);
    }
}

#[test]
fn known_fixed_huffman_vectors() {
    let mut out = [0u8; 64];
    assert_eq!(inflate(&mut out, &[115, 4, 0]), Ok(1));
    assert_eq!(out[0], b'A');

    let hello = [203, 72, 205, 201, 201, 87, 200, 64, 39, 1];
    let n = inflate(&mut out, &hello).unwrap();
    assert_eq!(&out[..n], b"hello hello hello hello");
}

#[test]
fn distance_beyond_output_is_a_data_error() {
    // Fixed block: <len 3, dist 1> with nothing written yet.
    let mut out = [0u8; 16];
    let err = inflate(&mut out, &[3, 2, 0]).unwrap_err();
    assert_eq!(
        err,
        InflateError::DistanceTooFar {
            distance: 1,
            written: 0
        }
    );
    assert_eq!(err.status(), InflateStatus::DataError);
}

#[test]
fn small_destination_reports_buf_error() {
    let data = text(4096);
    for level in [0, 9] {
        let packed = compress_to_vec(&data, level);
        let mut out = vec![0u8; 1000];
        let err = inflate(&mut out, &packed).unwrap_err();
        assert_eq!(err, InflateError::OutputFull);
        assert_eq!(err.status(), InflateStatus::BufError);
    }
}

#[test]
fn truncated_stored_stream_reports_buf_error() {
    let data = noise(2000);
    let packed = compress_to_vec(&data, 0);
    let mut out = vec![0u8; data.len()];
    let err = inflate(&mut out, &packed[..packed.len() / 2]).unwrap_err();
    assert_eq!(err, InflateError::SourceExhausted);
    assert_eq!(err.status(), InflateStatus::BufError);
}

#[test]
fn truncated_compressed_stream_fails_without_panicking() {
    let data = text(5000);
    let packed = compress_to_vec(&data, 9);
    let mut out = vec![0u8; data.len()];
    for cut in [1, 2, packed.len() / 3, packed.len() - 1] {
        assert!(inflate(&mut out, &packed[..cut]).is_err(), "cut at {cut}");
    }
    assert!(inflate(&mut out, &[]).is_err());
}

#[test]
fn garbage_never_escapes_its_buffers() {
    let mut out = vec![0u8; 4096];
    for seed in 0..64usize {
        let junk = noise(256 + seed * 7);
        // Any outcome is fine as long as it is reported and in bounds.
        if let Ok(n) = inflate(&mut out, &junk[seed..]) {
            assert!(n <= out.len());
        }
    }
}
