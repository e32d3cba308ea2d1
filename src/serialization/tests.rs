use super::deserializer::varint_read;
use super::serializer::{encode_counts, varint_write};
use super::{Deserializer, Serializer};
use crate::Histogram;
use rand::Rng;
use std::io::Cursor;

fn write_to_vec(input: i64) -> Vec<u8> {
    let mut buf = [0_u8; 10];
    let used = varint_write(input, &mut buf);
    buf[0..used].to_vec()
}

fn encode_to_vec(counts: &[u64]) -> Vec<u8> {
    let mut buf = vec![0_u8; counts.len() * super::MAX_VARINT_LEN];
    let used = encode_counts(counts, &mut buf).unwrap();
    buf.truncate(used);
    buf
}

#[test]
fn varint_write_small_positive() {
    assert_eq!(vec![0], write_to_vec(0));
    assert_eq!(vec![1], write_to_vec(1));
    assert_eq!(vec![56], write_to_vec(56));
    // largest value whose sign bit stays clear in one group
    assert_eq!(vec![63], write_to_vec(63));
}

#[test]
fn varint_write_small_negative() {
    assert_eq!(vec![0x7F], write_to_vec(-1));
    assert_eq!(vec![0x7C], write_to_vec(-4));
    // smallest value that still fits in one group
    assert_eq!(vec![0x40], write_to_vec(-64));
}

#[test]
fn varint_write_group_boundaries() {
    // 64 sets the sign bit of the first group, forcing a second byte
    assert_eq!(vec![0xC0, 0x00], write_to_vec(64));
    assert_eq!(vec![0xBF, 0x7F], write_to_vec(-65));
    assert_eq!(vec![0xFF, 0x00], write_to_vec(127));
    assert_eq!(vec![0x80, 0x01], write_to_vec(128));
}

#[test]
fn varint_write_extremes_use_ten_bytes() {
    assert_eq!(10, write_to_vec(i64::MAX).len());
    assert_eq!(10, write_to_vec(i64::MIN).len());
}

#[test]
fn varint_read_rejects_overlong() {
    let bytes = [0x80_u8; 11];
    assert!(varint_read(&mut Cursor::new(&bytes)).is_err());
}

#[test]
fn varint_roundtrip_edges() {
    for &input in &[
        0,
        1,
        -1,
        63,
        64,
        -64,
        -65,
        i64::from(i32::MAX),
        i64::from(i32::MIN),
        i64::MAX,
        i64::MIN,
    ] {
        let bytes = write_to_vec(input);
        let decoded = varint_read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(input, decoded, "bytes: {:?}", bytes);
    }
}

#[test]
fn varint_roundtrip_random() {
    let mut rng = rand::thread_rng();

    for _ in 0..1_000_000 {
        let input = rng.gen::<i64>();
        let bytes = write_to_vec(input);
        let decoded = varint_read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(input, decoded);
    }
}

#[test]
fn encode_counts_single_nonzero() {
    assert_eq!(vec![56], encode_to_vec(&[56]));
}

#[test]
fn encode_counts_single_zero_is_a_run_of_one() {
    assert_eq!(vec![127], encode_to_vec(&[0]));
}

#[test]
fn encode_counts_interior_zero_run() {
    assert_eq!(vec![56, 124, 57], encode_to_vec(&[56, 0, 0, 0, 0, 57]));
}

#[test]
fn encode_counts_trailing_zero_run_is_emitted() {
    // -3 encodes as a single group: 0b0111_1101
    assert_eq!(vec![1, 0x7D], encode_to_vec(&[1, 0, 0, 0]));
}

#[test]
fn encode_counts_leading_zero_run() {
    assert_eq!(vec![0x7E, 9], encode_to_vec(&[0, 0, 9]));
}

#[test]
fn encode_counts_empty_histogram_is_one_run() {
    let h = Histogram::<u64>::new_with_max(3_600_000_000, 3).unwrap();
    // 23552 slots collapse into one varint
    assert_eq!(write_to_vec(-23552), encode_to_vec(&h.counts));
}

#[test]
fn serialize_header_layout() {
    let mut h = Histogram::<u64>::new_with_bounds(1000, 3_600_000_000, 2).unwrap();
    h.record(1_000_000).unwrap();

    let mut buf = Vec::new();
    let len = Serializer::new().serialize(&h, &mut buf).unwrap();

    assert_eq!(len, buf.len());
    assert_eq!(buf[0..8], 1000_u64.to_be_bytes());
    assert_eq!(buf[8..16], 3_600_000_000_u64.to_be_bytes());
    assert_eq!(buf[16], 2);
}

#[test]
fn serialize_deserialize_empty() {
    let h = Histogram::<u64>::new_with_max(3_600_000_000, 3).unwrap();

    let mut buf = Vec::new();
    Serializer::new().serialize(&h, &mut buf).unwrap();
    let restored: Histogram<u64> = Deserializer::new()
        .deserialize(&mut buf.as_slice())
        .unwrap();

    assert_eq!(h, restored);
    assert_eq!(0, restored.count());
}

#[test]
fn serialize_deserialize_random_counts() {
    let mut rng = rand::thread_rng();
    let mut serializer = Serializer::new();
    let mut deserializer = Deserializer::new();

    for _ in 0..50 {
        let mut h = Histogram::<u64>::new_with_max(1_000_000, 3).unwrap();
        for _ in 0..rng.gen_range(1..2_000_u32) {
            let value = rng.gen_range(0..=1_000_000_u64);
            let count = rng.gen_range(1..256_u64);
            h.record_n(value, count).unwrap();
        }

        let mut buf = Vec::new();
        serializer.serialize(&h, &mut buf).unwrap();
        let restored: Histogram<u64> = deserializer.deserialize(&mut buf.as_slice()).unwrap();

        assert_eq!(h, restored);
    }
}

#[test]
fn deserialize_rejects_bad_parameters() {
    let mut buf = Vec::new();
    Serializer::new()
        .serialize(
            &Histogram::<u64>::new_with_max(1_000_000, 3).unwrap(),
            &mut buf,
        )
        .unwrap();

    // corrupt the sigfig byte
    buf[16] = 9;
    assert!(Deserializer::new()
        .deserialize::<u64, _>(&mut buf.as_slice())
        .is_err());
}

#[test]
fn deserialize_narrower_counter_type() {
    let mut h = Histogram::<u64>::new_with_max(100_000, 2).unwrap();
    h.record_n(500, 70_000).unwrap();

    let mut buf = Vec::new();
    Serializer::new().serialize(&h, &mut buf).unwrap();

    // fits in u32, not in u16
    assert!(Deserializer::new()
        .deserialize::<u32, _>(&mut buf.as_slice())
        .is_ok());
    assert!(Deserializer::new()
        .deserialize::<u16, _>(&mut buf.as_slice())
        .is_err());
}
