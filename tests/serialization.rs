//! End-to-end wire format behavior through the public API.

use hdrhist::serialization::{Deserializer, SerializeError, Serializer};
use hdrhist::Histogram;
use std::io;

#[test]
fn known_payload_bytes() {
    // the smallest layout: 32 slots, values 0..=31 at unit resolution
    let mut h = Histogram::<u64>::new_with_bounds(1, 2, 1).unwrap();
    h.record(1).unwrap();

    let mut buf = Vec::new();
    let written = Serializer::new().serialize(&h, &mut buf).unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&1_u64.to_be_bytes()); // lowest discernible value
    expected.extend_from_slice(&2_u64.to_be_bytes()); // highest trackable value
    expected.push(1); // significant digits
    expected.push(0x7F); // skip 1 empty slot (-1)
    expected.push(0x01); // count of 1 at value 1
    expected.push(0x62); // skip the 30 remaining slots (-30)

    assert_eq!(expected, buf);
    assert_eq!(written, buf.len());
}

#[test]
fn round_trip_preserves_everything() {
    let mut h = Histogram::<u64>::new_with_bounds(1000, 3_600_000_000, 3).unwrap();
    for v in [1_u64, 999, 1000, 55_555, 2_000_000, 3_599_999_999] {
        h.record_n(v, 1 + v % 7).unwrap();
    }

    let mut buf = Vec::new();
    Serializer::new().serialize(&h, &mut buf).unwrap();
    let restored: Histogram<u64> = Deserializer::new()
        .deserialize(&mut buf.as_slice())
        .unwrap();

    assert_eq!(h, restored);
    assert_eq!(h.count(), restored.count());
    assert_eq!(h.max(), restored.max());
    assert_eq!(
        h.percentiles(&[50.0, 99.0]),
        restored.percentiles(&[50.0, 99.0])
    );
}

#[test]
fn round_trip_then_merge() {
    let mut h1 = Histogram::<u64>::new_with_max(1_000_000, 2).unwrap();
    let mut h2 = Histogram::<u64>::new_with_max(1_000_000, 2).unwrap();
    h1.record_n(500, 10).unwrap();
    h2.record_n(900_000, 4).unwrap();

    let mut buf = Vec::new();
    let mut serializer = Serializer::new();
    serializer.serialize(&h1, &mut buf).unwrap();
    serializer.serialize(&h2, &mut buf).unwrap();

    let mut deserializer = Deserializer::new();
    let mut reader = buf.as_slice();
    let mut merged: Histogram<u64> = deserializer.deserialize(&mut reader).unwrap();
    let second: Histogram<u64> = deserializer.deserialize(&mut reader).unwrap();
    merged.add(&second).unwrap();

    assert_eq!(14, merged.count());
    assert_eq!(10, merged.count_at(500));
    assert_eq!(4, merged.count_at(900_000));
}

#[test]
fn truncated_stream_is_an_io_error() {
    let mut h = Histogram::<u64>::new_with_max(1_000_000, 3).unwrap();
    h.record(42).unwrap();

    let mut buf = Vec::new();
    Serializer::new().serialize(&h, &mut buf).unwrap();
    buf.truncate(buf.len() - 1);

    let result = Deserializer::new().deserialize::<u64, _>(&mut buf.as_slice());
    assert!(result.is_err());
}

/// A writer that fails after a configurable number of bytes.
struct FailingWriter {
    remaining: usize,
}

impl io::Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.remaining {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "writer full"));
        }
        self.remaining -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn writer_errors_propagate() {
    let mut h = Histogram::<u64>::new_with_max(1_000_000, 3).unwrap();
    h.record(42).unwrap();

    let mut writer = FailingWriter { remaining: 4 };
    let result = Serializer::new().serialize(&h, &mut writer);
    assert!(matches!(result, Err(SerializeError::IoError(_))));

    // the histogram itself is unaffected
    assert_eq!(1, h.count());
}
