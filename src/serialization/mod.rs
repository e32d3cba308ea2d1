//! Serialization/deserialization support.
//!
//! The format is a compact binary representation of the full state of a histogram, intended for
//! archival or transmission to other systems for further analysis. Histograms are designed to
//! be merged, and an efficient storage format facilitates this: capture and serialize one
//! histogram per minute, and later deserialize and [`add`](crate::Histogram::add) an hour's
//! worth together to compute, say, a correct 99.99th percentile for the whole hour, which is
//! not something that can be recovered from stored percentiles.
//!
//! # Format
//!
//! A serialized histogram is a 17-byte header followed by the counter stream:
//!
//! ```text
//! 8 bytes  big-endian  lowest discernible value
//! 8 bytes  big-endian  highest trackable value
//! 1 byte               significant decimal digits (1..=5)
//! n bytes              counter stream, to the end of the payload
//! ```
//!
//! The counter array length is deliberately absent: the deserializer re-derives the bucket
//! layout from the three header fields, exactly as construction does, and the stream covers
//! every slot. The stream itself is a sequence of signed LEB128 varints (7-bit groups,
//! little-endian within each varint, high bit flagging continuation): a non-negative number is
//! the count of the next slot, and a negative number -k skips a run of k empty slots. Runs of
//! empty slots dominate most histograms, so this run compression keeps payloads small without
//! any general-purpose compressor.
//!
//! This format is not wire-compatible with the HdrHistogram V2 interchange format; it is a
//! smaller, self-contained variant.
//!
//! # API
//!
//! [`Serializer`] and [`Deserializer`] are intended to be re-used across many histograms so the
//! cost of their internal buffers is amortized. Both work against `std::io` traits: anything
//! from a `Vec<u8>` to a file or socket works.
//!
//! ```
//! use hdrhist::Histogram;
//! use hdrhist::serialization::{Deserializer, Serializer};
//!
//! let mut hist = Histogram::<u64>::new_with_max(3_600_000, 3).unwrap();
//! hist.record_n(42, 7).unwrap();
//!
//! let mut buf = Vec::new();
//! Serializer::new().serialize(&hist, &mut buf).unwrap();
//!
//! let restored: Histogram<u64> = Deserializer::new()
//!     .deserialize(&mut buf.as_slice())
//!     .unwrap();
//! assert_eq!(hist, restored);
//! ```

#[cfg(test)]
mod tests;

mod serializer;
pub use self::serializer::{SerializeError, Serializer};

mod deserializer;
pub use self::deserializer::{DeserializeError, Deserializer};

/// Two 8-byte value bounds plus the significant-digits byte.
const HEADER_SIZE: usize = 17;

/// A signed LEB128 varint for an i64 needs at most 10 bytes.
const MAX_VARINT_LEN: usize = 10;
