use crate::{Counter, Histogram};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};
use std::{error, fmt};

/// Errors that can happen during deserialization.
#[derive(Debug)]
pub enum DeserializeError {
    /// An i/o operation failed. A truncated counter stream surfaces here as an unexpected-EOF
    /// error from the reader.
    IoError(io::Error),
    /// The histogram instance could not be created because the header parameters were invalid
    /// (e.g. lowest value, highest value, significant digits).
    InvalidParameters,
    /// A count exceeded what can be represented in the chosen counter type.
    UnsuitableCounterType,
    /// The counter stream encodes more slots than the header's bucket layout has.
    EncodedArrayTooLong,
}

impl From<io::Error> for DeserializeError {
    fn from(e: io::Error) -> Self {
        DeserializeError::IoError(e)
    }
}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeserializeError::IoError(e) => write!(f, "An i/o operation failed: {}", e),
            DeserializeError::InvalidParameters => {
                write!(f, "The header parameters were invalid (e.g. lowest value, highest value)")
            }
            DeserializeError::UnsuitableCounterType => write!(
                f,
                "A count exceeded what can be represented in the chosen counter type"
            ),
            DeserializeError::EncodedArrayTooLong => write!(
                f,
                "The counter stream encodes more slots than the header's bucket layout has"
            ),
        }
    }
}

impl error::Error for DeserializeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DeserializeError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// Deserializer for the header + counter-stream binary format.
pub struct Deserializer {
    // counter streams are decoded straight off the reader; no state is needed yet, but the
    // struct keeps the API symmetric with `Serializer` and leaves room for a read buffer
    _private: (),
}

impl Default for Deserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer {
    /// Create a new deserializer.
    pub fn new() -> Deserializer {
        Deserializer { _private: () }
    }

    /// Deserialize an encoded histogram from the provided reader.
    ///
    /// The histogram is reconstructed with the bucket layout derived from the header fields;
    /// its total count is recomputed from the decoded counters.
    ///
    /// Note that `&[u8]` and `Cursor` are convenient implementations of `Read` if you have
    /// bytes already in slice or `Vec` form.
    pub fn deserialize<T: Counter, R: Read>(
        &mut self,
        reader: &mut R,
    ) -> Result<Histogram<T>, DeserializeError> {
        let low = reader.read_u64::<BigEndian>()?;
        let high = reader.read_u64::<BigEndian>()?;
        let sigfig = reader.read_u8()?;

        let mut h: Histogram<T> = Histogram::new_with_bounds(low, high, sigfig)
            .map_err(|_| DeserializeError::InvalidParameters)?;

        let slots = h.distinct_values();
        let mut dest_index: usize = 0;
        let mut total_count: u64 = 0;

        while dest_index < slots {
            let count_or_zeros = varint_read(reader)?;
            if count_or_zeros < 0 {
                // a run of that many empty slots; the array is already zeroed, so just skip
                let zeros = count_or_zeros.unsigned_abs() as usize;
                dest_index = dest_index
                    .checked_add(zeros)
                    .filter(|&i| i <= slots)
                    .ok_or(DeserializeError::EncodedArrayTooLong)?;
            } else {
                let count =
                    T::from_i64(count_or_zeros).ok_or(DeserializeError::UnsuitableCounterType)?;
                h.counts[dest_index] = count;
                total_count = total_count.saturating_add(count_or_zeros as u64);
                dest_index += 1;
            }
        }

        h.total_count = total_count;
        Ok(h)
    }
}

// Only public for testing.
/// Read one signed LEB128 varint from the reader.
pub fn varint_read<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = reader.read_u8()?;
        result |= i64::from(byte & 0x7F) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                // sign-extend the final group
                result |= -1_i64 << shift;
            }
            return Ok(result);
        }

        if shift >= 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "varint is longer than 10 bytes",
            ));
        }
    }
}
