use super::{HEADER_SIZE, MAX_VARINT_LEN};
use crate::{Counter, Histogram};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};
use std::{error, fmt};

/// Errors that occur during serialization.
#[derive(Debug)]
pub enum SerializeError {
    /// A count above `i64::MAX` cannot be represented in the signed varint stream, and
    /// therefore cannot be serialized.
    CountNotSerializable,
    /// Internal calculations cannot be represented in `usize`. Use smaller histograms or
    /// beefier hardware.
    UsizeTypeTooSmall,
    /// An i/o operation failed.
    IoError(io::Error),
}

impl From<io::Error> for SerializeError {
    fn from(e: io::Error) -> Self {
        SerializeError::IoError(e)
    }
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SerializeError::CountNotSerializable => {
                write!(f, "A count above i64::MAX cannot be encoded")
            }
            SerializeError::UsizeTypeTooSmall => {
                write!(f, "Internal calculations cannot be represented in `usize`")
            }
            SerializeError::IoError(e) => write!(f, "An i/o operation failed: {}", e),
        }
    }
}

impl error::Error for SerializeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SerializeError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// Serializer for the header + counter-stream binary format.
///
/// The internal buffer is retained between calls, so re-using one serializer for many
/// histograms amortizes its allocation.
pub struct Serializer {
    buf: Vec<u8>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    /// Create a new serializer.
    pub fn new() -> Serializer {
        Serializer { buf: Vec::new() }
    }

    /// Serialize the histogram into the provided writer and flush it.
    /// Returns the number of bytes written, or an error.
    ///
    /// Note that `Vec<u8>` is a reasonable `Write` implementation for simple usage.
    pub fn serialize<T: Counter, W: Write>(
        &mut self,
        h: &Histogram<T>,
        writer: &mut W,
    ) -> Result<usize, SerializeError> {
        self.buf.clear();
        let max_size = max_encoded_size(h).ok_or(SerializeError::UsizeTypeTooSmall)?;

        self.buf.write_u64::<BigEndian>(h.low())?;
        self.buf.write_u64::<BigEndian>(h.high())?;
        self.buf.write_u8(h.sigfig())?;

        debug_assert_eq!(HEADER_SIZE, self.buf.len());

        // encode_counts wants a slice; the dummy bytes past the end are truncated by total_len
        self.buf.resize(max_size, 0);
        let counts_len = encode_counts(&h.counts, &mut self.buf[HEADER_SIZE..])?;
        // addition is safe as max_size is already a usize
        let total_len = HEADER_SIZE + counts_len;

        writer.write_all(&self.buf[0..total_len])?;
        writer.flush()?;
        Ok(total_len)
    }
}

fn max_encoded_size<T: Counter>(h: &Histogram<T>) -> Option<usize> {
    h.distinct_values()
        .checked_mul(MAX_VARINT_LEN)?
        .checked_add(HEADER_SIZE)
}

// Only public for testing.
/// Encode a counter array into the slice as a run-compressed signed varint stream: non-zero
/// counts literally, each maximal run of k zero slots as -k, including the trailing run.
/// The slice must be at least `MAX_VARINT_LEN` times the number of slots.
/// Returns the number of bytes used.
pub fn encode_counts<T: Counter>(counts: &[T], buf: &mut [u8]) -> Result<usize, SerializeError> {
    let mut bytes_written = 0;
    let mut zeros: i64 = 0;

    for &count in counts {
        if count == T::zero() {
            // a run can never exceed the slot count, which is nowhere near i64::MAX
            zeros += 1;
            continue;
        }
        if zeros > 0 {
            bytes_written += varint_write(-zeros, &mut buf[bytes_written..]);
            zeros = 0;
        }
        let count = count.to_i64().ok_or(SerializeError::CountNotSerializable)?;
        bytes_written += varint_write(count, &mut buf[bytes_written..]);
    }
    if zeros > 0 {
        bytes_written += varint_write(-zeros, &mut buf[bytes_written..]);
    }

    Ok(bytes_written)
}

// Only public for testing.
/// Write a number to buf as a signed little-endian base 128 varint: 7-bit groups starting from
/// the least significant, the high bit of each byte flagging that more groups follow. The last
/// group is the one after which only sign extension remains, so small magnitudes of either sign
/// take one byte. Returns the number of bytes written (in [1, 10]).
#[inline]
pub fn varint_write(input: i64, buf: &mut [u8]) -> usize {
    let mut value = input;
    let mut i = 0;
    loop {
        let byte = (value as u8) & 0x7F;
        // arithmetic shift: negative values keep their sign bits
        value >>= 7;
        let sign_bit_clear = byte & 0x40 == 0;
        if (value == 0 && sign_bit_clear) || (value == -1 && !sign_bit_clear) {
            buf[i] = byte;
            return i + 1;
        }
        buf[i] = byte | 0x80;
        i += 1;
    }
}
