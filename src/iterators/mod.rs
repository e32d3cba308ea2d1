//! Iteration over histogram counter slots.

use crate::core::counter::Counter;
use crate::Histogram;

/// One counter slot of a histogram: its count and the inclusive bounds of the equivalent range
/// it covers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bucket {
    count: u64,
    lowest: u64,
    highest: u64,
}

impl Bucket {
    /// Number of observations recorded at values within this slot's range.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Lowest value that maps to this slot.
    pub fn lowest(&self) -> u64 {
        self.lowest
    }

    /// Highest value that maps to this slot.
    pub fn highest(&self) -> u64 {
        self.highest
    }

    /// The middle of the slot's range, rounded up; the same representative value that
    /// [`Histogram::median_equivalent`] reports for any value in the slot.
    pub fn median(&self) -> u64 {
        self.lowest / 2 + self.highest / 2 + 1
    }
}

/// An iterator over every counter slot of a histogram in ascending value order, empty slots
/// included.
///
/// Yields exactly [`Histogram::distinct_values`] items. The iterator borrows the histogram, so
/// the histogram cannot be mutated while an iteration is in progress.
pub struct Iter<'a, T: Counter> {
    hist: &'a Histogram<T>,
    bucket_index: u8,
    sub_bucket_index: u32,
}

impl<'a, T: Counter> Iter<'a, T> {
    pub(crate) fn new(hist: &'a Histogram<T>) -> Iter<'a, T> {
        Iter {
            hist,
            bucket_index: 0,
            sub_bucket_index: 0,
        }
    }
}

impl<'a, T: Counter> Iterator for Iter<'a, T> {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        let h = self.hist;

        if self.sub_bucket_index >= h.sub_bucket_count {
            // Rolled off the top of a bucket. The next bucket's bottom half repeats values the
            // buckets so far already cover, so resume at its upper half.
            self.sub_bucket_index = h.sub_bucket_half_count;
            self.bucket_index += 1;
        }

        let index = ((usize::from(self.bucket_index) + 1) << h.sub_bucket_half_count_magnitude)
            + self.sub_bucket_index as usize
            - h.sub_bucket_half_count as usize;
        if index >= h.counts.len() {
            return None;
        }

        // sub_bucket_index is always below sub_bucket_count here, so the slot's quantum is the
        // bucket's own
        let range = 1_u64 << (self.bucket_index + h.unit_magnitude);
        let lowest =
            u64::from(self.sub_bucket_index) << (self.bucket_index + h.unit_magnitude);
        let bucket = Bucket {
            count: h.counts[index].as_u64(),
            lowest,
            highest: lowest + (range - 1),
        };

        self.sub_bucket_index += 1;
        Some(bucket)
    }
}
