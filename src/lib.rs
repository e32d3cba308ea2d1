//! hdrhist records the distribution of positive integer observations (latencies in
//! nanoseconds, request sizes in bytes, queue depths) across a wide, configurable value range
//! while guaranteeing a bounded relative error at every magnitude. A histogram configured to
//! track values between 1 and 3,600,000,000 with 3 significant digits keeps value quantization
//! below 0.1% of any value in that range, whether the value is 900 nanoseconds or 50 minutes.
//!
//! The memory footprint is fixed at construction and depends only on the configured range and
//! precision, never on how many observations are recorded. Recording is constant time and does
//! no allocation: a value is mapped directly to a counter slot with a handful of shifts and a
//! leading-zeros count. Summaries (min, max, mean, standard deviation, percentile batches) walk
//! the counter array once.
//!
//! # Recording samples
//!
//! A histogram is created with [`Histogram::new_with_max`] (track `1..=high`) or
//! [`Histogram::new_with_bounds`] (also raise the lowest discernible value, which shrinks the
//! counter array when fine absolute resolution is not needed near zero). The counter type is a
//! type parameter; `u64` is the usual choice, while `u32` or `u16` halve or quarter the
//! footprint at the cost of a lower per-slot saturation ceiling.
//!
//! ```
//! use hdrhist::Histogram;
//!
//! // one hour in milliseconds, 2 significant digits
//! let mut hist = Histogram::<u64>::new_with_max(60 * 60 * 1000, 2).unwrap();
//!
//! hist.record(54_321).expect("value is in range");
//!
//! // ergonomic form; panics if the value is out of range
//! hist += 54_321;
//!
//! assert_eq!(2, hist.count());
//! ```
//!
//! # Querying
//!
//! ```
//! use hdrhist::Histogram;
//!
//! let mut hist = Histogram::<u64>::new_with_max(1_000_000, 3).unwrap();
//! for v in 1..=1000 {
//!     hist.record(v).unwrap();
//! }
//!
//! let summary = hist.percentiles(&[50.0, 90.0, 99.0, 99.9]);
//! assert_eq!(summary, vec![500, 900, 990, 999]);
//! assert_eq!(hist.max(), 1000);
//! ```
//!
//! Histograms recorded in different places (one per thread, one per shard) can be merged with
//! [`Histogram::add`] as long as they were constructed with parameters that derive the same
//! bucket layout, and serialized into a compact run-compressed binary form with the
//! [`serialization`] module.
//!
//! # Limitations
//!
//! The histogram is a single-threaded structure: shard per thread and merge, or wrap it in a
//! lock. Values are unsigned integers; scale floating-point observations into integer units
//! before recording. The value range is fixed at construction, so recording above the highest
//! trackable value is an error, not a resize.

use std::cmp;
use std::ops::AddAssign;

mod core;
mod errors;

pub use crate::core::counter::Counter;
pub use crate::errors::{CreationError, MergeError, RecordError};

pub mod iterators;
pub mod serialization;

#[cfg(test)]
mod tests;

/// A histogram of positive integer values with a configurable range and precision.
///
/// The counter type `T` sets the width of each slot; see the crate docs for the trade-off.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram<T: Counter> {
    lowest_discernible_value: u64,
    highest_trackable_value: u64,
    significant_value_digits: u8,

    bucket_count: u8,
    sub_bucket_count: u32,
    sub_bucket_half_count: u32,
    sub_bucket_half_count_magnitude: u8,
    sub_bucket_mask: u64,

    unit_magnitude: u8,
    leading_zero_count_base: u8,

    total_count: u64,
    counts: Vec<T>,
}

// Construction.

impl<T: Counter> Histogram<T> {
    /// Construct a histogram that tracks values in `[1, high]` with `sigfig` significant decimal
    /// digits of precision.
    ///
    /// `high` must be at least 2; `sigfig` must be in `[1, 5]`.
    pub fn new_with_max(high: u64, sigfig: u8) -> Result<Histogram<T>, CreationError> {
        Self::new_with_bounds(1, high, sigfig)
    }

    /// Construct a histogram that tracks values in `[low, high]` with `sigfig` significant
    /// decimal digits of precision.
    ///
    /// `low` is the smallest value that needs to be distinguished from values near it, and is
    /// useful when the recorded unit is much finer than the needed accuracy: recording
    /// nanoseconds while only caring about microsecond accuracy calls for `low = 1000`, which
    /// makes the counter array roughly a thousand slots shorter. `low` is internally rounded
    /// down to the nearest power of two. Values below `low` are still recorded, at `low`'s
    /// resolution.
    ///
    /// `high` must be at least `2 * low`; `sigfig` must be in `[1, 5]`.
    pub fn new_with_bounds(low: u64, high: u64, sigfig: u8) -> Result<Histogram<T>, CreationError> {
        if low < 1 {
            return Err(CreationError::LowIsZero);
        }
        // this also rejects low > u64::MAX / 2, for which no valid high exists
        if low.checked_mul(2).map_or(true, |twice_low| high < twice_low) {
            return Err(CreationError::HighLessThanTwiceLow);
        }
        if !(1..=5).contains(&sigfig) {
            return Err(CreationError::SigFigOutOfRange);
        }

        // Given a 3 decimal digit accuracy, the expectation is for "+/- 1 unit at 1000". It is
        // NOT ok to be +/- 2 units at 1999; only starting at 2000. So single unit resolution
        // must be maintained out to 2 * 10^sigfig.
        let largest_value_with_single_unit_resolution = 2 * 10_u64.pow(u32::from(sigfig));

        let unit_magnitude = 63 - low.leading_zeros() as u8;

        // Sub-bucket count must be a power of two (for clean direct indexing) large enough to
        // provide unit resolution out to largest_value_with_single_unit_resolution; its
        // magnitude is the integer bit length of (largest - 1), i.e. the ceiling log2.
        let sub_bucket_count_magnitude =
            (64 - (largest_value_with_single_unit_resolution - 1).leading_zeros()) as u8;

        if unit_magnitude + sub_bucket_count_magnitude > 63 {
            // the sub-bucket span (1 << (unit_magnitude + magnitude)) must fit in a u64
            return Err(CreationError::CannotRepresentSigFigBeyondLow);
        }

        let sub_bucket_half_count_magnitude = cmp::max(sub_bucket_count_magnitude, 2) - 1;
        let sub_bucket_count = 1_u32 << (sub_bucket_half_count_magnitude + 1);
        let sub_bucket_half_count = sub_bucket_count / 2;
        let sub_bucket_mask = (u64::from(sub_bucket_count) - 1) << unit_magnitude;

        // used by bucket_for: subtract out the bits consumed by the largest value in bucket 0
        let leading_zero_count_base = 64 - unit_magnitude - sub_bucket_half_count_magnitude - 1;

        let mut h = Histogram {
            lowest_discernible_value: low,
            highest_trackable_value: high,
            significant_value_digits: sigfig,

            bucket_count: 0, // set below once the count is known
            sub_bucket_count,
            sub_bucket_half_count,
            sub_bucket_half_count_magnitude,
            sub_bucket_mask,

            unit_magnitude,
            leading_zero_count_base,

            total_count: 0,
            counts: Vec::new(),
        };

        let buckets_needed = h.buckets_needed_to_cover(high);
        let len = h
            .counts_len_for(buckets_needed)
            .ok_or(CreationError::UsizeTypeTooSmall)?;

        h.bucket_count = buckets_needed;
        h.counts = vec![T::zero(); len];

        Ok(h)
    }

    fn buckets_needed_to_cover(&self, value: u64) -> u8 {
        // The k'th bucket can express from 0 * 2^k to sub_bucket_count * 2^k in units of 2^k.
        // The comparison below is <=, not <: when the smallest untrackable value lands exactly
        // on `value`, `value` itself still needs one more bucket.
        let mut smallest_untrackable_value =
            u64::from(self.sub_bucket_count) << self.unit_magnitude;

        // always have at least 1 bucket
        let mut buckets_needed: u8 = 1;
        while smallest_untrackable_value <= value {
            if smallest_untrackable_value > u64::MAX / 2 {
                // next shift will overflow, meaning that bucket could represent values up to
                // ones greater than u64::MAX, so it's the last bucket
                return buckets_needed + 1;
            }
            smallest_untrackable_value <<= 1;
            buckets_needed += 1;
        }
        buckets_needed
    }

    /// The buckets (each of which has sub_bucket_count sub-buckets, here assumed to be 2048 as
    /// an example) overlap:
    ///
    /// ```text
    /// The 0'th bucket covers 0...2047 in multiples of 1, using all 2048 sub-buckets
    /// The 1'th bucket covers 2048..4097 in multiples of 2, using only the top 1024 sub-buckets
    /// The 2'th bucket covers 4096..8191 in multiples of 4, using only the top 1024 sub-buckets
    /// ...
    /// ```
    ///
    /// Bucket 0 is "special": it is the only one with all sub_bucket_count entries; every other
    /// bucket's bottom half is already covered, at better precision, by the buckets before it.
    /// So the array holds one full bucket plus a half bucket per remaining bucket, and one extra
    /// half bucket accounts for bucket 0's doubled size.
    fn counts_len_for(&self, buckets: u8) -> Option<usize> {
        (usize::from(buckets) + 1).checked_mul(self.sub_bucket_half_count as usize)
    }
}

// Index mapping.

impl<T: Counter> Histogram<T> {
    /// Number of powers of two by which the value is greater than the biggest value that fits in
    /// bucket 0. The mask maps values below the first bucket's span to bucket 0.
    fn bucket_for(&self, value: u64) -> u8 {
        self.leading_zero_count_base - (value | self.sub_bucket_mask).leading_zeros() as u8
    }

    /// For bucket 0 this is the value in units, anywhere in [0, sub_bucket_count). For any other
    /// bucket it lands in the top half: a bottom-half result would mean the value was also
    /// representable in the previous bucket's top half, and bucket_for would have returned that
    /// bucket instead.
    fn sub_bucket_for(&self, value: u64, bucket_index: u8) -> u32 {
        (value >> (bucket_index + self.unit_magnitude)) as u32
    }

    fn index_for(&self, value: u64) -> usize {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);

        debug_assert!(sub_bucket_index < self.sub_bucket_count);
        debug_assert!(bucket_index == 0 || sub_bucket_index >= self.sub_bucket_half_count);

        // The first slot a bucket owns sits halfway through its sub-bucket range; for bucket 0
        // the base is still set in the middle, which maps its bottom half onto the start of the
        // array once the offset below (negative only for bucket 0) is applied.
        let bucket_base_index =
            (i32::from(bucket_index) + 1) << self.sub_bucket_half_count_magnitude;
        let offset_in_bucket = sub_bucket_index as i32 - self.sub_bucket_half_count as i32;

        (bucket_base_index + offset_in_bucket) as usize
    }

    fn value_from_loc(&self, bucket_index: u8, sub_bucket_index: u32) -> u64 {
        u64::from(sub_bucket_index) << (bucket_index + self.unit_magnitude)
    }

    /// Lowest value that maps to the counter slot at `index`.
    ///
    /// Slots are in ascending value order, `0..self.distinct_values()`.
    pub fn value_for(&self, index: usize) -> u64 {
        let mut bucket_index = (index >> self.sub_bucket_half_count_magnitude) as i32 - 1;
        let mut sub_bucket_index =
            (index & (self.sub_bucket_half_count as usize - 1)) as u32 + self.sub_bucket_half_count;
        if bucket_index < 0 {
            // the first half-bucket of the array is bucket 0's bottom half
            sub_bucket_index -= self.sub_bucket_half_count;
            bucket_index = 0;
        }
        self.value_from_loc(bucket_index as u8, sub_bucket_index)
    }
}

// Equivalent ranges.

impl<T: Counter> Histogram<T> {
    /// Get the lowest value that is equivalent to the given value within the histogram's
    /// resolution, where "equivalent" means that values counted in a common slot.
    pub fn lowest_equivalent(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);
        self.value_from_loc(bucket_index, sub_bucket_index)
    }

    /// Get the highest value that is equivalent to the given value within the histogram's
    /// resolution.
    pub fn highest_equivalent(&self, value: u64) -> u64 {
        if value == u64::MAX {
            u64::MAX
        } else {
            self.next_non_equivalent(value) - 1
        }
    }

    /// Get a value that lies in the middle (rounded up) of the range of values equivalent to the
    /// given value. This is the representative value used by [`mean`](Histogram::mean) and
    /// [`std_dev`](Histogram::std_dev).
    pub fn median_equivalent(&self, value: u64) -> u64 {
        // halving both bounds first cannot overflow, where (lowest + highest) / 2 could
        self.lowest_equivalent(value) / 2 + self.highest_equivalent(value) / 2 + 1
    }

    /// Get the next value that is *not* equivalent to the given value within the histogram's
    /// resolution. Saturates at `u64::MAX`.
    pub fn next_non_equivalent(&self, value: u64) -> u64 {
        self.lowest_equivalent(value)
            .saturating_add(self.equivalent_range(value))
    }

    /// Get the size (in value units) of the range of values that are equivalent to the given
    /// value within the histogram's resolution. Always a power of two.
    pub fn equivalent_range(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);
        // a sub-bucket index at or past the bucket's end only arises for values at the very top
        // of the range; the distance to the next value is then the next bucket's quantum
        1_u64
            << (self.unit_magnitude
                + if sub_bucket_index >= self.sub_bucket_count {
                    bucket_index + 1
                } else {
                    bucket_index
                })
    }

    /// Determine if two values are equivalent within the histogram's resolution, i.e. whether
    /// they are counted in a common slot.
    pub fn equivalent(&self, value1: u64, value2: u64) -> bool {
        self.lowest_equivalent(value1) == self.lowest_equivalent(value2)
    }
}

// Recording and merging.

impl<T: Counter> Histogram<T> {
    /// Record `value` in the histogram.
    ///
    /// Values above the highest trackable value are rejected with
    /// [`RecordError::ValueOutOfRange`] and leave the histogram unchanged.
    pub fn record(&mut self, value: u64) -> Result<(), RecordError> {
        self.record_n(value, T::one())
    }

    /// Record `count` occurrences of `value` in the histogram.
    ///
    /// The out-of-range policy is the same as [`record`](Histogram::record). The slot counter
    /// saturates at the counter type's maximum; statistics are undefined once that happens.
    pub fn record_n(&mut self, value: u64, count: T) -> Result<(), RecordError> {
        if value > self.highest_trackable_value {
            return Err(RecordError::ValueOutOfRange);
        }
        let index = self.index_for(value);
        // every value up to the highest trackable value maps inside the array
        let slot = &mut self.counts[index];
        *slot = slot.saturating_add(count);
        self.total_count = self.total_count.saturating_add(count.as_u64());
        Ok(())
    }

    /// Add the contents of `other` to this histogram.
    ///
    /// Fails with [`MergeError::IncompatibleLayout`], modifying neither histogram, unless both
    /// were constructed with parameters deriving the same bucket layout. Merging is element-wise
    /// on the counter slots, so it is exact: the merged histogram is indistinguishable from one
    /// that recorded both input sequences itself.
    pub fn add(&mut self, other: &Histogram<T>) -> Result<(), MergeError> {
        if self.bucket_count != other.bucket_count
            || self.sub_bucket_count != other.sub_bucket_count
            || self.unit_magnitude != other.unit_magnitude
        {
            return Err(MergeError::IncompatibleLayout);
        }

        for (slot, &other_slot) in self.counts.iter_mut().zip(other.counts.iter()) {
            *slot = slot.saturating_add(other_slot);
        }
        self.total_count = self.total_count.saturating_add(other.total_count);
        Ok(())
    }

    /// Reset the contents of this histogram; the configuration is unchanged.
    pub fn clear(&mut self) {
        for c in self.counts.iter_mut() {
            *c = T::zero();
        }
        self.total_count = 0;
    }
}

impl<T: Counter> AddAssign<u64> for Histogram<T> {
    /// Record a value. Panics if the value is out of range; use
    /// [`record`](Histogram::record) to handle the error.
    fn add_assign(&mut self, value: u64) {
        self.record(value).unwrap();
    }
}

impl<T: Counter> AddAssign<&Histogram<T>> for Histogram<T> {
    /// Merge another histogram in. Panics on layout mismatch; use
    /// [`add`](Histogram::add) to handle the error.
    fn add_assign(&mut self, other: &Histogram<T>) {
        self.add(other).unwrap();
    }
}

// Accessors.

impl<T: Counter> Histogram<T> {
    /// Get the configured lowest discernible value.
    pub fn low(&self) -> u64 {
        self.lowest_discernible_value
    }

    /// Get the configured highest trackable value.
    pub fn high(&self) -> u64 {
        self.highest_trackable_value
    }

    /// Get the configured number of significant decimal digits.
    pub fn sigfig(&self) -> u8 {
        self.significant_value_digits
    }

    /// Get the number of buckets in the geometric layout.
    pub fn buckets(&self) -> u8 {
        self.bucket_count
    }

    /// Get the number of counter slots, i.e. the number of distinct equivalent ranges the
    /// histogram distinguishes.
    pub fn distinct_values(&self) -> usize {
        self.counts.len()
    }

    /// Get the total number of recorded observations.
    pub fn count(&self) -> u64 {
        self.total_count
    }

    /// Get the number of observations recorded at values equivalent to `value`. Values above the
    /// highest trackable value read the topmost slot.
    pub fn count_at(&self, value: u64) -> T {
        let index = cmp::min(self.index_for(value), self.counts.len() - 1);
        self.counts[index]
    }

    /// Get the number of observations recorded in slots covering `[lowest_equivalent(low),
    /// highest_equivalent(high)]`. Bounds above the highest trackable value are clamped to the
    /// topmost slot; an empty interval (low above high) counts nothing.
    pub fn count_between(&self, low: u64, high: u64) -> u64 {
        let last = self.counts.len() - 1;
        let low_index = cmp::min(self.index_for(low), last);
        let high_index = cmp::min(self.index_for(high), last);
        if low_index > high_index {
            return 0;
        }
        self.counts[low_index..=high_index]
            .iter()
            .map(Counter::as_u64)
            .sum()
    }

    /// Iterate over every counter slot in ascending value order, empty slots included. Yields
    /// one [`iterators::Bucket`] per slot, exactly
    /// [`distinct_values`](Histogram::distinct_values) of them.
    pub fn iter_buckets(&self) -> iterators::Iter<'_, T> {
        iterators::Iter::new(self)
    }
}

// Statistics.

impl<T: Counter> Histogram<T> {
    /// Get the lowest recorded value level in the histogram: the lower bound of the first
    /// non-empty slot. 0 if the histogram is empty.
    pub fn min(&self) -> u64 {
        self.iter_buckets()
            .find(|b| b.count() > 0)
            .map(|b| b.lowest())
            .unwrap_or(0)
    }

    /// Get the highest recorded value level in the histogram: the upper bound of the last
    /// non-empty slot. 0 if the histogram is empty.
    pub fn max(&self) -> u64 {
        self.iter_buckets()
            .filter(|b| b.count() > 0)
            .last()
            .map(|b| b.highest())
            .unwrap_or(0)
    }

    /// Get the mean of all recorded values, each slot represented by its
    /// [`median_equivalent`](Histogram::median_equivalent) value, rounded down to an integer.
    /// 0 if the histogram is empty.
    pub fn mean(&self) -> u64 {
        if self.total_count == 0 {
            return 0;
        }

        let weighted: u128 = self
            .iter_buckets()
            .filter(|b| b.count() > 0)
            .fold(0_u128, |total, b| {
                total.saturating_add(u128::from(b.count()) * u128::from(b.median()))
            });
        (weighted / u128::from(self.total_count)) as u64
    }

    /// Get the standard deviation of all recorded values, rounded down to an integer. 0 if the
    /// histogram is empty.
    pub fn std_dev(&self) -> u64 {
        if self.total_count == 0 {
            return 0;
        }

        let mean = self.mean();
        let sum_of_squares: u128 = self
            .iter_buckets()
            .filter(|b| b.count() > 0)
            .fold(0_u128, |total, b| {
                let dev = u128::from(b.median().abs_diff(mean));
                total.saturating_add(u128::from(b.count()).saturating_mul(dev * dev))
            });
        isqrt(sum_of_squares / u128::from(self.total_count))
    }

    /// Get the values at a batch of percentiles in one pass over the histogram.
    ///
    /// `targets` must be sorted ascending and each within `[0.0, 100.0]`. The result has one
    /// value per target: the upper bound of the first slot at which the running count reaches
    /// the target's share of the total count. A target of 0.0 resolves to the first non-empty
    /// slot (and, like every other target, reports that slot's upper bound); 100.0 resolves to
    /// [`max`](Histogram::max). All results are 0 if the histogram is empty.
    ///
    /// Callers wanting several percentiles (the typical 50/90/99/99.9 spread) should prefer this
    /// over repeated [`value_at_percentile`](Histogram::value_at_percentile) calls: the whole
    /// batch costs one walk of the counter array.
    pub fn percentiles(&self, targets: &[f64]) -> Vec<u64> {
        debug_assert!(
            targets.windows(2).all(|w| w[0] <= w[1]),
            "percentile targets must be sorted ascending"
        );
        debug_assert!(
            targets.iter().all(|p| (0.0..=100.0).contains(p)),
            "percentile targets must be in [0.0, 100.0]"
        );

        if self.total_count == 0 {
            return vec![0; targets.len()];
        }

        let mut results = Vec::with_capacity(targets.len());
        let mut buckets = self.iter_buckets();
        // the smallest layout still has several slots, so the iterator is never empty
        let mut current = buckets.next().expect("histogram has at least one slot");
        let mut cumulative = current.count();

        for &target in targets {
            // round to nearest, and always reach at least the first recorded entry
            let needed = cmp::max(
                ((target / 100.0) * self.total_count as f64 + 0.5) as u64,
                1,
            );
            while cumulative < needed {
                match buckets.next() {
                    Some(bucket) => {
                        cumulative += bucket.count();
                        current = bucket;
                    }
                    None => break,
                }
            }
            results.push(current.highest());
        }
        results
    }

    /// Get the value at a single percentile; equivalent to `percentiles(&[percentile])[0]`.
    /// Percentiles above 100.0 are truncated to 100.0.
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        self.percentiles(&[percentile.min(100.0)])[0]
    }
}

/// Integer square root, rounded down. Newton's method starting from a power-of-two upper bound,
/// which converges monotonically onto the floor.
fn isqrt(n: u128) -> u64 {
    if n < 2 {
        return n as u64;
    }
    let bits = 128 - n.leading_zeros();
    let mut x0 = 1_u128 << ((bits + 1) / 2);
    let mut x1 = (x0 + n / x0) / 2;
    while x1 < x0 {
        x0 = x1;
        x1 = (x0 + n / x0) / 2;
    }
    x0 as u64
}
