use num_traits as num;
use std::fmt;

/// The operations a histogram needs from its per-slot counter type. `ToPrimitive` widens counts
/// into the running total and the integer statistics; `FromPrimitive` converts decoded wire
/// counts back into the counter type; `Saturating` pins counters at their ceiling instead of
/// wrapping. Partial ordering is used for thresholding, mostly in the percentile scan.
///
/// Implemented for `u16`, `u32` and `u64`. Narrower counters shrink the histogram's footprint
/// proportionally and lower the per-slot saturation ceiling the same way.
pub trait Counter:
    num::Num
    + num::ToPrimitive
    + num::FromPrimitive
    + num::Saturating
    + num::CheckedSub
    + num::CheckedAdd
    + Copy
    + PartialOrd<Self>
    + fmt::Debug
{
    /// Counter as a u64.
    fn as_u64(&self) -> u64;
}

impl Counter for u16 {
    #[inline]
    fn as_u64(&self) -> u64 {
        u64::from(*self)
    }
}

impl Counter for u32 {
    #[inline]
    fn as_u64(&self) -> u64 {
        u64::from(*self)
    }
}

impl Counter for u64 {
    #[inline]
    fn as_u64(&self) -> u64 {
        *self
    }
}
