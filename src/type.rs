use std::fmt::Debug;

use num_traits::{Bounded, Num, NumCast};

/// A trait for scalar types that can be used as point coordinates.
///
/// The blanket impl covers the primitive integer and float types. Squared
/// distances are accumulated in the coordinate type itself, so the type must
/// be wide enough to hold `dim * max_coord * max_coord` without overflow.
pub trait CoordNum:
    Num + NumCast + Bounded + PartialOrd + Copy + Debug + Send + Sync + 'static
{
}

impl<T> CoordNum for T where
    T: Num + NumCast + Bounded + PartialOrd + Copy + Debug + Send + Sync + 'static
{
}
