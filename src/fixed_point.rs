use crate::error::{Error, Result};

/// Fixed-point precision in bits.
pub const FIXED_POINT_PRECISION: u32 = 16;

/// Largest magnitude accepted for embedding. Sums and differences of two embedded
/// values stay below `2^63`, so the sign bit of a difference is meaningful.
const MAX_MAGNITUDE: f64 = (1u64 << 46) as f64;

const SCALE: f64 = (1u64 << FIXED_POINT_PRECISION) as f64;

pub trait EmbedFixedPoint {
    fn embed(self) -> Result<u64>;
}

impl EmbedFixedPoint for f64 {
    fn embed(self) -> Result<u64> {
        embed_fixed_point(self)
    }
}

pub trait ToFixedPoint {
    fn to_fixed_point(self) -> f64;
}

impl ToFixedPoint for u64 {
    fn to_fixed_point(self) -> f64 {
        to_fixed_point(self)
    }
}

/// Embed `x` into the ring `Z_2^64` as a two's complement value with
/// [`FIXED_POINT_PRECISION`] fractional bits.
pub fn embed_fixed_point(x: f64) -> Result<u64> {
    if x.is_finite() && x.abs() < MAX_MAGNITUDE {
        Ok((x * SCALE).round() as i64 as u64)
    } else {
        Err(Error::FixedPointEmbedding(x))
    }
}

pub fn to_fixed_point(embedded: u64) -> f64 {
    embedded as i64 as f64 / SCALE
}
