use std::error;
use std::fmt;

/// The numeric value of a single `Point` field.
///
/// This is a closed set. Every integer kind differences as an integer of its
/// own width and signedness; `F64` is carried along but never differenced.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F64(f64),
}

/// Returned by `FieldValue::delta` when the previous observation of a field
/// was recorded with a different numeric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMismatch {
    /// Kind of the value being differenced.
    pub current: &'static str,
    /// Kind of the value it was differenced against.
    pub previous: &'static str,
}

impl fmt::Display for KindMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "cannot difference {} against previous {}",
            self.current, self.previous
        )
    }
}

impl error::Error for KindMismatch {
    fn description(&self) -> &str {
        "numeric kind changed between observations"
    }
}

// Subtraction wraps at the kind's width, exactly as the counter itself would.
// A factor of 1.0 skips the float round-trip so large deltas stay exact;
// otherwise the scaled float is truncated toward zero and saturates into the
// kind's range.
macro_rules! scaled_delta {
    ($cur:expr, $prev:expr, $factor:expr, $ty:ty) => {{
        let diff: $ty = $cur.wrapping_sub($prev);
        if $factor == 1.0 {
            diff
        } else {
            (diff as f64 * $factor) as $ty
        }
    }};
}

macro_rules! from_primitive {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for FieldValue {
            fn from(val: $ty) -> FieldValue {
                FieldValue::$variant(val)
            }
        }
    };
}

from_primitive!(i8, I8);
from_primitive!(i16, I16);
from_primitive!(i32, I32);
from_primitive!(i64, I64);
from_primitive!(isize, Isize);
from_primitive!(u8, U8);
from_primitive!(u16, U16);
from_primitive!(u32, U32);
from_primitive!(u64, U64);
from_primitive!(usize, Usize);
from_primitive!(f64, F64);

impl FieldValue {
    /// Name of the numeric kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match *self {
            FieldValue::I8(_) => "i8",
            FieldValue::I16(_) => "i16",
            FieldValue::I32(_) => "i32",
            FieldValue::I64(_) => "i64",
            FieldValue::Isize(_) => "isize",
            FieldValue::U8(_) => "u8",
            FieldValue::U16(_) => "u16",
            FieldValue::U32(_) => "u32",
            FieldValue::U64(_) => "u64",
            FieldValue::Usize(_) => "usize",
            FieldValue::F64(_) => "f64",
        }
    }

    /// Compute `self - previous`, scaled by `factor`, in self's kind.
    ///
    /// Floating point values are returned as-is: they are never differenced.
    pub fn delta(&self, previous: &FieldValue, factor: f64) -> Result<FieldValue, KindMismatch> {
        use self::FieldValue::*;
        let res = match (*self, *previous) {
            (I8(c), I8(p)) => I8(scaled_delta!(c, p, factor, i8)),
            (I16(c), I16(p)) => I16(scaled_delta!(c, p, factor, i16)),
            (I32(c), I32(p)) => I32(scaled_delta!(c, p, factor, i32)),
            (I64(c), I64(p)) => I64(scaled_delta!(c, p, factor, i64)),
            (Isize(c), Isize(p)) => Isize(scaled_delta!(c, p, factor, isize)),
            (U8(c), U8(p)) => U8(scaled_delta!(c, p, factor, u8)),
            (U16(c), U16(p)) => U16(scaled_delta!(c, p, factor, u16)),
            (U32(c), U32(p)) => U32(scaled_delta!(c, p, factor, u32)),
            (U64(c), U64(p)) => U64(scaled_delta!(c, p, factor, u64)),
            (Usize(c), Usize(p)) => Usize(scaled_delta!(c, p, factor, usize)),
            (F64(c), F64(_)) => F64(c),
            (c, p) => {
                return Err(KindMismatch {
                    current: c.kind(),
                    previous: p.kind(),
                })
            }
        };
        Ok(res)
    }
}

/// InfluxDB stores integer fields as int64. Unsigned values past that range,
/// such as a wrapped delta of a shrinking gauge, are pinned to `i64::MAX`.
fn clamp_unsigned(v: u64) -> u64 {
    let max = i64::max_value() as u64;
    if v > max {
        max
    } else {
        v
    }
}

/// Renders the value the way InfluxDB line protocol expects it: integers
/// carry an `i` suffix, floats are bare.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FieldValue::I8(v) => write!(f, "{}i", v),
            FieldValue::I16(v) => write!(f, "{}i", v),
            FieldValue::I32(v) => write!(f, "{}i", v),
            FieldValue::I64(v) => write!(f, "{}i", v),
            FieldValue::Isize(v) => write!(f, "{}i", v),
            FieldValue::U8(v) => write!(f, "{}i", v),
            FieldValue::U16(v) => write!(f, "{}i", v),
            FieldValue::U32(v) => write!(f, "{}i", v),
            FieldValue::U64(v) => write!(f, "{}i", clamp_unsigned(v)),
            FieldValue::Usize(v) => write!(f, "{}i", clamp_unsigned(v as u64)),
            FieldValue::F64(v) => write!(f, "{}", v),
        }
    }
}
