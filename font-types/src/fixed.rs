//! fixed-point numerical types

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

macro_rules! fixed_impl {
    ($name:ident, $bits:literal, $fract_bits:literal, $ty:ty, $raw_len:literal) => {
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "bytemuck", derive(bytemuck::AnyBitPattern))]
        #[repr(transparent)]
        #[doc = concat!(stringify!($bits), "-bit signed fixed point number with ", stringify!($fract_bits), " bits of fraction.")]
        pub struct $name($ty);

        impl $name {
            pub const MIN: Self = Self(<$ty>::MIN);
            pub const MAX: Self = Self(<$ty>::MAX);
            pub const ZERO: Self = Self(0);
            pub const ONE: Self = Self(1 << $fract_bits);
            /// The smallest step between two values.
            pub const EPSILON: Self = Self(1);

            const INT_MASK: $ty = !0 << $fract_bits;
            const ROUND: $ty = 1 << ($fract_bits - 1);
            const FRACT_BITS: u32 = $fract_bits;

            /// Wrap the raw bits of a fixed point value.
            pub const fn from_bits(bits: $ty) -> Self {
                Self(bits)
            }

            /// The raw bits of this value.
            pub const fn to_bits(self) -> $ty {
                self.0
            }

            /// Round to the nearest integer, ties away from zero for positive values.
            pub fn round(self) -> Self {
                Self(self.0.wrapping_add(Self::ROUND) & Self::INT_MASK)
            }

            pub fn floor(self) -> Self {
                Self(self.0 & Self::INT_MASK)
            }

            pub fn abs(self) -> Self {
                Self(self.0.wrapping_abs())
            }

            pub fn saturating_add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            pub fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, other: Self) -> Self {
                Self(self.0.wrapping_add(other.0))
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, other: Self) {
                *self = *self + other;
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, other: Self) -> Self {
                Self(self.0.wrapping_sub(other.0))
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, other: Self) {
                *self = *self - other;
            }
        }

        impl Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                Self(self.0.wrapping_neg())
            }
        }

        impl Mul for $name {
            type Output = Self;
            /// Fixed point multiplication, rounding to nearest.
            fn mul(self, other: Self) -> Self {
                let wide = self.0 as i64 * other.0 as i64;
                let rounded = (wide + (1 << (Self::FRACT_BITS - 1))) >> Self::FRACT_BITS;
                Self(rounded as $ty)
            }
        }

        impl crate::Scalar for $name {
            type Raw = [u8; $raw_len];

            fn from_raw(raw: [u8; $raw_len]) -> Self {
                Self(<$ty>::from_be_bytes(raw))
            }

            fn to_raw(self) -> [u8; $raw_len] {
                self.0.to_be_bytes()
            }
        }
    };
}

// Floats round to the nearest representable value; going back to a float is lossless.
macro_rules! float_conv {
    ($name:ident, $to:ident, $from:ident, $float:ty) => {
        impl $name {
            #[doc = concat!("Creates a fixed point value from an `", stringify!($float), "`, rounding to nearest.")]
            pub fn $from(x: $float) -> Self {
                Self((x * Self::ONE.0 as $float).round() as _)
            }

            #[doc = concat!("Returns the value as an `", stringify!($float), "`.")]
            pub fn $to(self) -> $float {
                self.0 as $float / Self::ONE.0 as $float
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.$to().fmt(f)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.$to().fmt(f)
            }
        }
    };
}

fixed_impl!(F2Dot14, 16, 14, i16, 2);
fixed_impl!(Fixed, 32, 16, i32, 4);
float_conv!(F2Dot14, to_f32, from_f32, f32);
float_conv!(Fixed, to_f64, from_f64, f64);

impl Fixed {
    /// Converts from a float, rounding to nearest.
    pub fn from_f32(x: f32) -> Self {
        Self::from_f64(x as f64)
    }

    pub fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }

    pub const fn from_i32(x: i32) -> Self {
        Self(x << 16)
    }

    /// The integer part, rounded to nearest.
    pub fn to_i32(self) -> i32 {
        self.round().0 >> 16
    }

    /// Convert a 16.16 value to 2.14, dropping the low bits.
    pub fn to_f2dot14(self) -> F2Dot14 {
        F2Dot14(((self.0.wrapping_add(2)) >> 2) as i16)
    }
}

impl F2Dot14 {
    /// Widen to 16.16.
    pub fn to_fixed(self) -> Fixed {
        Fixed(self.0 as i32 * 4)
    }
}

#[cfg(test)]
mod tests {
    #![allow(overflowing_literals)]
    use super::*;

    #[test]
    fn f2dot14_floats() {
        assert_eq!(F2Dot14(0x7fff), F2Dot14::from_f32(1.999939));
        assert_eq!(F2Dot14(0x7000), F2Dot14::from_f32(1.75));
        assert_eq!(F2Dot14(0x0000), F2Dot14::from_f32(0.0));
        assert_eq!(F2Dot14(0xffff), F2Dot14::from_f32(-0.000061));
        assert_eq!(F2Dot14(0x8000), F2Dot14::from_f32(-2.0));
    }

    #[test]
    fn fixed_floats() {
        assert_eq!(Fixed(0x7fff_0000), Fixed::from_f64(32767.));
        assert_eq!(Fixed(0x0001_0000), Fixed::from_f64(1.0));
        assert_eq!(Fixed(0x0001_8000), Fixed::from_f32(1.5));
        assert_eq!(Fixed::from_i32(-3).to_f64(), -3.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(Fixed(0x0001_7fff).round(), Fixed(0x0001_0000));
        assert_eq!(Fixed(0x0001_8000).round(), Fixed(0x0002_0000));
        assert_eq!(Fixed::from_f64(399.6).to_i32(), 400);
    }

    #[test]
    fn multiply() {
        let half = Fixed::from_f64(0.5);
        assert_eq!(Fixed::from_i32(300) * half, Fixed::from_i32(150));
        assert_eq!(F2Dot14::from_f32(0.5) * F2Dot14::from_f32(0.5), F2Dot14::from_f32(0.25));
    }

    #[test]
    fn widen_and_narrow() {
        let val = F2Dot14::from_f32(-0.75);
        assert_eq!(val.to_fixed().to_f2dot14(), val);
    }
}
