//! Conversion between scalar values and their big-endian byte form.

/// A value that has a fixed-width big-endian encoding in font data.
///
/// Implemented for the integer primitives and for every scalar in this crate.
/// Parsing code never reads one of these types directly; it reads the raw bytes
/// and converts them with [`Scalar::from_raw`].
pub trait Scalar: Sized {
    /// The raw byte array for this type, in big-endian order.
    type Raw: Copy + Default + AsRef<[u8]> + AsMut<[u8]>;

    /// Decode a value from its big-endian bytes.
    fn from_raw(raw: Self::Raw) -> Self;

    /// Encode this value as big-endian bytes.
    fn to_raw(self) -> Self::Raw;

    /// Decode a value from the front of `bytes`, if there are enough of them.
    fn read(bytes: &[u8]) -> Option<Self> {
        let mut raw = Self::Raw::default();
        let dest = raw.as_mut();
        let src = bytes.get(..dest.len())?;
        dest.copy_from_slice(src);
        Some(Self::from_raw(raw))
    }
}

/// Types with a known encoded length.
pub trait FixedSize: Sized {
    /// The number of bytes used to encode this type.
    const RAW_BYTE_LEN: usize;
}

impl<T: Scalar> FixedSize for T {
    const RAW_BYTE_LEN: usize = std::mem::size_of::<T::Raw>();
}

/// The raw bytes of some scalar, in the order they appear in the font.
///
/// This is useful for keeping data in its on-disk form while still being able
/// to read typed values out of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct BigEndian<T: Scalar>(pub(crate) T::Raw);

impl<T: Scalar> BigEndian<T> {
    /// Wrap an already encoded value.
    pub fn from_bytes(raw: T::Raw) -> Self {
        BigEndian(raw)
    }

    /// Decode the wrapped value.
    pub fn get(&self) -> T {
        T::from_raw(self.0)
    }

    /// Overwrite the wrapped bytes with a new value.
    pub fn set(&mut self, value: T) {
        self.0 = value.to_raw();
    }

    /// The underlying big-endian bytes.
    pub fn be_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<T: Scalar> From<T> for BigEndian<T> {
    fn from(value: T) -> Self {
        BigEndian(value.to_raw())
    }
}

impl<T: Scalar + std::fmt::Debug> std::fmt::Debug for BigEndian<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.get().fmt(f)
    }
}

/// Implement [`Scalar`] for a newtype around some other scalar.
#[macro_export]
macro_rules! newtype_scalar {
    ($name:ident, $raw:ty) => {
        impl $crate::Scalar for $name {
            type Raw = $raw;

            fn from_raw(raw: $raw) -> Self {
                Self($crate::Scalar::from_raw(raw))
            }

            fn to_raw(self) -> $raw {
                $crate::Scalar::to_raw(self.0)
            }
        }
    };
}

macro_rules! int_scalar {
    ($ty:ty, $len:literal) => {
        impl Scalar for $ty {
            type Raw = [u8; $len];

            fn from_raw(raw: [u8; $len]) -> Self {
                <$ty>::from_be_bytes(raw)
            }

            fn to_raw(self) -> [u8; $len] {
                self.to_be_bytes()
            }
        }
    };
}

int_scalar!(u8, 1);
int_scalar!(i8, 1);
int_scalar!(u16, 2);
int_scalar!(i16, 2);
int_scalar!(u32, 4);
int_scalar!(i32, 4);
int_scalar!(u64, 8);
int_scalar!(i64, 8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_short_input() {
        assert_eq!(u16::read(&[0x12]), None);
        assert_eq!(u16::read(&[0x12, 0x34, 0x56]), Some(0x1234));
        assert_eq!(i16::read(&[0xff, 0xfe]), Some(-2));
    }

    #[test]
    fn wrapper_roundtrip() {
        let mut val = BigEndian::<u32>::from(0xdead_beef);
        assert_eq!(val.be_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
        val.set(7);
        assert_eq!(val.get(), 7);
        assert_eq!(<i32 as FixedSize>::RAW_BYTE_LEN, 4);
    }
}
