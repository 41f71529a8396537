//! A growable byte sink for writing subset tables

use font_types::Scalar;

/// Errors raised while serializing a table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SerializeErrorFlags(u16);

impl SerializeErrorFlags {
    pub const SERIALIZE_ERROR_NONE: Self = Self(0x0000);
    pub const SERIALIZE_ERROR_OTHER: Self = Self(0x0001);
    pub const SERIALIZE_ERROR_INT_OVERFLOW: Self = Self(0x0002);
    pub const SERIALIZE_ERROR_OUT_OF_ROOM: Self = Self(0x0004);
    pub const SERIALIZE_ERROR_READ_ERROR: Self = Self(0x0008);

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOrAssign for SerializeErrorFlags {
    fn bitor_assign(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// A position in the output that can be returned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    len: usize,
}

/// Writes big-endian data into an owned buffer.
///
/// Once an error is recorded every further write fails with the same error,
/// so callers can chain writes with `?` and check once at the end.
#[derive(Debug, Default)]
pub struct Serializer {
    data: Vec<u8>,
    errors: SerializeErrorFlags,
    max_size: Option<usize>,
}

impl Serializer {
    pub fn new() -> Self {
        Default::default()
    }

    /// A serializer that fails with `SERIALIZE_ERROR_OUT_OF_ROOM` past `max_size` bytes.
    pub fn with_max_size(max_size: usize) -> Self {
        Serializer {
            max_size: Some(max_size),
            ..Default::default()
        }
    }

    pub fn length(&self) -> usize {
        self.data.len()
    }

    pub fn in_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error(&self) -> SerializeErrorFlags {
        self.errors
    }

    fn set_err(&mut self, err: SerializeErrorFlags) -> SerializeErrorFlags {
        self.errors |= err;
        err
    }

    fn check_room(&mut self, len: usize) -> Result<(), SerializeErrorFlags> {
        if self.in_error() {
            return Err(self.errors);
        }
        if self
            .max_size
            .is_some_and(|max| self.data.len().saturating_add(len) > max)
        {
            return Err(self.set_err(SerializeErrorFlags::SERIALIZE_ERROR_OUT_OF_ROOM));
        }
        Ok(())
    }

    /// Append a scalar, returning its position in the output.
    pub fn embed(&mut self, obj: impl Scalar) -> Result<usize, SerializeErrorFlags> {
        let raw = obj.to_raw();
        self.embed_bytes(raw.as_ref())
    }

    /// Append raw bytes, returning their position in the output.
    pub fn embed_bytes(&mut self, bytes: &[u8]) -> Result<usize, SerializeErrorFlags> {
        self.check_room(bytes.len())?;
        let pos = self.data.len();
        self.data.extend_from_slice(bytes);
        Ok(pos)
    }

    /// Overwrite a previously embedded `u16` with a value that must fit.
    pub fn check_assign_u16(
        &mut self,
        pos: usize,
        value: usize,
    ) -> Result<(), SerializeErrorFlags> {
        let Ok(value) = u16::try_from(value) else {
            return Err(self.set_err(SerializeErrorFlags::SERIALIZE_ERROR_INT_OVERFLOW));
        };
        match self.data.get_mut(pos..pos + 2) {
            Some(slot) => {
                slot.copy_from_slice(&value.to_be_bytes());
                Ok(())
            }
            None => Err(self.set_err(SerializeErrorFlags::SERIALIZE_ERROR_OTHER)),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            len: self.data.len(),
        }
    }

    /// Drop everything written since `snap`.
    pub fn revert(&mut self, snap: Snapshot) {
        if self.in_error() {
            return;
        }
        self.data.truncate(snap.len);
    }

    pub fn copy_bytes(self) -> Result<Vec<u8>, SerializeErrorFlags> {
        if self.in_error() {
            return Err(self.errors);
        }
        Ok(self.data)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn embed_and_revert() {
        let mut s = Serializer::new();
        assert_eq!(s.embed(1u16), Ok(0));
        let snap = s.snapshot();
        s.embed(0xdeadbeef_u32).unwrap();
        assert_eq!(s.length(), 6);
        s.revert(snap);
        s.embed_bytes(&[7]).unwrap();
        assert_eq!(s.copy_bytes().unwrap(), vec![0, 1, 7]);
    }

    #[test]
    fn errors_are_sticky() {
        let mut s = Serializer::with_max_size(3);
        s.embed(1u16).unwrap();
        assert_eq!(
            s.embed(2u16),
            Err(SerializeErrorFlags::SERIALIZE_ERROR_OUT_OF_ROOM)
        );
        assert!(s.embed_bytes(&[]).is_err());
        assert!(s.in_error());
        assert!(s.copy_bytes().is_err());
    }

    #[test]
    fn check_assign_overflow() {
        let mut s = Serializer::new();
        let pos = s.embed(0u16).unwrap();
        s.check_assign_u16(pos, 513).unwrap();
        assert_eq!(
            s.check_assign_u16(pos, 70_000),
            Err(SerializeErrorFlags::SERIALIZE_ERROR_INT_OVERFLOW)
        );
    }
}
