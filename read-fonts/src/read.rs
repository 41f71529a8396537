//! Traits for interpreting font data

use crate::font_data::FontData;

/// A type that can be read from raw table data.
///
/// `read` is the validation pass: it checks the structure of the table (header
/// size, declared array lengths against the available bytes) so that the
/// accessors on the returned type can assume a well formed table. Accessors
/// still never read out of bounds; on a table that passed validation they
/// simply never hit their fallbacks.
pub trait FontRead<'a>: Sized {
    fn read(data: FontData<'a>) -> Result<Self, ReadError>;
}

/// A table that has multiple formats.
pub trait Format<T> {
    /// The format value for this table.
    const FORMAT: T;
}

/// An error that occurs when reading font data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    OutOfBounds,
    // i64 is flexible enough to store any value we might encounter
    InvalidFormat(i64),
    InvalidArrayLen,
    ValidationError,
    NullOffset,
    MalformedData(&'static str),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::OutOfBounds => write!(f, "An offset was out of bounds"),
            ReadError::InvalidFormat(x) => write!(f, "Invalid format '{x}'"),
            ReadError::InvalidArrayLen => {
                write!(f, "Specified array length not a multiple of item size")
            }
            ReadError::ValidationError => write!(f, "A validation error occurred"),
            ReadError::NullOffset => write!(f, "An offset was unexpectedly null"),
            ReadError::MalformedData(msg) => write!(f, "Malformed data: '{msg}'"),
        }
    }
}

impl std::error::Error for ReadError {}

/// Resolve a 16-bit offset relative to `data`.
///
/// A zero offset is reported as [`ReadError::NullOffset`].
pub(crate) fn resolve_offset16<'a, T: FontRead<'a>>(
    data: FontData<'a>,
    offset: u16,
) -> Result<T, ReadError> {
    if offset == 0 {
        return Err(ReadError::NullOffset);
    }
    data.split_off(offset as usize)
        .ok_or(ReadError::OutOfBounds)
        .and_then(T::read)
}
