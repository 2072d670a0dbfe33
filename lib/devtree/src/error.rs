use core::fmt::{self, Display};

/// Errors met while reading a flattened device tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtbError {
    /// The header does not start with `0xd00dfeed`.
    BadMagic(u32),
    /// The blob ends before `needed` bytes.
    Truncated { needed: usize, available: usize },
    /// Header offsets point outside the blob.
    BadLayout,
    /// Unknown or misplaced structure token.
    BadToken { offset: usize, token: u32 },
    /// A node or property name is not a terminated UTF-8 string.
    BadString { offset: usize },
    /// Nodes nest deeper than the scanner tracks.
    TooDeep,
    /// The relocation destination cannot hold the blob.
    OutputTooSmall { needed: usize, available: usize },
}

pub type DtbResult<T> = Result<T, DtbError>;

impl Display for DtbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DtbError::BadMagic(magic) => write!(f, "bad device tree magic {magic:#x}"),
            DtbError::Truncated { needed, available } => {
                write!(f, "device tree truncated: need {needed} bytes, have {available}")
            }
            DtbError::BadLayout => write!(f, "device tree header offsets out of range"),
            DtbError::BadToken { offset, token } => {
                write!(f, "unexpected token {token:#x} at offset {offset:#x}")
            }
            DtbError::BadString { offset } => write!(f, "malformed string at offset {offset:#x}"),
            DtbError::TooDeep => write!(f, "device tree nests too deep"),
            DtbError::OutputTooSmall { needed, available } => {
                write!(f, "relocation needs {needed} bytes, destination has {available}")
            }
        }
    }
}
