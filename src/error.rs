use derive_more::derive::{Display, Error};
use embedded_io_async::ErrorKind;

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[expect(missing_docs, reason = "The variants are self-explanatory.")]
#[derive(Debug, Display, Error)]
pub enum Error {
    #[display("Index out of bounds")]
    IndexOutOfBounds,

    #[display("Buffer has length {actual} but the door geometry needs {expected}")]
    BufferLengthMismatch { expected: usize, actual: usize },

    // `#[error(not(source))]` below tells `derive_more` that `ErrorKind` does not implement
    // `core::error::Error`.
    #[display("Serial transport read failed: {_0:?}")]
    TransportRead(#[error(not(source))] ErrorKind),

    #[display("Door geometry has {expected} banks but {actual} output pins were given")]
    BankPinCount { expected: usize, actual: usize },

    #[display("A parallel output drives at most 32 banks, got {_0}")]
    TooManyBanks(#[error(not(source))] usize),
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::TransportRead(kind)
    }
}
