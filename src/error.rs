//! Error taxonomy (spec §7): argument, I/O, capacity, accelerator, and
//! transfer errors. No retries anywhere — a phase either hands off or the
//! process exits.

use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Bad numeric range or missing required flag.
    Argument(String),
    /// Missing file, unparseable header, or other I/O failure.
    Io(std::io::Error),
    /// A configured size exceeds what the simulated fabric can hold.
    Capacity(String),
    /// An accelerator-side invariant was violated (scratchpad assertion,
    /// recursion depth past `STACK_DEPTH`).
    Accelerator(String),
    /// A host-to-accelerator transfer failed.
    Transfer(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Argument(msg) => write!(f, "invalid argument: {msg}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Capacity(msg) => write!(f, "capacity violation: {msg}"),
            Error::Accelerator(msg) => write!(f, "accelerator fault: {msg}"),
            Error::Transfer(msg) => write!(f, "transfer failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
