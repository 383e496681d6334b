use std::io;

use thiserror::Error;

/// Catch-all error type for decoding CIA files
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    #[error("File is too short to hold a CIA header")]
    TruncatedHeader,
    #[error("File is too short to hold the ticket")]
    TruncatedTicket,
    #[error("Unknown signature type {0:#x}")]
    UnknownSignatureType(u32),
    #[error("Value out of range for {0} enum")]
    EnumValueOutOfRange(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Ways sending a file to the console can fail
///
/// None of these are retried, the transfer is simply aborted.
#[derive(Error, Debug)]
pub enum TransmitError {
    #[error("Failed to send file size: {0}")]
    Header(#[source] io::Error),
    #[error("Failed to read source file: {0}")]
    Read(#[source] io::Error),
    #[error("Failed to send file data: {0}")]
    Write(#[source] io::Error),
    #[error("Partial write: sent {written} out of {expected} bytes")]
    PartialWrite { written: usize, expected: usize },
}
