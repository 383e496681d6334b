//! Helpers for fixed layout records.
//!
//! Records are read whole first, so a short read can be told apart from other
//! I/O errors, and then decoded field by field with `byteorder` over a cursor.

use std::io::{self, Read};

use crate::{Error, Result};

/// Reads exactly `N` bytes, turning a short read into `truncated`
pub fn read_record<R: Read, const N: usize>(reader: &mut R, truncated: Error) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(truncated),
        Err(e) => Err(e.into()),
    }
}

/// Reads a fixed size byte field
pub fn read_bytes<R: Read, const N: usize>(reader: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Skips over a reserved field
pub fn skip<R: Read, const N: usize>(reader: &mut R) -> io::Result<()> {
    read_bytes::<_, N>(reader).map(drop)
}
