//! Streaming a file to a console listening for it.
//!
//! The protocol is as small as it gets: the size of the file as a big-endian
//! u64, followed by the file itself. Nothing is sent back.

use std::io::{self, Read, Write};

use log::trace;

use crate::TransmitError;

/// How much of the file is read and sent at once
pub const CHUNK_SIZE: usize = 128 * 1024;

/// Receives the number of bytes sent after every chunk
pub trait Progress {
    fn advance(&mut self, bytes: u64);
}

impl<F: FnMut(u64)> Progress for F {
    fn advance(&mut self, bytes: u64) {
        self(bytes)
    }
}

/// Sends `size` followed by everything `source` yields until end of file
///
/// Returns the number of file bytes sent. A chunk that is only partially
/// written aborts the transfer, and nothing after it is sent. Reads and writes
/// failing with [`io::ErrorKind::Interrupted`] are reissued.
pub fn transmit<R, W, P>(source: &mut R, size: u64, stream: &mut W, progress: &mut P) -> Result<u64, TransmitError>
where
    R: Read,
    W: Write,
    P: Progress,
{
    stream
        .write_all(&size.to_be_bytes())
        .map_err(TransmitError::Header)?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut sent = 0u64;
    loop {
        let read = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransmitError::Read(e)),
        };

        let written = loop {
            match stream.write(&buf[..read]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransmitError::Write(e)),
            }
        };
        sent += written as u64;
        progress.advance(written as u64);
        trace!("Sent chunk of {written} bytes, {sent} total");

        if written != read {
            return Err(TransmitError::PartialWrite {
                written,
                expected: read,
            });
        }
    }

    stream.flush().map_err(TransmitError::Write)?;
    Ok(sent)
}
