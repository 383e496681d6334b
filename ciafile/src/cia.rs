use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use derivative::Derivative;
use log::{debug, warn};
use static_assertions::const_assert_eq;

use crate::record::{read_bytes, read_record};
use crate::string::until_nul;
use crate::ticket::{read_ticket, SignedTicket};
use crate::{Error, Result};

/// Size of the CIA header, content index included
pub const HEADER_SIZE: usize = 0x2020;
const CONTENT_INDEX_SIZE: usize = 0x2000;
const_assert_eq!(HEADER_SIZE, 0x20 + CONTENT_INDEX_SIZE);

/// Where the serial sits relative to the start of the content section
///
/// Found by looking at real files rather than taken from format documentation.
/// It lines up with the product code of the NCCH header of the first content.
pub const SERIAL_OFFSET: u64 = 336;
/// How many bytes are scanned for the serial
pub const SERIAL_WINDOW: usize = 256;

/// Rounds `what` up to the next multiple of 64
#[must_use]
pub fn align64(what: u64) -> u64 {
    if what % 0x40 != 0 {
        what.saturating_add(0x40 - (what % 0x40))
    } else {
        what
    }
}

/// CIA header, all integers are stored little-endian
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct CiaHeader {
    hdr_size: u32,
    ty: u16,
    version: u16,
    cert_size: u32,
    ticket_size: u32,
    tmd_size: u32,
    meta_size: u32,
    content_size: u64,
    #[derivative(Debug = "ignore")]
    content_index: [u8; CONTENT_INDEX_SIZE],
}

impl CiaHeader {
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut r = Cursor::new(&bytes[..]);
        let header = Self {
            hdr_size: r.read_u32::<LittleEndian>()?,
            ty: r.read_u16::<LittleEndian>()?,
            version: r.read_u16::<LittleEndian>()?,
            cert_size: r.read_u32::<LittleEndian>()?,
            ticket_size: r.read_u32::<LittleEndian>()?,
            tmd_size: r.read_u32::<LittleEndian>()?,
            meta_size: r.read_u32::<LittleEndian>()?,
            content_size: r.read_u64::<LittleEndian>()?,
            content_index: read_bytes(&mut r)?,
        };
        debug_assert_eq!(r.position(), HEADER_SIZE as u64);
        Ok(header)
    }
    /// Reads the header from the start of `reader`
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let raw = read_record::<_, HEADER_SIZE>(reader, Error::TruncatedHeader)?;
        Self::parse(&raw)
    }

    #[must_use] pub fn hdr_size(&self) -> u32 { self.hdr_size }
    #[must_use] pub fn ty(&self) -> u16 { self.ty }
    #[must_use] pub fn version(&self) -> u16 { self.version }
    #[must_use] pub fn cert_size(&self) -> u32 { self.cert_size }
    #[must_use] pub fn ticket_size(&self) -> u32 { self.ticket_size }
    #[must_use] pub fn tmd_size(&self) -> u32 { self.tmd_size }
    #[must_use] pub fn meta_size(&self) -> u32 { self.meta_size }
    #[must_use] pub fn content_size(&self) -> u64 { self.content_size }
    #[must_use] pub fn content_index(&self) -> &[u8; CONTENT_INDEX_SIZE] { &self.content_index }

    /// Checks whether content `idx` is marked present in the content index
    #[must_use]
    pub fn has_content(&self, idx: u16) -> bool {
        let byte = self.content_index[usize::from(idx / 8)];
        byte & (0x80 >> (idx % 8)) != 0
    }
    /// Indexes of all contents marked present
    pub fn contents(&self) -> impl Iterator<Item = u16> + '_ {
        (0..=u16::MAX).filter(|idx| self.has_content(*idx))
    }

    /// Computes where each section starts, every one of them is 64-byte aligned
    #[must_use]
    pub fn offsets(&self) -> SectionOffsets {
        let cert = align64(u64::from(self.hdr_size));
        let ticket = align64(cert.saturating_add(u64::from(self.cert_size)));
        let tmd = align64(ticket.saturating_add(u64::from(self.ticket_size)));
        let content = align64(tmd.saturating_add(u64::from(self.tmd_size)));
        let meta = align64(content.saturating_add(self.content_size));
        let end = align64(meta.saturating_add(u64::from(self.meta_size)));
        SectionOffsets { cert, ticket, tmd, content, meta, end }
    }
}

/// Absolute offsets of the sections of a CIA file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOffsets {
    pub cert: u64,
    pub ticket: u64,
    pub tmd: u64,
    pub content: u64,
    pub meta: u64,
    /// Where the file should end according to the header
    pub end: u64,
}

/// What gets shown to the user before sending a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiaMetadata {
    pub title_id: u64,
    pub serial: String,
}

/// Problems that were noticed while decoding, but didn't stop it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The header describes a file of a different size than the real one
    SizeMismatch { expected: u64, actual: u64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "Header describes a {expected} byte file, but the file is {actual} bytes"
            ),
        }
    }
}

/// Result of decoding a CIA file
#[derive(Debug, Clone)]
pub struct Decoded {
    header: CiaHeader,
    offsets: SectionOffsets,
    ticket: SignedTicket,
    metadata: CiaMetadata,
    diagnostics: Vec<Diagnostic>,
}

impl Decoded {
    pub fn header(&self) -> &CiaHeader { &self.header }
    pub fn offsets(&self) -> SectionOffsets { self.offsets }
    pub fn ticket(&self) -> &SignedTicket { &self.ticket }
    pub fn metadata(&self) -> &CiaMetadata { &self.metadata }
    pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }
    pub fn into_metadata(self) -> CiaMetadata { self.metadata }
}

/// Decodes the title id and serial of a CIA file
///
/// A file size that doesn't match the header is reported in
/// [`Decoded::diagnostics`] instead of failing, and a serial that can't be read
/// is left empty.
pub fn decode<R: Read + Seek>(source: &mut R) -> Result<Decoded> {
    let header = CiaHeader::read(source)?;
    let offsets = header.offsets();
    debug!("Section offsets: {offsets:x?}");

    let mut diagnostics = Vec::new();
    let actual = source.seek(SeekFrom::End(0))?;
    if actual != offsets.end {
        let diag = Diagnostic::SizeMismatch { expected: offsets.end, actual };
        debug!("{diag}");
        diagnostics.push(diag);
    }

    let ticket = read_ticket(source, offsets.ticket)?;
    let serial = read_content_serial(source, offsets.content);

    Ok(Decoded {
        metadata: CiaMetadata {
            title_id: ticket.title_id(),
            serial,
        },
        header,
        offsets,
        ticket,
        diagnostics,
    })
}

/// Opens and decodes the CIA file at `path`
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Decoded> {
    let mut file = File::open(path)?;
    decode(&mut file)
}

/// Like [`decode_file`], but gives back a zero title id and an empty serial on failure
pub fn title_serial<P: AsRef<Path>>(path: P) -> CiaMetadata {
    let path = path.as_ref();
    match decode_file(path) {
        Ok(decoded) => decoded.into_metadata(),
        Err(e) => {
            warn!("Could not determine metadata of {}: {e}", path.display());
            CiaMetadata::default()
        }
    }
}

/// Reads the serial out of the content section starting at `content_offset`
///
/// Never fails, any I/O error gives an empty serial.
pub fn read_content_serial<R: Read + Seek>(reader: &mut R, content_offset: u64) -> String {
    match try_read_content_serial(reader, content_offset) {
        Ok(serial) => serial,
        Err(e) => {
            debug!("Couldn't read content serial: {e}");
            String::new()
        }
    }
}

fn try_read_content_serial<R: Read + Seek>(reader: &mut R, content_offset: u64) -> io::Result<String> {
    reader.seek(SeekFrom::Start(content_offset.saturating_add(SERIAL_OFFSET)))?;
    let mut window = Vec::with_capacity(SERIAL_WINDOW);
    reader.by_ref().take(SERIAL_WINDOW as u64).read_to_end(&mut window)?;
    Ok(String::from_utf8_lossy(until_nul(&window)).into_owned())
}
