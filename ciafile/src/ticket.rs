use std::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::record::{read_bytes, read_record, skip};
use crate::signature::SignatureType;
use crate::string::SizedCString;
use crate::titleid::TitleId;
use crate::{Error, Result};

use byteorder::{BigEndian, ReadBytesExt};
use derivative::Derivative;
use log::debug;
use static_assertions::const_assert_eq;

/// Size of the ticket body that follows the signature
pub const TICKET_SIZE: usize = 0x210;

/// Offset of the title id within the ticket body
pub const TITLE_ID_OFFSET: usize = 0x9c;

const_assert_eq!(
    TICKET_SIZE,
    0x40 + 0x3c + 3 + 0x10 + 1 + 8 + 4 + 8 + 2 + 2 + 8 + 2 + 0x2a + 4 + 2 + 0x42 + 0x40 + 0xac
);

fn hex_bytes<T: AsRef<[u8]>>(bytes: &T, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&hex::encode(bytes.as_ref()))
}

/// Ticket body, all integers are stored big-endian
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Ticket {
    issuer: SizedCString<0x40>,
    #[derivative(Debug(format_with = "hex_bytes"))]
    ecc_pubkey: [u8; 0x3c],
    version: u8,
    ca_crl_version: u8,
    signer_crl_version: u8,
    #[derivative(Debug(format_with = "hex_bytes"))]
    title_key: [u8; 0x10],
    ticket_id: u64,
    console_id: u32,
    title_id: u64,
    ticket_title_version: u16,
    license_type: u8,
    key_index: u8,
    eshop_account_id: u32,
    audit: u8,
    #[derivative(Debug = "ignore")]
    limits: [u8; 0x40],
    #[derivative(Debug = "ignore")]
    content_index: [u8; 0xac],
}

impl Ticket {
    pub fn parse(bytes: &[u8; TICKET_SIZE]) -> Result<Self> {
        let mut r = Cursor::new(&bytes[..]);
        let issuer = SizedCString::from(read_bytes::<_, 0x40>(&mut r)?);
        let ecc_pubkey = read_bytes(&mut r)?;
        let version = r.read_u8()?;
        let ca_crl_version = r.read_u8()?;
        let signer_crl_version = r.read_u8()?;
        let title_key = read_bytes(&mut r)?;
        skip::<_, 1>(&mut r)?;
        let ticket_id = r.read_u64::<BigEndian>()?;
        let console_id = r.read_u32::<BigEndian>()?;
        let title_id = r.read_u64::<BigEndian>()?;
        skip::<_, 2>(&mut r)?;
        let ticket_title_version = r.read_u16::<BigEndian>()?;
        skip::<_, 8>(&mut r)?;
        let license_type = r.read_u8()?;
        let key_index = r.read_u8()?;
        skip::<_, 0x2a>(&mut r)?;
        let eshop_account_id = r.read_u32::<BigEndian>()?;
        skip::<_, 1>(&mut r)?;
        let audit = r.read_u8()?;
        skip::<_, 0x42>(&mut r)?;
        let limits = read_bytes(&mut r)?;
        let content_index = read_bytes(&mut r)?;
        debug_assert_eq!(r.position(), TICKET_SIZE as u64);

        Ok(Self {
            issuer,
            ecc_pubkey,
            version,
            ca_crl_version,
            signer_crl_version,
            title_key,
            ticket_id,
            console_id,
            title_id,
            ticket_title_version,
            license_type,
            key_index,
            eshop_account_id,
            audit,
            limits,
            content_index,
        })
    }

    pub fn issuer(&self) -> &SizedCString<0x40> { &self.issuer }
    pub fn ecc_pubkey(&self) -> &[u8; 0x3c] { &self.ecc_pubkey }
    pub fn version(&self) -> u8 { self.version }
    pub fn ca_crl_version(&self) -> u8 { self.ca_crl_version }
    pub fn signer_crl_version(&self) -> u8 { self.signer_crl_version }
    /// Title key as stored, still encrypted with the common key
    pub fn title_key_raw(&self) -> &[u8; 0x10] { &self.title_key }
    pub fn ticket_id(&self) -> u64 { self.ticket_id }
    pub fn console_id(&self) -> u32 { self.console_id }
    /// The title id this ticket grants rights for
    pub fn title_id(&self) -> u64 { self.title_id }
    pub fn title_id_parts(&self) -> Result<TitleId> { TitleId::from_u64(self.title_id) }
    pub fn ticket_title_version(&self) -> u16 { self.ticket_title_version }
    pub fn license_type(&self) -> u8 { self.license_type }
    pub fn key_index(&self) -> u8 { self.key_index }
    pub fn eshop_account_id(&self) -> u32 { self.eshop_account_id }
    pub fn audit(&self) -> u8 { self.audit }
    pub fn limits(&self) -> &[u8; 0x40] { &self.limits }
    pub fn content_index(&self) -> &[u8; 0xac] { &self.content_index }
}

/// A ticket together with the signature scheme it was found behind
#[derive(Debug, Clone)]
pub struct SignedTicket {
    sig_type: SignatureType,
    ticket: Ticket,
}

impl SignedTicket {
    pub fn sig_type(&self) -> SignatureType { self.sig_type }
    pub fn ticket(&self) -> &Ticket { &self.ticket }
    pub fn title_id(&self) -> u64 { self.ticket.title_id }
}

/// Reads the ticket that starts at `offset`
///
/// The signature type in front of the ticket decides where its body starts.
/// Unknown signature types are rejected before anything past the type is read.
pub fn read_ticket<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<SignedTicket> {
    reader.seek(SeekFrom::Start(offset))?;
    let tag = u32::from_be_bytes(read_record(reader, Error::TruncatedTicket)?);
    let sig_type = SignatureType::from_tag(tag).ok_or(Error::UnknownSignatureType(tag))?;

    let body = offset + sig_type.body_offset();
    debug!("Ticket signed with {sig_type}, body at {body:#x}");

    reader.seek(SeekFrom::Start(body))?;
    let raw = read_record::<_, TICKET_SIZE>(reader, Error::TruncatedTicket)?;

    Ok(SignedTicket {
        sig_type,
        ticket: Ticket::parse(&raw)?,
    })
}
