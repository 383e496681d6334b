use std::io::{Cursor, Write};
use std::sync::{Mutex, Once};

use ciafile::cia::{self, HEADER_SIZE, SERIAL_OFFSET, SERIAL_WINDOW};
use ciafile::prelude::*;
use ciafile::ticket::{TICKET_SIZE, TITLE_ID_OFFSET};
use hex_literal::hex;
use log::{Level, LevelFilter, Log, Metadata, Record};
use rand::Rng;

const TITLE_ID: u64 = 0x0004_0000_0005_5d00;

struct CiaBuilder {
    sig_tag: u32,
    title_id: u64,
    cert_size: u32,
    tmd_size: u32,
    meta_size: u32,
    content: Vec<u8>,
}

impl CiaBuilder {
    fn new(sig: SignatureType) -> Self {
        let mut content = vec![0u8; 0x400];
        content[..4].copy_from_slice(b"NCCH");
        content[SERIAL_OFFSET as usize..][..11].copy_from_slice(b"CTR-P-AXCE\0");
        Self {
            sig_tag: sig.tag(),
            title_id: TITLE_ID,
            cert_size: 0xa00,
            tmd_size: 0xb34,
            meta_size: 0x3ac0,
            content,
        }
    }

    fn ticket(&self) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let body_offset = SignatureType::from_tag(self.sig_tag)
            .map(|sig| sig.body_offset() as usize)
            .unwrap_or(0x140);

        let mut ticket = self.sig_tag.to_be_bytes().to_vec();
        let mut signature = vec![0u8; body_offset - 4];
        rng.fill(&mut signature[..]);
        ticket.extend(signature);

        let mut body = [0u8; TICKET_SIZE];
        rng.fill(&mut body[..]);
        body[TITLE_ID_OFFSET..][..8].copy_from_slice(&self.title_id.to_be_bytes());
        ticket.extend_from_slice(&body);
        ticket
    }

    fn build(&self) -> Vec<u8> {
        let ticket = self.ticket();
        let mut rng = rand::thread_rng();

        let mut out = Vec::new();
        out.write_all(&(HEADER_SIZE as u32).to_le_bytes()).unwrap();
        out.write_all(&0u16.to_le_bytes()).unwrap();
        out.write_all(&0u16.to_le_bytes()).unwrap();
        out.write_all(&self.cert_size.to_le_bytes()).unwrap();
        out.write_all(&(ticket.len() as u32).to_le_bytes()).unwrap();
        out.write_all(&self.tmd_size.to_le_bytes()).unwrap();
        out.write_all(&self.meta_size.to_le_bytes()).unwrap();
        out.write_all(&(self.content.len() as u64).to_le_bytes()).unwrap();
        let mut index = [0u8; 0x2000];
        index[0] = 0x80;
        out.write_all(&index).unwrap();

        let pad = |out: &mut Vec<u8>| out.resize(align64(out.len() as u64) as usize, 0);

        pad(&mut out);
        let mut cert = vec![0u8; self.cert_size as usize];
        rng.fill(&mut cert[..]);
        out.extend(cert);
        pad(&mut out);
        out.extend(ticket);
        pad(&mut out);
        let mut tmd = vec![0u8; self.tmd_size as usize];
        rng.fill(&mut tmd[..]);
        out.extend(tmd);
        pad(&mut out);
        out.extend_from_slice(&self.content);
        pad(&mut out);
        out.resize(out.len() + self.meta_size as usize, 0);
        pad(&mut out);
        out
    }
}

#[test]
fn decodes_every_signature_type() {
    for sig in SignatureType::ALL {
        let data = CiaBuilder::new(sig).build();
        let decoded = cia::decode(&mut Cursor::new(data)).unwrap();

        assert_eq!(decoded.ticket().sig_type(), sig);
        assert_eq!(
            decoded.metadata(),
            &CiaMetadata {
                title_id: TITLE_ID,
                serial: "CTR-P-AXCE".to_string(),
            },
            "{sig}"
        );
        assert!(decoded.diagnostics().is_empty(), "{sig}");
        assert_eq!(decoded.header().contents().collect::<Vec<_>>(), vec![0]);
    }
}

#[test]
fn section_offsets_follow_header() {
    let builder = CiaBuilder::new(SignatureType::Rsa2048Sha256);
    let data = builder.build();
    let decoded = cia::decode(&mut Cursor::new(&data)).unwrap();
    let offsets = decoded.offsets();

    assert_eq!(decoded.header().ticket_size(), 0x350);
    assert_eq!(offsets.cert, 0x2040);
    assert_eq!(offsets.ticket, 0x2a40);
    assert_eq!(&data[offsets.ticket as usize..][..4], &hex!("00010004"));
    assert_eq!(&data[offsets.content as usize..][..4], b"NCCH");
    assert_eq!(offsets.end, data.len() as u64);
}

#[test]
fn unknown_signature_type_fails() {
    let mut builder = CiaBuilder::new(SignatureType::EcdsaSha256);
    builder.sig_tag = 0x10002;
    let data = builder.build();

    let err = cia::decode(&mut Cursor::new(data)).unwrap_err();
    assert!(matches!(err, Error::UnknownSignatureType(0x10002)));
}

#[test]
fn ten_byte_file() {
    let data = hex!("2020000000000000a00a").to_vec();
    assert!(matches!(cia::decode(&mut Cursor::new(data)), Err(Error::TruncatedHeader)));
}

#[test]
fn truncated_ticket() {
    let data = CiaBuilder::new(SignatureType::Rsa4096Sha256).build();
    // cut the file in the middle of the ticket body
    let cut = 0x2a40 + 0x240 + TICKET_SIZE / 2;
    let err = cia::decode(&mut Cursor::new(&data[..cut])).unwrap_err();
    assert!(matches!(err, Error::TruncatedTicket));
}

#[test]
fn size_mismatch_is_only_a_diagnostic() {
    let builder = CiaBuilder::new(SignatureType::Rsa2048Sha256);
    let mut data = builder.build();
    let expected = data.len() as u64;
    data.extend_from_slice(&[0u8; 0x40]);

    let decoded = cia::decode(&mut Cursor::new(&data)).unwrap();
    assert_eq!(decoded.metadata().title_id, TITLE_ID);
    assert_eq!(
        decoded.diagnostics(),
        &[Diagnostic::SizeMismatch {
            expected,
            actual: expected + 0x40,
        }]
    );
}

static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

struct Captured;

impl Log for Captured {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }
    fn log(&self, record: &Record) {
        RECORDS.lock().unwrap().push((record.level(), record.args().to_string()));
    }
    fn flush(&self) {}
}

fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&Captured).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

#[test]
fn size_mismatch_is_left_to_the_caller() {
    capture_logs();
    let mut data = CiaBuilder::new(SignatureType::Rsa2048Sha256).build();
    data.extend_from_slice(&[0u8; 0x80]);

    let decoded = cia::decode(&mut Cursor::new(&data)).unwrap();
    let msg = decoded.diagnostics()[0].to_string();

    let records = RECORDS.lock().unwrap();
    let matching: Vec<_> = records.iter().filter(|(_, m)| *m == msg).collect();
    assert!(!matching.is_empty());
    // reported once, by whoever looks at the diagnostics
    assert!(matching.iter().all(|(level, _)| *level == Level::Debug));
}

#[test]
fn file_ending_early_still_decodes() {
    let builder = CiaBuilder::new(SignatureType::Rsa2048Sha256);
    let data = builder.build();
    // drop the meta section entirely
    let cut = data.len() - builder.meta_size as usize;

    let decoded = cia::decode(&mut Cursor::new(&data[..cut])).unwrap();
    assert_eq!(decoded.metadata().serial, "CTR-P-AXCE");
    assert_eq!(decoded.diagnostics().len(), 1);
}

#[test]
fn serial_without_terminator() {
    let mut builder = CiaBuilder::new(SignatureType::Rsa2048Sha256);
    builder.content = vec![b'Z'; SERIAL_OFFSET as usize + SERIAL_WINDOW + 0x40];

    let decoded = cia::decode(&mut Cursor::new(builder.build())).unwrap();
    assert_eq!(decoded.metadata().serial, "Z".repeat(SERIAL_WINDOW));
}

#[test]
fn missing_content_gives_empty_serial() {
    let mut builder = CiaBuilder::new(SignatureType::Rsa2048Sha256);
    builder.content = Vec::new();
    builder.meta_size = 0;

    let decoded = cia::decode(&mut Cursor::new(builder.build())).unwrap();
    assert_eq!(decoded.metadata().title_id, TITLE_ID);
    assert_eq!(decoded.metadata().serial, "");
}

#[test]
fn title_serial_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&CiaBuilder::new(SignatureType::Rsa2048Sha256).build()).unwrap();
    file.flush().unwrap();

    let meta = cia::title_serial(file.path());
    assert_eq!(meta.title_id, TITLE_ID);
    assert_eq!(meta.serial, "CTR-P-AXCE");
}

#[test]
fn title_serial_degrades() {
    let mut short = tempfile::NamedTempFile::new().unwrap();
    short.write_all(&[0u8; 10]).unwrap();
    short.flush().unwrap();
    assert_eq!(cia::title_serial(short.path()), CiaMetadata::default());

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(cia::title_serial(dir.path().join("missing.cia")), CiaMetadata::default());
    assert!(matches!(cia::decode_file(dir.path().join("missing.cia")), Err(Error::Io(_))));
}
