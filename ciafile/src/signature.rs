use std::fmt;

use static_assertions::const_assert_eq;

use crate::cia::align64;

/// Signature schemes a signed structure (ticket, TMD) can start with
///
/// The signature type is stored as a big-endian u32 in front of the
/// signature itself, and decides how far away the signed data is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SignatureType {
    Rsa4096Sha256 = 0x10003,
    Rsa2048Sha256 = 0x10004,
    EcdsaSha256 = 0x10005,
}

impl SignatureType {
    pub const ALL: [SignatureType; 3] = [
        SignatureType::Rsa4096Sha256,
        SignatureType::Rsa2048Sha256,
        SignatureType::EcdsaSha256,
    ];

    /// Looks up a raw big-endian tag, `None` if the scheme isn't known
    #[must_use]
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0x10003 => Some(Self::Rsa4096Sha256),
            0x10004 => Some(Self::Rsa2048Sha256),
            0x10005 => Some(Self::EcdsaSha256),
            _ => None,
        }
    }
    #[must_use]
    pub fn tag(self) -> u32 {
        self as u32
    }
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rsa4096Sha256 => "RSA4096_SHA256",
            Self::Rsa2048Sha256 => "RSA2048_SHA256",
            Self::EcdsaSha256 => "ECDSA_SHA256",
        }
    }
    /// Size of the signature in bytes
    #[must_use]
    pub fn size(self) -> u32 {
        match self {
            Self::Rsa4096Sha256 => 0x200,
            Self::Rsa2048Sha256 => 0x100,
            Self::EcdsaSha256 => 0x3c,
        }
    }
    /// Size of the padding that follows the signature
    #[must_use]
    pub fn pad_size(self) -> u32 {
        match self {
            Self::Rsa4096Sha256 => 0x3c,
            Self::Rsa2048Sha256 => 0x3c,
            Self::EcdsaSha256 => 0x40,
        }
    }
    /// Distance from the start of the signed structure to its body
    #[must_use]
    pub fn body_offset(self) -> u64 {
        align64(u64::from(self.size() + self.pad_size()))
    }
}

// tag + signature + padding always ends up on the aligned body offset
const_assert_eq!(4 + 0x200 + 0x3c, 0x240);
const_assert_eq!(4 + 0x100 + 0x3c, 0x140);
const_assert_eq!(4 + 0x3c + 0x40, 0x80);

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
