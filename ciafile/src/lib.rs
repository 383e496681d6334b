pub mod cia;
pub mod error;
pub mod record;
pub mod signature;
pub mod string;
pub mod ticket;
pub mod titleid;
pub mod transmit;

pub use error::{Error, Result, TransmitError};

pub mod prelude {
    pub use crate::cia::{self, align64, CiaHeader, CiaMetadata, Decoded, Diagnostic, SectionOffsets};
    pub use crate::signature::SignatureType;
    pub use crate::ticket::{SignedTicket, Ticket};
    pub use crate::titleid::{Category, Platform, TitleId};
    pub use crate::transmit::{transmit, Progress};
    pub use crate::{Error, Result, TransmitError};
}
