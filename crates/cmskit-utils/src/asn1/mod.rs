//! ASN.1 DER encoding and decoding.
//!
//! Only the definite-length, minimal-encoding subset of X.690 that CMS and
//! X.509 structures use. Indefinite lengths and multi-byte tag numbers are
//! rejected on decode.

mod decoder;
mod encoder;
mod tag;

pub use decoder::Decoder;
pub use encoder::{tlv_len, Encoder};
pub use tag::{Tag, TagClass};

/// ASN.1 tag constants.
pub mod tags {
    pub const INTEGER: u8 = 0x02;
    pub const BIT_STRING: u8 = 0x03;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OID: u8 = 0x06;
    pub const UTF8_STRING: u8 = 0x0C;
    pub const SEQUENCE: u8 = 0x30;
    pub const SET: u8 = 0x31;
    pub const CONTEXT_SPECIFIC: u8 = 0x80;
    pub const CONSTRUCTED: u8 = 0x20;
}

/// A borrowed ASN.1 TLV element.
#[derive(Debug, Clone)]
pub struct Tlv<'a> {
    pub tag: Tag,
    pub value: &'a [u8],
}
