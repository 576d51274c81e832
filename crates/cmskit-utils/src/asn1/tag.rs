//! ASN.1 tag parsing and encoding.

use cmskit_types::CryptoError;

/// Represents a parsed ASN.1 tag.
///
/// Tag numbers are limited to the single-byte short form (0..=30); every
/// tag appearing in X.509 and CMS structures fits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u8,
}

/// ASN.1 tag class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl Tag {
    /// Parse a short-form tag from a single byte.
    pub fn from_byte(byte: u8) -> Result<Self, CryptoError> {
        let class = match (byte >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        };
        let number = byte & 0x1F;
        if number == 0x1F {
            // Long-form tag number: not used by CMS/X.509
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(Tag {
            class,
            constructed: (byte & 0x20) != 0,
            number,
        })
    }

    /// Encode this tag as its identifier byte.
    pub fn to_byte(&self) -> u8 {
        let class_bits = match self.class {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::ContextSpecific => 0x80,
            TagClass::Private => 0xC0,
        };
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };
        class_bits | constructed_bit | self.number
    }
}
