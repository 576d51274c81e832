//! ASN.1 DER decoder.

use super::{Tag, TagClass, Tlv};
use cmskit_types::CryptoError;

/// A streaming ASN.1 DER decoder.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder over the given data.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the remaining undecoded bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Parse the next TLV element.
    pub fn read_tlv(&mut self) -> Result<Tlv<'a>, CryptoError> {
        if self.pos >= self.data.len() {
            return Err(CryptoError::NullInput);
        }
        let tag = Tag::from_byte(self.data[self.pos])?;
        self.pos += 1;

        let length = self.read_length()?;
        let end = self
            .pos
            .checked_add(length)
            .ok_or(CryptoError::DecodeAsn1Fail)?;
        if end > self.data.len() {
            return Err(CryptoError::DecodeAsn1Fail);
        }

        let value = &self.data[self.pos..end];
        self.pos = end;

        Ok(Tlv { tag, value })
    }

    /// Parse a DER length. Indefinite lengths are rejected.
    fn read_length(&mut self) -> Result<usize, CryptoError> {
        if self.pos >= self.data.len() {
            return Err(CryptoError::DecodeAsn1Fail);
        }

        let first = self.data[self.pos];
        self.pos += 1;

        if first < 0x80 {
            Ok(first as usize)
        } else if first == 0x80 {
            // Indefinite length — not valid in DER
            Err(CryptoError::DecodeAsn1Fail)
        } else {
            let num_bytes = (first & 0x7F) as usize;
            if num_bytes > 4 || self.pos + num_bytes > self.data.len() {
                return Err(CryptoError::DecodeAsn1Fail);
            }
            let mut length: usize = 0;
            for i in 0..num_bytes {
                length = (length << 8) | self.data[self.pos + i] as usize;
            }
            self.pos += num_bytes;
            Ok(length)
        }
    }

    /// Read a universal-class primitive with the expected tag number.
    /// Tags of any other class or a constructed encoding are rejected.
    fn read_universal_primitive(&mut self, number: u8) -> Result<Tlv<'a>, CryptoError> {
        let tlv = self.read_tlv()?;
        if tlv.tag.class != TagClass::Universal || tlv.tag.constructed || tlv.tag.number != number
        {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(tlv)
    }

    /// Read an INTEGER and return its bytes (big-endian, may include leading zero).
    pub fn read_integer(&mut self) -> Result<&'a [u8], CryptoError> {
        Ok(self.read_universal_primitive(0x02)?.value)
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<&'a [u8], CryptoError> {
        Ok(self.read_universal_primitive(0x04)?.value)
    }

    /// Read a BIT STRING and return (unused_bits, data).
    pub fn read_bit_string(&mut self) -> Result<(u8, &'a [u8]), CryptoError> {
        let tlv = self.read_universal_primitive(0x03)?;
        if tlv.value.is_empty() {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok((tlv.value[0], &tlv.value[1..]))
    }

    /// Read an OID and return the raw value bytes.
    pub fn read_oid(&mut self) -> Result<&'a [u8], CryptoError> {
        Ok(self.read_universal_primitive(0x06)?.value)
    }

    /// Read a SEQUENCE, returning a sub-decoder over its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder<'a>, CryptoError> {
        let tlv = self.read_tlv()?;
        if tlv.tag.class != TagClass::Universal || tlv.tag.number != 0x10 || !tlv.tag.constructed {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(Decoder::new(tlv.value))
    }

    /// Read a SET, returning a sub-decoder over its contents.
    pub fn read_set(&mut self) -> Result<Decoder<'a>, CryptoError> {
        let tlv = self.read_tlv()?;
        if tlv.tag.class != TagClass::Universal || tlv.tag.number != 0x11 || !tlv.tag.constructed {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(Decoder::new(tlv.value))
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Result<Tag, CryptoError> {
        if self.pos >= self.data.len() {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Tag::from_byte(self.data[self.pos])
    }

    /// Read a context-specific tagged value with the expected tag number.
    pub fn read_context_specific(
        &mut self,
        tag_num: u8,
        constructed: bool,
    ) -> Result<Tlv<'a>, CryptoError> {
        let tlv = self.read_tlv()?;
        if tlv.tag.class != TagClass::ContextSpecific
            || tlv.tag.number != tag_num
            || tlv.tag.constructed != constructed
        {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(tlv)
    }

    /// Try to read a context-specific tagged value. Returns `None` if
    /// the next tag does not match, without consuming any bytes.
    pub fn try_read_context_specific(
        &mut self,
        tag_num: u8,
        constructed: bool,
    ) -> Result<Option<Tlv<'a>>, CryptoError> {
        if self.is_empty() {
            return Ok(None);
        }
        let tag = self.peek_tag()?;
        if tag.class == TagClass::ContextSpecific
            && tag.number == tag_num
            && tag.constructed == constructed
        {
            Ok(Some(self.read_tlv()?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sequence() {
        // SEQUENCE { INTEGER 5 }
        let data = [0x30, 0x03, 0x02, 0x01, 0x05];
        let mut dec = Decoder::new(&data);
        let mut seq = dec.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), &[0x05]);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_read_set() {
        // SET { INTEGER 42 }
        let data = [0x31, 0x03, 0x02, 0x01, 0x2A];
        let mut dec = Decoder::new(&data);
        let mut set_dec = dec.read_set().unwrap();
        assert_eq!(set_dec.read_integer().unwrap(), &[0x2A]);
    }

    #[test]
    fn test_truncated_value_rejected() {
        // Declared length exceeds available bytes
        let data = [0x04, 0x05, 0xAA, 0xBB];
        let mut dec = Decoder::new(&data);
        assert!(dec.read_octet_string().is_err());
    }

    #[test]
    fn test_indefinite_length_rejected() {
        let data = [0x30, 0x80, 0x00, 0x00];
        let mut dec = Decoder::new(&data);
        assert!(dec.read_sequence().is_err());
    }

    #[test]
    fn test_try_read_context_specific() {
        // [0] EXPLICIT { INTEGER 2 } followed by INTEGER 1
        let data = [0xA0, 0x03, 0x02, 0x01, 0x02, 0x02, 0x01, 0x01];
        let mut dec = Decoder::new(&data);

        // Should match [0]
        assert!(dec.try_read_context_specific(0, true).unwrap().is_some());
        // Next is INTEGER, try [1] -> None and nothing consumed
        assert!(dec.try_read_context_specific(1, true).unwrap().is_none());
        assert_eq!(dec.read_integer().unwrap(), &[0x01]);
    }

    #[test]
    fn test_wrong_tag_class_rejected() {
        // [2] primitive shares the INTEGER tag number but is context class
        let data = [0x82, 0x01, 0x05];
        let mut dec = Decoder::new(&data);
        assert!(dec.read_integer().is_err());
    }

    #[test]
    fn test_constructed_primitive_rejected() {
        // Constructed OCTET STRING is BER, not DER
        let data = [0x24, 0x03, 0x04, 0x01, 0xAA];
        let mut dec = Decoder::new(&data);
        assert!(dec.read_octet_string().is_err());
    }

    #[test]
    fn test_long_length_roundtrip() {
        let mut data = vec![0x04, 0x82, 0x01, 0x00];
        data.extend_from_slice(&[0x7Fu8; 256]);
        let mut dec = Decoder::new(&data);
        let value = dec.read_octet_string().unwrap();
        assert_eq!(value.len(), 256);
        assert!(dec.is_empty());
    }
}
