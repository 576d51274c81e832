//! ASN.1 DER encoder.

/// Total encoded size of a TLV holding `value_len` content bytes:
/// one identifier byte, the length field, and the content itself.
///
/// Lets callers compute exact output sizes before serializing anything.
pub fn tlv_len(value_len: usize) -> usize {
    1 + length_field_len(value_len) + value_len
}

/// Number of bytes the DER length field occupies for `length` content bytes.
fn length_field_len(length: usize) -> usize {
    if length < 0x80 {
        1
    } else {
        // one prefix byte plus the minimal big-endian encoding
        let mut n = 0;
        let mut rest = length;
        while rest > 0 {
            n += 1;
            rest >>= 8;
        }
        1 + n
    }
}

/// A builder for constructing DER-encoded ASN.1 data.
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Consume the encoder and return the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Write a raw TLV with the given tag byte and value.
    pub fn write_tlv(&mut self, tag: u8, value: &[u8]) -> &mut Self {
        self.buf.push(tag);
        self.write_length(value.len());
        self.buf.extend_from_slice(value);
        self
    }

    /// Write a DER length in the minimal definite form (X.690 strict).
    ///
    /// The byte count comes from [`length_field_len`], so the serialized
    /// form and the precomputed size always agree.
    fn write_length(&mut self, length: usize) {
        if length < 0x80 {
            self.buf.push(length as u8);
            return;
        }
        let num_bytes = length_field_len(length) - 1;
        self.buf.push(0x80 | num_bytes as u8);
        for i in (0..num_bytes).rev() {
            self.buf.push((length >> (8 * i)) as u8);
        }
    }

    /// Write an INTEGER value from big-endian bytes.
    pub fn write_integer(&mut self, value: &[u8]) -> &mut Self {
        // Add leading zero if high bit is set (to keep it positive)
        if !value.is_empty() && (value[0] & 0x80) != 0 {
            let mut padded = vec![0x00];
            padded.extend_from_slice(value);
            self.write_tlv(0x02, &padded);
        } else {
            self.write_tlv(0x02, value);
        }
        self
    }

    /// Write an OCTET STRING.
    pub fn write_octet_string(&mut self, value: &[u8]) -> &mut Self {
        self.write_tlv(0x04, value)
    }

    /// Write a BIT STRING with the given unused_bits count.
    pub fn write_bit_string(&mut self, unused_bits: u8, value: &[u8]) -> &mut Self {
        let mut content = vec![unused_bits];
        content.extend_from_slice(value);
        self.write_tlv(0x03, &content)
    }

    /// Write an OID from raw encoded value bytes.
    pub fn write_oid(&mut self, oid_bytes: &[u8]) -> &mut Self {
        self.write_tlv(0x06, oid_bytes)
    }

    /// Write a NULL.
    pub fn write_null(&mut self) -> &mut Self {
        self.buf.push(0x05);
        self.buf.push(0x00);
        self
    }

    /// Write a SEQUENCE wrapping the given contents.
    pub fn write_sequence(&mut self, contents: &[u8]) -> &mut Self {
        self.write_tlv(0x30, contents)
    }

    /// Write a SET wrapping the given contents.
    pub fn write_set(&mut self, contents: &[u8]) -> &mut Self {
        self.write_tlv(0x31, contents)
    }

    /// Write raw bytes directly (already DER-encoded).
    pub fn write_raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Write a UTF8String (tag 0x0C).
    pub fn write_utf8_string(&mut self, s: &str) -> &mut Self {
        self.write_tlv(0x0C, s.as_bytes())
    }

    /// Write a context-specific tagged value.
    pub fn write_context_specific(
        &mut self,
        tag_num: u8,
        constructed: bool,
        content: &[u8],
    ) -> &mut Self {
        let tag = 0x80 | (if constructed { 0x20 } else { 0 }) | (tag_num & 0x1F);
        self.write_tlv(tag, content)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
