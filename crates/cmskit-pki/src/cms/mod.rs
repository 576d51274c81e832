//! CMS (Cryptographic Message Syntax) / PKCS#7.

use cmskit_types::PkiError;
use cmskit_utils::asn1::Decoder;
use cmskit_utils::oid::{known, Oid};

pub mod enveloped;

pub use enveloped::{
    ContentDescriptor, ContentEncryptionAlg, EncryptedContentInfo, EnvelopedData,
    KeyTransRecipientInfo, RecipientInfo,
};

pub(crate) use crate::encoding::{
    enc_explicit_ctx, enc_int, enc_null, enc_octet, enc_oid, enc_seq, enc_set, enc_tlv,
};

/// CMS content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmsContentType {
    Data,
    EnvelopedData,
}

/// An algorithm identifier: OID value bytes plus optional parameters.
///
/// `params` is stored as a complete DER TLV (e.g. a NULL or an OCTET
/// STRING holding an IV) and emitted verbatim on encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    pub oid: Vec<u8>,
    pub params: Option<Vec<u8>>,
}

/// A CMS message (ContentInfo).
#[derive(Debug, Clone)]
pub struct CmsMessage {
    pub content_type: CmsContentType,
    pub enveloped_data: Option<EnvelopedData>,
    /// DER-encoded ContentInfo.
    pub raw: Vec<u8>,
}

pub(crate) fn cerr(msg: &str) -> PkiError {
    PkiError::CmsError(msg.to_string())
}

impl CmsMessage {
    /// Parse a CMS message from DER-encoded ContentInfo bytes.
    pub fn from_der(data: &[u8]) -> Result<Self, PkiError> {
        let mut dec = Decoder::new(data);
        let mut ci = dec
            .read_sequence()
            .map_err(|e| cerr(&format!("ContentInfo: {e}")))?;

        let ct_bytes = ci
            .read_oid()
            .map_err(|e| cerr(&format!("contentType: {e}")))?;
        let ct_oid =
            Oid::from_der_value(ct_bytes).map_err(|e| cerr(&format!("contentType OID: {e}")))?;

        if ct_oid == known::pkcs7_enveloped_data() {
            // content [0] EXPLICIT EnvelopedData
            let content = ci
                .read_context_specific(0, true)
                .map_err(|e| cerr(&format!("ContentInfo [0]: {e}")))?;
            let ed = enveloped::parse_enveloped_data(content.value)?;
            Ok(CmsMessage {
                content_type: CmsContentType::EnvelopedData,
                enveloped_data: Some(ed),
                raw: data.to_vec(),
            })
        } else if ct_oid == known::pkcs7_data() {
            Ok(CmsMessage {
                content_type: CmsContentType::Data,
                enveloped_data: None,
                raw: data.to_vec(),
            })
        } else {
            Err(cerr(&format!("unsupported content type: {ct_oid}")))
        }
    }

    /// Encoded size of this message in bytes.
    pub fn encoded_len(&self) -> usize {
        self.raw.len()
    }

    /// Write the DER encoding into `out`, returning the byte count.
    ///
    /// When `out` is too short, fails with `BufferTooSmall` carrying
    /// the exact size needed and writes nothing.
    pub fn encode_to_slice(&self, out: &mut [u8]) -> Result<usize, PkiError> {
        let need = self.raw.len();
        if out.len() < need {
            return Err(cmskit_types::CryptoError::BufferTooSmall {
                need,
                got: out.len(),
            }
            .into());
        }
        out[..need].copy_from_slice(&self.raw);
        Ok(need)
    }
}
