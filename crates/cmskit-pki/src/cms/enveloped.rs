//! CMS EnvelopedData (RFC 5652 section 6).
//!
//! Builds and parses EnvelopedData messages: a random content-encryption
//! key (CEK) encrypts the content with AES-CBC and PKCS#7 padding, and
//! the CEK is wrapped for each recipient with RSAES-PKCS1-v1_5 key
//! transport. The output is a complete ContentInfo whose size is known
//! exactly before a single byte is serialized.

use cmskit_crypto::cbc::{self, BLOCK_SIZE};
use cmskit_crypto::cek::ContentEncryptionKey;
use cmskit_crypto::keytrans;
use cmskit_types::{CryptoError, PkiError};
use cmskit_utils::asn1::{tags, tlv_len, Decoder};
use cmskit_utils::oid::{known, Oid};
use rand_core::CryptoRngCore;
use rsa::RsaPrivateKey;

use crate::x509::Certificate;

use super::{
    cerr, enc_explicit_ctx, enc_int, enc_null, enc_octet, enc_oid, enc_seq, enc_set, enc_tlv,
    AlgorithmIdentifier, CmsContentType, CmsMessage,
};

/// Upper bound on content length. Leaves one cipher block of headroom
/// so the padded ciphertext still fits a 4-byte DER length field.
pub const MAX_CONTENT_LEN: usize = u32::MAX as usize - BLOCK_SIZE;

// ── Types ────────────────────────────────────────────────────────────

/// Content encryption algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncryptionAlg {
    /// AES-128-CBC (16-byte key).
    Aes128Cbc,
    /// AES-256-CBC (32-byte key).
    Aes256Cbc,
}

impl ContentEncryptionAlg {
    pub fn key_len(self) -> usize {
        match self {
            ContentEncryptionAlg::Aes128Cbc => 16,
            ContentEncryptionAlg::Aes256Cbc => 32,
        }
    }

    pub fn oid(self) -> Oid {
        match self {
            ContentEncryptionAlg::Aes128Cbc => known::aes128_cbc(),
            ContentEncryptionAlg::Aes256Cbc => known::aes256_cbc(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentEncryptionAlg::Aes128Cbc => "aes-128-cbc",
            ContentEncryptionAlg::Aes256Cbc => "aes-256-cbc",
        }
    }

    /// Look up an algorithm by its CLI name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "aes-128-cbc" => Some(ContentEncryptionAlg::Aes128Cbc),
            "aes-256-cbc" => Some(ContentEncryptionAlg::Aes256Cbc),
            _ => None,
        }
    }

    fn from_oid(oid: &Oid) -> Option<Self> {
        if *oid == known::aes128_cbc() {
            Some(ContentEncryptionAlg::Aes128Cbc)
        } else if *oid == known::aes256_cbc() {
            Some(ContentEncryptionAlg::Aes256Cbc)
        } else {
            None
        }
    }
}

impl Default for ContentEncryptionAlg {
    fn default() -> Self {
        ContentEncryptionAlg::Aes256Cbc
    }
}

/// Validated content to be enveloped.
#[derive(Debug, Clone)]
pub struct ContentDescriptor {
    content: Vec<u8>,
    /// Inner content type OID value bytes (id-data).
    content_type: Vec<u8>,
    alg: ContentEncryptionAlg,
}

impl ContentDescriptor {
    /// Validate content for enveloping.
    ///
    /// Empty content and content beyond [`MAX_CONTENT_LEN`] are
    /// rejected with `InvalidInput`.
    pub fn new(content: &[u8], alg: ContentEncryptionAlg) -> Result<Self, PkiError> {
        if content.is_empty() {
            return Err(PkiError::InvalidInput("content must not be empty".into()));
        }
        if content.len() > MAX_CONTENT_LEN {
            return Err(PkiError::InvalidInput(format!(
                "content length {} exceeds maximum {}",
                content.len(),
                MAX_CONTENT_LEN
            )));
        }
        Ok(Self {
            content: content.to_vec(),
            content_type: known::pkcs7_data().to_der_value(),
            alg,
        })
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn alg(&self) -> ContentEncryptionAlg {
        self.alg
    }
}

/// Encrypted content info (RFC 5652 section 6.1).
#[derive(Debug, Clone)]
pub struct EncryptedContentInfo {
    /// Content type OID value bytes (usually id-data).
    pub content_type: Vec<u8>,
    /// Content encryption algorithm identifier (params hold the IV).
    pub content_encryption_algorithm: AlgorithmIdentifier,
    /// Encrypted content bytes.
    pub encrypted_content: Option<Vec<u8>>,
}

/// Key transport recipient info (RFC 5652 section 6.2.1).
#[derive(Debug, Clone)]
pub struct KeyTransRecipientInfo {
    pub version: u32,
    /// Issuer Name as a complete DER TLV, byte-for-byte from the
    /// recipient certificate.
    pub rid_issuer: Vec<u8>,
    /// Serial number INTEGER value bytes, byte-for-byte from the
    /// recipient certificate.
    pub rid_serial: Vec<u8>,
    /// Key encryption algorithm identifier.
    pub key_encryption_algorithm: AlgorithmIdentifier,
    /// Wrapped content-encryption key.
    pub encrypted_key: Vec<u8>,
}

/// Recipient info (CHOICE). Only key transport is supported.
#[derive(Debug, Clone)]
pub enum RecipientInfo {
    KeyTransport(KeyTransRecipientInfo),
}

/// CMS EnvelopedData structure.
#[derive(Debug, Clone)]
pub struct EnvelopedData {
    pub version: u32,
    pub recipient_infos: Vec<RecipientInfo>,
    pub encrypted_content_info: EncryptedContentInfo,
}

/// CMS version derived from the recipient set (RFC 5652 section 6.1):
/// 0 while every recipient is an issuerAndSerial key-transport v0.
fn derive_version(recipients: &[RecipientInfo]) -> u32 {
    let all_v0 = recipients.iter().all(|ri| match ri {
        RecipientInfo::KeyTransport(k) => k.version == 0,
    });
    if all_v0 {
        0
    } else {
        2
    }
}

// ── Encryption ───────────────────────────────────────────────────────

impl CmsMessage {
    /// Envelope content for one or more RSA recipients.
    ///
    /// Generates a random CEK and IV from `rng`, encrypts the content
    /// with AES-CBC, and wraps the CEK for each recipient certificate
    /// with RSAES-PKCS1-v1_5. All certificates are parsed before any
    /// key material is generated, so a bad certificate fails the call
    /// without consuming randomness.
    pub fn encrypt_rsa<R: CryptoRngCore>(
        rng: &mut R,
        descriptor: &ContentDescriptor,
        recipient_certs: &[&[u8]],
    ) -> Result<Self, PkiError> {
        if recipient_certs.is_empty() {
            return Err(PkiError::InvalidInput(
                "at least one recipient certificate required".into(),
            ));
        }

        let mut recipients = Vec::with_capacity(recipient_certs.len());
        for der in recipient_certs {
            let cert = Certificate::from_der(der)?;
            let key = cert.rsa_public_key()?;
            recipients.push((cert, key));
        }

        let alg = descriptor.alg();
        let cek = ContentEncryptionKey::generate(rng, alg.key_len())?;

        let mut iv = [0u8; BLOCK_SIZE];
        rng.try_fill_bytes(&mut iv)
            .map_err(|_| CryptoError::RngFailure)?;

        let encrypted_content = cbc::cbc_encrypt(cek.as_bytes(), &iv, descriptor.content())?;

        let mut recipient_infos = Vec::with_capacity(recipients.len());
        for (cert, key) in &recipients {
            let encrypted_key = keytrans::wrap_cek(rng, key, cek.as_bytes())?;
            recipient_infos.push(RecipientInfo::KeyTransport(KeyTransRecipientInfo {
                version: 0,
                rid_issuer: cert.issuer_raw.clone(),
                rid_serial: cert.serial_number.clone(),
                key_encryption_algorithm: AlgorithmIdentifier {
                    oid: known::rsa_encryption().to_der_value(),
                    params: Some(enc_null()),
                },
                encrypted_key,
            }));
        }

        let eci = EncryptedContentInfo {
            content_type: descriptor.content_type.clone(),
            content_encryption_algorithm: AlgorithmIdentifier {
                oid: alg.oid().to_der_value(),
                params: Some(enc_octet(&iv)),
            },
            encrypted_content: Some(encrypted_content),
        };

        let ed = EnvelopedData {
            version: derive_version(&recipient_infos),
            recipient_infos,
            encrypted_content_info: eci,
        };

        let raw = encode_content_info(&ed);

        Ok(CmsMessage {
            content_type: CmsContentType::EnvelopedData,
            enveloped_data: Some(ed),
            raw,
        })
    }

    /// Decrypt an EnvelopedData message with an RSA private key.
    ///
    /// Each key-transport recipient is tried in order until the CEK
    /// unwraps to the expected length.
    pub fn decrypt_rsa(&self, key: &RsaPrivateKey) -> Result<Vec<u8>, PkiError> {
        let ed = self
            .enveloped_data
            .as_ref()
            .ok_or_else(|| cerr("not an EnvelopedData message"))?;
        let eci = &ed.encrypted_content_info;

        let ciphertext = eci
            .encrypted_content
            .as_ref()
            .ok_or_else(|| cerr("no encrypted content"))?;

        let alg_oid = Oid::from_der_value(&eci.content_encryption_algorithm.oid)
            .map_err(|e| cerr(&format!("content encryption OID: {e}")))?;
        let alg = ContentEncryptionAlg::from_oid(&alg_oid).ok_or_else(|| {
            cerr(&format!(
                "unsupported content encryption algorithm: {alg_oid}"
            ))
        })?;

        let params = eci
            .content_encryption_algorithm
            .params
            .as_ref()
            .ok_or_else(|| cerr("missing IV parameter"))?;
        let iv = Decoder::new(params)
            .read_octet_string()
            .map_err(|e| cerr(&format!("IV: {e}")))?;

        let mut last_err = cerr("no key transport recipient");
        for ri in &ed.recipient_infos {
            let RecipientInfo::KeyTransport(ktri) = ri;
            match keytrans::unwrap_cek(key, &ktri.encrypted_key) {
                Ok(cek) if cek.len() == alg.key_len() => {
                    return cbc::cbc_decrypt(&cek, iv, ciphertext).map_err(PkiError::from);
                }
                Ok(_) => last_err = cerr("unwrapped key has unexpected length"),
                Err(e) => last_err = PkiError::from(e),
            }
        }
        Err(last_err)
    }
}

// ── Encoded lengths ──────────────────────────────────────────────────
//
// Mirrors the encoding functions below exactly; `encoded_len` must
// agree with `to_der().len()` for every well-formed structure.

fn alg_id_len(alg: &AlgorithmIdentifier) -> usize {
    let params_len = alg.params.as_ref().map(|p| p.len()).unwrap_or(0);
    tlv_len(tlv_len(alg.oid.len()) + params_len)
}

fn ktri_len(ktri: &KeyTransRecipientInfo) -> usize {
    let ias_inner = ktri.rid_issuer.len() + tlv_len(ktri.rid_serial.len());
    let inner = tlv_len(1) // version
        + tlv_len(ias_inner)
        + alg_id_len(&ktri.key_encryption_algorithm)
        + tlv_len(ktri.encrypted_key.len());
    tlv_len(inner)
}

fn eci_len(eci: &EncryptedContentInfo) -> usize {
    let content_len = eci
        .encrypted_content
        .as_ref()
        .map(|c| tlv_len(c.len()))
        .unwrap_or(0);
    tlv_len(
        tlv_len(eci.content_type.len())
            + alg_id_len(&eci.content_encryption_algorithm)
            + content_len,
    )
}

fn enveloped_data_len(ed: &EnvelopedData) -> usize {
    let set_inner: usize = ed
        .recipient_infos
        .iter()
        .map(|ri| match ri {
            RecipientInfo::KeyTransport(k) => ktri_len(k),
        })
        .sum();
    tlv_len(tlv_len(1) + tlv_len(set_inner) + eci_len(&ed.encrypted_content_info))
}

fn content_info_len(ed: &EnvelopedData) -> usize {
    let oid_len = known::pkcs7_enveloped_data().to_der_value().len();
    tlv_len(tlv_len(oid_len) + tlv_len(enveloped_data_len(ed)))
}

impl EnvelopedData {
    /// Exact encoded size of the full ContentInfo, computed without
    /// serializing.
    pub fn encoded_len(&self) -> usize {
        content_info_len(self)
    }

    /// Encode this EnvelopedData wrapped in a ContentInfo.
    pub fn to_der(&self) -> Vec<u8> {
        encode_content_info(self)
    }
}

// ── Encoding ─────────────────────────────────────────────────────────

fn encode_algorithm_identifier(alg: &AlgorithmIdentifier) -> Vec<u8> {
    let mut inner = enc_oid(&alg.oid);
    if let Some(params) = &alg.params {
        inner.extend_from_slice(params);
    }
    enc_seq(&inner)
}

fn encode_key_trans_recipient_info(ktri: &KeyTransRecipientInfo) -> Vec<u8> {
    let mut inner = Vec::new();

    // version
    inner.extend_from_slice(&enc_int(&[ktri.version as u8]));

    // rid: IssuerAndSerialNumber SEQUENCE. Issuer and serial are
    // re-emitted verbatim; in particular the serial must not be
    // sign-normalized again.
    let mut ias_inner = Vec::new();
    ias_inner.extend_from_slice(&ktri.rid_issuer);
    ias_inner.extend_from_slice(&enc_tlv(tags::INTEGER, &ktri.rid_serial));
    inner.extend_from_slice(&enc_seq(&ias_inner));

    // keyEncryptionAlgorithm
    inner.extend_from_slice(&encode_algorithm_identifier(&ktri.key_encryption_algorithm));

    // encryptedKey OCTET STRING
    inner.extend_from_slice(&enc_octet(&ktri.encrypted_key));

    enc_seq(&inner)
}

fn encode_recipient_info(ri: &RecipientInfo) -> Vec<u8> {
    match ri {
        // KeyTransRecipientInfo is the default CHOICE (no implicit tag)
        RecipientInfo::KeyTransport(ktri) => encode_key_trans_recipient_info(ktri),
    }
}

fn encode_encrypted_content_info(eci: &EncryptedContentInfo) -> Vec<u8> {
    let mut inner = Vec::new();

    // contentType OID
    inner.extend_from_slice(&enc_oid(&eci.content_type));

    // contentEncryptionAlgorithm AlgorithmIdentifier
    inner.extend_from_slice(&encode_algorithm_identifier(
        &eci.content_encryption_algorithm,
    ));

    // encryptedContent [0] IMPLICIT OCTET STRING OPTIONAL (primitive)
    if let Some(content) = &eci.encrypted_content {
        inner.extend_from_slice(&enc_tlv(tags::CONTEXT_SPECIFIC, content));
    }

    enc_seq(&inner)
}

fn encode_enveloped_data(ed: &EnvelopedData) -> Vec<u8> {
    let mut inner = Vec::new();

    // version
    inner.extend_from_slice(&enc_int(&[ed.version as u8]));

    // recipientInfos SET OF RecipientInfo
    let mut ri_inner = Vec::new();
    for ri in &ed.recipient_infos {
        ri_inner.extend_from_slice(&encode_recipient_info(ri));
    }
    inner.extend_from_slice(&enc_set(&ri_inner));

    // encryptedContentInfo
    inner.extend_from_slice(&encode_encrypted_content_info(&ed.encrypted_content_info));

    enc_seq(&inner)
}

pub(crate) fn encode_content_info(ed: &EnvelopedData) -> Vec<u8> {
    let ed_encoded = encode_enveloped_data(ed);
    let ctx0 = enc_explicit_ctx(0, &ed_encoded);
    let mut ci_inner = enc_oid(&known::pkcs7_enveloped_data().to_der_value());
    ci_inner.extend_from_slice(&ctx0);
    let out = enc_seq(&ci_inner);
    debug_assert_eq!(out.len(), content_info_len(ed));
    out
}

// ── Parsing ──────────────────────────────────────────────────────────

fn bytes_to_u32(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_shl(8) | b as u32)
}

fn parse_algorithm_identifier(dec: &mut Decoder) -> Result<AlgorithmIdentifier, PkiError> {
    let mut seq = dec
        .read_sequence()
        .map_err(|e| cerr(&format!("AlgorithmIdentifier: {e}")))?;
    let oid = seq
        .read_oid()
        .map_err(|e| cerr(&format!("algorithm OID: {e}")))?
        .to_vec();
    let params = if !seq.is_empty() {
        Some(seq.remaining().to_vec())
    } else {
        None
    };
    Ok(AlgorithmIdentifier { oid, params })
}

fn parse_key_trans_recipient_info(dec: &mut Decoder) -> Result<KeyTransRecipientInfo, PkiError> {
    let mut seq = dec
        .read_sequence()
        .map_err(|e| cerr(&format!("KeyTransRecipientInfo: {e}")))?;

    let version = bytes_to_u32(
        seq.read_integer()
            .map_err(|e| cerr(&format!("KTRI version: {e}")))?,
    );

    // rid: IssuerAndSerialNumber — capture the issuer Name TLV span
    let mut ias = seq
        .read_sequence()
        .map_err(|e| cerr(&format!("issuerAndSerialNumber: {e}")))?;
    let rid_issuer = {
        let before = ias.remaining();
        ias.read_sequence()
            .map_err(|e| cerr(&format!("issuer: {e}")))?;
        let consumed = before.len() - ias.remaining().len();
        before[..consumed].to_vec()
    };
    let rid_serial = ias
        .read_integer()
        .map_err(|e| cerr(&format!("serialNumber: {e}")))?
        .to_vec();

    let key_encryption_algorithm = parse_algorithm_identifier(&mut seq)?;

    let encrypted_key = seq
        .read_octet_string()
        .map_err(|e| cerr(&format!("encryptedKey: {e}")))?
        .to_vec();

    Ok(KeyTransRecipientInfo {
        version,
        rid_issuer,
        rid_serial,
        key_encryption_algorithm,
        encrypted_key,
    })
}

fn parse_encrypted_content_info(dec: &mut Decoder) -> Result<EncryptedContentInfo, PkiError> {
    let mut seq = dec
        .read_sequence()
        .map_err(|e| cerr(&format!("EncryptedContentInfo: {e}")))?;

    let content_type = seq
        .read_oid()
        .map_err(|e| cerr(&format!("inner contentType: {e}")))?
        .to_vec();

    let content_encryption_algorithm = parse_algorithm_identifier(&mut seq)?;

    // encryptedContent [0] IMPLICIT OCTET STRING OPTIONAL (primitive)
    let encrypted_content = seq
        .try_read_context_specific(0, false)
        .map_err(|e| cerr(&format!("encryptedContent: {e}")))?
        .map(|tlv| tlv.value.to_vec());

    Ok(EncryptedContentInfo {
        content_type,
        content_encryption_algorithm,
        encrypted_content,
    })
}

pub(crate) fn parse_enveloped_data(data: &[u8]) -> Result<EnvelopedData, PkiError> {
    let mut dec = Decoder::new(data);
    let mut ed = dec
        .read_sequence()
        .map_err(|e| cerr(&format!("EnvelopedData: {e}")))?;

    let version = bytes_to_u32(
        ed.read_integer()
            .map_err(|e| cerr(&format!("EnvelopedData version: {e}")))?,
    );

    // recipientInfos SET OF RecipientInfo
    let mut ri_set = ed
        .read_set()
        .map_err(|e| cerr(&format!("recipientInfos: {e}")))?;
    let mut recipient_infos = Vec::new();
    while !ri_set.is_empty() {
        let tag = ri_set
            .peek_tag()
            .map_err(|e| cerr(&format!("RecipientInfo tag: {e}")))?;
        // Only the untagged KeyTransRecipientInfo SEQUENCE arm of the
        // CHOICE is supported; any other tag is rejected.
        if tag.to_byte() != tags::SEQUENCE {
            return Err(cerr(&format!(
                "unsupported RecipientInfo tag: 0x{:02x}",
                tag.to_byte()
            )));
        }
        recipient_infos.push(RecipientInfo::KeyTransport(parse_key_trans_recipient_info(
            &mut ri_set,
        )?));
    }

    let encrypted_content_info = parse_encrypted_content_info(&mut ed)?;

    Ok(EnvelopedData {
        version,
        recipient_infos,
        encrypted_content_info,
    })
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cmskit_utils::asn1::Encoder;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const CERT_DER: &[u8] = include_bytes!("../../tests/data/recipient.der");

    fn envelope(seed: u64, content: &[u8], alg: ContentEncryptionAlg) -> CmsMessage {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let descriptor = ContentDescriptor::new(content, alg).unwrap();
        CmsMessage::encrypt_rsa(&mut rng, &descriptor, &[CERT_DER]).unwrap()
    }

    #[test]
    fn test_hello_world_structure() {
        let cms = envelope(1, b"hello world", ContentEncryptionAlg::Aes256Cbc);

        // Outer tag is a SEQUENCE (ContentInfo)
        assert_eq!(cms.raw[0], tags::SEQUENCE);

        let parsed = CmsMessage::from_der(&cms.raw).unwrap();
        assert_eq!(parsed.content_type, CmsContentType::EnvelopedData);

        let ed = parsed.enveloped_data.as_ref().unwrap();
        assert_eq!(ed.version, 0);
        assert_eq!(ed.recipient_infos.len(), 1);

        let RecipientInfo::KeyTransport(ktri) = &ed.recipient_infos[0];
        assert_eq!(ktri.version, 0);
        let kea = Oid::from_der_value(&ktri.key_encryption_algorithm.oid).unwrap();
        assert_eq!(kea, known::rsa_encryption());
        // 2048-bit recipient key
        assert_eq!(ktri.encrypted_key.len(), 256);

        // 11 bytes of content pad to a single block
        let eci = &ed.encrypted_content_info;
        assert_eq!(eci.encrypted_content.as_ref().unwrap().len(), 16);
        let ct = Oid::from_der_value(&eci.content_type).unwrap();
        assert_eq!(ct, known::pkcs7_data());
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let a = envelope(7, b"determinism check", ContentEncryptionAlg::Aes128Cbc);
        let b = envelope(7, b"determinism check", ContentEncryptionAlg::Aes128Cbc);
        assert_eq!(a.raw, b.raw);

        let c = envelope(8, b"determinism check", ContentEncryptionAlg::Aes128Cbc);
        assert_ne!(a.raw, c.raw);
        let ed_a = a.enveloped_data.as_ref().unwrap();
        let ed_c = c.enveloped_data.as_ref().unwrap();
        assert_ne!(
            ed_a.encrypted_content_info.encrypted_content,
            ed_c.encrypted_content_info.encrypted_content
        );
    }

    #[test]
    fn test_encoded_len_matches_serialization() {
        for len in [1usize, 15, 16, 17, 31, 32, 1000] {
            let cms = envelope(2, &vec![0xA5; len], ContentEncryptionAlg::Aes256Cbc);
            let ed = cms.enveloped_data.as_ref().unwrap();
            assert_eq!(ed.encoded_len(), cms.raw.len(), "content length {len}");
            assert_eq!(ed.to_der(), cms.raw);
        }
    }

    #[test]
    fn test_ciphertext_block_rounding() {
        for len in [1usize, 15, 16, 17, 31, 32] {
            let cms = envelope(3, &vec![0x5A; len], ContentEncryptionAlg::Aes256Cbc);
            let ed = cms.enveloped_data.as_ref().unwrap();
            let ct_len = ed
                .encrypted_content_info
                .encrypted_content
                .as_ref()
                .unwrap()
                .len();
            assert_eq!(ct_len, (len / 16 + 1) * 16, "content length {len}");
        }
    }

    #[test]
    fn test_encode_to_slice() {
        let cms = envelope(4, b"slice encoding", ContentEncryptionAlg::Aes256Cbc);
        let need = cms.raw.len();

        let mut exact = vec![0u8; need];
        assert_eq!(cms.encode_to_slice(&mut exact).unwrap(), need);
        assert_eq!(exact, cms.raw);

        // Short buffer: typed error and no partial write
        let mut short = vec![0u8; need - 1];
        let err = cms.encode_to_slice(&mut short).unwrap_err();
        match err {
            PkiError::CryptoError(CryptoError::BufferTooSmall { need: n, got }) => {
                assert_eq!(n, need);
                assert_eq!(got, need - 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(short.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = ContentDescriptor::new(&[], ContentEncryptionAlg::Aes256Cbc).unwrap_err();
        assert!(matches!(err, PkiError::InvalidInput(_)));
    }

    #[test]
    fn test_max_content_padded_fits_length_field() {
        // Padding always adds a block; the padded ciphertext for content
        // at the cap must still be representable in four length bytes.
        let max_padded = (MAX_CONTENT_LEN / BLOCK_SIZE + 1) * BLOCK_SIZE;
        assert!(max_padded <= u32::MAX as usize);
    }

    #[test]
    fn test_no_recipients_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let descriptor = ContentDescriptor::new(b"x", ContentEncryptionAlg::Aes256Cbc).unwrap();
        let err = CmsMessage::encrypt_rsa(&mut rng, &descriptor, &[]).unwrap_err();
        assert!(matches!(err, PkiError::InvalidInput(_)));
    }

    #[test]
    fn test_non_rsa_recipient_rejected() {
        // id-ecPublicKey SPKI instead of rsaEncryption
        let ec_oid = Oid::new(&[1, 2, 840, 10045, 2, 1]).to_der_value();
        let cert = make_test_cert(&ec_oid, &[0x04; 65], &[0x01]);

        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let descriptor = ContentDescriptor::new(b"x", ContentEncryptionAlg::Aes256Cbc).unwrap();
        let err = CmsMessage::encrypt_rsa(&mut rng, &descriptor, &[&cert]).unwrap_err();
        assert!(matches!(err, PkiError::UnsupportedKeyType(_)));
    }

    #[test]
    fn test_garbage_recipient_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let descriptor = ContentDescriptor::new(b"x", ContentEncryptionAlg::Aes256Cbc).unwrap();
        let err = CmsMessage::encrypt_rsa(&mut rng, &descriptor, &[&[0xFF; 64]]).unwrap_err();
        assert!(matches!(err, PkiError::CertificateParse(_)));
    }

    #[test]
    fn test_multi_recipient_encoding() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let descriptor =
            ContentDescriptor::new(b"shared secret", ContentEncryptionAlg::Aes256Cbc).unwrap();
        let cms = CmsMessage::encrypt_rsa(&mut rng, &descriptor, &[CERT_DER, CERT_DER]).unwrap();

        let parsed = CmsMessage::from_der(&cms.raw).unwrap();
        let ed = parsed.enveloped_data.as_ref().unwrap();
        assert_eq!(ed.version, 0);
        assert_eq!(ed.recipient_infos.len(), 2);

        // The one CEK is wrapped independently per recipient
        let RecipientInfo::KeyTransport(a) = &ed.recipient_infos[0];
        let RecipientInfo::KeyTransport(b) = &ed.recipient_infos[1];
        assert_ne!(a.encrypted_key, b.encrypted_key);
        assert_eq!(a.rid_serial, b.rid_serial);
    }

    #[test]
    fn test_serial_kept_verbatim() {
        // A serial whose DER value carries a sign byte: the value bytes
        // must survive encode/parse untouched, not gain a second pad.
        let cert = make_rsa_test_cert(&[0x9C, 0x52, 0x11, 0x03]);

        let mut rng = ChaCha20Rng::seed_from_u64(14);
        let descriptor = ContentDescriptor::new(b"serial check", ContentEncryptionAlg::Aes256Cbc)
            .unwrap();
        let cms = CmsMessage::encrypt_rsa(&mut rng, &descriptor, &[&cert]).unwrap();

        let parsed_cert = Certificate::from_der(&cert).unwrap();
        assert_eq!(parsed_cert.serial_number, &[0x00, 0x9C, 0x52, 0x11, 0x03]);

        let parsed = CmsMessage::from_der(&cms.raw).unwrap();
        let ed = parsed.enveloped_data.as_ref().unwrap();
        let RecipientInfo::KeyTransport(ktri) = &ed.recipient_infos[0];
        assert_eq!(ktri.rid_serial, parsed_cert.serial_number);
        assert_eq!(ktri.rid_issuer, parsed_cert.issuer_raw);
    }

    #[test]
    fn test_parse_encode_roundtrip() {
        let cms = envelope(15, b"roundtrip body", ContentEncryptionAlg::Aes128Cbc);
        let parsed = CmsMessage::from_der(&cms.raw).unwrap();
        let ed = parsed.enveloped_data.as_ref().unwrap();
        assert_eq!(ed.to_der(), cms.raw);
    }

    #[test]
    fn test_unknown_recipient_choice_rejected() {
        // EnvelopedData with a [1]-tagged recipient arm
        let bogus_ri = enc_tlv(0xA1, &[]);
        let mut inner = enc_int(&[0]);
        inner.extend_from_slice(&enc_set(&bogus_ri));
        // minimal EncryptedContentInfo
        let mut eci = enc_oid(&known::pkcs7_data().to_der_value());
        eci.extend_from_slice(&enc_seq(&enc_oid(&known::aes256_cbc().to_der_value())));
        inner.extend_from_slice(&enc_seq(&eci));
        let ed = enc_seq(&inner);

        let err = parse_enveloped_data(&ed).unwrap_err();
        assert!(matches!(err, PkiError::CmsError(_)));
    }

    #[test]
    fn test_from_der_plain_data_content() {
        let ci = enc_seq(&enc_oid(&known::pkcs7_data().to_der_value()));
        let parsed = CmsMessage::from_der(&ci).unwrap();
        assert_eq!(parsed.content_type, CmsContentType::Data);
        assert!(parsed.enveloped_data.is_none());
    }

    // ── Test helpers ──────────────────────────────────────────────────

    /// Certificate with the fixture's RSA key but a chosen serial.
    fn make_rsa_test_cert(serial: &[u8]) -> Vec<u8> {
        let fixture = Certificate::from_der(CERT_DER).unwrap();
        make_test_cert(
            &known::rsa_encryption().to_der_value(),
            &fixture.public_key.public_key,
            serial,
        )
    }

    /// Build a minimal certificate shell around the given SPKI. The
    /// signature is a dummy; nothing here verifies it.
    fn make_test_cert(spki_alg_oid: &[u8], spki_key_bits: &[u8], serial: &[u8]) -> Vec<u8> {
        // AlgorithmIdentifier { oid, NULL }
        let mut alg_inner = enc_oid(spki_alg_oid);
        alg_inner.extend_from_slice(&enc_null());
        let alg_seq = enc_seq(&alg_inner);

        // SubjectPublicKeyInfo
        let mut spki_inner = alg_seq.clone();
        {
            let mut e = Encoder::new();
            e.write_bit_string(0, spki_key_bits);
            spki_inner.extend_from_slice(&e.finish());
        }
        let spki = enc_seq(&spki_inner);

        // Issuer/Subject: CN=Test
        let mut cn_attr = enc_oid(&known::common_name().to_der_value());
        {
            let mut e = Encoder::new();
            e.write_utf8_string("Test");
            cn_attr.extend_from_slice(&e.finish());
        }
        let name = enc_seq(&enc_set(&enc_seq(&cn_attr)));

        // TBSCertificate
        let mut tbs_inner = Vec::new();
        tbs_inner.extend_from_slice(&enc_explicit_ctx(0, &enc_int(&[2]))); // v3
        tbs_inner.extend_from_slice(&enc_int(serial));
        tbs_inner.extend_from_slice(&alg_seq); // signature alg placeholder
        tbs_inner.extend_from_slice(&name); // issuer
        tbs_inner.extend_from_slice(&enc_seq(&[])); // validity (skipped by parser)
        tbs_inner.extend_from_slice(&name); // subject
        tbs_inner.extend_from_slice(&spki);
        let tbs = enc_seq(&tbs_inner);

        // Certificate SEQUENCE with dummy signature
        let mut cert_inner = tbs;
        cert_inner.extend_from_slice(&alg_seq);
        {
            let mut e = Encoder::new();
            e.write_bit_string(0, &[0u8; 64]);
            cert_inner.extend_from_slice(&e.finish());
        }
        enc_seq(&cert_inner)
    }
}
