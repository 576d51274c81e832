//! X.509 certificate parsing.
//!
//! Parses just enough of a DER certificate to act as a CMS recipient:
//! the serial number, the issuer name, and the subject public key. The
//! issuer name and serial are kept as the exact bytes found in the
//! certificate so they can be re-emitted verbatim inside a
//! `KeyTransRecipientInfo` recipient identifier.

use cmskit_types::{CryptoError, PkiError};
use cmskit_utils::asn1::Decoder;
use cmskit_utils::oid::{known, Oid};

use rsa::RsaPublicKey;

fn xerr(ctx: &str, e: CryptoError) -> PkiError {
    PkiError::CertificateParse(format!("{ctx}: {e}"))
}

/// Subject public key info.
#[derive(Debug, Clone)]
pub struct SubjectPublicKeyInfo {
    pub algorithm_oid: Vec<u8>,
    pub algorithm_params: Option<Vec<u8>>,
    /// BIT STRING contents (the key encoding itself).
    pub public_key: Vec<u8>,
}

/// An X.509 certificate, parsed only as far as CMS key transport needs.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// DER-encoded certificate data.
    pub raw: Vec<u8>,
    /// Certificate version (typically 3, encoded as 2).
    pub version: u8,
    /// Serial number INTEGER value bytes, exactly as encoded.
    pub serial_number: Vec<u8>,
    /// Issuer Name as the complete DER TLV, exactly as encoded.
    pub issuer_raw: Vec<u8>,
    /// Subject public key info.
    pub public_key: SubjectPublicKeyInfo,
}

fn parse_algorithm_identifier(dec: &mut Decoder) -> Result<(Vec<u8>, Option<Vec<u8>>), PkiError> {
    let mut alg_dec = dec.read_sequence().map_err(|e| xerr("AlgorithmId", e))?;
    let oid = alg_dec
        .read_oid()
        .map_err(|e| xerr("algorithm OID", e))?
        .to_vec();
    let params = if !alg_dec.is_empty() {
        let tlv = alg_dec
            .read_tlv()
            .map_err(|e| xerr("algorithm params", e))?;
        // NULL params are treated as absent
        if tlv.tag.number == 0x05 && tlv.value.is_empty() {
            None
        } else {
            Some(tlv.value.to_vec())
        }
    } else {
        None
    };
    Ok((oid, params))
}

fn parse_subject_public_key_info(dec: &mut Decoder) -> Result<SubjectPublicKeyInfo, PkiError> {
    let mut spki_dec = dec
        .read_sequence()
        .map_err(|e| xerr("SubjectPublicKeyInfo", e))?;
    let (algorithm_oid, algorithm_params) = parse_algorithm_identifier(&mut spki_dec)?;
    let (unused_bits, key_bytes) = spki_dec
        .read_bit_string()
        .map_err(|e| xerr("subjectPublicKey", e))?;
    if unused_bits != 0 {
        return Err(PkiError::CertificateParse(
            "subjectPublicKey has unused bits".into(),
        ));
    }
    Ok(SubjectPublicKeyInfo {
        algorithm_oid,
        algorithm_params,
        public_key: key_bytes.to_vec(),
    })
}

impl Certificate {
    /// Parse a certificate from DER-encoded bytes.
    pub fn from_der(data: &[u8]) -> Result<Self, PkiError> {
        let mut outer = Decoder::new(data)
            .read_sequence()
            .map_err(|e| xerr("Certificate", e))?;

        let tbs_tlv = outer.read_tlv().map_err(|e| xerr("TBSCertificate", e))?;
        let mut tbs_dec = Decoder::new(tbs_tlv.value);

        // version [0] EXPLICIT INTEGER DEFAULT v1
        let version = {
            let v_tlv = tbs_dec
                .try_read_context_specific(0, true)
                .map_err(|e| xerr("version", e))?;
            if let Some(v_tlv) = v_tlv {
                let mut v_dec = Decoder::new(v_tlv.value);
                let ver_bytes = v_dec.read_integer().map_err(|e| xerr("version", e))?;
                // Only v1..v3 exist (encoded 0..=2); anything else is bogus
                match ver_bytes {
                    [v @ 0..=2] => *v + 1,
                    _ => {
                        return Err(PkiError::CertificateParse(
                            "unsupported certificate version".into(),
                        ))
                    }
                }
            } else {
                1 // default v1
            }
        };

        // serialNumber INTEGER — keep the value bytes untouched
        let serial_number = tbs_dec
            .read_integer()
            .map_err(|e| xerr("serialNumber", e))?
            .to_vec();

        // signature AlgorithmIdentifier (inner) — not needed here
        let _ = parse_algorithm_identifier(&mut tbs_dec)?;

        // issuer Name — capture the complete TLV span
        let issuer_raw = {
            let before = tbs_dec.remaining();
            tbs_dec.read_sequence().map_err(|e| xerr("issuer", e))?;
            let consumed = before.len() - tbs_dec.remaining().len();
            before[..consumed].to_vec()
        };

        // validity, subject — skip past
        tbs_dec.read_sequence().map_err(|e| xerr("validity", e))?;
        tbs_dec.read_sequence().map_err(|e| xerr("subject", e))?;

        // subjectPublicKeyInfo
        let public_key = parse_subject_public_key_info(&mut tbs_dec)?;

        // signatureAlgorithm + signatureValue on the outer sequence
        let _ = parse_algorithm_identifier(&mut outer)?;
        outer
            .read_bit_string()
            .map_err(|e| xerr("signatureValue", e))?;

        Ok(Certificate {
            raw: data.to_vec(),
            version,
            serial_number,
            issuer_raw,
            public_key,
        })
    }

    /// Extract the recipient's RSA public key from the SPKI.
    ///
    /// Fails with `UnsupportedKeyType` when the key algorithm is not
    /// rsaEncryption.
    pub fn rsa_public_key(&self) -> Result<RsaPublicKey, PkiError> {
        let alg = Oid::from_der_value(&self.public_key.algorithm_oid)
            .map_err(|e| xerr("key algorithm OID", e))?;
        if alg != known::rsa_encryption() {
            return Err(PkiError::UnsupportedKeyType(alg.to_dot_string()));
        }

        // RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER }
        let mut key_dec = Decoder::new(&self.public_key.public_key);
        let mut key_seq = key_dec.read_sequence().map_err(|e| xerr("RSAPublicKey", e))?;
        let n = key_seq.read_integer().map_err(|e| xerr("modulus", e))?;
        let e = key_seq.read_integer().map_err(|e| xerr("publicExponent", e))?;

        cmskit_crypto::keytrans::public_key_from_parts(n, e).map_err(PkiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_DER: &[u8] = include_bytes!("../../tests/data/recipient.der");

    #[test]
    fn test_parse_recipient_cert() {
        let cert = Certificate::from_der(CERT_DER).unwrap();
        assert_eq!(cert.version, 3);
        // Serial value bytes start after any sign padding; 20-byte serial
        assert_eq!(cert.serial_number.len(), 20);
        // Issuer span is a complete SEQUENCE TLV
        assert_eq!(cert.issuer_raw[0], 0x30);
    }

    #[test]
    fn test_rsa_public_key_extraction() {
        let cert = Certificate::from_der(CERT_DER).unwrap();
        let key = cert.rsa_public_key().unwrap();
        use rsa::traits::PublicKeyParts;
        assert_eq!(key.size(), 256); // 2048-bit modulus
    }

    #[test]
    fn test_truncated_cert_rejected() {
        let err = Certificate::from_der(&CERT_DER[..40]).unwrap_err();
        assert!(matches!(err, PkiError::CertificateParse(_)));
    }

    #[test]
    fn test_bogus_version_rejected() {
        // TBS whose version INTEGER is 255: must error, never overflow
        let der = [
            0x30, 0x08, // Certificate
            0x30, 0x06, // TBSCertificate
            0xA0, 0x04, // version [0]
            0x02, 0x02, 0x00, 0xFF,
        ];
        let err = Certificate::from_der(&der).unwrap_err();
        assert!(matches!(err, PkiError::CertificateParse(_)));
    }
}
