#![forbid(unsafe_code)]
#![doc = "Utility modules for cmskit: ASN.1 DER and OID handling."]

#[cfg(feature = "asn1")]
pub mod asn1;

#[cfg(feature = "oid")]
pub mod oid;
