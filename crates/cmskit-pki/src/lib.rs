#![forbid(unsafe_code)]
#![doc = "X.509 certificate parsing and CMS/PKCS#7 EnvelopedData assembly."]

#[cfg(feature = "cms")]
pub(crate) mod encoding;

#[cfg(feature = "x509")]
pub mod x509;

#[cfg(feature = "cms")]
pub mod cms;
