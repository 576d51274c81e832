//! Envelope command: encrypt a file for a recipient certificate.

use std::fs;

use cmskit_pki::cms::{CmsMessage, ContentDescriptor, ContentEncryptionAlg};
use rand::rngs::OsRng;

pub fn run(
    cert: &str,
    algorithm: &str,
    input: &str,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let alg = ContentEncryptionAlg::from_name(algorithm).ok_or_else(|| {
        format!("cipher '{algorithm}' not supported. Supported: aes-128-cbc, aes-256-cbc")
    })?;
    eprintln!("Enveloping {input} -> {output} with {}", alg.as_str());

    let cert_der = fs::read(cert)?;
    let data = fs::read(input)?;

    let descriptor = ContentDescriptor::new(&data, alg)?;
    let cms = CmsMessage::encrypt_rsa(&mut OsRng, &descriptor, &[cert_der.as_slice()])?;

    fs::write(output, &cms.raw)?;
    eprintln!("Wrote {} bytes", cms.raw.len());
    Ok(())
}
