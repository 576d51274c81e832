//! Open command: decrypt an enveloped file with an RSA private key.

use std::fs;

use cmskit_pki::cms::CmsMessage;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;

pub fn run(key: &str, input: &str, output: &str) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Opening {input} -> {output}");

    let key_bytes = fs::read(key)?;
    let priv_key = if key_bytes.starts_with(b"-----") {
        let pem = std::str::from_utf8(&key_bytes)?;
        RsaPrivateKey::from_pkcs8_pem(pem)?
    } else {
        RsaPrivateKey::from_pkcs8_der(&key_bytes)?
    };

    let cms = CmsMessage::from_der(&fs::read(input)?)?;
    let plaintext = cms.decrypt_rsa(&priv_key)?;

    fs::write(output, &plaintext)?;
    eprintln!("Decrypted {} bytes", plaintext.len());
    Ok(())
}
