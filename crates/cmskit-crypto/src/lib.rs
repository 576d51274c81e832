#![forbid(unsafe_code)]
#![doc = "Symmetric content encryption and RSA key transport for cmskit."]

pub mod cbc;
pub mod cek;
pub mod keytrans;
