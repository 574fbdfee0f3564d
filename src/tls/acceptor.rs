//! TLS acceptor creation for the https listener

use log::info;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::path::Path;

use crate::common::Result;

/// Create the TLS acceptor used when the proxy serves `proto: https`
///
/// No ALPN protocols are advertised, so clients stay on HTTP/1.1, which is
/// required for CONNECT tunnelling.
///
/// # Example
///
/// ```no_run
/// # use std::path::Path;
/// # use whitelist_proxy::tls::create_tls_acceptor;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let acceptor = create_tls_acceptor(
///     Path::new("certs/server.pem"),
///     Path::new("certs/server.key"),
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn create_tls_acceptor(pem_path: &Path, key_path: &Path) -> Result<SslAcceptor> {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls())?;

    acceptor.set_certificate_chain_file(pem_path)?;
    acceptor.set_private_key_file(key_path, SslFiletype::PEM)?;
    acceptor.check_private_key()?;

    info!("Loaded TLS certificate from {}", pem_path.display());

    Ok(acceptor.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::hash::MessageDigest;
    use openssl::pkey::PKey;
    use openssl::rsa::Rsa;
    use openssl::x509::{X509NameBuilder, X509};
    use std::fs;

    /// Write a throwaway self-signed certificate and key into `dir`
    fn self_signed(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "localhost").unwrap();
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
        builder.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();
        let cert = builder.build();

        let pem_path = dir.join("server.pem");
        let key_path = dir.join("server.key");
        fs::write(&pem_path, cert.to_pem().unwrap()).unwrap();
        fs::write(&key_path, key.private_key_to_pem_pkcs8().unwrap()).unwrap();
        (pem_path, key_path)
    }

    #[test]
    fn test_create_acceptor_from_pem() {
        let dir = tempfile::tempdir().unwrap();
        let (pem_path, key_path) = self_signed(dir.path());

        assert!(create_tls_acceptor(&pem_path, &key_path).is_ok());
    }

    #[test]
    fn test_missing_files_fail() {
        let result = create_tls_acceptor(Path::new("nope.pem"), Path::new("nope.key"));
        assert!(result.is_err());
    }
}
