//! TLS termination module
//!
//! Builds a `TlsAcceptor` from PEM certificate material. Any failure
//! here is a [`CertificateError`]; the caller downgrades to HTTP-only
//! rather than aborting, so a broken keystore never takes down the
//! plaintext listener.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsConfig;
use crate::error::CertificateError;

/// Build a TLS acceptor from the configured certificate material.
///
/// The served chain is `cert_path` plus, when `ca_path` is configured,
/// the extra chain certificates from that file. Chain augmentation is
/// never implicit.
pub fn build_acceptor(tls: &TlsConfig) -> Result<TlsAcceptor, CertificateError> {
    let (Some(cert_path), Some(key_path)) = (&tls.cert_path, &tls.key_path) else {
        return Err(CertificateError::MissingPaths);
    };

    let mut chain = load_certs(Path::new(cert_path))?;
    if let Some(ca_path) = &tls.ca_path {
        chain.extend(load_certs(Path::new(ca_path))?);
    }
    let key = load_key(Path::new(key_path))?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(chain, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Load all PEM certificates from a file
fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, CertificateError> {
    let file = File::open(path).map_err(|source| CertificateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CertificateError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(CertificateError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

/// Load the first PEM private key (PKCS#8, PKCS#1 or SEC1) from a file
fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, CertificateError> {
    let file = File::open(path).map_err(|source| CertificateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| CertificateError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| CertificateError::NoPrivateKey(path.to_path_buf()))
}
