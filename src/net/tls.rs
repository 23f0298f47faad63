//! TLS configuration and certificate loading.

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Problems with the certificate/key pair. All are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Certificate file not found: {}", .0.display())]
    CertificateNotFound(PathBuf),

    #[error("Key file not found: {}", .0.display())]
    KeyNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("invalid certificate/key pair: {0}")]
    Rustls(#[from] rustls::Error),
}

async fn read(path: &Path, not_found: fn(PathBuf) -> TlsError) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            not_found(path.to_path_buf())
        } else {
            TlsError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Parse PEM certificate chain and private key into a rustls server config
/// advertising HTTP/2 and HTTP/1.1 via ALPN.
pub fn server_config(
    cert_pem: &[u8],
    key_pem: &[u8],
    cert_path: &Path,
    key_path: &Path,
) -> Result<rustls::ServerConfig, TlsError> {
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<Result<_, _>>()
        .map_err(|source| TlsError::Io {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|source| TlsError::Io {
            path: key_path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(key_path.to_path_buf()))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(config)
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let cert_pem = read(cert_path, TlsError::CertificateNotFound).await?;
    let key_pem = read(key_path, TlsError::KeyNotFound).await?;

    let config = server_config(&cert_pem, &key_pem, cert_path, key_path)?;
    tracing::debug!(cert = %cert_path.display(), key = %key_path.display(), "TLS material loaded");

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[tokio::test]
    async fn loads_fixture_pair() {
        assert!(load_tls_config(&fixture("cert.pem"), &fixture("key.pem")).await.is_ok());
    }

    #[test]
    fn advertises_alpn() {
        let cert = std::fs::read(fixture("cert.pem")).unwrap();
        let key = std::fs::read(fixture("key.pem")).unwrap();
        let config = server_config(&cert, &key, &fixture("cert.pem"), &fixture("key.pem")).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"h2".to_vec(), b"http/1.1".to_vec()]);
    }

    #[tokio::test]
    async fn missing_certificate() {
        let err = load_tls_config(Path::new("/nonexistent/cert.pem"), &fixture("key.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::CertificateNotFound(_)));
        assert_eq!(err.to_string(), "Certificate file not found: /nonexistent/cert.pem");
    }

    #[tokio::test]
    async fn missing_key() {
        let err = load_tls_config(&fixture("cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::KeyNotFound(_)));
    }

    #[tokio::test]
    async fn key_file_without_key() {
        // A certificate where the key should be.
        let err = load_tls_config(&fixture("cert.pem"), &fixture("cert.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::NoPrivateKey(_)));
    }

    #[tokio::test]
    async fn certificate_file_without_certificate() {
        let err = load_tls_config(&fixture("key.pem"), &fixture("key.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::NoCertificates(_)));
    }
}
