//! TLS-specific error types

/// Failures while preparing the TLS layer.
///
/// Converted into [`crate::Error`] with the `SecureHandshake` kind.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Certificate parsing failed: {0}")]
    CertificateParsing(String),
    #[error("No usable trust anchors: {0}")]
    NoTrustAnchors(String),
    #[error("Invalid server name {0}")]
    InvalidServerName(String),
    #[error("TLS configuration rejected: {0}")]
    Config(#[from] rustls::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
