//! TLS client settings
//!
//! Settings are plain data compared structurally: two TLS factories built
//! from equal settings are interchangeable.

use std::io::BufReader;
use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};

use super::errors::TlsError;
use super::verifier::AcceptAnyServerCert;

/// Where server certificates are validated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TrustAnchors {
    /// Mozilla's root program, compiled in
    #[default]
    WebPkiRoots,
    /// The platform certificate store
    NativeRoots,
    /// Only the given DER-encoded roots
    Custom(Vec<Vec<u8>>),
    /// No validation at all. Test setups only.
    AcceptAny,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TlsSettings {
    trust: TrustAnchors,
    alpn_protocols: Vec<Vec<u8>>,
    enable_sni: bool,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            trust: TrustAnchors::WebPkiRoots,
            alpn_protocols: Vec::new(),
            enable_sni: true,
        }
    }
}

impl TlsSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trust(mut self, trust: TrustAnchors) -> Self {
        self.trust = trust;
        self
    }

    /// Trust only the certificates found in `pem`.
    ///
    /// # Errors
    ///
    /// Returns `CertificateParsing` when the PEM data is malformed or holds
    /// no certificate.
    pub fn with_pem_roots(self, pem: &[u8]) -> Result<Self, TlsError> {
        let mut reader = BufReader::new(pem);
        let roots = rustls_pemfile::certs(&mut reader)
            .map(|cert| cert.map(|der| der.as_ref().to_vec()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TlsError::CertificateParsing(e.to_string()))?;
        if roots.is_empty() {
            return Err(TlsError::CertificateParsing(
                "no certificate found in PEM data".to_string(),
            ));
        }
        Ok(self.with_trust(TrustAnchors::Custom(roots)))
    }

    /// Protocols offered through ALPN, most preferred first.
    #[must_use]
    pub fn with_alpn<I, P>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Vec<u8>>,
    {
        self.alpn_protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_sni(mut self, enabled: bool) -> Self {
        self.enable_sni = enabled;
        self
    }

    #[must_use]
    pub fn trust(&self) -> &TrustAnchors {
        &self.trust
    }

    #[must_use]
    pub fn alpn_protocols(&self) -> &[Vec<u8>] {
        &self.alpn_protocols
    }

    #[must_use]
    pub fn sni_enabled(&self) -> bool {
        self.enable_sni
    }

    /// Build the rustls client configuration, using the `ring` provider.
    ///
    /// # Errors
    ///
    /// Returns `NoTrustAnchors` when no root could be loaded and
    /// `CertificateParsing` for a custom root rustls rejects.
    pub fn client_config(&self) -> Result<Arc<ClientConfig>, TlsError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?;

        let mut config = match &self.trust {
            TrustAnchors::AcceptAny => {
                tracing::warn!("TLS certificate validation disabled");
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
                    .with_no_client_auth()
            }
            trust => builder
                .with_root_certificates(root_store(trust)?)
                .with_no_client_auth(),
        };

        config.alpn_protocols.clone_from(&self.alpn_protocols);
        config.enable_sni = self.enable_sni;
        Ok(Arc::new(config))
    }
}

fn root_store(trust: &TrustAnchors) -> Result<RootCertStore, TlsError> {
    let mut root_store = RootCertStore::empty();

    match trust {
        TrustAnchors::WebPkiRoots => {
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
        TrustAnchors::NativeRoots => {
            let cert_result = rustls_native_certs::load_native_certs();
            for err in &cert_result.errors {
                tracing::warn!("Certificate load error: {}", err);
            }
            let (added, ignored) = root_store.add_parsable_certificates(cert_result.certs);
            tracing::debug!("Loaded {} system certificates, ignored {}", added, ignored);
        }
        TrustAnchors::Custom(roots) => {
            for der in roots {
                root_store
                    .add(CertificateDer::from(der.clone()))
                    .map_err(|e| TlsError::CertificateParsing(e.to_string()))?;
            }
        }
        TrustAnchors::AcceptAny => {}
    }

    if root_store.is_empty() {
        return Err(TlsError::NoTrustAnchors(format!("{trust:?} yielded no roots")));
    }
    Ok(root_store)
}
