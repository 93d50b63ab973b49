//! TLS for `https://` and `wss://`.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Load the PEM certificate chain and private key named in `tls`.
///
/// Missing files are reported by name before rustls sees them.
pub async fn load_tls_config(tls: &TlsConfig) -> io::Result<RustlsConfig> {
    let cert = Path::new(&tls.cert_path);
    let key = Path::new(&tls.key_path);

    for (what, path) in [("certificate", cert), ("private key", key)] {
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("TLS {} not found at {}", what, path.display()),
            ));
        }
    }

    tracing::debug!(cert = %cert.display(), key = %key.display(), "Loading TLS material");
    RustlsConfig::from_pem_file(cert, key).await
}
