//! Server-side TLS setup.
//!
//! TLS library initialization is explicitly an external collaborator
//! per spec's scope section — we bind `rustls`/`tokio-rustls`, we do
//! not write a TLS stack. This module is the thin glue that turns a
//! cert/key path pair into a `tokio_rustls::TlsAcceptor`, the way
//! `mssql-tls::connector` turns a `TlsConfig` into a client-side
//! connector.

use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::error::HandlerError;
use rekey_wire::ErrorCode;

/// Load a PEM certificate chain and private key from disk and build a
/// `rustls::ServerConfig` with no client-certificate verification — the
/// protocol's mutual authentication is carried by the GSS layer inside
/// the tunnel, not by TLS client certs.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, HandlerError> {
    let cert_bytes = std::fs::read(cert_path)
        .map_err(|e| HandlerError::fatal(ErrorCode::Other, format!("reading TLS cert {}: {e}", cert_path.display())))?;
    let key_bytes = std::fs::read(key_path)
        .map_err(|e| HandlerError::fatal(ErrorCode::Other, format!("reading TLS key {}: {e}", key_path.display())))?;

    let certs: Vec<_> = rustls_pemfile::certs(&mut cert_bytes.as_slice())
        .collect::<Result<_, _>>()
        .map_err(|e| HandlerError::fatal(ErrorCode::Other, format!("parsing TLS cert chain: {e}")))?;
    let key = rustls_pemfile::private_key(&mut key_bytes.as_slice())
        .map_err(|e| HandlerError::fatal(ErrorCode::Other, format!("parsing TLS private key: {e}")))?
        .ok_or_else(|| HandlerError::fatal(ErrorCode::Other, "no private key found in TLS key file"))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| HandlerError::fatal(ErrorCode::Other, format!("building TLS server config: {e}")))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
