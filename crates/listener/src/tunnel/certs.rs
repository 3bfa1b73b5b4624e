//! Certificate and key file loading

use crate::error::ResourceError;
use crate::options::EndpointOption;
use std::path::{Path, PathBuf};
use tracing::debug;
use x509_parser::error::PEMError;
use x509_parser::pem::Pem;

fn read_file(field: &str, path: &str) -> Result<Vec<u8>, ResourceError> {
    std::fs::read(path).map_err(|source| ResourceError::Read {
        field: field.to_string(),
        path: PathBuf::from(path),
        source,
    })
}

fn certificate_error(field: &str, path: &Path, reason: impl Into<String>) -> ResourceError {
    ResourceError::Certificate {
        field: field.to_string(),
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Parse every `CERTIFICATE` block of a PEM buffer, returning their DER bytes
fn parse_certificates(field: &str, path: &Path, pem: &[u8]) -> Result<Vec<Vec<u8>>, ResourceError> {
    let mut certificates = Vec::new();

    for block in Pem::iter_from_buffer(pem) {
        let block = match block {
            Ok(block) => block,
            // trailing text after the last block
            Err(PEMError::MissingHeader) if !certificates.is_empty() => break,
            Err(e) => return Err(certificate_error(field, path, e.to_string())),
        };
        if block.label != "CERTIFICATE" {
            continue;
        }
        block
            .parse_x509()
            .map_err(|e| certificate_error(field, path, e.to_string()))?;
        certificates.push(block.contents);
    }

    if certificates.is_empty() {
        return Err(certificate_error(field, path, "no PEM certificate found"));
    }
    Ok(certificates)
}

/// Read a certificate and key pair for TLS termination at the edge
pub(crate) fn tls_termination(cert: &str, key: &str) -> Result<EndpointOption, ResourceError> {
    let cert_pem = read_file("cert", cert)?;
    let chain = parse_certificates("cert", Path::new(cert), &cert_pem)?;
    let key_pem = read_file("key", key)?;

    debug!(cert, key, certificates = chain.len(), "loaded TLS termination certificate");
    Ok(EndpointOption::TlsTermination { cert_pem, key_pem })
}

/// Read every CA bundle used to verify client certificates
pub(crate) fn mutual_tls_cas(paths: &[String]) -> Result<Option<EndpointOption>, ResourceError> {
    if paths.is_empty() {
        return Ok(None);
    }

    let mut cas = Vec::new();
    for path in paths {
        let pem = read_file("mutual_tls_cas", path)?;
        let certificates = parse_certificates("mutual_tls_cas", Path::new(path), &pem)?;
        debug!(path = %path, certificates = certificates.len(), "loaded mutual TLS CA bundle");
        cas.extend(certificates);
    }
    Ok(Some(EndpointOption::MutualTlsCas(cas)))
}
