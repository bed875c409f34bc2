use actix_web::http::Uri;

use crate::error::LedgerError;

/// Extract the `host:port` part of a peer address.
///
/// Accepts full URLs (`http://10.0.0.2:5000/`) and bare authorities
/// (`10.0.0.2:5000`). Anything without a host is rejected.
pub fn peer_authority(address: &str) -> Result<String, LedgerError> {
    let trimmed = address.trim();
    let uri: Uri = trimmed
        .parse()
        .map_err(|_| LedgerError::InvalidPeerAddress(trimmed.to_string()))?;

    match uri.authority() {
        Some(authority) if !authority.host().is_empty() => Ok(authority.as_str().to_string()),
        _ => Err(LedgerError::InvalidPeerAddress(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_host_and_port_of_urls() {
        assert_eq!(
            peer_authority("http://192.168.0.5:5000").unwrap(),
            "192.168.0.5:5000"
        );
        assert_eq!(
            peer_authority("https://node.example:8080/chain?x=1").unwrap(),
            "node.example:8080"
        );
    }

    #[test]
    fn accepts_bare_authorities() {
        assert_eq!(peer_authority(" localhost:5001 ").unwrap(), "localhost:5001");
    }

    #[test]
    fn rejects_addresses_without_host() {
        assert!(peer_authority("/chain").is_err());
        assert!(peer_authority("").is_err());
        assert!(peer_authority("http://").is_err());
    }
}
