//! Single shared-password gate.
//!
//! There is exactly one credential for the whole system. Its SHA-256 hex
//! digest comes from configuration; the password itself is never stored.

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{Result, SpooldexError};
use crate::web::SessionState;

/// Hex-encoded SHA-256 digest of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    password_hash: String,
}

impl AuthGate {
    /// Create a gate for the given hex digest.
    ///
    /// Fails if `password_hash` is not a 64 character hex string, since no
    /// candidate could ever match it.
    pub fn new(password_hash: impl AsRef<str>) -> Result<Self> {
        let hash = password_hash.as_ref().trim().to_ascii_lowercase();
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SpooldexError::Config(
                "password hash must be a 64 character SHA-256 hex digest".to_string(),
            ));
        }
        Ok(Self {
            password_hash: hash,
        })
    }

    pub fn check_password(&self, candidate: &str) -> bool {
        sha256_hex(candidate) == self.password_hash
    }

    /// Mark the session authenticated if `candidate` matches.
    ///
    /// A failed attempt leaves the session untouched.
    pub fn login(&self, session: &mut SessionState, candidate: &str) -> Result<()> {
        if !self.check_password(candidate) {
            warn!("rejected login attempt");
            return Err(SpooldexError::Authentication);
        }
        session.authenticated = true;
        info!("operator logged in");
        Ok(())
    }

    pub fn logout(&self, session: &mut SessionState) {
        session.authenticated = false;
        session.admin_visible = false;
        info!("operator logged out");
    }

    /// Refuse anything inventory related for sessions that are not logged in.
    pub fn require(&self, session: &SessionState) -> Result<()> {
        if session.authenticated {
            Ok(())
        } else {
            Err(SpooldexError::NotAuthenticated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AuthGate {
        AuthGate::new(sha256_hex("spool-secret")).unwrap()
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_check_password_only_accepts_configured_credential() {
        let gate = gate();
        assert!(gate.check_password("spool-secret"));
        assert!(!gate.check_password(""));
        assert!(!gate.check_password("spool-secret "));
        assert!(!gate.check_password("Spool-Secret"));
    }

    #[test]
    fn test_uppercase_hash_is_accepted() {
        let gate = AuthGate::new(sha256_hex("x").to_ascii_uppercase()).unwrap();
        assert!(gate.check_password("x"));
    }

    #[test]
    fn test_invalid_hash_is_rejected() {
        assert!(matches!(AuthGate::new("abc"), Err(SpooldexError::Config(_))));
        assert!(matches!(
            AuthGate::new("z".repeat(64)),
            Err(SpooldexError::Config(_))
        ));
    }

    #[test]
    fn test_login_and_logout() {
        let gate = gate();
        let mut session = SessionState::default();

        assert!(matches!(
            gate.login(&mut session, "wrong"),
            Err(SpooldexError::Authentication)
        ));
        assert!(!session.authenticated);
        assert!(matches!(
            gate.require(&session),
            Err(SpooldexError::NotAuthenticated)
        ));

        gate.login(&mut session, "spool-secret").unwrap();
        assert!(session.authenticated);
        assert!(gate.require(&session).is_ok());

        session.admin_visible = true;
        gate.logout(&mut session);
        assert!(!session.authenticated);
        assert!(!session.admin_visible);
    }
}
