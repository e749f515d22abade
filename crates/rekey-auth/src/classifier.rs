//! Authorization classifier: derive `is_host`/`is_admin` from an
//! authenticated principal.
//!
//! Run once per session, immediately after the GSS handshake completes
//! (see [`crate::acceptor::Acceptor`]). Never re-run: the flags it
//! produces are fixed for the lifetime of the connection.

use crate::principal::KerberosPrincipal;

/// The two authorization flags and, for a host principal, the captured
/// hostname.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorization {
    /// Set when the principal is `host/<fqdn>@<default realm>`.
    pub is_host: bool,
    /// Set when the principal is `<user>/admin@<default realm>`.
    pub is_admin: bool,
    /// The `<fqdn>` captured from a `host/<fqdn>` principal. `None`
    /// unless `is_host`.
    pub hostname: Option<String>,
}

/// Classify `principal` against the server's `default_realm`.
///
/// A realm mismatch (byte-for-byte, not a substring match) leaves both
/// flags clear regardless of the principal's component shape. A
/// two-component principal of the form `host/<fqdn>` sets `is_host`
/// and captures `<fqdn>`; a two-component principal of the form
/// `<user>/admin` sets `is_admin`. Any other component shape — zero,
/// one, or three-or-more components, or a two-component principal
/// matching neither pattern — leaves both flags clear.
#[must_use]
pub fn classify(principal: &KerberosPrincipal, default_realm: &str) -> Authorization {
    if !principal.realm_equals(default_realm) {
        return Authorization::default();
    }
    match principal.components() {
        [first, second] if first == "host" => Authorization {
            is_host: true,
            is_admin: false,
            hostname: Some(second.clone()),
        },
        [_, second] if second == "admin" => Authorization {
            is_host: false,
            is_admin: true,
            hostname: None,
        },
        _ => Authorization::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(text: &str) -> KerberosPrincipal {
        KerberosPrincipal::parse(text).unwrap()
    }

    #[test]
    fn host_principal_sets_is_host_and_captures_hostname() {
        let p = principal("host/db1.example.org@EXAMPLE.ORG");
        let auth = classify(&p, "EXAMPLE.ORG");
        assert!(auth.is_host);
        assert!(!auth.is_admin);
        assert_eq!(auth.hostname.as_deref(), Some("db1.example.org"));
    }

    #[test]
    fn admin_principal_sets_is_admin_only() {
        let p = principal("alice/admin@EXAMPLE.ORG");
        let auth = classify(&p, "EXAMPLE.ORG");
        assert!(auth.is_admin);
        assert!(!auth.is_host);
        assert_eq!(auth.hostname, None);
    }

    #[test]
    fn wrong_realm_clears_both_flags() {
        let p = principal("bob/admin@OTHER.ORG");
        let auth = classify(&p, "EXAMPLE.ORG");
        assert!(!auth.is_admin);
        assert!(!auth.is_host);
    }

    #[test]
    fn single_component_principal_is_neither() {
        let p = principal("svc@EXAMPLE.ORG");
        let auth = classify(&p, "EXAMPLE.ORG");
        assert!(!auth.is_admin);
        assert!(!auth.is_host);
    }

    #[test]
    fn three_component_principal_is_neither() {
        let p = principal("a/b/c@EXAMPLE.ORG");
        let auth = classify(&p, "EXAMPLE.ORG");
        assert!(!auth.is_admin);
        assert!(!auth.is_host);
    }

    #[test]
    fn realm_is_substring_but_not_equal_is_rejected() {
        let p = principal("host/db1.example.org@EXAMPLE.ORG.EXTRA");
        let auth = classify(&p, "EXAMPLE.ORG");
        assert!(!auth.is_host);
    }
}
