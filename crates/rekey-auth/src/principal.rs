//! Kerberos principal name parsing.
//!
//! A principal's text representation is `component[/component...]@REALM`.
//! Components and the realm may contain an escaped `/`, `@`, or `\` as
//! `\/`, `\@`, `\\`; this parser un-escapes them the way krb5's
//! `krb5_parse_name` does, without linking a Kerberos library for it —
//! the grammar is small and self-contained.

use std::fmt;

/// A parsed Kerberos principal: an ordered list of components plus a
/// realm, e.g. `host/db1.example.org@EXAMPLE.ORG` parses to
/// `components = ["host", "db1.example.org"]`, `realm = "EXAMPLE.ORG"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KerberosPrincipal {
    components: Vec<String>,
    realm: String,
}

/// The principal text did not parse as `component[/component...]@REALM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("malformed principal name")]
pub struct ParsePrincipalError;

impl KerberosPrincipal {
    /// Parse a principal's text representation.
    pub fn parse(text: &str) -> Result<Self, ParsePrincipalError> {
        let mut components = vec![String::new()];
        let mut realm = None;
        let mut escaped = false;

        for c in text.chars() {
            if escaped {
                components.last_mut().expect("non-empty").push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '/' if realm.is_none() => components.push(String::new()),
                '@' if realm.is_none() => realm = Some(String::new()),
                _ => match &mut realm {
                    Some(r) => r.push(c),
                    None => components.last_mut().expect("non-empty").push(c),
                },
            }
        }
        if escaped {
            return Err(ParsePrincipalError);
        }
        let realm = realm.ok_or(ParsePrincipalError)?;
        if realm.is_empty() || components.iter().any(String::is_empty) {
            return Err(ParsePrincipalError);
        }
        Ok(Self { components, realm })
    }

    /// This principal's components, in order.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// This principal's realm.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Whether `realm` is byte-for-byte identical to this principal's
    /// realm (equal length, equal bytes — never a substring match).
    #[must_use]
    pub fn realm_equals(&self, realm: &str) -> bool {
        self.realm.len() == realm.len() && self.realm == realm
    }
}

impl fmt::Display for KerberosPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.components.join("/"), self.realm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_principal() {
        let p = KerberosPrincipal::parse("host/db1.example.org@EXAMPLE.ORG").unwrap();
        assert_eq!(p.components(), ["host", "db1.example.org"]);
        assert_eq!(p.realm(), "EXAMPLE.ORG");
    }

    #[test]
    fn parses_admin_principal() {
        let p = KerberosPrincipal::parse("alice/admin@EXAMPLE.ORG").unwrap();
        assert_eq!(p.components(), ["alice", "admin"]);
    }

    #[test]
    fn parses_single_component() {
        let p = KerberosPrincipal::parse("svc@EXAMPLE.ORG").unwrap();
        assert_eq!(p.components(), ["svc"]);
    }

    #[test]
    fn rejects_missing_realm() {
        assert_eq!(KerberosPrincipal::parse("host/db1"), Err(ParsePrincipalError));
    }

    #[test]
    fn rejects_empty_component() {
        assert_eq!(KerberosPrincipal::parse("host/@EXAMPLE.ORG"), Err(ParsePrincipalError));
    }

    #[test]
    fn unescapes_slash_in_component() {
        let p = KerberosPrincipal::parse(r"weird\/name@EXAMPLE.ORG").unwrap();
        assert_eq!(p.components(), ["weird/name"]);
    }

    #[test]
    fn realm_equality_is_length_and_byte_exact() {
        let p = KerberosPrincipal::parse("svc@EXAMPLE.ORG").unwrap();
        assert!(p.realm_equals("EXAMPLE.ORG"));
        assert!(!p.realm_equals("EXAMPLE.ORGX"));
        assert!(!p.realm_equals("EXAMPLE.OR"));
        assert!(!p.realm_equals("example.org"));
    }
}
