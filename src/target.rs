use std::fmt;

use unicase::UniCase;

use crate::error::{RequiredField, SessionError};


/// Scheme token every bind target starts with.
pub const SCHEME_PREFIX: &str = "LDAP://";


/// What the operator typed in to reach the directory.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct ConnectionConfig {
    pub server_address: String,
    pub username: String,
    pub password: String,
}
impl ConnectionConfig {
    pub fn new<S: Into<String>, U: Into<String>, P: Into<String>>(server_address: S, username: U, password: P) -> Self {
        Self {
            server_address: server_address.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Checks the required fields in order: server address, username, password.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.server_address.trim().is_empty() {
            return Err(SessionError::validation(RequiredField::ServerAddress));
        }
        if self.username.is_empty() {
            return Err(SessionError::validation(RequiredField::Username));
        }
        if self.password.is_empty() {
            return Err(SessionError::validation(RequiredField::Password));
        }
        Ok(())
    }
}
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_address", &self.server_address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}


#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SearchRequest {
    pub filter: String,
}
impl SearchRequest {
    pub fn new<F: Into<String>>(filter: F) -> Self {
        Self { filter: filter.into() }
    }

    /// The filter as submitted to the server: wrapped in one pair of parentheses.
    pub fn effective_filter(&self) -> Result<String, SessionError> {
        if self.filter.trim().is_empty() {
            return Err(SessionError::validation(RequiredField::Filter));
        }
        Ok(format!("({})", self.filter))
    }
}


/// A normalized server address, e.g. `LDAP://dc01.example.com` or
/// `LDAP://dc01.example.com:389/OU=Users,DC=example,DC=com`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BindTarget {
    address: String,
}
impl BindTarget {
    pub fn from_address(server_address: &str) -> Self {
        let trimmed = server_address.trim();
        let address = if has_scheme_prefix(trimmed) {
            trimmed.to_owned()
        } else {
            format!("{}{}", SCHEME_PREFIX, trimmed)
        };
        Self { address }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn without_prefix(&self) -> &str {
        // from_address guarantees the prefix; it is ASCII so the slice is on a boundary
        &self.address[SCHEME_PREFIX.len()..]
    }

    /// The host (and optional port) part of the address.
    pub fn host(&self) -> &str {
        match self.without_prefix().split_once('/') {
            Some((host, _)) => host,
            None => self.without_prefix(),
        }
    }

    /// The search base embedded after the host, if any.
    pub fn base_dn(&self) -> Option<&str> {
        self.without_prefix()
            .split_once('/')
            .map(|(_, dn)| dn)
            .filter(|dn| !dn.is_empty())
    }

    /// URL in the form the LDAP client library expects.
    pub fn ldap_url(&self) -> String {
        format!("ldap://{}", self.host())
    }
}
impl fmt::Display for BindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

fn has_scheme_prefix(address: &str) -> bool {
    address.get(..SCHEME_PREFIX.len())
        .map(|prefix| UniCase::new(prefix) == UniCase::new(SCHEME_PREFIX))
        .unwrap_or(false)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_prefixed() {
        let target = BindTarget::from_address("dc01.example.com");
        assert_eq!(target.address(), "LDAP://dc01.example.com");
        assert_eq!(target.to_string(), "LDAP://dc01.example.com");
    }

    #[test]
    fn existing_prefix_is_kept_in_any_case() {
        for address in ["LDAP://dc01.example.com", "ldap://dc01.example.com", "LdAp://dc01.example.com"] {
            assert_eq!(BindTarget::from_address(address).address(), address);
        }
    }

    #[test]
    fn host_and_base_are_split() {
        let target = BindTarget::from_address("dc01:3268/OU=Users,DC=corp,DC=com");
        assert_eq!(target.host(), "dc01:3268");
        assert_eq!(target.base_dn(), Some("OU=Users,DC=corp,DC=com"));
        assert_eq!(target.ldap_url(), "ldap://dc01:3268");

        let target = BindTarget::from_address("LDAP://dc01/");
        assert_eq!(target.host(), "dc01");
        assert_eq!(target.base_dn(), None);
    }

    #[test]
    fn short_and_non_ascii_addresses_do_not_panic() {
        assert_eq!(BindTarget::from_address("dc").address(), "LDAP://dc");
        assert_eq!(BindTarget::from_address("läp://x").address(), "LDAP://läp://x");
    }

    #[test]
    fn validation_checks_fields_in_order() {
        let err = ConnectionConfig::new("", "", "").validate().unwrap_err();
        assert!(matches!(err, SessionError::Validation { field: RequiredField::ServerAddress }));

        let err = ConnectionConfig::new("dc01", "", "").validate().unwrap_err();
        assert!(matches!(err, SessionError::Validation { field: RequiredField::Username }));

        let err = ConnectionConfig::new("dc01", "CORP\\alice", "").validate().unwrap_err();
        assert!(matches!(err, SessionError::Validation { field: RequiredField::Password }));

        assert!(ConnectionConfig::new("dc01", "CORP\\alice", "x").validate().is_ok());
    }

    #[test]
    fn filter_is_wrapped_once() {
        let request = SearchRequest::new("samAccountName=jdoe");
        assert_eq!(request.effective_filter().unwrap(), "(samAccountName=jdoe)");

        let err = SearchRequest::new("  ").effective_filter().unwrap_err();
        assert!(matches!(err, SessionError::Validation { field: RequiredField::Filter }));
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", ConnectionConfig::new("dc01", "alice", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
