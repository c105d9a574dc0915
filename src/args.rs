use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};


/// Runs an LDAP filter query and shows the matching entries.
#[derive(Clone, Debug, Eq, Hash, Ord, Parser, PartialEq, PartialOrd)]
#[command(version)]
pub struct Opts {
    /// Directory server, e.g. `dc01.example.com` or `LDAP://dc01/DC=example,DC=com`.
    #[arg(short = 'H', long)]
    pub server: Option<String>,

    /// Account to bind as; the password is prompted for.
    #[arg(short = 'u', long, group = "auth")]
    pub username: Option<String>,

    /// TOML file holding `username`, `password` and optionally `server_address`.
    #[arg(short = 'c', long, group = "auth")]
    pub credentials_file: Option<PathBuf>,

    /// Show the attributes of the entry with this path.
    #[arg(short = 'e', long)]
    pub entry: Option<String>,

    /// Show only this attribute's first value.
    #[arg(short = 'a', long, requires = "entry")]
    pub attribute: Option<String>,

    /// Search filter without the enclosing parentheses; defaults to the current account.
    pub filter: Option<String>,
}

#[derive(Clone, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub server_address: Option<String>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_and_entry_selection_parse() {
        let opts = Opts::try_parse_from([
            "ldapinspect", "-H", "dc01", "-u", "CORP\\alice",
            "-e", "CN=alice,OU=Users,DC=corp,DC=com", "-a", "mail",
            "uid=alice",
        ]).unwrap();
        assert_eq!(opts.server.as_deref(), Some("dc01"));
        assert_eq!(opts.username.as_deref(), Some("CORP\\alice"));
        assert_eq!(opts.entry.as_deref(), Some("CN=alice,OU=Users,DC=corp,DC=com"));
        assert_eq!(opts.attribute.as_deref(), Some("mail"));
        assert_eq!(opts.filter.as_deref(), Some("uid=alice"));
    }

    #[test]
    fn username_and_credentials_file_are_exclusive() {
        assert!(Opts::try_parse_from(["ldapinspect", "-u", "alice", "-c", "creds.toml"]).is_err());
    }

    #[test]
    fn attribute_needs_entry() {
        assert!(Opts::try_parse_from(["ldapinspect", "-a", "mail"]).is_err());
    }

    #[test]
    fn credentials_file_server_is_optional() {
        let credentials: Credentials = toml::from_str("username = 'CORP\\alice'\npassword = 'x'\n").unwrap();
        assert_eq!(credentials.username, "CORP\\alice");
        assert_eq!(credentials.server_address, None);

        let credentials: Credentials = toml::from_str(
            "username = 'alice'\npassword = 'x'\nserver_address = 'dc01.corp.com'\n",
        ).unwrap();
        assert_eq!(credentials.server_address.as_deref(), Some("dc01.corp.com"));
    }
}
