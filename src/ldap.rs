use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapError, LdapResult, Scope, SearchEntry};
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use tracing::{debug, warn};

use crate::directory::{AttributeValue, Connector, Directory, DirectoryEntry};
use crate::error::SessionError;
use crate::target::BindTarget;


// LDAP result codes (RFC 4511) that mean the bind itself did not go through
const RC_INAPPROPRIATE_AUTHENTICATION: u32 = 48;
const RC_INVALID_CREDENTIALS: u32 = 49;
const RC_INSUFFICIENT_ACCESS_RIGHTS: u32 = 50;
const RC_BUSY: u32 = 51;
const RC_UNAVAILABLE: u32 = 52;


/// Connects to real servers through `ldap3`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LdapConnector;
impl LdapConnector {
    pub fn new() -> Self { Self }
}
#[async_trait]
impl Connector for LdapConnector {
    async fn bind(&self, target: &BindTarget, username: &str, password: &str) -> Result<Box<dyn Directory>, SessionError> {
        let url = target.ldap_url();
        debug!(%url, username, "connecting to directory server");
        let (conn, mut ldap) = LdapConnAsync::new(&url)
            .await.map_err(connection_error)?;
        ldap3::drive!(conn);

        ldap.simple_bind(username, password)
            .await.map_err(connection_error)?
            .success().map_err(connection_error)?;

        let base_dn = match target.base_dn() {
            Some(dn) => dn.to_owned(),
            None => get_default_naming_context(&mut ldap).await?,
        };
        debug!(%url, %base_dn, "bound to directory server");

        Ok(Box::new(LdapConnection::new(ldap, base_dn)))
    }
}


/// A bound `ldap3` connection with a fixed search base.
#[derive(Debug)]
pub struct LdapConnection {
    ldap: ldap3::Ldap,
    base_dn: String,
}
impl LdapConnection {
    pub fn new(ldap: ldap3::Ldap, base_dn: String) -> Self { Self { ldap, base_dn } }
}
#[async_trait]
impl Directory for LdapConnection {
    async fn paged_search(&mut self, filter: &str, page_size: i32) -> Result<Vec<DirectoryEntry>, SessionError> {
        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(page_size)),
        ];
        let mut stream = self.ldap.streaming_search_with(
            adapters,
            &self.base_dn,
            Scope::Subtree,
            filter,
            vec!["*"],
        ).await.map_err(search_error)?;

        let mut entries = Vec::new();
        while let Some(raw_entry) = stream.next().await.map_err(search_error)? {
            entries.push(entry_from_search(SearchEntry::construct(raw_entry)));
        }
        stream.finish().await
            .success().map_err(search_error)?;

        Ok(entries)
    }

    async fn unbind(&mut self) -> Result<(), SessionError> {
        self.ldap.unbind()
            .await.map_err(connection_error)
    }
}


/// Reads the search base from the RootDSE.
///
/// This runs while binding, before any operator filter is sent, so failures
/// are reported as connection errors.
async fn get_default_naming_context(ldap: &mut ldap3::Ldap) -> Result<String, SessionError> {
    let (rootdse_entries, _) = ldap.search(
        "",
        Scope::Base,
        "(objectClass=*)",
        vec!["defaultNamingContext", "namingContexts"],
    )
        .await.map_err(connection_error)?
        .success().map_err(connection_error)?;

    let rootdse_entries = rootdse_entries.into_iter()
        .map(SearchEntry::construct)
        .collect::<Vec<_>>();
    match naming_context(&rootdse_entries) {
        Some(nc) => Ok(nc),
        None => {
            warn!("RootDSE advertises no naming context; searching from the empty base");
            Ok(String::new())
        },
    }
}

/// `defaultNamingContext` if advertised, else the first of `namingContexts`.
fn naming_context(rootdse_entries: &[SearchEntry]) -> Option<String> {
    let mut naming_context = None;
    for rootdse_entry in rootdse_entries {
        let default_context = rootdse_entry.attrs
            .get("defaultNamingContext")
            .and_then(|values| values.first());
        let first_context = rootdse_entry.attrs
            .get("namingContexts")
            .and_then(|values| values.first());
        if let Some(context) = default_context.or(first_context) {
            naming_context = Some(context.clone());
        }
    }
    naming_context
}


fn entry_from_search(search_entry: SearchEntry) -> DirectoryEntry {
    let mut entry = DirectoryEntry::new(search_entry.dn);
    for (key, string_values) in search_entry.attrs {
        entry.properties
            .entry(key)
            .or_insert_with(Vec::new)
            .extend(string_values.into_iter().map(AttributeValue::Text));
    }
    for (key, bytes_values) in search_entry.bin_attrs {
        entry.properties
            .entry(key)
            .or_insert_with(Vec::new)
            .extend(bytes_values.into_iter().map(AttributeValue::Binary));
    }
    entry
}


/// The most specific text available: the server's diagnostic message if it sent one.
fn diagnostic(error: &LdapError) -> String {
    match error {
        LdapError::LdapResult { result } if !result.text.is_empty() => result.text.clone(),
        other => other.to_string(),
    }
}

fn is_bind_failure(result: &LdapResult) -> bool {
    matches!(
        result.rc,
        RC_INAPPROPRIATE_AUTHENTICATION
            | RC_INVALID_CREDENTIALS
            | RC_INSUFFICIENT_ACCESS_RIGHTS
            | RC_BUSY
            | RC_UNAVAILABLE
    )
}

/// Classifies an error raised while connecting or binding.
fn connection_error(error: LdapError) -> SessionError {
    SessionError::Connection { reason: diagnostic(&error) }
}

/// Classifies an error raised while searching.
fn search_error(error: LdapError) -> SessionError {
    let reason = diagnostic(&error);
    match &error {
        LdapError::FilterParsing => SessionError::Protocol { reason },
        LdapError::LdapResult { result } if is_bind_failure(result) => SessionError::Connection { reason },
        LdapError::LdapResult { .. } => SessionError::Protocol { reason },
        LdapError::Io { .. }
            | LdapError::OpSend { .. }
            | LdapError::ResultRecv { .. }
            | LdapError::Timeout { .. }
            | LdapError::EndOfStream
            | LdapError::UrlParsing { .. }
            | LdapError::UnknownScheme(_) => SessionError::Connection { reason },
        _ => SessionError::Unexpected { reason },
    }
}
