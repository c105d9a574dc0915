use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::directory::{Connector, Directory, DirectoryEntry};
use crate::error::SessionError;
use crate::ldap::LdapConnector;
use crate::target::{BindTarget, ConnectionConfig, SearchRequest};


/// Entries requested per protocol round trip.
pub const PAGE_SIZE: i32 = 255;


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SessionState {
    /// Open, with no results loaded.
    Bound,
    HasResults,
}


#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResultSummary {
    pub count: usize,

    /// Entry paths in ordinal order.
    pub entries: Vec<String>,
}


#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SearchOutcome {
    Found(ResultSummary),
    Empty,
}


/// A directory connection plus the result set of the most recent search.
///
/// The connection is established lazily by the first search and reused
/// afterwards. Only one search can run at a time since `search` borrows the
/// session mutably.
pub struct DirectorySession {
    target: BindTarget,
    username: String,
    password: String,
    connector: Box<dyn Connector>,
    directory: Option<Box<dyn Directory>>,
    results: Vec<DirectoryEntry>,
}
impl DirectorySession {
    /// Opens a session that talks to the server over LDAP.
    pub fn open(config: ConnectionConfig) -> Result<Self, SessionError> {
        Self::open_with_connector(config, Box::new(LdapConnector::new()))
    }

    pub fn open_with_connector(config: ConnectionConfig, connector: Box<dyn Connector>) -> Result<Self, SessionError> {
        config.validate()?;
        let target = BindTarget::from_address(&config.server_address);
        debug!(server = %target, username = %config.username, "directory session opened");
        Ok(Self {
            target,
            username: config.username,
            password: config.password,
            connector,
            directory: None,
            results: Vec::new(),
        })
    }

    pub fn target(&self) -> &BindTarget {
        &self.target
    }

    pub fn state(&self) -> SessionState {
        if self.results.is_empty() {
            SessionState::Bound
        } else {
            SessionState::HasResults
        }
    }

    /// Runs a search and replaces the current result set with its entries.
    ///
    /// The previous result set is discarded before the search is issued, so
    /// after a failure the session holds no results.
    pub async fn search(&mut self, request: &SearchRequest) -> Result<SearchOutcome, SessionError> {
        let filter = request.effective_filter()?;
        self.results.clear();

        debug!(server = %self.target, %filter, "searching");
        let entries = match self.run_search(&filter).await {
            Ok(entries) => entries,
            Err(e) => {
                if e.invalidates_connection() {
                    self.directory = None;
                }
                debug!(server = %self.target, %filter, error = %e, "search failed");
                return Err(e);
            },
        };
        debug!(server = %self.target, %filter, count = entries.len(), "search finished");

        warn_on_duplicate_paths(&entries);
        self.results = entries;

        if self.results.is_empty() {
            return Ok(SearchOutcome::Empty);
        }
        let entries: Vec<String> = self.list_entries()
            .into_iter()
            .map(|path| path.to_owned())
            .collect();
        Ok(SearchOutcome::Found(ResultSummary {
            count: entries.len(),
            entries,
        }))
    }

    async fn run_search(&mut self, filter: &str) -> Result<Vec<DirectoryEntry>, SessionError> {
        let directory = match self.directory.take() {
            Some(d) => d,
            None => self.connector.bind(&self.target, &self.username, &self.password).await?,
        };
        let directory = self.directory.insert(directory);
        directory.paged_search(filter, PAGE_SIZE).await
    }

    /// Paths of the current result set in ordinal order.
    pub fn list_entries(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.results.iter()
            .map(|entry| entry.path.as_str())
            .collect();
        paths.sort_unstable();
        paths
    }

    pub fn select_entry(&self, path: &str) -> Option<&DirectoryEntry> {
        self.results.iter()
            .find(|entry| entry.path == path)
    }

    /// Discards the results and unbinds from the server.
    pub async fn close(mut self) -> Result<(), SessionError> {
        self.results.clear();
        if let Some(mut directory) = self.directory.take() {
            debug!(server = %self.target, "unbinding");
            directory.unbind().await?;
        }
        Ok(())
    }
}

fn warn_on_duplicate_paths(entries: &[DirectoryEntry]) {
    let mut seen = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.path.as_str()) {
            warn!(path = %entry.path, "search returned the same path more than once; selecting it picks the first");
        }
    }
}
