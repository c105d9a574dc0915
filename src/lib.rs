//! Bind to a directory server, run a filter query, and inspect the attributes
//! of the returned entries one at a time.

pub mod args;
pub mod defaults;
pub mod directory;
pub mod error;
pub mod ldap;
pub mod session;
pub mod target;


pub use crate::directory::{AttributeValue, Connector, Directory, DirectoryEntry};
pub use crate::error::{RequiredField, SessionError};
pub use crate::ldap::LdapConnector;
pub use crate::session::{DirectorySession, ResultSummary, SearchOutcome, SessionState, PAGE_SIZE};
pub use crate::target::{BindTarget, ConnectionConfig, SearchRequest};
