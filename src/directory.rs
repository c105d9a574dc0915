use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use unicase::UniCase;

use crate::error::SessionError;
use crate::target::BindTarget;


/// One value of a directory attribute.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AttributeValue {
    Text(String),
    Binary(Vec<u8>),
}
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Binary(bs) => write!(f, "{}", base64::engine::general_purpose::STANDARD.encode(bs)),
        }
    }
}
impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self { Self::Text(value.to_owned()) }
}
impl From<String> for AttributeValue {
    fn from(value: String) -> Self { Self::Text(value) }
}
impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self { Self::Binary(value) }
}


/// A directory object returned by a search.
///
/// Values keep the order in which the server sent them.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DirectoryEntry {
    pub path: String,
    pub properties: BTreeMap<String, Vec<AttributeValue>>,
}
impl DirectoryEntry {
    pub fn new<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_values<N, I, V>(mut self, name: N, values: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        self.properties
            .entry(name.into())
            .or_insert_with(Vec::new)
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Attribute names in ordinal order.
    pub fn list_attribute_names(&self) -> Vec<&str> {
        self.properties.keys()
            .map(|name| name.as_str())
            .collect()
    }

    fn values(&self, attribute_name: &str) -> Option<&[AttributeValue]> {
        if let Some(values) = self.properties.get(attribute_name) {
            return Some(values.as_slice());
        }
        // attribute descriptions are case-insensitive
        let wanted = UniCase::new(attribute_name);
        self.properties.iter()
            .find(|(name, _)| UniCase::new(name.as_str()) == wanted)
            .map(|(_, values)| values.as_slice())
    }

    /// String form of the first value of the attribute.
    ///
    /// A missing attribute or one without values is `None`, not an error.
    pub fn attribute_value(&self, attribute_name: &str) -> Option<String> {
        self.values(attribute_name)?
            .first()
            .map(|value| value.to_string())
    }
}


/// A bound connection that can run searches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Directory: Send {
    /// Runs a subtree search and collects every page of results.
    async fn paged_search(&mut self, filter: &str, page_size: i32) -> Result<Vec<DirectoryEntry>, SessionError>;

    async fn unbind(&mut self) -> Result<(), SessionError>;
}


/// Establishes bound connections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn bind(&self, target: &BindTarget, username: &str, password: &str) -> Result<Box<dyn Directory>, SessionError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> DirectoryEntry {
        DirectoryEntry::new("CN=alice,OU=Users,DC=corp,DC=com")
            .with_values("sn", ["Liddell"])
            .with_values("mail", ["alice@corp.com", "a.liddell@corp.com"])
            .with_values("Description", Vec::<String>::new())
            .with_values("objectGUID", [vec![0x01u8, 0x02, 0x03]])
            .with_values("cn", ["alice"])
    }

    #[test]
    fn attribute_names_are_ordinal() {
        // uppercase sorts before lowercase
        assert_eq!(alice().list_attribute_names(), vec!["Description", "cn", "mail", "objectGUID", "sn"]);
    }

    #[test]
    fn first_value_wins() {
        assert_eq!(alice().attribute_value("mail").as_deref(), Some("alice@corp.com"));
    }

    #[test]
    fn missing_or_empty_is_none() {
        let entry = alice();
        assert_eq!(entry.attribute_value("doesNotExist"), None);
        assert_eq!(entry.attribute_value("Description"), None);
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive() {
        let entry = alice();
        assert_eq!(entry.attribute_value("MAIL").as_deref(), Some("alice@corp.com"));
        assert_eq!(entry.attribute_value("objectguid").as_deref(), Some("AQID"));
    }

    #[test]
    fn exact_name_preferred_over_case_fold() {
        let entry = DirectoryEntry::new("CN=x")
            .with_values("Name", ["upper"])
            .with_values("name", ["lower"]);
        assert_eq!(entry.attribute_value("name").as_deref(), Some("lower"));
        assert_eq!(entry.attribute_value("Name").as_deref(), Some("upper"));
    }
}
