//! Persisted store formats
//!
//! Pure encode/decode of the flat key space; reading and writing bytes is the sink's job.

mod properties;
mod xml;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// `key=value` lines with an optional leading description comment
    #[default]
    Properties,
    /// `<preference id=".." value=".."/>` elements under `<preferences>`
    Xml,
}

impl StoreFormat {
    /// `.xml` selects XML, anything else properties.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => Self::Xml,
            _ => Self::Properties,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::Xml => "xml",
        }
    }

    pub fn encode(
        &self,
        entries: &BTreeMap<String, String>,
        description: Option<&str>,
    ) -> DomainResult<String> {
        match self {
            Self::Properties => Ok(properties::encode(entries, description)),
            Self::Xml => xml::encode(entries),
        }
    }

    pub fn decode(&self, content: &str) -> DomainResult<BTreeMap<String, String>> {
        match self {
            Self::Properties => properties::decode(content),
            Self::Xml => xml::decode(content),
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StoreFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "properties" | "props" => Ok(Self::Properties),
            "xml" => Ok(Self::Xml),
            other => Err(format!("unknown store format: {other} (expected properties or xml)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("prefs.xml", StoreFormat::Xml)]
    #[case("PREFS.XML", StoreFormat::Xml)]
    #[case("prefs.properties", StoreFormat::Properties)]
    #[case("prefs", StoreFormat::Properties)]
    fn given_path_when_detecting_format_then_uses_extension(
        #[case] path: &str,
        #[case] expected: StoreFormat,
    ) {
        assert_eq!(StoreFormat::from_path(Path::new(path)), expected);
    }

    #[test]
    fn given_unknown_name_when_parsing_then_rejects() {
        assert_eq!("XML".parse::<StoreFormat>().unwrap(), StoreFormat::Xml);
        assert!("yaml".parse::<StoreFormat>().is_err());
    }
}
