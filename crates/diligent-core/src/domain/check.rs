//! Static check definitions and the per-OS catalog shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::error::CatalogError;

/// A single diagnostic command paired with the question the oracle should
/// answer about its output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Check {
    /// Shell command line, run through the platform shell.
    pub command: String,

    /// What the oracle should look for in the output.
    pub prompt: String,
}

impl Check {
    pub fn new(command: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            prompt: prompt.into(),
        }
    }
}

/// Operating system family a catalog entry targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    MacOs,
    Linux,
    Windows,
    Unsupported,
}

impl OsFamily {
    /// Name used in the oracle's system instruction.
    pub fn display_name(&self) -> &'static str {
        match self {
            OsFamily::MacOs => "macOS",
            OsFamily::Linux => "Linux",
            OsFamily::Windows => "Windows",
            OsFamily::Unsupported => "Unsupported OS",
        }
    }

    /// Map a `std::env::consts::OS` value to a family.
    pub fn from_target_os(os: &str) -> Self {
        match os {
            "macos" => OsFamily::MacOs,
            "linux" => OsFamily::Linux,
            "windows" => OsFamily::Windows,
            _ => OsFamily::Unsupported,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for OsFamily {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "mac" => Ok(OsFamily::MacOs),
            "linux" => Ok(OsFamily::Linux),
            "windows" | "win" => Ok(OsFamily::Windows),
            other => Err(CatalogError::UnknownOs(other.to_string())),
        }
    }
}

/// Check lists for every supported OS family.
///
/// The JSON field names match the catalog file format accepted by
/// `diligent run --catalog`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OsChecks {
    #[serde(rename = "macOS", default)]
    pub macos: Vec<Check>,

    #[serde(default)]
    pub windows: Vec<Check>,

    #[serde(default)]
    pub linux: Vec<Check>,
}

impl OsChecks {
    /// Checks for the given OS, in catalog order. Unsupported yields nothing.
    pub fn for_os(&self, os: OsFamily) -> &[Check] {
        match os {
            OsFamily::MacOs => &self.macos,
            OsFamily::Linux => &self.linux,
            OsFamily::Windows => &self.windows,
            OsFamily::Unsupported => &[],
        }
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_family_from_target_os() {
        assert_eq!(OsFamily::from_target_os("macos"), OsFamily::MacOs);
        assert_eq!(OsFamily::from_target_os("linux"), OsFamily::Linux);
        assert_eq!(OsFamily::from_target_os("windows"), OsFamily::Windows);
        assert_eq!(OsFamily::from_target_os("freebsd"), OsFamily::Unsupported);
    }

    #[test]
    fn test_os_family_display_names() {
        assert_eq!(OsFamily::MacOs.to_string(), "macOS");
        assert_eq!(OsFamily::Unsupported.to_string(), "Unsupported OS");
    }

    #[test]
    fn test_os_family_parse() {
        assert_eq!("macOS".parse::<OsFamily>().unwrap(), OsFamily::MacOs);
        assert_eq!("darwin".parse::<OsFamily>().unwrap(), OsFamily::MacOs);
        assert_eq!("Linux".parse::<OsFamily>().unwrap(), OsFamily::Linux);
        assert!("plan9".parse::<OsFamily>().is_err());
    }

    #[test]
    fn test_catalog_json_field_names() {
        let raw = r#"{
            "macOS": [{"command": "fdesetup status", "prompt": "FileVault?"}],
            "linux": [{"command": "uptime", "prompt": "Load?"}]
        }"#;
        let catalog = OsChecks::from_json(raw).expect("parse catalog");
        assert_eq!(catalog.for_os(OsFamily::MacOs).len(), 1);
        assert_eq!(catalog.for_os(OsFamily::Linux)[0].command, "uptime");
        assert!(catalog.for_os(OsFamily::Windows).is_empty());
        assert!(catalog.for_os(OsFamily::Unsupported).is_empty());
    }

    #[test]
    fn test_catalog_rejects_malformed_json() {
        let err = OsChecks::from_json("{\"macOS\": [{\"command\": 1}]}").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_catalog_load_missing_file() {
        let err = OsChecks::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
