//! OCI credential profile file
//!
//! The file is INI shaped and read with the `config` crate's INI format. A
//! named profile inherits any key it lacks from `[DEFAULT]`.

use crate::streaming::error::{StreamError, StreamResult};
use crate::streaming::signer::RequestSigner;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_SECTION: &str = "DEFAULT";
const REQUIRED_KEYS: [&str; 4] = ["user", "fingerprint", "key_file", "tenancy"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciProfile {
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: Option<String>,
}

type Sections = HashMap<String, HashMap<String, String>>;

impl OciProfile {
    /// Read profile `name` from the file at `path`
    pub async fn load(path: &Path, name: &str) -> StreamResult<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            StreamError::config(format!(
                "Unable to read OCI config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&contents, name).map_err(|e| match e {
            StreamError::Config { message } => {
                StreamError::config(format!("{} ({})", message, path.display()))
            }
            other => other,
        })
    }

    /// Extract profile `name` from INI text
    pub fn parse(contents: &str, name: &str) -> StreamResult<Self> {
        let sections = parse_sections(contents).map_err(StreamError::config)?;

        let defaults = find_section(&sections, DEFAULT_SECTION);
        let section = find_section(&sections, name);
        if section.is_none() && (!name.eq_ignore_ascii_case(DEFAULT_SECTION) || defaults.is_none()) {
            return Err(StreamError::config(format!(
                "Profile '{}' not found in OCI config file",
                name
            )));
        }

        let mut merged: HashMap<String, String> = defaults.cloned().unwrap_or_default();
        if let Some(section) = section {
            merged.extend(section.clone());
        }
        let lookup = |key: &str| {
            merged
                .get(key)
                .map(String::as_str)
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| lookup(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(StreamError::config(format!(
                "Profile '{}' is missing required keys: {}",
                name,
                missing.join(", ")
            )));
        }
        if lookup("pass_phrase").is_some() {
            return Err(StreamError::config(format!(
                "Profile '{}' uses an encrypted key (pass_phrase); provide an unencrypted key_file",
                name
            )));
        }

        let required = |key: &str| lookup(key).unwrap_or_default().to_string();
        Ok(Self {
            user: required("user"),
            fingerprint: required("fingerprint"),
            key_file: expand_home(lookup("key_file").unwrap_or_default()),
            tenancy: required("tenancy"),
            region: lookup("region").map(str::to_string),
        })
    }

    /// Read the key file and build a request signer
    pub async fn signer(&self) -> StreamResult<RequestSigner> {
        let pem = tokio::fs::read_to_string(&self.key_file).await.map_err(|e| {
            StreamError::config(format!(
                "Unable to read API key file {}: {}",
                self.key_file.display(),
                e
            ))
        })?;
        RequestSigner::from_pem(&self.tenancy, &self.user, &self.fingerprint, &pem)
    }
}

fn parse_sections(contents: &str) -> Result<Sections, String> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(contents, config::FileFormat::Ini))
        .build()
        .map_err(|e| format!("Invalid OCI config file: {}", e))?;
    let root: HashMap<String, config::Value> = settings
        .try_deserialize()
        .map_err(|e| format!("Invalid OCI config file: {}", e))?;

    let mut sections = Sections::new();
    for (name, value) in root {
        // Keys outside any section belong to no profile
        let Ok(table) = value.into_table() else {
            continue;
        };
        let mut entries = HashMap::new();
        for (key, value) in table {
            let value = value
                .into_string()
                .map_err(|e| format!("[{}] {}: {}", name, key, e))?;
            entries.insert(key.to_ascii_lowercase(), value.trim().to_string());
        }
        sections.insert(name, entries);
    }
    Ok(sections)
}

/// Section names are matched exactly first, then ignoring ASCII case
fn find_section<'a>(sections: &'a Sections, name: &str) -> Option<&'a HashMap<String, String>> {
    sections.get(name).or_else(|| {
        sections
            .iter()
            .find(|(section, _)| section.eq_ignore_ascii_case(name))
            .map(|(_, entries)| entries)
    })
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
