//! Environment file loader
//!
//! An environment file is a JSON object whose keys are environment names and
//! whose values are flat variable objects:
//!
//! ```json
//! {
//!   "$shared": { "apiVersion": "v2" },
//!   "dev": { "baseUrl": "http://localhost:3000" },
//!   "prod": { "baseUrl": "https://api.example.com", "apiKey": "{{secret:Vault:ApiKey}}" },
//!   "active": "dev"
//! }
//! ```
//!
//! The file is searched for starting from a directory and walking up a
//! bounded number of parents.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parsed contents of an environment file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentFile {
    /// Variables every environment inherits.
    pub shared: HashMap<String, String>,

    /// Named environments.
    pub environments: HashMap<String, HashMap<String, String>>,

    /// Environment named by the file's `active` key, if any.
    pub active: Option<String>,
}

impl EnvironmentFile {
    /// Parses environment file JSON.
    ///
    /// # Arguments
    ///
    /// * `json` - The file contents
    ///
    /// # Returns
    ///
    /// The parsed file, `Error::Json` for invalid JSON, or
    /// `Error::InvalidEnvironment` if the structure is wrong.
    pub fn parse(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json)?;
        let obj = raw
            .as_object()
            .ok_or_else(|| Error::InvalidEnvironment("root must be a JSON object".to_string()))?;

        let mut file = EnvironmentFile::default();

        for (key, value) in obj {
            match key.as_str() {
                "shared" | "$shared" => {
                    file.shared = parse_variable_map(value, "shared")?;
                }
                "active" | "$active" => {
                    file.active = value.as_str().map(str::to_string);
                }
                env_name => {
                    if !is_valid_identifier(env_name) {
                        return Err(Error::InvalidEnvironment(format!(
                            "invalid environment name '{}'",
                            env_name
                        )));
                    }
                    let variables = parse_variable_map(value, env_name)?;
                    file.environments.insert(env_name.to_string(), variables);
                }
            }
        }

        Ok(file)
    }

    /// Sorted environment names.
    pub fn environment_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.environments.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Flattens shared variables and one environment into a single map.
    ///
    /// `selected` wins over the file's `active` key. With neither, only the
    /// shared variables are returned.
    pub fn variables(&self, selected: Option<&str>) -> Result<HashMap<String, String>> {
        let mut variables = self.shared.clone();

        if let Some(name) = selected.or(self.active.as_deref()) {
            let environment = self
                .environments
                .get(name)
                .ok_or_else(|| Error::EnvironmentNotFound(name.to_string()))?;
            variables.extend(environment.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Ok(variables)
    }
}

/// Finds the first existing file named in `file_names`, looking in `start`
/// and then up to `max_parent_depth` parent directories.
pub fn find_environment_file(
    start: &Path,
    file_names: &[String],
    max_parent_depth: usize,
) -> Option<PathBuf> {
    let mut current = Some(start);

    for _ in 0..=max_parent_depth {
        let dir = current?;
        for name in file_names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        current = dir.parent();
    }

    None
}

/// Reads and parses an environment file.
pub fn read_environment_file(path: &Path) -> Result<EnvironmentFile> {
    debug!(path = %path.display(), "Loading environment file");
    let content = fs::read_to_string(path)?;
    EnvironmentFile::parse(&content)
}

/// Converts a JSON object of scalars into a string map.
fn parse_variable_map(value: &Value, context: &str) -> Result<HashMap<String, String>> {
    let obj = value.as_object().ok_or_else(|| {
        Error::InvalidEnvironment(format!("'{}' must be a JSON object", context))
    })?;

    let mut map = HashMap::with_capacity(obj.len());

    for (key, val) in obj {
        let value_str = match val {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => {
                return Err(Error::InvalidEnvironment(format!(
                    "variable '{}' in '{}' must be a string, number, boolean or null",
                    key, context
                )));
            }
        };
        map.insert(key.clone(), value_str);
    }

    Ok(map)
}

/// Environment names start with a letter or underscore and contain only
/// letters, digits, underscores and hyphens.
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
