//! Environment variables for request files
//!
//! Produces the flat name → value map the [`VariableResolver`] consumes, from
//! an `http-client.env.json` style file. Secret placeholders such as
//! `{{secret:Vault:ApiKey}}` are passed through verbatim for a later stage
//! to substitute.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use dothttp::environment::{load_variables, EnvironmentConfig};
//! use dothttp::variables::VariableResolver;
//!
//! let config = EnvironmentConfig {
//!     environment: Some("dev".to_string()),
//!     ..EnvironmentConfig::default()
//! };
//! let variables = load_variables(Path::new("/path/to/workspace"), &config).unwrap();
//!
//! let mut resolver = VariableResolver::new();
//! resolver.set_variables(variables);
//! ```
//!
//! [`VariableResolver`]: crate::variables::VariableResolver

pub mod loader;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub use loader::{find_environment_file, read_environment_file, EnvironmentFile};

/// Where to look for an environment file and which environment to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Candidate file names, in order of preference.
    pub file_names: Vec<String>,

    /// How many parent directories to search above the start directory.
    pub max_parent_depth: usize,

    /// Environment to select. Falls back to the file's `active` key.
    pub environment: Option<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            file_names: vec![
                "http-client.env.json".to_string(),
                ".http-client-env.json".to_string(),
            ],
            max_parent_depth: 3,
            environment: None,
        }
    }
}

/// Loads the variable map for `config.environment` starting at `dir`.
///
/// # Arguments
///
/// * `dir` - Directory to start searching from, usually the `.http` file's
/// * `config` - Search and selection settings
///
/// # Returns
///
/// Shared variables overlaid with the selected environment. If no
/// environment file is found the map is empty. Errors are returned for
/// unreadable or malformed files and for an unknown environment name.
pub fn load_variables(dir: &Path, config: &EnvironmentConfig) -> Result<HashMap<String, String>> {
    let Some(path) = find_environment_file(dir, &config.file_names, config.max_parent_depth) else {
        debug!(dir = %dir.display(), "No environment file found");
        return Ok(HashMap::new());
    };

    read_environment_file(&path)?.variables(config.environment.as_deref())
}

/// Parses environment file JSON and returns the variables for `environment`.
pub fn parse_variables(json: &str, environment: Option<&str>) -> Result<HashMap<String, String>> {
    EnvironmentFile::parse(json)?.variables(environment)
}
