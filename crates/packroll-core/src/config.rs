use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PackrollError, Result};

const CONFIG_FILE: &str = "config.toml";

/// The category labels a cover page file name may start with. Folder
/// names under a package root are expected to match one of these, and
/// only cover files whose name starts with a label get their title
/// cell rewritten.
pub const DEFAULT_HEAD_LIST: &[&str] = &[
    "Analysis",
    "CofA Step",
    "Events",
    "Format Calculation",
    "LIMS Constant",
    "LIMS Users",
    "Label Printer",
    "Lists",
    "Lot Template",
    "Product",
    "Report Template",
    "Stock",
    "Subroutine",
    "Suppliers",
    "T PH AQL Sample Plan",
    "T PH Item Code",
    "T PH Sample Plan",
    "T_PH_Grade",
    "T_PH_Spec Type",
    "T_Report Text",
    "Table Master",
    "Table Template",
    "Units",
    "User Dialog",
    "vendor",
    "Stage",
];

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# packroll configuration file
# Location: ~/.packroll/config.toml

[paths]
# Default source tree (the current package version)
# Example: source = "/data/packages/current"
source = ""

# Default target tree (where the next version is created)
# Example: target = "/data/packages/next"
target = ""

[rollover]
# Category labels recognized at the start of cover file names.
# Leave empty to use the built-in list.
head_list = []
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub rollover: RolloverConfig,
}

/// Default source/target trees so the CLI flags can be omitted
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub target: String,
}

/// Rollover behavior knobs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RolloverConfig {
    /// Category labels; empty means the built-in list
    #[serde(default)]
    pub head_list: Vec<String>,
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Effective category labels: the configured list, or the
    /// built-in one when the config leaves it empty.
    pub fn head_list(&self) -> Vec<String> {
        if self.rollover.head_list.is_empty() {
            DEFAULT_HEAD_LIST.iter().map(|s| s.to_string()).collect()
        } else {
            self.rollover.head_list.clone()
        }
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "paths.source" => Some(self.paths.source.clone()),
            "paths.target" => Some(self.paths.target.clone()),
            "rollover.head_list" => Some(format!("{:?}", self.rollover.head_list)),
            _ => None,
        }
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "paths.source" => {
                self.paths.source = value.to_string();
                Ok(())
            }
            "paths.target" => {
                self.paths.target = value.to_string();
                Ok(())
            }
            "rollover.head_list" => {
                self.rollover.head_list = parse_string_list(value);
                Ok(())
            }
            _ => Err(PackrollError::ConfigKeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            ("paths.source".to_string(), self.paths.source.clone()),
            ("paths.target".to_string(), self.paths.target.clone()),
            (
                "rollover.head_list".to_string(),
                format!("{:?}", self.rollover.head_list),
            ),
        ]
    }
}

/// Default base directory: `~/.packroll`
pub fn default_base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".packroll"))
        .ok_or(PackrollError::HomeNotFound)
}

/// Parse a comma-separated or JSON-like list string
fn parse_string_list(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = if trimmed.starts_with('[') && trimmed.ends_with(']') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    inner
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_string_list_comma() {
        let result = parse_string_list("Product,Stage");
        assert_eq!(result, vec!["Product", "Stage"]);
    }

    #[test]
    fn test_parse_string_list_json() {
        let result = parse_string_list(r#"["Product", "Stage"]"#);
        assert_eq!(result, vec!["Product", "Stage"]);
    }

    #[test]
    fn test_head_list_falls_back_to_builtin() {
        let config = Config::default();
        let heads = config.head_list();
        assert_eq!(heads.len(), DEFAULT_HEAD_LIST.len());
        assert!(heads.iter().any(|h| h == "Product"));

        let mut custom = Config::default();
        custom.rollover.head_list = vec!["PKG".to_string()];
        assert_eq!(custom.head_list(), vec!["PKG"]);
    }

    #[test]
    fn test_config_get_set() {
        let mut config = Config::default();

        config.set("paths.source", "/data/current").unwrap();
        assert_eq!(config.get("paths.source").unwrap(), "/data/current");

        config.set("rollover.head_list", "Product,Stage").unwrap();
        assert_eq!(config.rollover.head_list, vec!["Product", "Stage"]);

        let err = config.set("unknown.key", "x").unwrap_err();
        assert!(matches!(err, PackrollError::ConfigKeyNotFound { .. }));
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.paths.source = "/data/current".to_string();
        config.rollover.head_list = vec!["Product".to_string()];
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.paths.source, "/data/current");
        assert_eq!(loaded.rollover.head_list, vec!["Product"]);
    }

    #[test]
    fn test_config_load_missing_is_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.paths.source.is_empty());
        assert!(config.rollover.head_list.is_empty());
    }

    #[test]
    fn test_config_init_writes_template_once() {
        let dir = tempdir().unwrap();
        let path = Config::init(dir.path()).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.contains("[rollover]"));

        fs::write(&path, "custom = true").unwrap();
        Config::init(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "custom = true");
    }
}
