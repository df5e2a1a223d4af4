//! # Config Loader
//!
//! Loads the hub configuration (`HubConfig`) from a `.toml` or `.json` file,
//! or from an inline string, and validates it before anything is wired.
//!
//! Parse errors carry the config origin and the `line:column` of the fault;
//! validation errors carry the offending field path.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("hub.toml")).unwrap();
//! println!("Hub: {} ({})", config.hub.name, config.hub.role);
//! ```

mod parser;
mod validator;

pub use contracts::HubConfig;
pub use parser::ConfigFormat;
pub use validator::validate;

use contracts::ContractError;
use std::path::Path;

/// Origin label used in errors for configs not read from a file
const INLINE_ORIGIN: &str = "<inline>";

/// Hub configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a hub config file
    ///
    /// The format follows the extension (`.toml` / `.json`, case-insensitive).
    pub fn load_from_path(path: &Path) -> Result<HubConfig, ContractError> {
        let format = ConfigFormat::detect(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| ContractError::ConfigParse {
            message: format!("cannot read hub config {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::load(&content, format, &path.display().to_string())
    }

    /// Load and validate an inline hub config
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<HubConfig, ContractError> {
        Self::load(content, format, INLINE_ORIGIN)
    }

    fn load(content: &str, format: ConfigFormat, origin: &str) -> Result<HubConfig, ContractError> {
        let config = parser::parse(content, format, origin)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EligibilityPolicy, SourceType};
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[hub]
name = "edge-01"
role = "edge"

[[devices]]
code = "dev-1"
identify = "custom"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.hub.role, SourceType::Edge);
        assert_eq!(config.queue.capacity, 10_000);
        assert_eq!(config.scheduler.eligibility, EligibilityPolicy::ActiveOnline);
        assert_eq!(config.devices.len(), 1);
        assert!(config.devices[0].active);
    }

    #[test]
    fn test_json_and_toml_agree() {
        let json = r#"{
            "hub": { "name": "edge-01", "role": "edge" },
            "devices": [{ "code": "dev-1", "identify": "custom" }]
        }"#;
        let from_toml = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let from_json = ConfigLoader::load_from_str(json, ConfigFormat::Json).unwrap();
        assert_eq!(from_toml.hub.role, from_json.hub.role);
        assert_eq!(from_toml.queue.capacity, from_json.queue.capacity);
        assert_eq!(from_toml.devices[0].code, from_json.devices[0].code);
    }

    #[test]
    fn test_inline_parse_error_names_origin() {
        let err = ConfigLoader::load_from_str("[hub\nname = 1", ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("<inline>:"), "{err}");
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[hub]
name = "edge-01"
role = "edge"

[[devices]]
code = "dev-1"
identify = "custom"

[[devices]]
code = "dev-1"
identify = "custom"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.hub.name, "edge-01");
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_from_path_reports_path_on_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[hub]\nname = \"edge-01\"\nrole = \"gateway\"\n").unwrap();

        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&file.path().display().to_string()), "{message}");
        assert!(message.contains(":3:"), "{message}");
    }

    #[test]
    fn test_load_from_missing_path() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/hub.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read hub config"), "{err}");
    }
}
