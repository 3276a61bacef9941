//! Intent loader for reading intent documents from disk.
//!
//! This module handles loading intents from YAML or JSON files, with the
//! format picked from the file extension, and loading a `.env` file next
//! to the intent when one exists.

use crate::error::{IntentError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::Intent;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

/// Loader for intent documents.
#[derive(Debug, Default)]
pub struct IntentLoader {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl IntentLoader {
    /// Creates a new intent loader.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Loads an intent from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Intent> {
        let path = self.resolve(path.as_ref());
        info!("Loading intent from: {}", path.display());

        if !path.exists() {
            return Err(IntentError::FileNotFound { path }.into());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| IntentError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })?;

        match format_of(&path) {
            Format::Json => self.parse_json(&content, Some(&path)),
            Format::Yaml => self.parse_yaml(&content, Some(&path)),
        }
    }

    /// Parses an intent from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Intent> {
        debug!("Parsing YAML intent");

        let intent: Intent = serde_yaml::from_str(content).map_err(|e| IntentError::ParseError {
            message: format!("YAML parse error: {e}"),
            location: source.map(|p| p.display().to_string()),
        })?;

        debug!("Parsed intent with {} resources", intent.len());
        Ok(intent)
    }

    /// Parses an intent from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn parse_json(&self, content: &str, source: Option<&Path>) -> Result<Intent> {
        debug!("Parsing JSON intent");

        let intent: Intent = serde_json::from_str(content).map_err(|e| IntentError::ParseError {
            message: format!("JSON parse error: {e}"),
            location: source.map(|p| p.display().to_string()),
        })?;

        debug!("Parsed intent with {} resources", intent.len());
        Ok(intent)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| IntentError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: Some(env_path.display().to_string()),
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

fn format_of(path: &Path) -> Format {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
        _ => Format::Yaml,
    }
}

/// Default intent file names to search for.
pub const DEFAULT_INTENT_FILES: &[&str] = &[
    "intent.yaml",
    "intent.yml",
    "intent.json",
];

/// Finds the intent file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no intent file is found.
pub fn find_intent_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_INTENT_FILES {
            let intent_path = current.join(filename);
            if intent_path.exists() {
                info!("Found intent file: {}", intent_path.display());
                return Ok(intent_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(IntentError::FileNotFound {
        path: start.join(DEFAULT_INTENT_FILES[0]),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanwrightError;

    #[test]
    fn test_parse_yaml_intent() {
        let yaml = r#"
resources:
  - id: v1:Namespace:demo
    type: Kubernetes
    attributes:
      apiVersion: v1
      kind: Namespace
  - id: v1:Service:demo:web
    type: Kubernetes
    attributes:
      spec:
        selector:
          app: web
    dependsOn:
      - v1:Namespace:demo
"#;
        let intent = IntentLoader::new().parse_yaml(yaml, None).unwrap();
        assert_eq!(intent.len(), 2);
        assert_eq!(intent.resources[1].depends_on, vec!["v1:Namespace:demo"]);
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intent.json");
        std::fs::write(&path, r#"{"resources":[{"id":"a","type":"Terraform"}]}"#).unwrap();

        let intent = IntentLoader::new().load_file(&path).unwrap();
        assert_eq!(intent.resources[0].id, "a");
    }

    #[test]
    fn test_load_relative_to_base_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("intent.yaml"), "resources: []\n").unwrap();

        let intent = IntentLoader::new()
            .with_base_path(dir.path())
            .load_file("intent.yaml")
            .unwrap();
        assert!(intent.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = IntentLoader::new()
            .load_file(dir.path().join("missing.yaml"))
            .unwrap_err();
        assert!(matches!(
            err,
            PlanwrightError::Intent(IntentError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml_reports_location() {
        let err = IntentLoader::new()
            .parse_yaml("resources: [", Some(Path::new("broken.yaml")))
            .unwrap_err();
        match err {
            PlanwrightError::Intent(IntentError::ParseError { location, .. }) => {
                assert_eq!(location.as_deref(), Some("broken.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_find_intent_file_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("intent.yml"), "resources: []\n").unwrap();

        let found = find_intent_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("intent.yml"));
    }
}
