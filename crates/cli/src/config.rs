//! CLI configuration utilities

use anyhow::{Context, Result, bail};
use portal_core::{PortalConfig, StateDir};
use std::path::{Path, PathBuf};
use tracing::info;

/// Load the client configuration
///
/// An explicit path must exist. Without one, the file in the state
/// directory is used when present, otherwise defaults plus environment.
pub fn load_config(path: Option<&Path>, state_dir: &StateDir) -> Result<PortalConfig> {
    let path = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => Some(state_dir.config_path()).filter(|default| default.exists()),
    };

    match &path {
        Some(path) => info!("Loading configuration from: {}", path.display()),
        None => info!("Using default configuration with environment overrides"),
    }

    PortalConfig::load(path.as_deref()).context("Failed to load configuration")
}

/// Write the default configuration as TOML
pub fn generate_default_config(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = PortalConfig::default().to_toml()?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::LoginEncoding;
    use tempfile::TempDir;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let state_dir = StateDir::with_override(dir.path());

        let path = generate_default_config(&state_dir.config_path(), false).unwrap();
        assert!(path.exists());

        let config = load_config(None, &state_dir).unwrap();
        assert_eq!(config.auth.login_encoding, LoginEncoding::Form);
        assert_eq!(config.http.timeout_secs, 10);
    }

    #[test]
    fn test_generate_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("portal.toml");
        std::fs::write(&path, "# mine").unwrap();

        assert!(generate_default_config(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");

        generate_default_config(&path, true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[auth]"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let state_dir = StateDir::with_override(dir.path());

        let err = load_config(Some(&dir.path().join("missing.toml")), &state_dir).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_file_values_apply() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("portal.yaml");
        std::fs::write(&path, "auth:\n  login_encoding: json\nui:\n  redirect_delay_ms: 0\n")
            .unwrap();

        let config = load_config(Some(&path), &StateDir::with_override(dir.path())).unwrap();
        assert_eq!(config.auth.login_encoding, LoginEncoding::Json);
        assert_eq!(config.ui.redirect_delay_ms, 0);
    }
}
