// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use clinview_core::{PageSize, RefreshPolicy, WorkspaceOptions};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "clinview";
pub const CONFIG_PATH_ENV: &str = "CLINVIEW_CONFIG_PATH";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
const CONFIG_VERSION: i64 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data: Data::default(),
            view: View::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Data {
    pub workspace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct View {
    pub page_size: Option<PageSize>,
    pub on_refresh: Option<RefreshPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and keep values under [data], [view], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(workspace) = &self.data.workspace
            && workspace.trim().is_empty()
        {
            bail!(
                "data.workspace in {} must be a file path; remove it to require --workspace or --demo",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && tracing_subscriber::EnvFilter::try_new(level).is_err()
        {
            bail!(
                "log.level in {} is not a valid filter, got {:?}; use a level such as \"warn\" or \"debug\"",
                path.display(),
                level
            );
        }

        if let Some(file) = &self.log.file
            && file.trim().is_empty()
        {
            bail!("log.file in {} must be a file path", path.display());
        }

        Ok(())
    }

    pub fn workspace_path(&self) -> Option<PathBuf> {
        self.data.workspace.as_ref().map(PathBuf::from)
    }

    pub fn page_size(&self) -> PageSize {
        self.view.page_size.unwrap_or_default()
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.view.on_refresh.unwrap_or_default()
    }

    pub fn workspace_options(&self) -> WorkspaceOptions {
        WorkspaceOptions {
            refresh_policy: self.refresh_policy(),
            default_page_size: self.page_size(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_ref().map(PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# clinview config\n# Place this file at: {}\n\nversion = 1\n\n[data]\n# Optional. --workspace overrides it; --demo ignores it.\n# workspace = \"/absolute/path/to/workspace.json\"\n\n[view]\n# \"all\" or a positive row count\npage_size = \"all\"\n# \"reset\" clears search, sort and paging when a section is refreshed; \"preserve\" keeps them\non_refresh = \"reset\"\n\n[log]\n# CLINVIEW_LOG overrides this filter\nlevel = \"{}\"\n# Optional. The interactive view only logs when a file is set.\n# file = \"/absolute/path/to/clinview.log\"\n",
            path.display(),
            DEFAULT_LOG_LEVEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config};
    use anyhow::Result;
    use clinview_core::{PageSize, RefreshPolicy};
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.page_size(), PageSize::All);
        assert_eq!(config.refresh_policy(), RefreshPolicy::Reset);
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.workspace_path(), None);
        assert_eq!(config.log_file(), None);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[view]\npage_size = 25\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[data], [view], and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[data]\nworkspace = \"/srv/ward-4.json\"\n[view]\npage_size = 25\non_refresh = \"preserve\"\n[log]\nlevel = \"clinview_core=debug,warn\"\nfile = \"/tmp/clinview.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.workspace_path(), Some(PathBuf::from("/srv/ward-4.json")));
        let options = config.workspace_options();
        assert_eq!(options.default_page_size, PageSize::Rows(25));
        assert_eq!(options.refresh_policy, RefreshPolicy::Preserve);
        assert_eq!(config.log_level(), "clinview_core=debug,warn");
        assert_eq!(config.log_file(), Some(PathBuf::from("/tmp/clinview.log")));
        Ok(())
    }

    #[test]
    fn page_size_accepts_all_keyword() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[view]\npage_size = \"ALL\"\n")?;
        assert_eq!(Config::load(&path)?.page_size(), PageSize::All);
        Ok(())
    }

    #[test]
    fn zero_page_size_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[view]\npage_size = 0\n")?;
        let error = Config::load(&path).expect_err("zero page size should fail");
        assert!(format!("{error:#}").contains("invalid page size"));
        Ok(())
    }

    #[test]
    fn unknown_refresh_policy_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[view]\non_refresh = \"merge\"\n")?;
        let error = Config::load(&path).expect_err("unknown policy should fail");
        let message = format!("{error:#}");
        assert!(message.contains("decode config"));
        assert!(message.contains("merge"), "unexpected message: {message}");
        Ok(())
    }

    #[test]
    fn empty_workspace_path_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[data]\nworkspace = \"  \"\n")?;
        let error = Config::load(&path).expect_err("blank workspace should fail");
        assert!(error.to_string().contains("data.workspace"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"clinview=shouting\"\n")?;
        let error = Config::load(&path).expect_err("bad filter should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("clinview/config.toml"));
        Ok(())
    }

    #[test]
    fn example_config_loads_cleanly() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[data]"));
        assert!(example.contains("[view]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.page_size(), PageSize::All);
        assert_eq!(config.refresh_policy(), RefreshPolicy::Reset);
        Ok(())
    }
}
