use crate::error::{ForgeError, Result};
use crate::git::{Credentials, Identity};
use crate::template::GoTemplate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "release-forge.toml";

const DEFAULT_REMOTE: &str = "origin";
const DEFAULT_COMMITTER_NAME: &str = "Bitrise";
const DEFAULT_COMMITTER_EMAIL: &str = "bitrise@bitrise.io";

/// Settings as they appear in the config file and environment, before validation.
///
/// Every field is optional here; [RawConfig::validate] decides what is required.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RawConfig {
    pub source_dir: Option<String>,
    pub clone_url: Option<String>,
    pub ssh_key_path: Option<String>,
    pub username: Option<String>,
    pub access_token: Option<String>,
    pub version_code_file: Option<String>,
    pub version_code_regex: Option<String>,
    pub version_code_template: Option<String>,
    pub tag_file: Option<String>,
    pub tag_file_template: Option<String>,
    pub tag_name_suffix: Option<String>,
    pub release_branch_template: Option<String>,
    pub trunk_branch: Option<String>,
    pub remote_name: Option<String>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
    pub tag_version_line: Option<bool>,
}

fn overlay(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *slot = Some(value);
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ForgeError::config(format!("Missing required setting '{}'", key)))
}

fn compile_template(source: &str, key: &str) -> Result<GoTemplate> {
    GoTemplate::compile(source)
        .map_err(|e| ForgeError::config(format!("Invalid template in '{}': {}", key, e)))
}

/// Tracked files are given relative to the source directory; a leading `/`
/// is tolerated.
fn tracked_path(file: &str) -> PathBuf {
    PathBuf::from(file.trim_start_matches('/'))
}

impl RawConfig {
    /// Parse a TOML config file body
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ForgeError::config(format!("Invalid config file: {}", e)))
    }

    /// Override fields with non-empty values from `lookup` (environment style keys).
    pub fn overlay_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        overlay(&mut self.source_dir, lookup("BITRISE_SOURCE_DIR"));
        overlay(&mut self.clone_url, lookup("git_repo_url"));
        overlay(&mut self.ssh_key_path, lookup("ssh_key_save_path"));
        overlay(&mut self.username, lookup("git_username"));
        overlay(&mut self.access_token, lookup("git_access_token"));
        overlay(&mut self.version_code_file, lookup("version_code_file"));
        overlay(&mut self.version_code_regex, lookup("version_code_regex"));
        overlay(&mut self.version_code_template, lookup("version_code_template"));
        overlay(&mut self.tag_file, lookup("tag_file"));
        overlay(&mut self.tag_file_template, lookup("tag_file_template"));
        overlay(&mut self.tag_name_suffix, lookup("tag_name_suffix"));
        overlay(&mut self.release_branch_template, lookup("release_branch_template"));
        overlay(&mut self.trunk_branch, lookup("trunk_branch"));
        overlay(&mut self.remote_name, lookup("remote_name"));
        overlay(&mut self.committer_name, lookup("committer_name"));
        overlay(&mut self.committer_email, lookup("committer_email"));

        if let Some(value) = lookup("tag_version_line").filter(|v| !v.is_empty()) {
            let flag = match value.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                other => {
                    return Err(ForgeError::config(format!(
                        "tag_version_line must be true or false, got '{}'",
                        other
                    )))
                }
            };
            self.tag_version_line = Some(flag);
        }
        Ok(())
    }

    /// Check required settings and compile the regex and templates.
    pub fn validate(self) -> Result<Config> {
        let source_dir = PathBuf::from(required(self.source_dir, "source_dir")?);
        let clone_url = required(self.clone_url, "clone_url")?;
        let credentials = Credentials::for_url(
            &clone_url,
            self.ssh_key_path.as_deref(),
            self.username.as_deref(),
            self.access_token.as_deref(),
        )?;

        let version_code_file =
            tracked_path(&required(self.version_code_file, "version_code_file")?);
        let regex_source = required(self.version_code_regex, "version_code_regex")?;
        let version_code_regex = Regex::new(&regex_source).map_err(|e| {
            ForgeError::config(format!("Invalid version_code_regex '{}': {}", regex_source, e))
        })?;
        let version_code_template = compile_template(
            &required(self.version_code_template, "version_code_template")?,
            "version_code_template",
        )?;

        let tag_file = tracked_path(&required(self.tag_file, "tag_file")?);
        let tag_file_template = compile_template(
            &required(self.tag_file_template, "tag_file_template")?,
            "tag_file_template",
        )?;
        let tag_name_suffix = required(self.tag_name_suffix, "tag_name_suffix")?;
        let release_branch_template = compile_template(
            &required(self.release_branch_template, "release_branch_template")?,
            "release_branch_template",
        )?;
        let trunk_branch = required(self.trunk_branch, "trunk_branch")?;

        Ok(Config {
            source_dir,
            clone_url,
            credentials,
            version_code_file,
            version_code_regex,
            version_code_template,
            tag_file,
            tag_file_template,
            tag_name_suffix,
            release_branch_template,
            trunk_branch,
            remote_name: self.remote_name.unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            identity: Identity::new(
                self.committer_name
                    .unwrap_or_else(|| DEFAULT_COMMITTER_NAME.to_string()),
                self.committer_email
                    .unwrap_or_else(|| DEFAULT_COMMITTER_EMAIL.to_string()),
            ),
            tag_version_line: self.tag_version_line.unwrap_or(false),
        })
    }
}

/// Validated configuration for one run.
///
/// Passed by reference to every step; nothing is read from globals after loading.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_dir: PathBuf,
    pub clone_url: String,
    pub credentials: Credentials,
    pub version_code_file: PathBuf,
    pub version_code_regex: Regex,
    pub version_code_template: GoTemplate,
    pub tag_file: PathBuf,
    pub tag_file_template: GoTemplate,
    pub tag_name_suffix: String,
    pub release_branch_template: GoTemplate,
    pub trunk_branch: String,
    pub remote_name: String,
    pub identity: Identity,
    pub tag_version_line: bool,
}

impl Config {
    pub fn version_code_path(&self) -> PathBuf {
        self.source_dir.join(&self.version_code_file)
    }

    pub fn tag_file_path(&self) -> PathBuf {
        self.source_dir.join(&self.tag_file)
    }

    /// Key/value pairs for display; secrets are never included.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("source_dir", self.source_dir.display().to_string()),
            ("clone_url", self.clone_url.clone()),
            ("credentials", self.credentials.to_string()),
            ("version_code_file", self.version_code_file.display().to_string()),
            ("version_code_regex", self.version_code_regex.as_str().to_string()),
            ("version_code_template", self.version_code_template.source().to_string()),
            ("tag_file", self.tag_file.display().to_string()),
            ("tag_file_template", self.tag_file_template.source().to_string()),
            ("tag_name_suffix", self.tag_name_suffix.clone()),
            ("release_branch_template", self.release_branch_template.source().to_string()),
            ("trunk_branch", self.trunk_branch.clone()),
            ("remote_name", self.remote_name.clone()),
            ("committer", self.identity.to_string()),
            ("tag_version_line", self.tag_version_line.to_string()),
        ]
    }
}

/// Loads and validates configuration.
///
/// Reads the config file in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-forge.toml` in current directory
/// 3. `release-forge.toml` in user config directory
/// 4. No file; settings come from the environment only
///
/// Environment variables then override file values.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    load_config_with(config_path, |key| std::env::var(key).ok())
}

/// [load_config] with an explicit environment lookup
pub fn load_config_with<F>(config_path: Option<&str>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut raw = match find_config_file(config_path) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "reading config file");
            let content = fs::read_to_string(&path).map_err(|e| {
                ForgeError::config(format!("Cannot read {}: {}", path.display(), e))
            })?;
            RawConfig::from_toml(&content)?
        }
        None => RawConfig::default(),
    };
    raw.overlay_env(lookup)?;
    raw.validate()
}

fn find_config_file(config_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(PathBuf::from(path));
    }
    let local = Path::new(".").join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}
