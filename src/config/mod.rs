use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::engine::renamed::normalize_tag;
use crate::rules::var_naming::DEFAULT_PATTERN;

pub const CONFIG_FILE: &str = ".playlint.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub format: OutputFormat,
    pub include: Vec<String>,
    pub ignore: Vec<String>,
    pub ignore_files: Vec<String>,
    /// Rule ids or tags that are never reported.
    pub skip_list: Vec<String>,
    /// Rule ids or tags reported as info only.
    pub warn_list: Vec<String>,
    pub rules: RulesConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub fqcn: RuleToggle,
    pub no_handler: RuleToggle,
    pub package_latest: RuleToggle,
    pub var_naming: VarNamingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RuleToggle {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VarNamingConfig {
    pub enabled: bool,
    pub pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            include: vec!["**/*.yml".into(), "**/*.yaml".into()],
            ignore: vec![
                ".git".into(),
                "node_modules".into(),
                "target".into(),
                ".venv".into(),
            ],
            ignore_files: Vec::new(),
            skip_list: Vec::new(),
            warn_list: Vec::new(),
            rules: RulesConfig::default(),
        }
    }
}

impl Default for RuleToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for VarNamingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let path = config_path.map(Path::to_path_buf).or_else(|| {
            let default = project_root.join(CONFIG_FILE);
            default.exists().then_some(default)
        });

        let mut config: Config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Cannot read config {}", path.display()))?;
                toml::from_str(&content).map_err(|e| anyhow::anyhow!("Config parse error: {e}"))?
            }
            None => Config::default(),
        };
        config.normalize_lists();
        Ok(config)
    }

    /// Rewrite outdated rule ids in `skip_list` and `warn_list`.
    fn normalize_lists(&mut self) {
        for list in [&mut self.skip_list, &mut self.warn_list] {
            for tag in list.iter_mut() {
                *tag = normalize_tag(tag);
            }
        }
    }

    pub const fn default_toml() -> &'static str {
        r#"# playlint configuration

# Which files to scan (glob patterns, case-insensitive).
include = ["**/*.yml", "**/*.yaml"]

# Directories to ignore when scanning
ignore = [".git", "node_modules", "target", ".venv"]

# Individual files to skip entirely (supports glob patterns)
# ignore_files = ["molecule/**", "requirements.yml"]

# Rule ids or tags that are never reported
# skip_list = ["fqcn[action-core]"]

# Rule ids or tags reported as info instead of failing the run
# warn_list = ["no-handler"]

[rules.package_latest]
enabled = true

[rules.var_naming]
enabled = true
# Regex every variable name must match
# pattern = "^[a-z_][a-z0-9_]*$"

[rules.no_handler]
enabled = true

[rules.fqcn]
enabled = true
"#
    }
}
