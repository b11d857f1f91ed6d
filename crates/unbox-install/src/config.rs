//! Installer configuration.
//!
//! Read from `<resources>/config.toml`, then overridden by `UNBOX_`-prefixed
//! environment variables. Nested keys use `__`, e.g.
//! `UNBOX_VARIABLES__PRODUCT=Studio`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ENV_PREFIX: &str = "UNBOX_";

const EXTRA_EXPANSION_PASSES: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Values templates and post-actions draw on: `product`, `version`,
    /// `company_short`, `tagline`, `icon_file`, `start_command`,
    /// `uninstaller_name`, `show_terminal_during_app_run`.
    pub variables:                  BTreeMap<String, String>,
    pub must_accept_license_on_cli: bool,
    /// Joined with the home directory to propose a target.
    pub default_install_dir_name:   String,
    /// Only install archive members below this prefix.
    pub subdir:                     Option<String>,
    #[serde(skip)]
    pub no_launcher:                bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            variables:                  BTreeMap::new(),
            must_accept_license_on_cli: true,
            default_install_dir_name:   "{{product}}".to_string(),
            subdir:                     None,
            no_launcher:                false,
        }
    }
}

impl InstallerConfig {
    /// Defaults, then the resources config file, then the environment.
    pub fn figment(resources: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(resources.join(CONFIG_FILE_NAME)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(resources: &Path) -> Result<Self, ConfigError> { Self::from_figment(Self::figment(resources)) }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        tracing::debug!("loaded installer config with {} variables", config.variables.len());
        Ok(config)
    }

    pub fn variable(&self, key: &str) -> &str { self.variables.get(key).map_or("", String::as_str) }

    pub fn expand(&self, template: &str) -> String { expand_variables(template, &self.variables) }

    /// `~/<default_install_dir_name>`, with variables expanded.
    pub fn default_install_dir(&self) -> Option<PathBuf> {
        let name = self.expand(&self.default_install_dir_name);
        home::home_dir().map(|home| home.join(name.trim()))
    }
}

/// Substitute `{{key}}` (or `{{.key}}`) placeholders from `vars`.
///
/// Unknown keys expand to nothing. Results that still contain `{{` are
/// expanded again, at most three more times.
pub fn expand_variables(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = expand_once(template, vars);
    for _ in 0..EXTRA_EXPANSION_PASSES {
        if !out.contains("{{") {
            break;
        }
        out = expand_once(&out, vars);
    }
    out
}

fn expand_once(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim().trim_start_matches('.');
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => tracing::debug!("template variable '{}' is not set", key),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn expands_known_and_drops_unknown() {
        let vars = vars(&[("product", "Studio"), ("version", "2.1")]);
        assert_eq!(expand_variables("{{product}} {{ .version }}", &vars), "Studio 2.1");
        assert_eq!(expand_variables("[{{missing}}]", &vars), "[]");
        assert_eq!(expand_variables("open {{product", &vars), "open {{product");
    }

    #[test]
    fn nested_values_are_reexpanded() {
        let vars = vars(&[("title", "{{product}} Setup"), ("product", "{{name}}"), ("name", "Studio")]);
        assert_eq!(expand_variables("{{title}}", &vars), "Studio Setup");
    }

    #[test]
    fn self_reference_stops() {
        let vars = vars(&[("loop", "x{{loop}}")]);
        assert_eq!(expand_variables("{{loop}}", &vars), "xxxx{{loop}}");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let resources = tempfile::tempdir().unwrap();
        let figment = Figment::from(Serialized::defaults(InstallerConfig::default()))
            .merge(Toml::file(resources.path().join(CONFIG_FILE_NAME)));
        let config = InstallerConfig::from_figment(figment).unwrap();
        assert_eq!(config, InstallerConfig::default());
        assert!(config.must_accept_license_on_cli);
    }

    #[test]
    fn file_overrides_defaults() {
        let resources = tempfile::tempdir().unwrap();
        std::fs::write(
            resources.path().join(CONFIG_FILE_NAME),
            r#"
must_accept_license_on_cli = false
default_install_dir_name = "{{company_short}}/{{product}}"
subdir = "payload"

[variables]
product = "Studio"
company_short = "Acme"
"#,
        )
        .unwrap();

        let figment = Figment::from(Serialized::defaults(InstallerConfig::default()))
            .merge(Toml::file(resources.path().join(CONFIG_FILE_NAME)));
        let config = InstallerConfig::from_figment(figment).unwrap();

        assert!(!config.must_accept_license_on_cli);
        assert_eq!(config.subdir.as_deref(), Some("payload"));
        assert_eq!(config.variable("product"), "Studio");
        assert_eq!(config.expand(&config.default_install_dir_name), "Acme/Studio");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let resources = tempfile::tempdir().unwrap();
        std::fs::write(resources.path().join(CONFIG_FILE_NAME), "must_accept_license_on_cli = \"maybe\"").unwrap();

        let figment = Figment::from(Serialized::defaults(InstallerConfig::default()))
            .merge(Toml::file(resources.path().join(CONFIG_FILE_NAME)));
        assert!(InstallerConfig::from_figment(figment).is_err());
    }
}
