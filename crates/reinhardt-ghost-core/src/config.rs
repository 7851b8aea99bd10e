//! Runtime configuration.
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! document is a valid configuration:
//!
//! ```toml
//! [markers]
//! prefix = "data-"
//! events = ["click", "submit"]
//! anchor_text = " an anchor comment "
//!
//! [templates]
//! directory = "templates"
//! extension = "html"
//! # base_url = "https://example.com/templates"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding [`TemplateConfig::directory`].
pub const TEMPLATE_DIR_ENV: &str = "REINHARDT_GHOST_TEMPLATE_DIR";

/// Environment variable overriding [`TemplateConfig::base_url`].
pub const BASE_URL_ENV: &str = "REINHARDT_GHOST_BASE_URL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostConfig {
	/// Marker attribute settings.
	pub markers: MarkerConfig,
	/// Template lookup settings.
	pub templates: TemplateConfig,
}

/// Names of the marker attributes recognized in templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
	/// Prefix shared by all marker attributes.
	pub prefix: String,
	/// Events that may be bound with `on-<event>` markers.
	pub events: Vec<String>,
	/// Text of the comment left in place of a hidden node.
	pub anchor_text: String,
}

impl Default for MarkerConfig {
	fn default() -> Self {
		Self {
			prefix: "data-".to_string(),
			events: vec!["click".to_string(), "submit".to_string()],
			anchor_text: " an anchor comment ".to_string(),
		}
	}
}

impl MarkerConfig {
	/// Attribute holding a visibility expression.
	pub fn show_if(&self) -> String {
		format!("{}show-if", self.prefix)
	}

	/// Attribute holding a value expression.
	pub fn value(&self) -> String {
		format!("{}value", self.prefix)
	}

	/// Attribute naming a sub-component.
	pub fn component(&self) -> String {
		format!("{}component", self.prefix)
	}

	/// Attribute binding `event` to a handler.
	pub fn on(&self, event: &str) -> String {
		format!("{}on-{}", self.prefix, event)
	}
}

/// Where templates come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
	/// Directory searched by the directory transport.
	pub directory: PathBuf,
	/// File extension appended to component names.
	pub extension: String,
	/// Base URL for the HTTP transport. Selects it when set.
	pub base_url: Option<String>,
}

impl Default for TemplateConfig {
	fn default() -> Self {
		Self {
			directory: PathBuf::from("templates"),
			extension: "html".to_string(),
			base_url: None,
		}
	}
}

impl TemplateConfig {
	/// File name for a component, e.g. `counter.html`.
	pub fn file_name(&self, name: &str) -> String {
		if self.extension.is_empty() {
			name.to_string()
		} else {
			format!("{}.{}", name, self.extension)
		}
	}
}

impl GhostConfig {
	/// Parses a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(source)?)
	}

	/// Reads and parses a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&source)
	}

	/// Applies overrides from the process environment.
	pub fn with_env_overrides(self) -> Self {
		self.with_overrides_from(|key| std::env::var(key).ok())
	}

	/// Applies overrides from `lookup`, which maps variable names to values.
	pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
		if let Some(directory) = lookup(TEMPLATE_DIR_ENV).filter(|value| !value.is_empty()) {
			tracing::debug!(directory = %directory, "template directory overridden from environment");
			self.templates.directory = PathBuf::from(directory);
		}
		if let Some(base_url) = lookup(BASE_URL_ENV).filter(|value| !value.is_empty()) {
			tracing::debug!(base_url = %base_url, "template base url overridden from environment");
			self.templates.base_url = Some(base_url);
		}
		self
	}
}
