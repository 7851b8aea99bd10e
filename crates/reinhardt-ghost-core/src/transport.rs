//! Template transports: where component markup comes from.
//!
//! The runtime only needs an asynchronous name to markup lookup. Three
//! implementations are provided:
//!
//! - [`DirectoryTransport`] reads `<directory>/<name>.<extension>` with `tokio::fs`
//! - [`HttpTransport`] (feature `http`) fetches `<base_url>/<name>.<extension>`
//! - [`MemoryTransport`] serves templates registered in process, for tests
//!   and embedded templates

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::TemplateConfig;
use crate::error::TransportError;

/// Asynchronous lookup of component markup by name.
#[async_trait(?Send)]
pub trait TemplateTransport {
	/// Fetches the markup of component `name`.
	async fn fetch_template(&self, name: &str) -> Result<String, TransportError>;
}

fn validate_name(name: &str) -> Result<(), TransportError> {
	if name.is_empty() {
		return Err(TransportError::new(name, "component name is empty"));
	}
	for component in Path::new(name).components() {
		match component {
			Component::ParentDir => {
				return Err(TransportError::new(
					name,
					"directory traversal attempt detected",
				));
			}
			Component::RootDir | Component::Prefix(_) => {
				return Err(TransportError::new(name, "absolute paths are not allowed"));
			}
			_ => {}
		}
	}
	Ok(())
}

/// Reads templates from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryTransport {
	directory: PathBuf,
	extension: String,
}

impl DirectoryTransport {
	/// Creates a transport reading `<directory>/<name>.html`.
	pub fn new(directory: impl Into<PathBuf>) -> Self {
		Self {
			directory: directory.into(),
			extension: "html".to_string(),
		}
	}

	/// Sets the file extension. An empty extension uses the bare name.
	pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
		self.extension = extension.into();
		self
	}

	/// Returns the template directory.
	pub fn directory(&self) -> &Path {
		&self.directory
	}

	fn path_for(&self, name: &str) -> Result<PathBuf, TransportError> {
		validate_name(name)?;
		let file_name = if self.extension.is_empty() {
			name.to_string()
		} else {
			format!("{}.{}", name, self.extension)
		};
		Ok(self.directory.join(file_name))
	}
}

#[async_trait(?Send)]
impl TemplateTransport for DirectoryTransport {
	async fn fetch_template(&self, name: &str) -> Result<String, TransportError> {
		let path = self.path_for(name)?;
		tracing::debug!(component = name, path = %path.display(), "reading template file");
		tokio::fs::read_to_string(&path)
			.await
			.map_err(|error| TransportError::new(name, format!("{}: {}", path.display(), error)))
	}
}

/// Fetches templates over HTTP.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: reqwest::Client,
	base_url: String,
	extension: String,
}

#[cfg(feature = "http")]
impl HttpTransport {
	/// Creates a transport fetching `<base_url>/<name>.html`.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.into().trim_end_matches('/').to_string(),
			extension: "html".to_string(),
		}
	}

	/// Uses a preconfigured client (timeouts, headers, proxies).
	pub fn with_client(mut self, client: reqwest::Client) -> Self {
		self.client = client;
		self
	}

	/// Sets the file extension. An empty extension uses the bare name.
	pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
		self.extension = extension.into();
		self
	}

	/// Returns the URL requested for `name`.
	pub fn url_for(&self, name: &str) -> String {
		if self.extension.is_empty() {
			format!("{}/{}", self.base_url, name)
		} else {
			format!("{}/{}.{}", self.base_url, name, self.extension)
		}
	}
}

#[cfg(feature = "http")]
#[async_trait(?Send)]
impl TemplateTransport for HttpTransport {
	async fn fetch_template(&self, name: &str) -> Result<String, TransportError> {
		validate_name(name)?;
		let url = self.url_for(name);
		tracing::debug!(component = name, url = %url, "requesting template");
		let response = self
			.client
			.get(&url)
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)
			.map_err(|error| TransportError::new(name, error.to_string()))?;
		response
			.text()
			.await
			.map_err(|error| TransportError::new(name, error.to_string()))
	}
}

/// Serves templates from memory.
///
/// Every fetch is counted per name, which lets tests assert how often the
/// cache actually reached the transport.
#[derive(Debug, Default)]
pub struct MemoryTransport {
	templates: RefCell<HashMap<String, String>>,
	fetches: RefCell<HashMap<String, usize>>,
	latency: Option<Duration>,
}

impl MemoryTransport {
	/// Creates an empty transport.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a template, builder style.
	pub fn with_template(self, name: impl Into<String>, markup: impl Into<String>) -> Self {
		self.insert(name, markup);
		self
	}

	/// Delays every fetch by `latency`.
	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	/// Adds or replaces a template.
	pub fn insert(&self, name: impl Into<String>, markup: impl Into<String>) {
		self.templates
			.borrow_mut()
			.insert(name.into(), markup.into());
	}

	/// Removes a template.
	pub fn remove(&self, name: &str) -> Option<String> {
		self.templates.borrow_mut().remove(name)
	}

	/// Number of fetches issued for `name`.
	pub fn fetch_count(&self, name: &str) -> usize {
		self.fetches.borrow().get(name).copied().unwrap_or(0)
	}

	/// Number of fetches issued for all names.
	pub fn total_fetches(&self) -> usize {
		self.fetches.borrow().values().sum()
	}
}

#[async_trait(?Send)]
impl TemplateTransport for MemoryTransport {
	async fn fetch_template(&self, name: &str) -> Result<String, TransportError> {
		*self.fetches.borrow_mut().entry(name.to_string()).or_insert(0) += 1;
		if let Some(latency) = self.latency {
			tokio::time::sleep(latency).await;
		}
		self.templates
			.borrow()
			.get(name)
			.cloned()
			.ok_or_else(|| TransportError::new(name, "template not found"))
	}
}

/// Builds the transport selected by `config`.
///
/// A configured base URL selects [`HttpTransport`] when the `http` feature
/// is enabled; otherwise templates are read from the configured directory.
pub fn transport_from_config(config: &TemplateConfig) -> Rc<dyn TemplateTransport> {
	#[cfg(feature = "http")]
	if let Some(base_url) = &config.base_url {
		return Rc::new(HttpTransport::new(base_url.clone()).with_extension(config.extension.clone()));
	}

	#[cfg(not(feature = "http"))]
	if let Some(base_url) = &config.base_url {
		tracing::warn!(
			base_url = %base_url,
			"templates.base_url is set but the `http` feature is disabled; using the template directory"
		);
	}

	Rc::new(
		DirectoryTransport::new(config.directory.clone()).with_extension(config.extension.clone()),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	#[tokio::test]
	async fn test_directory_transport_reads_named_file() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("counter.html"), "<p>count</p>").unwrap();
		let transport = DirectoryTransport::new(dir.path());

		let markup = transport.fetch_template("counter").await.unwrap();

		assert_eq!(markup, "<p>count</p>");
	}

	#[rstest]
	#[tokio::test]
	async fn test_directory_transport_supports_subdirectories() {
		let dir = TempDir::new().unwrap();
		std::fs::create_dir(dir.path().join("forms")).unwrap();
		std::fs::write(dir.path().join("forms/login.tpl"), "<form></form>").unwrap();
		let transport = DirectoryTransport::new(dir.path()).with_extension("tpl");

		let markup = transport.fetch_template("forms/login").await.unwrap();

		assert_eq!(markup, "<form></form>");
	}

	#[rstest]
	#[case("../secret")]
	#[case("forms/../../secret")]
	#[case("/etc/passwd")]
	#[case("")]
	#[tokio::test]
	async fn test_directory_transport_rejects_unsafe_names(#[case] name: &str) {
		let dir = TempDir::new().unwrap();
		let transport = DirectoryTransport::new(dir.path());

		let error = transport.fetch_template(name).await.unwrap_err();

		assert_eq!(error.name, name);
	}

	#[rstest]
	#[tokio::test]
	async fn test_directory_transport_missing_file() {
		let dir = TempDir::new().unwrap();
		let transport = DirectoryTransport::new(dir.path());

		let error = transport.fetch_template("missing").await.unwrap_err();

		assert!(error.message.contains("missing.html"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_memory_transport_counts_fetches() {
		let transport = MemoryTransport::new().with_template("a", "<i>a</i>");

		assert!(transport.fetch_template("a").await.is_ok());
		assert!(transport.fetch_template("b").await.is_err());
		transport.insert("b", "<b>b</b>");
		assert_eq!(transport.fetch_template("b").await.unwrap(), "<b>b</b>");

		assert_eq!(transport.fetch_count("a"), 1);
		assert_eq!(transport.fetch_count("b"), 2);
		assert_eq!(transport.total_fetches(), 3);
	}

	#[rstest]
	#[tokio::test]
	async fn test_transport_from_config_reads_configured_directory() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("root.htm"), "<main></main>").unwrap();
		let config = TemplateConfig {
			directory: dir.path().to_path_buf(),
			extension: "htm".to_string(),
			base_url: None,
		};

		let transport = transport_from_config(&config);

		assert_eq!(transport.fetch_template("root").await.unwrap(), "<main></main>");
	}

	#[cfg(feature = "http")]
	#[rstest]
	fn test_http_transport_url() {
		let transport = HttpTransport::new("https://example.com/templates/");

		assert_eq!(
			transport.url_for("root"),
			"https://example.com/templates/root.html"
		);
	}
}
