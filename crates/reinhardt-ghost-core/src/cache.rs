//! Shared, de-duplicating template cache.
//!
//! The cache hands out one shared fetch per component name. Concurrent
//! requests for a name wait on the same fetch, and a successful result is
//! kept for the life of the cache. A failed fetch is evicted so that a later
//! request starts over.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use crate::error::TransportError;
use crate::transport::TemplateTransport;

type SharedFetch = Shared<LocalBoxFuture<'static, Result<Rc<str>, TransportError>>>;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
	/// Requests served by an existing entry, pending or resolved.
	pub hits: u64,
	/// Requests that started a new fetch.
	pub misses: u64,
	/// Fetches that failed and were evicted.
	pub failures: u64,
	/// Total number of requests.
	pub total_requests: u64,
}

impl CacheStatistics {
	/// Calculate hit rate (0.0 to 1.0)
	pub fn hit_rate(&self) -> f64 {
		if self.total_requests == 0 {
			0.0
		} else {
			self.hits as f64 / self.total_requests as f64
		}
	}

	/// Calculate miss rate (0.0 to 1.0)
	pub fn miss_rate(&self) -> f64 {
		if self.total_requests == 0 {
			0.0
		} else {
			self.misses as f64 / self.total_requests as f64
		}
	}
}

/// Template cache shared by every component of a runtime.
pub struct TemplateCache {
	transport: Rc<dyn TemplateTransport>,
	entries: RefCell<HashMap<String, SharedFetch>>,
	statistics: Cell<CacheStatistics>,
}

impl TemplateCache {
	/// Creates an empty cache over `transport`.
	pub fn new(transport: Rc<dyn TemplateTransport>) -> Self {
		Self {
			transport,
			entries: RefCell::new(HashMap::new()),
			statistics: Cell::new(CacheStatistics::default()),
		}
	}

	fn record(&self, update: impl FnOnce(&mut CacheStatistics)) {
		let mut statistics = self.statistics.get();
		update(&mut statistics);
		self.statistics.set(statistics);
	}

	fn entry(&self, name: &str) -> SharedFetch {
		let mut entries = self.entries.borrow_mut();
		if let Some(existing) = entries.get(name) {
			tracing::debug!(component = name, "template cache hit");
			self.record(|stats| {
				stats.hits += 1;
				stats.total_requests += 1;
			});
			return existing.clone();
		}

		tracing::debug!(component = name, "template cache miss");
		self.record(|stats| {
			stats.misses += 1;
			stats.total_requests += 1;
		});
		let transport = Rc::clone(&self.transport);
		let owned = name.to_string();
		let fetch = async move {
			transport
				.fetch_template(&owned)
				.await
				.map(Rc::<str>::from)
		}
		.boxed_local()
		.shared();
		entries.insert(name.to_string(), fetch.clone());
		fetch
	}

	/// Returns the markup for `name`, fetching it at most once at a time.
	pub async fn fetch(&self, name: &str) -> Result<Rc<str>, TransportError> {
		let fetch = self.entry(name);
		let result = fetch.clone().await;
		if let Err(error) = &result {
			let mut entries = self.entries.borrow_mut();
			// A newer fetch may already have replaced the failed one.
			if entries
				.get(name)
				.is_some_and(|current| current.ptr_eq(&fetch))
			{
				entries.remove(name);
				self.record(|stats| stats.failures += 1);
				tracing::debug!(component = name, %error, "evicted failed template fetch");
			}
		}
		result
	}

	/// Returns true if an entry exists for `name`, pending or resolved.
	pub fn contains(&self, name: &str) -> bool {
		self.entries.borrow().contains_key(name)
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Returns true if the cache has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}

	/// Drops the entry for `name`. Returns true if there was one.
	pub fn evict(&self, name: &str) -> bool {
		self.entries.borrow_mut().remove(name).is_some()
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.entries.borrow_mut().clear();
	}

	/// Returns a snapshot of the statistics.
	pub fn statistics(&self) -> CacheStatistics {
		self.statistics.get()
	}
}

impl fmt::Debug for TemplateCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateCache")
			.field("entries", &self.entries.borrow().keys().collect::<Vec<_>>())
			.field("statistics", &self.statistics.get())
			.finish()
	}
}
