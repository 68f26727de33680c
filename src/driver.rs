//! Page driver contract and its CDP-backed implementation.
//!
//! The quiz engine only ever talks to the page through [`PageDriver`], so the
//! whole resolution pipeline can run against a scripted in-memory driver in tests.

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use chromiumoxide::{Page, element::Element};

/// Selector engine of a [`Locator`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum By {
	Css,
	XPath,
}

/// Opaque selector-engine + selector-string pair. The literal values live in
/// [`crate::selectors`] and are a fixed site contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locator {
	pub by: By,
	pub query: String,
}

impl Locator {
	pub fn css(query: impl Into<String>) -> Self {
		Self { by: By::Css, query: query.into() }
	}

	pub fn xpath(query: impl Into<String>) -> Self {
		Self { by: By::XPath, query: query.into() }
	}
}

impl std::fmt::Display for Locator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.by {
			By::Css => write!(f, "css `{}`", self.query),
			By::XPath => write!(f, "xpath `{}`", self.query),
		}
	}
}

/// Handle to a located element, only meaningful to the driver that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementId(pub(crate) u64);

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
	/// The locator matched nothing. Recoverable: variants fall back to an
	/// arbitrary option on a per-token miss.
	#[error("no element matches {0}")]
	NotFound(String),
	/// Anything else the browser backend reports. Fatal for the activity.
	#[error("driver backend failure: {0}")]
	Backend(String),
}

impl DriverError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, DriverError::NotFound(_))
	}
}

/// The small fixed contract the engine drives the quiz UI through.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
	async fn goto(&self, url: &str) -> Result<(), DriverError>;
	/// Poll for a locator until it matches or the timeout elapses.
	async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<ElementId, DriverError>;
	async fn locate(&self, locator: &Locator) -> Result<ElementId, DriverError>;
	async fn locate_all(&self, locator: &Locator) -> Result<Vec<ElementId>, DriverError>;
	async fn locate_within(&self, scope: &ElementId, locator: &Locator) -> Result<ElementId, DriverError>;
	async fn locate_all_within(&self, scope: &ElementId, locator: &Locator) -> Result<Vec<ElementId>, DriverError>;
	async fn click(&self, el: &ElementId) -> Result<(), DriverError>;
	async fn type_text(&self, el: &ElementId, text: &str) -> Result<(), DriverError>;
	async fn text(&self, el: &ElementId) -> Result<String, DriverError>;
	async fn attribute(&self, el: &ElementId, name: &str) -> Result<Option<String>, DriverError>;
	/// Live `value` property of an input. Typed text updates the DOM property
	/// only, never the `value` attribute, so gap detection must read this.
	async fn input_value(&self, el: &ElementId) -> Result<String, DriverError>;
	async fn outer_html(&self, el: &ElementId) -> Result<String, DriverError>;
}

/// Chromium-backed driver over a single [`Page`].
///
/// Element handles are kept alive in a map for the lifetime of the page; they go
/// stale on navigation, so `goto` drops them all.
pub struct CdpDriver {
	page: Page,
	elements: Mutex<HashMap<u64, Arc<Element>>>,
	next_id: AtomicU64,
}

impl CdpDriver {
	pub fn new(page: Page) -> Self {
		Self {
			page,
			elements: Mutex::new(HashMap::new()),
			next_id: AtomicU64::new(1),
		}
	}

	/// The underlying page, for browser-only plumbing (login, content extraction)
	pub fn page(&self) -> &Page {
		&self.page
	}

	fn keep(&self, el: Element) -> ElementId {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.elements.lock().expect("element map poisoned").insert(id, Arc::new(el));
		ElementId(id)
	}

	fn get(&self, id: &ElementId) -> Result<Arc<Element>, DriverError> {
		self.elements
			.lock()
			.expect("element map poisoned")
			.get(&id.0)
			.cloned()
			.ok_or_else(|| DriverError::Backend(format!("stale element handle {}", id.0)))
	}

	async fn find(&self, locator: &Locator) -> Result<Element, DriverError> {
		match locator.by {
			By::Css => self.page.find_element(&locator.query).await,
			By::XPath => self.page.find_xpath(&locator.query).await,
		}
		.map_err(|_| DriverError::NotFound(locator.to_string()))
	}
}

impl PageDriver for CdpDriver {
	async fn goto(&self, url: &str) -> Result<(), DriverError> {
		// Handles are document-scoped, a navigation invalidates all of them
		self.elements.lock().expect("element map poisoned").clear();
		self.page.goto(url).await.map_err(|e| DriverError::Backend(e.to_string()))?;
		Ok(())
	}

	async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<ElementId, DriverError> {
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			match self.find(locator).await {
				Ok(el) => return Ok(self.keep(el)),
				Err(_) if tokio::time::Instant::now() < deadline => {
					tokio::time::sleep(Duration::from_millis(250)).await;
				}
				Err(_) => return Err(DriverError::NotFound(format!("{locator} (after {timeout:?})"))),
			}
		}
	}

	async fn locate(&self, locator: &Locator) -> Result<ElementId, DriverError> {
		let el = self.find(locator).await?;
		Ok(self.keep(el))
	}

	async fn locate_all(&self, locator: &Locator) -> Result<Vec<ElementId>, DriverError> {
		let els = match locator.by {
			By::Css => self.page.find_elements(&locator.query).await,
			By::XPath => self.page.find_xpaths(&locator.query).await,
		}
		.map_err(|e| DriverError::Backend(e.to_string()))?;
		Ok(els.into_iter().map(|el| self.keep(el)).collect())
	}

	async fn locate_within(&self, scope: &ElementId, locator: &Locator) -> Result<ElementId, DriverError> {
		match locator.by {
			By::Css => {
				let scope = self.get(scope)?;
				let el = scope.find_element(&locator.query).await.map_err(|_| DriverError::NotFound(locator.to_string()))?;
				Ok(self.keep(el))
			}
			// The site shows a single question at a time, so the absolute xpaths
			// of the selector contract search the whole document
			By::XPath => self.locate(locator).await,
		}
	}

	async fn locate_all_within(&self, scope: &ElementId, locator: &Locator) -> Result<Vec<ElementId>, DriverError> {
		match locator.by {
			By::Css => {
				let scope = self.get(scope)?;
				let els = scope.find_elements(&locator.query).await.map_err(|e| DriverError::Backend(e.to_string()))?;
				Ok(els.into_iter().map(|el| self.keep(el)).collect())
			}
			By::XPath => self.locate_all(locator).await,
		}
	}

	async fn click(&self, el: &ElementId) -> Result<(), DriverError> {
		let el = self.get(el)?;
		el.click().await.map_err(|e| DriverError::Backend(e.to_string()))?;
		Ok(())
	}

	async fn type_text(&self, el: &ElementId, text: &str) -> Result<(), DriverError> {
		let el = self.get(el)?;
		el.click().await.map_err(|e| DriverError::Backend(e.to_string()))?;
		el.type_str(text).await.map_err(|e| DriverError::Backend(e.to_string()))?;
		Ok(())
	}

	async fn text(&self, el: &ElementId) -> Result<String, DriverError> {
		let el = self.get(el)?;
		let text = el.inner_text().await.map_err(|e| DriverError::Backend(e.to_string()))?;
		Ok(text.unwrap_or_default())
	}

	async fn attribute(&self, el: &ElementId, name: &str) -> Result<Option<String>, DriverError> {
		let el = self.get(el)?;
		el.attribute(name).await.map_err(|e| DriverError::Backend(e.to_string()))
	}

	async fn input_value(&self, el: &ElementId) -> Result<String, DriverError> {
		let el = self.get(el)?;
		let returns = el
			.call_js_fn("function() { return this.value; }", false)
			.await
			.map_err(|e| DriverError::Backend(e.to_string()))?;
		Ok(returns.result.value.and_then(|v| v.as_str().map(|s| s.to_string())).unwrap_or_default())
	}

	async fn outer_html(&self, el: &ElementId) -> Result<String, DriverError> {
		let el = self.get(el)?;
		let returns = el
			.call_js_fn("function() { return this.outerHTML; }", false)
			.await
			.map_err(|e| DriverError::Backend(e.to_string()))?;
		Ok(returns.result.value.and_then(|v| v.as_str().map(|s| s.to_string())).unwrap_or_default())
	}
}
