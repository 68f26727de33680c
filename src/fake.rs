//! Scripted in-memory [`PageDriver`] for engine tests.
//!
//! Elements are flat records tagged with the class tokens (including the
//! pool/ancestor markers the site's xpaths key on) they should match. Locator
//! matching understands just enough of the fixed selector contract: class
//! containment, negated class containment, text needles and `@src` needles.

use std::{
	collections::HashMap,
	sync::{LazyLock, Mutex},
	time::Duration,
};

use regex::Regex;

use crate::driver::{By, DriverError, ElementId, Locator, PageDriver};

#[derive(Clone, Debug, Default)]
pub enum OnClick {
	#[default]
	None,
	/// e.g. mark a fill button selected
	AddClass(String),
	/// e.g. move a letter out of the unselected box
	RemoveClass(String),
}

#[derive(Clone, Debug, Default)]
pub struct FakeElement {
	pub tag: String,
	pub classes: Vec<String>,
	pub text: String,
	pub attrs: HashMap<String, String>,
	/// Outer markup served to the markup helpers
	pub html: String,
	/// Typed text accumulates here
	pub value: String,
	/// Exact locator queries this element additionally answers to
	pub markers: Vec<String>,
	pub clicks: u32,
	pub on_click: OnClick,
	/// Cross-element click effects: (target index, class to add/remove)
	class_adds: Vec<(u64, String)>,
	class_removes: Vec<(u64, String)>,
}

impl FakeElement {
	pub fn with_classes(tag: &str, classes: &[&str]) -> Self {
		Self {
			tag: tag.to_string(),
			classes: classes.iter().map(|c| c.to_string()).collect(),
			..Self::default()
		}
	}

	pub fn text(mut self, text: &str) -> Self {
		self.text = text.to_string();
		self
	}

	pub fn html(mut self, html: &str) -> Self {
		self.html = html.to_string();
		self
	}

	pub fn attr(mut self, name: &str, value: &str) -> Self {
		self.attrs.insert(name.to_string(), value.to_string());
		self
	}

	pub fn marker(mut self, query: &str) -> Self {
		self.markers.push(query.to_string());
		self
	}

	pub fn on_click(mut self, effect: OnClick) -> Self {
		self.on_click = effect;
		self
	}
}

static CLASS_NEEDLE_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(not\()?contains\(@class,\s*"([^"]+)"\)"#).expect("valid regex"));
static TEXT_NEEDLE_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"contains\(text\(\),\s*"([^"]+)"\)"#).expect("valid regex"));
static SRC_NEEDLE_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"contains\(@src,\s*"([^"]+)"\)"#).expect("valid regex"));

#[derive(Default)]
struct Inner {
	elements: Vec<FakeElement>,
}

#[derive(Default)]
pub struct FakeDriver {
	inner: Mutex<Inner>,
}

impl FakeDriver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&self, element: FakeElement) -> ElementId {
		let mut inner = self.inner.lock().expect("fake driver poisoned");
		inner.elements.push(element);
		ElementId((inner.elements.len() - 1) as u64)
	}

	/// Snapshot of an element, for assertions
	pub fn element(&self, id: &ElementId) -> FakeElement {
		self.inner.lock().expect("fake driver poisoned").elements[id.0 as usize].clone()
	}

	pub fn clicks(&self, id: &ElementId) -> u32 {
		self.element(id).clicks
	}

	pub fn value(&self, id: &ElementId) -> String {
		self.element(id).value
	}

	/// Clicking `id` adds `class` to `target`, e.g. a "next" control revealing
	/// the results panel.
	pub fn on_click_add(&self, id: &ElementId, target: &ElementId, class: &str) {
		let mut inner = self.inner.lock().expect("fake driver poisoned");
		inner.elements[id.0 as usize].class_adds.push((target.0, class.to_string()));
	}

	/// Clicking `id` removes `class` from `target`, e.g. a retake control
	/// hiding the results panel again.
	pub fn on_click_remove(&self, id: &ElementId, target: &ElementId, class: &str) {
		let mut inner = self.inner.lock().expect("fake driver poisoned");
		inner.elements[id.0 as usize].class_removes.push((target.0, class.to_string()));
	}

	fn matches(el: &FakeElement, locator: &Locator) -> bool {
		if el.markers.iter().any(|m| m == &locator.query) {
			return true;
		}
		match locator.by {
			By::Css => Self::matches_css(el, &locator.query),
			By::XPath => Self::matches_xpath(el, &locator.query),
		}
	}

	fn matches_css(el: &FakeElement, query: &str) -> bool {
		// Descendant/child combinators are only matched through markers
		if query.contains(' ') || query.contains('>') || query.contains('[') {
			return false;
		}
		let mut parts = query.split('.');
		let tag = parts.next().unwrap_or_default();
		if !tag.is_empty() && el.tag != tag {
			return false;
		}
		parts.all(|class| el.classes.iter().any(|c| c == class))
	}

	fn matches_xpath(el: &FakeElement, query: &str) -> bool {
		for caps in CLASS_NEEDLE_RE.captures_iter(query) {
			let negated = caps.get(1).is_some();
			let has = el.classes.iter().any(|c| c.contains(&caps[2]));
			if has == negated {
				return false;
			}
		}

		let needles: Vec<String> = TEXT_NEEDLE_RE.captures_iter(query).map(|caps| caps[1].to_string()).collect();
		if !needles.is_empty() {
			let hit = |needle: &String| el.text.contains(needle.as_str());
			let ok = if query.contains(" or ") { needles.iter().any(hit) } else { needles.iter().all(hit) };
			if !ok {
				return false;
			}
		}

		for caps in SRC_NEEDLE_RE.captures_iter(query) {
			let src = el.attrs.get("src").cloned().unwrap_or_default();
			if !src.contains(&caps[1]) {
				return false;
			}
		}

		true
	}

	fn find_all(&self, locator: &Locator) -> Vec<ElementId> {
		let inner = self.inner.lock().expect("fake driver poisoned");
		inner
			.elements
			.iter()
			.enumerate()
			.filter(|(_, el)| Self::matches(el, locator))
			.map(|(i, _)| ElementId(i as u64))
			.collect()
	}
}

impl PageDriver for FakeDriver {
	async fn goto(&self, _url: &str) -> Result<(), DriverError> {
		Ok(())
	}

	async fn wait_for(&self, locator: &Locator, _timeout: Duration) -> Result<ElementId, DriverError> {
		self.locate(locator).await
	}

	async fn locate(&self, locator: &Locator) -> Result<ElementId, DriverError> {
		self.find_all(locator).into_iter().next().ok_or_else(|| DriverError::NotFound(locator.to_string()))
	}

	async fn locate_all(&self, locator: &Locator) -> Result<Vec<ElementId>, DriverError> {
		Ok(self.find_all(locator))
	}

	async fn locate_within(&self, _scope: &ElementId, locator: &Locator) -> Result<ElementId, DriverError> {
		self.locate(locator).await
	}

	async fn locate_all_within(&self, _scope: &ElementId, locator: &Locator) -> Result<Vec<ElementId>, DriverError> {
		self.locate_all(locator).await
	}

	async fn click(&self, id: &ElementId) -> Result<(), DriverError> {
		let mut inner = self.inner.lock().expect("fake driver poisoned");
		let el = &mut inner.elements[id.0 as usize];
		el.clicks += 1;
		match el.on_click.clone() {
			OnClick::None => {}
			OnClick::AddClass(class) => el.classes.push(class),
			OnClick::RemoveClass(class) => el.classes.retain(|c| c != &class),
		}
		let adds = el.class_adds.clone();
		let removes = el.class_removes.clone();
		for (target, class) in adds {
			inner.elements[target as usize].classes.push(class);
		}
		for (target, class) in removes {
			inner.elements[target as usize].classes.retain(|c| c != &class);
		}
		Ok(())
	}

	// Matches CDP semantics: typing fills the value property, not the attribute
	async fn type_text(&self, id: &ElementId, text: &str) -> Result<(), DriverError> {
		let mut inner = self.inner.lock().expect("fake driver poisoned");
		inner.elements[id.0 as usize].value.push_str(text);
		Ok(())
	}

	async fn text(&self, id: &ElementId) -> Result<String, DriverError> {
		Ok(self.element(id).text)
	}

	async fn attribute(&self, id: &ElementId, name: &str) -> Result<Option<String>, DriverError> {
		let el = self.element(id);
		if name == "class" {
			return Ok(Some(el.classes.join(" ")));
		}
		Ok(el.attrs.get(name).cloned())
	}

	async fn input_value(&self, id: &ElementId) -> Result<String, DriverError> {
		Ok(self.element(id).value)
	}

	async fn outer_html(&self, id: &ElementId) -> Result<String, DriverError> {
		Ok(self.element(id).html)
	}
}
