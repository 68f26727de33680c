//! Solved-URL cache: one URL per line, so reruns skip activities that were
//! already driven to mastery.

use std::{
	collections::HashSet,
	fs, io,
	path::{Path, PathBuf},
};

use color_eyre::Result;

pub struct UrlCache {
	path: PathBuf,
	urls: HashSet<String>,
}

impl UrlCache {
	/// A missing file is an empty cache; anything else failing to read is an error.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		let urls = match fs::read_to_string(&path) {
			Ok(content) => content.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect(),
			Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
			Err(e) => return Err(e.into()),
		};
		Ok(Self { path, urls })
	}

	pub fn contains(&self, url: &str) -> bool {
		self.urls.contains(url)
	}

	/// Record a solved URL and persist immediately, so an interrupted run keeps
	/// what it finished.
	pub fn add(&mut self, url: &str) -> Result<()> {
		if self.urls.insert(url.to_string()) {
			self.persist()?;
		}
		Ok(())
	}

	/// Forget every recorded URL, on disk too.
	pub fn clear(&mut self) -> Result<()> {
		self.urls.clear();
		self.persist()
	}

	pub fn len(&self) -> usize {
		self.urls.len()
	}

	pub fn is_empty(&self) -> bool {
		self.urls.is_empty()
	}

	fn persist(&self) -> Result<()> {
		let mut lines: Vec<&str> = self.urls.iter().map(String::as_str).collect();
		lines.sort_unstable();
		fs::write(&self.path, lines.join("\n") + "\n")?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn temp_path(name: &str) -> PathBuf {
		std::env::temp_dir().join(format!("fluent_headless_{}_{name}", std::process::id()))
	}

	#[test]
	fn missing_file_is_an_empty_cache() {
		let cache = UrlCache::load(temp_path("missing")).unwrap();
		assert!(cache.is_empty());
		assert!(!cache.contains("https://portal.example.com/app/x/1"));
	}

	#[test]
	fn added_urls_survive_a_reload() {
		let path = temp_path("reload");
		let _ = fs::remove_file(&path);

		let mut cache = UrlCache::load(&path).unwrap();
		cache.add("https://portal.example.com/app/x/1").unwrap();
		cache.add("https://portal.example.com/app/x/2").unwrap();
		cache.add("https://portal.example.com/app/x/1").unwrap();

		let reloaded = UrlCache::load(&path).unwrap();
		assert_eq!(reloaded.len(), 2);
		assert!(reloaded.contains("https://portal.example.com/app/x/1"));
		assert!(reloaded.contains("https://portal.example.com/app/x/2"));

		let _ = fs::remove_file(&path);
	}

	#[test]
	fn clear_empties_the_cache_and_the_file() {
		let path = temp_path("clear");
		let _ = fs::remove_file(&path);

		let mut cache = UrlCache::load(&path).unwrap();
		cache.add("https://portal.example.com/app/x/1").unwrap();
		cache.clear().unwrap();
		assert!(cache.is_empty());

		let reloaded = UrlCache::load(&path).unwrap();
		assert!(reloaded.is_empty());

		let _ = fs::remove_file(&path);
	}
}
