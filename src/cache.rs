//! Component cache: maps each mounted component to exactly one live node.

use crate::{dom::NodeId, model::ComponentRef};
use hashbrown::HashMap;
use tracing::trace;

#[derive(Clone)]
pub struct CacheEntry {
	pub component: ComponentRef,
	pub node: NodeId,
	pub page_id: Option<String>,
}

#[derive(Default)]
pub struct ComponentCache {
	entries: HashMap<String, CacheEntry>,
}

impl ComponentCache {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `component` as drawn to `node`. Returns the entry it superseded.
	pub fn insert(&mut self, component: ComponentRef, node: NodeId, page_id: Option<String>) -> Option<CacheEntry> {
		let id = component.id();
		trace!(component = %id, ?node, "Cached.");
		self.entries.insert(id, CacheEntry { component, node, page_id })
	}

	#[must_use]
	pub fn get(&self, component_id: &str) -> Option<&CacheEntry> {
		self.entries.get(component_id)
	}

	#[must_use]
	pub fn has(&self, component_id: &str) -> bool {
		self.entries.contains_key(component_id)
	}

	pub fn remove(&mut self, component_id: &str) -> Option<CacheEntry> {
		self.entries.remove(component_id)
	}

	/// The entry drawn to `node`.
	#[must_use]
	pub fn component_at(&self, node: NodeId) -> Option<&CacheEntry> {
		self.entries.values().find(|entry| entry.node == node)
	}

	/// Entries drawn for `page_id`.
	#[must_use]
	pub fn of_page(&self, page_id: &str) -> Vec<CacheEntry> {
		self.entries.values().filter(|entry| entry.page_id.as_deref() == Some(page_id)).cloned().collect()
	}

	/// Removes every entry of `page_id`, returning them.
	pub fn remove_page(&mut self, page_id: &str) -> Vec<CacheEntry> {
		let ids: Vec<String> = self.entries.iter().filter(|(_, entry)| entry.page_id.as_deref() == Some(page_id)).map(|(id, _)| id.clone()).collect();
		ids.iter().filter_map(|id| self.entries.remove(id)).collect()
	}

	/// Entries whose component has the given type.
	#[must_use]
	pub fn of_type(&self, component_type: &str) -> Vec<CacheEntry> {
		self.entries.values().filter(|entry| entry.component.component_type() == component_type).cloned().collect()
	}

	/// Keeps only the entries for which `keep` returns `true`.
	pub fn retain(&mut self, mut keep: impl FnMut(&CacheEntry) -> bool) {
		self.entries.retain(|_, entry| keep(entry));
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}
