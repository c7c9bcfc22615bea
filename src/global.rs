//! Registries that outlive any single [`Page`](`crate::page::Page`).
//!
//! The store is constructed explicitly and owned by the [`Ndom`](`crate::Ndom`); there is no module-level singleton.

use crate::{
	dom::NodeId,
	model::Component,
	page::PageRef,
	timers::Timers,
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Derives the global id of a component: `popUpView`, then `viewTag`, then the component id.
#[must_use]
pub fn global_id_of(component: &dyn Component) -> String {
	component
		.get_str("popUpView")
		.filter(|id| !id.is_empty())
		.or_else(|| component.get_str("viewTag").filter(|id| !id.is_empty()))
		.unwrap_or_else(|| component.id())
}

/// Tracks the node and page currently owning a global widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalComponentRecord {
	pub global_id: String,
	pub component_id: String,
	/// DOM id of the live node.
	pub node_id: String,
	pub node: Option<NodeId>,
	pub page_id: Option<String>,
	pub page_name: Option<String>,
}

impl GlobalComponentRecord {
	/// `global_id` defaults to the component's `data-globalid`; the node id defaults to the node's DOM id,
	/// falling back to the component id while no node exists.
	pub fn new(component: &dyn Component, global_id: Option<String>, node: Option<(NodeId, Option<String>)>) -> Self {
		let global_id = global_id.or_else(|| component.get_str("data-globalid")).unwrap_or_else(|| global_id_of(component));
		let (node, dom_id) = match node {
			Some((node, dom_id)) => (Some(node), dom_id),
			None => (None, None),
		};
		Self {
			global_id,
			component_id: component.id(),
			node_id: dom_id.filter(|id| !id.is_empty()).unwrap_or_else(|| component.id()),
			node,
			page_id: component.page_id(),
			page_name: None,
		}
	}
}

/// Lookup key for [`GlobalStore::has`].
#[derive(Clone, Copy)]
pub enum GlobalLookup<'a> {
	Component(&'a dyn Component),
	/// A node by its DOM id.
	NodeId(&'a str),
	GlobalId(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
	Css,
	Js,
}

pub type ResourceCallback = Rc<dyn Fn(&GlobalResourceRecord)>;

/// Bookkeeping for one CSS or JS resource, keyed by URL.
#[derive(Clone)]
pub struct GlobalResourceRecord {
	pub kind: ResourceKind,
	/// `href` or `src`.
	pub url: String,
	pub load_to_dom: bool,
	pub cond: Option<Rc<dyn Fn() -> bool>>,
	pub on_load: Option<ResourceCallback>,
	pub on_error: Option<ResourceCallback>,
	pub node: Option<NodeId>,
	pub loaded: bool,
	pub failed: bool,
}

impl Debug for GlobalResourceRecord {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("GlobalResourceRecord")
			.field("kind", &self.kind)
			.field("url", &self.url)
			.field("load_to_dom", &self.load_to_dom)
			.field("node", &self.node)
			.field("loaded", &self.loaded)
			.field("failed", &self.failed)
			.finish_non_exhaustive()
	}
}

pub type GlobalCssResourceRecord = GlobalResourceRecord;
pub type GlobalJsResourceRecord = GlobalResourceRecord;

#[derive(Default)]
pub struct GlobalStore {
	components: HashMap<String, GlobalComponentRecord>,
	pages: HashMap<String, PageRef>,
	/// Live page ids in creation order.
	page_ids: Vec<String>,
	css: HashMap<String, GlobalResourceRecord>,
	js: HashMap<String, GlobalResourceRecord>,
	timers: Timers,
}

impl GlobalStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Dual-keyed lookup: by global id, or by the last-known component or node id of any record.
	#[must_use]
	pub fn has(&self, lookup: GlobalLookup<'_>) -> bool {
		match lookup {
			GlobalLookup::GlobalId(global_id) => self.components.contains_key(global_id),
			GlobalLookup::NodeId(node_id) => self.components.values().any(|record| record.node_id == node_id || record.component_id == node_id),
			GlobalLookup::Component(component) => {
				let id = component.id();
				component.get_str("data-globalid").map_or(false, |global_id| self.components.contains_key(&global_id))
					|| self.components.contains_key(&global_id_of(component))
					|| self.components.values().any(|record| record.component_id == id || record.node_id == id)
			}
		}
	}

	#[must_use]
	pub fn component(&self, global_id: &str) -> Option<&GlobalComponentRecord> {
		self.components.get(global_id)
	}

	pub fn components(&self) -> impl Iterator<Item = &GlobalComponentRecord> {
		self.components.values()
	}

	/// Replaces the record for `record.global_id` in one step. Returns the superseded record.
	pub fn set_component(&mut self, record: GlobalComponentRecord) -> Option<GlobalComponentRecord> {
		trace!(global_id = %record.global_id, component_id = %record.component_id, "Global component record set.");
		self.components.insert(record.global_id.clone(), record)
	}

	pub fn remove_component(&mut self, global_id: &str) -> Option<GlobalComponentRecord> {
		self.components.remove(global_id)
	}

	/// Drops every component record owned by `page_id`.
	pub fn remove_components_of_page(&mut self, page_id: &str) -> Vec<GlobalComponentRecord> {
		let global_ids: Vec<String> = self.components.values().filter(|record| record.page_id.as_deref() == Some(page_id)).map(|record| record.global_id.clone()).collect();
		global_ids.iter().filter_map(|global_id| self.components.remove(global_id)).collect()
	}

	#[must_use]
	pub fn page(&self, id: &str) -> Option<PageRef> {
		self.pages.get(id).cloned()
	}

	/// Live pages in creation order.
	#[must_use]
	pub fn pages(&self) -> Vec<PageRef> {
		self.page_ids.iter().filter_map(|id| self.pages.get(id).cloned()).collect()
	}

	#[must_use]
	pub fn page_ids(&self) -> &[String] {
		&self.page_ids
	}

	pub fn add_page(&mut self, page: PageRef) {
		let id = page.id().to_owned();
		if self.pages.insert(id.clone(), page).is_none() {
			self.page_ids.push(id);
		}
	}

	pub fn remove_page(&mut self, id: &str) -> Option<PageRef> {
		self.page_ids.retain(|page_id| page_id != id);
		let removed = self.pages.remove(id);
		if removed.is_some() {
			debug!(page = %id, "Page unregistered.");
		}
		removed
	}

	fn resources(&self, kind: ResourceKind) -> &HashMap<String, GlobalResourceRecord> {
		match kind {
			ResourceKind::Css => &self.css,
			ResourceKind::Js => &self.js,
		}
	}

	fn resources_mut(&mut self, kind: ResourceKind) -> &mut HashMap<String, GlobalResourceRecord> {
		match kind {
			ResourceKind::Css => &mut self.css,
			ResourceKind::Js => &mut self.js,
		}
	}

	#[must_use]
	pub fn resource(&self, kind: ResourceKind, url: &str) -> Option<&GlobalResourceRecord> {
		self.resources(kind).get(url)
	}

	pub fn resource_mut(&mut self, kind: ResourceKind, url: &str) -> Option<&mut GlobalResourceRecord> {
		self.resources_mut(kind).get_mut(url)
	}

	/// Records in no particular order.
	pub fn resource_records(&self, kind: ResourceKind) -> impl Iterator<Item = &GlobalResourceRecord> {
		self.resources(kind).values()
	}

	/// Inserts `record` unless one exists for its URL. Returns whether it was inserted.
	pub fn add_resource(&mut self, record: GlobalResourceRecord) -> bool {
		let resources = self.resources_mut(record.kind);
		if resources.contains_key(&record.url) {
			return false;
		}
		resources.insert(record.url.clone(), record);
		true
	}

	#[must_use]
	pub fn timers(&self) -> &Timers {
		&self.timers
	}

	pub fn timers_mut(&mut self) -> &mut Timers {
		&mut self.timers
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{basic::BasicModel, ComponentModel, ComponentRef};
	use serde_json::json;

	fn component(raw: serde_json::Value) -> ComponentRef {
		let model = BasicModel::new();
		let page = model.create_page("Test", Some("p1"));
		futures::executor::block_on(model.resolve_components(&[raw], &page)).unwrap().remove(0)
	}

	#[test]
	fn global_id_priority() {
		assert_eq!(global_id_of(&*component(json!({ "id": "c", "popUpView": "pop", "viewTag": "tag" }))), "pop");
		assert_eq!(global_id_of(&*component(json!({ "id": "c", "viewTag": "tag" }))), "tag");
		assert_eq!(global_id_of(&*component(json!({ "id": "c" }))), "c");
	}

	#[test]
	fn record_defaults() {
		let c = component(json!({ "id": "c", "data-globalid": "g" }));
		let record = GlobalComponentRecord::new(&*c, None, None);
		assert_eq!(record.global_id, "g");
		assert_eq!(record.node_id, "c");
		assert_eq!(record.page_id.as_deref(), Some("p1"));
	}

	#[test]
	fn has_is_dual_keyed() {
		let mut store = GlobalStore::new();
		let c = component(json!({ "id": "c", "popUpView": "pop" }));
		store.set_component(GlobalComponentRecord::new(&*c, None, Some((NodeId(3), Some("node-c".to_owned())))));
		assert!(store.has(GlobalLookup::GlobalId("pop")));
		assert!(store.has(GlobalLookup::NodeId("node-c")));
		assert!(store.has(GlobalLookup::NodeId("c")));
		assert!(store.has(GlobalLookup::Component(&*c)));
		assert!(!store.has(GlobalLookup::GlobalId("c")));
	}

	#[test]
	fn set_component_replaces() {
		let mut store = GlobalStore::new();
		let first = component(json!({ "id": "a", "popUpView": "pop" }));
		let second = component(json!({ "id": "b", "popUpView": "pop" }));
		store.set_component(GlobalComponentRecord::new(&*first, None, None));
		let old = store.set_component(GlobalComponentRecord::new(&*second, None, None));
		assert_eq!(old.map(|r| r.component_id).as_deref(), Some("a"));
		assert_eq!(store.components().count(), 1);
		assert_eq!(store.component("pop").map(|r| r.component_id.as_str()), Some("b"));
	}
}
