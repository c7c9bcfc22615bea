//! Side-effect free lookups over drawn nodes.

use crate::{
	dom::{self, Document, NodeId},
	page::PageRef,
	Ndom,
};

/// Where a query searches.
#[derive(Clone, Copy)]
pub enum QueryScope<'a> {
	/// The whole document, embedded documents included.
	Document,
	/// The root of one page (its embedded body, for nested pages) and the documents embedded below it.
	Page(&'a PageRef),
}

impl Ndom {
	fn scope_root(&self, scope: QueryScope<'_>) -> NodeId {
		match scope {
			QueryScope::Document => self.document().borrow().root(),
			QueryScope::Page(page) => page.root_node(),
		}
	}

	fn find_all(&self, scope: QueryScope<'_>, mut predicate: impl FnMut(&dyn Document, NodeId) -> bool) -> Vec<NodeId> {
		let root = self.scope_root(scope);
		let document = self.document().borrow();
		dom::descendants(&*document, root, true).into_iter().filter(|&node| predicate(&*document, node)).collect()
	}

	fn in_scope(&self, scope: QueryScope<'_>, node: NodeId) -> bool {
		let root = self.scope_root(scope);
		let document = self.document().borrow();
		let mut current = Some(node);
		while let Some(candidate) = current {
			if candidate == root {
				return true;
			}
			current = document.parent(candidate).or_else(|| host_of(&*document, candidate));
		}
		false
	}

	/// The node drawn for the component `id`, or else the element with that `id` attribute.
	#[must_use]
	pub fn find_by_element_id(&self, id: &str, scope: QueryScope<'_>) -> Option<NodeId> {
		let cached = self.cache().get(id).map(|entry| entry.node);
		if let Some(node) = cached.filter(|&node| self.in_scope(scope, node)) {
			return Some(node);
		}
		self.find_all(scope, |document, node| document.attribute(node, "id").as_deref() == Some(id)).into_iter().next()
	}

	#[must_use]
	pub fn find_by_view_tag(&self, view_tag: &str, scope: QueryScope<'_>) -> Option<NodeId> {
		self.find_all_by_view_tag(view_tag, scope).into_iter().next()
	}

	#[must_use]
	pub fn find_all_by_view_tag(&self, view_tag: &str, scope: QueryScope<'_>) -> Vec<NodeId> {
		self.find_by_data_attrib("data-viewtag", view_tag, scope)
	}

	#[must_use]
	pub fn find_by_data_key(&self, data_key: &str, scope: QueryScope<'_>) -> Vec<NodeId> {
		self.find_by_data_attrib("data-key", data_key, scope)
	}

	/// Nodes whose `attribute` equals `value`.
	#[must_use]
	pub fn find_by_data_attrib(&self, attribute: &str, value: &str, scope: QueryScope<'_>) -> Vec<NodeId> {
		self.find_all(scope, |document, node| document.attribute(node, attribute).as_deref() == Some(value))
	}

	#[must_use]
	pub fn get_by_data_ux(&self, ux: &str, scope: QueryScope<'_>) -> Option<NodeId> {
		self.find_by_data_attrib("data-ux", ux, scope).into_iter().next()
	}
}

/// The frame hosting `node`, if `node` is the document node of an embedded document.
fn host_of(document: &dyn Document, node: NodeId) -> Option<NodeId> {
	dom::descendants(document, document.root(), true).into_iter().find(|&frame| document.embedded_root(frame) == Some(node))
}
