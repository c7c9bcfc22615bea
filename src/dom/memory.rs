//! Arena-backed document for hosts without a browser and for tests.

use super::{Document, DomEvent, Listener, ListenerId, NodeId};
use crate::error::DomError;
use hashbrown::HashSet;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeData {
	Document,
	Element { tag: String, attributes: Vec<(String, String)>, style: Vec<(String, String)>, value: Option<String> },
	Text(String),
}

struct MemoryNode {
	data: NodeData,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	/// For embedded document nodes: the frame element hosting them.
	host: Option<NodeId>,
	/// For frames: the embedded document node.
	embedded: Option<NodeId>,
}

struct ListenerEntry {
	id: ListenerId,
	node: NodeId,
	event: String,
	listener: Listener,
}

/// A complete in-memory document: `#document > html > (head, body)`.
///
/// `<iframe>` elements own an embedded document of the same shape. Connecting a frame, or a `<script src>`/`<link href>`,
/// queues a `load` event (or `error`, for URLs registered through [`MemoryDocument::fail_url`]).
pub struct MemoryDocument {
	nodes: Vec<MemoryNode>,
	listeners: Vec<ListenerEntry>,
	next_listener: u32,
	pending: Vec<DomEvent>,
	failing_urls: HashSet<String>,
	root: NodeId,
	head: NodeId,
	body: NodeId,
}

impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDocument {
	#[must_use]
	pub fn new() -> Self {
		let mut document = Self {
			nodes: Vec::new(),
			listeners: Vec::new(),
			next_listener: 0,
			pending: Vec::new(),
			failing_urls: HashSet::new(),
			root: NodeId(0),
			head: NodeId(0),
			body: NodeId(0),
		};
		let (root, head, body) = document.create_document_skeleton(None);
		document.root = root;
		document.head = head;
		document.body = body;
		document
	}

	/// Makes resources and frames with this URL fail to load.
	pub fn fail_url(&mut self, url: impl Into<String>) {
		self.failing_urls.insert(url.into());
	}

	/// Number of live listeners across all nodes.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Serializes the subtree at `node` as HTML-like markup. Meant for debugging and assertions.
	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut out = String::new();
		self.write_html(node, &mut out);
		out
	}

	fn write_html(&self, node: NodeId, out: &mut String) {
		let Some(entry) = self.node(node) else { return };
		match &entry.data {
			NodeData::Document => {
				for &child in &entry.children {
					self.write_html(child, out);
				}
			}
			NodeData::Text(text) => out.push_str(text),
			NodeData::Element { tag, attributes, style, .. } => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in attributes {
					out.push_str(&format!(" {}=\"{}\"", name, value));
				}
				if !style.is_empty() {
					let style: Vec<String> = style.iter().map(|(property, value)| format!("{}: {}", property, value)).collect();
					out.push_str(&format!(" style=\"{}\"", style.join("; ")));
				}
				out.push('>');
				for &child in &entry.children {
					self.write_html(child, out);
				}
				out.push_str(&format!("</{}>", tag));
			}
		}
	}

	fn create_document_skeleton(&mut self, host: Option<NodeId>) -> (NodeId, NodeId, NodeId) {
		let root = self.alloc(NodeData::Document);
		self.nodes[root.0 as usize].host = host;
		let html = self.alloc_element("html");
		let head = self.alloc_element("head");
		let body = self.alloc_element("body");
		self.link(root, html, None);
		self.link(html, head, None);
		self.link(html, body, None);
		(root, head, body)
	}

	fn alloc(&mut self, data: NodeData) -> NodeId {
		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(MemoryNode { data, parent: None, children: Vec::new(), host: None, embedded: None });
		id
	}

	fn alloc_element(&mut self, tag: &str) -> NodeId {
		self.alloc(NodeData::Element {
			tag: tag.to_ascii_lowercase(),
			attributes: Vec::new(),
			style: Vec::new(),
			value: None,
		})
	}

	fn node(&self, node: NodeId) -> Option<&MemoryNode> {
		self.nodes.get(node.0 as usize)
	}

	fn node_mut(&mut self, node: NodeId) -> Result<&mut MemoryNode, DomError> {
		self.nodes.get_mut(node.0 as usize).ok_or(DomError::NodeMissing(node))
	}

	fn element_mut(&mut self, node: NodeId) -> Result<(&mut Vec<(String, String)>, &mut Vec<(String, String)>, &mut Option<String>), DomError> {
		match &mut self.node_mut(node)?.data {
			NodeData::Element { attributes, style, value, .. } => Ok((attributes, style, value)),
			_ => Err(DomError::NotAnElement(node)),
		}
	}

	fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
		let position = reference.and_then(|reference| self.nodes[parent.0 as usize].children.iter().position(|&c| c == reference));
		let children = &mut self.nodes[parent.0 as usize].children;
		match position {
			Some(position) => children.insert(position, child),
			None => children.push(child),
		}
		self.nodes[child.0 as usize].parent = Some(parent);
	}

	fn unlink(&mut self, child: NodeId) -> Option<NodeId> {
		let parent = self.nodes[child.0 as usize].parent.take()?;
		self.nodes[parent.0 as usize].children.retain(|&c| c != child);
		Some(parent)
	}

	fn local_tag(&self, node: NodeId) -> Option<&str> {
		match &self.node(node)?.data {
			NodeData::Element { tag, .. } => Some(tag),
			_ => None,
		}
	}

	fn queue_load_events(&mut self, node: NodeId) {
		let mut stack = vec![node];
		while let Some(current) = stack.pop() {
			let url = match self.local_tag(current) {
				Some("iframe") => Some(self.attribute_of(current, "src").unwrap_or_default()),
				Some("script") => self.attribute_of(current, "src"),
				Some("link") => self.attribute_of(current, "href"),
				Some("img") => self.attribute_of(current, "src"),
				_ => None,
			};
			if let Some(url) = url {
				let name = if self.failing_urls.contains(&url) { "error" } else { "load" };
				trace!("Queued {} for {:?}.", name, current);
				self.pending.push(DomEvent::new(name, current));
			}
			stack.extend(self.nodes[current.0 as usize].children.iter().rev().copied());
		}
	}

	fn attribute_of(&self, node: NodeId, name: &str) -> Option<String> {
		match &self.node(node)?.data {
			NodeData::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone()),
			_ => None,
		}
	}
}

impl Document for MemoryDocument {
	fn root(&self) -> NodeId {
		self.root
	}

	fn head(&self) -> NodeId {
		self.head
	}

	fn body(&self) -> NodeId {
		self.body
	}

	fn create_element(&mut self, tag: &str) -> NodeId {
		let node = self.alloc_element(tag);
		if tag.eq_ignore_ascii_case("iframe") {
			let (embedded, _, _) = self.create_document_skeleton(Some(node));
			self.nodes[node.0 as usize].embedded = Some(embedded);
		}
		node
	}

	fn create_text_node(&mut self, text: &str) -> NodeId {
		self.alloc(NodeData::Text(text.to_owned()))
	}

	fn tag_name(&self, node: NodeId) -> Option<String> {
		self.local_tag(node).map(str::to_ascii_uppercase)
	}

	fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.node(node)?.parent
	}

	fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.node(node).map(|node| node.children.clone()).unwrap_or_default()
	}

	fn is_connected(&self, node: NodeId) -> bool {
		let mut current = node;
		loop {
			let Some(entry) = self.node(current) else { return false };
			if current == self.root {
				return true;
			}
			match (entry.parent, entry.host) {
				(Some(parent), _) => current = parent,
				(None, Some(host)) => current = host,
				(None, None) => return false,
			}
		}
	}

	fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), DomError> {
		self.node(parent).ok_or(DomError::NodeMissing(parent))?;
		self.node(child).ok_or(DomError::NodeMissing(child))?;
		if matches!(self.node(child).map(|n| &n.data), Some(NodeData::Document)) || super::contains(&*self, child, parent) || matches!(self.node(parent).map(|n| &n.data), Some(NodeData::Text(_))) {
			return Err(DomError::HierarchyRequest { parent, child });
		}
		if let Some(reference) = reference {
			if self.parent(reference) != Some(parent) {
				return Err(DomError::HierarchyRequest { parent, child: reference });
			}
		}
		let was_connected = self.is_connected(child);
		self.unlink(child);
		self.link(parent, child, reference);
		if !was_connected && self.is_connected(child) {
			self.queue_load_events(child);
		}
		Ok(())
	}

	fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
		self.node(node).ok_or(DomError::NodeMissing(node))?;
		self.unlink(node).map(|_| ()).ok_or(DomError::NotAttached(node))
	}

	fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		self.attribute_of(node, name)
	}

	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
		let (attributes, _, _) = self.element_mut(node)?;
		match attributes.iter_mut().find(|(n, _)| n == name) {
			Some(entry) => entry.1 = value.to_owned(),
			None => attributes.push((name.to_owned(), value.to_owned())),
		}
		Ok(())
	}

	fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
		let (attributes, _, _) = self.element_mut(node)?;
		attributes.retain(|(n, _)| n != name);
		Ok(())
	}

	fn style(&self, node: NodeId, property: &str) -> Option<String> {
		match &self.node(node)?.data {
			NodeData::Element { style, .. } => style.iter().find(|(p, _)| p == property).map(|(_, v)| v.clone()),
			_ => None,
		}
	}

	fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
		let (_, style, _) = self.element_mut(node)?;
		if value.is_empty() {
			style.retain(|(p, _)| p != property);
			return Ok(());
		}
		match style.iter_mut().find(|(p, _)| p == property) {
			Some(entry) => entry.1 = value.to_owned(),
			None => style.push((property.to_owned(), value.to_owned())),
		}
		Ok(())
	}

	fn text_content(&self, node: NodeId) -> String {
		let Some(entry) = self.node(node) else { return String::new() };
		match &entry.data {
			NodeData::Text(text) => text.clone(),
			_ => entry.children.iter().map(|&child| self.text_content(child)).collect(),
		}
	}

	fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
		if let NodeData::Text(data) = &mut self.node_mut(node)?.data {
			*data = text.to_owned();
			return Ok(());
		}
		for child in self.children(node) {
			self.unlink(child);
		}
		if !text.is_empty() {
			let text = self.create_text_node(text);
			self.link(node, text, None);
		}
		Ok(())
	}

	fn value(&self, node: NodeId) -> Option<String> {
		match &self.node(node)?.data {
			NodeData::Element { value, .. } => value.clone(),
			_ => None,
		}
	}

	fn set_value(&mut self, node: NodeId, new_value: &str) -> Result<(), DomError> {
		let (_, _, value) = self.element_mut(node)?;
		*value = Some(new_value.to_owned());
		Ok(())
	}

	fn add_event_listener(&mut self, node: NodeId, event: &str, listener: Listener) -> Result<ListenerId, DomError> {
		self.node(node).ok_or(DomError::NodeMissing(node))?;
		let id = ListenerId(self.next_listener);
		self.next_listener += 1;
		self.listeners.push(ListenerEntry { id, node, event: event.to_owned(), listener });
		Ok(id)
	}

	fn remove_event_listener(&mut self, listener: ListenerId) {
		self.listeners.retain(|entry| entry.id != listener);
	}

	fn listeners(&self, node: NodeId, event: &str) -> Vec<Listener> {
		self.listeners.iter().filter(|entry| entry.node == node && entry.event == event).map(|entry| entry.listener.clone()).collect()
	}

	fn embedded_root(&self, frame: NodeId) -> Option<NodeId> {
		self.node(frame)?.embedded
	}

	fn embedded_head(&self, frame: NodeId) -> Option<NodeId> {
		let html = *self.node(self.embedded_root(frame)?)?.children.first()?;
		self.node(html)?.children.first().copied()
	}

	fn embedded_body(&self, frame: NodeId) -> Option<NodeId> {
		let html = *self.node(self.embedded_root(frame)?)?.children.first()?;
		self.node(html)?.children.get(1).copied()
	}

	fn take_pending_events(&mut self) -> Vec<DomEvent> {
		core::mem::take(&mut self.pending)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn skeleton() {
		let document = MemoryDocument::new();
		assert_eq!(document.tag_name(document.head()).as_deref(), Some("HEAD"));
		assert_eq!(document.tag_name(document.body()).as_deref(), Some("BODY"));
		assert!(document.is_connected(document.body()));
	}

	#[test]
	fn insert_and_remove() {
		let mut document = MemoryDocument::new();
		let body = document.body();
		let a = document.create_element("div");
		let b = document.create_element("span");
		document.insert_before(body, a, None).unwrap();
		document.insert_before(body, b, Some(a)).unwrap();
		assert_eq!(document.children(body), vec![b, a]);
		document.remove(a).unwrap();
		assert!(!document.is_connected(a));
		assert_eq!(document.remove(a), Err(DomError::NotAttached(a)));
	}

	#[test]
	fn rejects_cycles() {
		let mut document = MemoryDocument::new();
		let outer = document.create_element("div");
		let inner = document.create_element("div");
		document.insert_before(outer, inner, None).unwrap();
		assert!(matches!(document.insert_before(inner, outer, None), Err(DomError::HierarchyRequest { .. })));
	}

	#[test]
	fn frames_load_on_connect() {
		let mut document = MemoryDocument::new();
		let frame = document.create_element("iframe");
		let body = document.embedded_body(frame).unwrap();
		let inner = document.create_element("p");
		document.insert_before(body, inner, None).unwrap();
		assert!(document.take_pending_events().is_empty());
		assert!(!document.is_connected(inner));

		let outer_body = document.body();
		document.insert_before(outer_body, frame, None).unwrap();
		assert!(document.is_connected(inner));
		let events = document.take_pending_events();
		assert_eq!(events, vec![DomEvent::new("load", frame)]);
	}

	#[test]
	fn failing_urls_raise_error() {
		let mut document = MemoryDocument::new();
		document.fail_url("missing.js");
		let script = document.create_element("script");
		document.set_attribute(script, "src", "missing.js").unwrap();
		let body = document.body();
		document.insert_before(body, script, None).unwrap();
		assert_eq!(document.take_pending_events(), vec![DomEvent::new("error", script)]);
	}

	#[test]
	fn text_content_replaces_children() {
		let mut document = MemoryDocument::new();
		let div = document.create_element("div");
		document.set_text_content(div, "Hello").unwrap();
		document.set_text_content(div, "World").unwrap();
		assert_eq!(document.children(div).len(), 1);
		assert_eq!(document.text_content(div), "World");
		assert_eq!(document.outer_html(div), "<div>World</div>");
	}
}
