//! Host document abstraction.
//!
//! The renderer never holds platform node objects directly. It works with [`NodeId`] handles issued by a [`Document`],
//! which makes the document the single registry of live nodes. [`MemoryDocument`] is a self-contained arena,
//! [`WebDocument`] forwards to the browser's [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).

use crate::error::DomError;
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, trace_span, warn};

mod closure_map;
pub mod memory;
pub mod web;

pub use memory::MemoryDocument;
pub use web::WebDocument;

/// Handle to a node owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
	#[must_use]
	pub fn index(self) -> u32 {
		self.0
	}
}

/// Handle to a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u32);

/// The parts of a DOM event the renderer and its resolvers care about.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
	pub name: String,
	pub target: NodeId,
	/// The target's current `value`, for form controls.
	pub value: Option<String>,
}

impl DomEvent {
	pub fn new(name: impl Into<String>, target: NodeId) -> Self {
		Self { name: name.into(), target, value: None }
	}

	#[must_use]
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}
}

pub type Listener = Rc<dyn Fn(&DomEvent)>;

pub type SharedDocument = Rc<RefCell<dyn Document>>;

/// A mutable document tree addressed through [`NodeId`]s.
///
/// Implementations must not call back into listeners while a method runs;
/// events raised by mutations are queued and handed out through [`Document::take_pending_events`].
pub trait Document {
	/// The document node itself.
	fn root(&self) -> NodeId;
	fn head(&self) -> NodeId;
	fn body(&self) -> NodeId;

	fn create_element(&mut self, tag: &str) -> NodeId;
	fn create_text_node(&mut self, text: &str) -> NodeId;

	/// Upper-case tag name of an element, [`None`] for other nodes.
	fn tag_name(&self, node: NodeId) -> Option<String>;
	fn parent(&self, node: NodeId) -> Option<NodeId>;
	fn children(&self, node: NodeId) -> Vec<NodeId>;
	fn is_connected(&self, node: NodeId) -> bool;

	/// Inserts `child` before `reference`, or appends it if `reference` is [`None`].
	///
	/// `child` is detached from its current parent first.
	fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), DomError>;

	/// Detaches `node` from its parent.
	///
	/// # Errors
	///
	/// [`DomError::NotAttached`] if the node has no parent.
	fn remove(&mut self, node: NodeId) -> Result<(), DomError>;

	fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;
	fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError>;

	fn style(&self, node: NodeId, property: &str) -> Option<String>;
	fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError>;

	fn text_content(&self, node: NodeId) -> String;
	fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;

	/// The `value` of a form control.
	fn value(&self, node: NodeId) -> Option<String>;
	fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError>;

	fn add_event_listener(&mut self, node: NodeId, event: &str, listener: Listener) -> Result<ListenerId, DomError>;
	fn remove_event_listener(&mut self, listener: ListenerId);
	/// Listeners registered for `event` on `node`, in registration order.
	fn listeners(&self, node: NodeId, event: &str) -> Vec<Listener>;

	/// The document node of an embedded document (`<iframe>`).
	fn embedded_root(&self, frame: NodeId) -> Option<NodeId>;
	fn embedded_head(&self, frame: NodeId) -> Option<NodeId>;
	fn embedded_body(&self, frame: NodeId) -> Option<NodeId>;

	/// Events raised by the document itself since the last call (for example `load` on connected frames).
	fn take_pending_events(&mut self) -> Vec<DomEvent> {
		Vec::new()
	}
}

/// Calls the listeners for `event` without holding a borrow of the document.
pub fn dispatch(document: &SharedDocument, event: &DomEvent) -> usize {
	let span = trace_span!("dispatch", event = %event.name, target = ?event.target);
	let _enter = span.enter();
	let listeners = document.borrow().listeners(event.target, &event.name);
	for listener in &listeners {
		listener(event);
	}
	trace!("Notified {} listener(s).", listeners.len());
	listeners.len()
}

/// Dispatches events the document queued during mutations.
pub fn flush_pending_events(document: &SharedDocument) {
	loop {
		let pending = document.borrow_mut().take_pending_events();
		if pending.is_empty() {
			break;
		}
		for event in &pending {
			dispatch(document, event);
		}
	}
}

/// Inserts `child` and delivers any events caused by the insertion.
pub fn insert_before(document: &SharedDocument, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), DomError> {
	document.borrow_mut().insert_before(parent, child, reference)?;
	flush_pending_events(document);
	Ok(())
}

pub fn append_child(document: &SharedDocument, parent: NodeId, child: NodeId) -> Result<(), DomError> {
	insert_before(document, parent, child, None)
}

/// Detaches `node`, logging instead of failing.
///
/// Returns whether the node was attached.
pub fn remove_logged(document: &SharedDocument, node: NodeId) -> bool {
	match document.borrow_mut().remove(node) {
		Ok(()) => true,
		Err(error) => {
			warn!("Failed to remove node: {}", error);
			false
		}
	}
}

/// Removes every child of `node`.
pub fn clear_children(document: &SharedDocument, node: NodeId) {
	let children = document.borrow().children(node);
	for child in children {
		remove_logged(document, child);
	}
}

/// Pre-order descendants of `root`, excluding `root` itself.
///
/// With `include_embedded`, the documents of `<iframe>` elements are walked as well.
#[must_use]
pub fn descendants(document: &dyn Document, root: NodeId, include_embedded: bool) -> Vec<NodeId> {
	let mut found = Vec::new();
	let mut stack: Vec<NodeId> = document.children(root).into_iter().rev().collect();
	while let Some(node) = stack.pop() {
		found.push(node);
		if include_embedded {
			if let Some(embedded) = document.embedded_root(node) {
				stack.extend(document.children(embedded).into_iter().rev());
			}
		}
		stack.extend(document.children(node).into_iter().rev());
	}
	found
}

/// First element under `root` whose `id` attribute equals `id`.
#[must_use]
pub fn get_element_by_id(document: &dyn Document, root: NodeId, id: &str) -> Option<NodeId> {
	descendants(document, root, false).into_iter().find(|&node| document.attribute(node, "id").as_deref() == Some(id))
}

/// Whether `node` is `ancestor` or lies inside it.
#[must_use]
pub fn contains(document: &dyn Document, ancestor: NodeId, node: NodeId) -> bool {
	let mut current = Some(node);
	while let Some(candidate) = current {
		if candidate == ancestor {
			return true;
		}
		current = document.parent(candidate);
	}
	false
}
