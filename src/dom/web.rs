//! [`Document`] implementation on top of [`web_sys`].
//!
//! Nodes are adopted lazily: any [***Node***](https://developer.mozilla.org/en-US/docs/Web/API/Node) reached through
//! [`Document::children`] or [`Document::parent`] receives a [`NodeId`], which is also stored on the JavaScript object so
//! that repeated lookups resolve to the same handle. This makes the document usable on top of markup the host page already has.

use super::{
	closure_map::{ClosureMap, PublishedListener},
	Document, DomEvent, Listener, ListenerId, NodeId,
};
use crate::error::DomError;
use core::cell::{Cell, RefCell};
use hashbrown::HashMap;
use js_sys::Reflect;
use tracing::{instrument, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Element, HtmlElement, HtmlIFrameElement, HtmlInputElement, HtmlSelectElement, Node};

const NODE_ID_KEY: &str = "__noodlDomNodeId";

fn js_error(error: &JsValue) -> DomError {
	DomError::Js(format!("{:?}", error))
}

pub struct WebDocument {
	document: web_sys::Document,
	nodes: RefCell<HashMap<NodeId, Node>>,
	next: Cell<u32>,
	closures: ClosureMap,
	root: NodeId,
	head: NodeId,
	body: NodeId,
}

impl WebDocument {
	/// Attaches to the current window's document.
	///
	/// # Errors
	///
	/// Iff there is no window, no document, or the document has no `<head>` or `<body>`.
	#[instrument]
	pub fn from_window() -> Result<Self, DomError> {
		let document = web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| DomError::Js("no window document".to_owned()))?;
		Self::new(document)
	}

	/// # Errors
	///
	/// Iff the document has no `<head>` or `<body>`.
	pub fn new(document: web_sys::Document) -> Result<Self, DomError> {
		let head = document.head().ok_or_else(|| DomError::Js("document has no head".to_owned()))?;
		let body = document.body().ok_or_else(|| DomError::Js("document has no body".to_owned()))?;
		let mut this = Self {
			document: document.clone(),
			nodes: RefCell::default(),
			next: Cell::new(0),
			closures: ClosureMap::default(),
			root: NodeId(0),
			head: NodeId(0),
			body: NodeId(0),
		};
		this.root = this.adopt(document.as_ref());
		this.head = this.adopt(head.as_ref());
		this.body = this.adopt(body.as_ref());
		Ok(this)
	}

	/// The browser node behind `node`.
	#[must_use]
	pub fn web_node(&self, node: NodeId) -> Option<Node> {
		self.nodes.borrow().get(&node).cloned()
	}

	/// Registers a browser node, reusing the id it was given before.
	pub fn adopt(&self, node: &Node) -> NodeId {
		if let Ok(existing) = Reflect::get(node, &JsValue::from_str(NODE_ID_KEY)) {
			if let Some(index) = existing.as_f64() {
				#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
				let id = NodeId(index as u32);
				if self.nodes.borrow().contains_key(&id) {
					return id;
				}
			}
		}
		let id = NodeId(self.next.get());
		self.next.set(id.0 + 1);
		if let Err(error) = Reflect::set(node, &JsValue::from_str(NODE_ID_KEY), &JsValue::from(id.0)) {
			warn!("Failed to tag adopted node: {:?}", error);
		}
		self.nodes.borrow_mut().insert(id, node.clone());
		trace!("Adopted node as {:?}.", id);
		id
	}

	fn get(&self, node: NodeId) -> Result<Node, DomError> {
		self.web_node(node).ok_or(DomError::NodeMissing(node))
	}

	fn element(&self, node: NodeId) -> Result<Element, DomError> {
		self.get(node)?.dyn_into::<Element>().map_err(|_| DomError::NotAnElement(node))
	}

	fn html_element(&self, node: NodeId) -> Result<HtmlElement, DomError> {
		self.get(node)?.dyn_into::<HtmlElement>().map_err(|_| DomError::NotAnElement(node))
	}

	fn content_document(&self, frame: NodeId) -> Option<web_sys::Document> {
		self.web_node(frame)?.dyn_into::<HtmlIFrameElement>().ok()?.content_document()
	}
}

fn control_value(node: &Node) -> Option<String> {
	if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
		Some(input.value())
	} else {
		node.dyn_ref::<HtmlSelectElement>().map(HtmlSelectElement::value)
	}
}

impl Document for WebDocument {
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
		match self.document.create_element(tag) {
			Ok(element) => self.adopt(element.as_ref()),
			Err(error) => {
				warn!("Failed to create <{}>: {:?}; falling back to <div>.", tag, error);
				let element = self.document.create_element("div").map_err(|e| js_error(&e));
				match element {
					Ok(element) => self.adopt(element.as_ref()),
					Err(_) => self.create_text_node(""),
				}
			}
		}
	}

	fn create_text_node(&mut self, text: &str) -> NodeId {
		let text = self.document.create_text_node(text);
		self.adopt(text.as_ref())
	}

	fn tag_name(&self, node: NodeId) -> Option<String> {
		self.web_node(node)?.dyn_ref::<Element>().map(Element::tag_name)
	}

	fn parent(&self, node: NodeId) -> Option<NodeId> {
		let parent = self.web_node(node)?.parent_node()?;
		Some(self.adopt(&parent))
	}

	fn children(&self, node: NodeId) -> Vec<NodeId> {
		let Some(node) = self.web_node(node) else { return Vec::new() };
		let child_nodes = node.child_nodes();
		(0..child_nodes.length()).filter_map(|i| child_nodes.get(i)).map(|child| self.adopt(&child)).collect()
	}

	fn is_connected(&self, node: NodeId) -> bool {
		self.web_node(node).map_or(false, |node| node.is_connected())
	}

	fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), DomError> {
		let parent_node = self.get(parent)?;
		let child_node = self.get(child)?;
		let reference = reference.map(|reference| self.get(reference)).transpose()?;
		parent_node
			.insert_before(&child_node, reference.as_ref())
			.map(|_| ())
			.map_err(|_| DomError::HierarchyRequest { parent, child })
	}

	fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
		let web_node = self.get(node)?;
		let parent = web_node.parent_node().ok_or(DomError::NotAttached(node))?;
		parent.remove_child(&web_node).map(|_| ()).map_err(|e| js_error(&e))
	}

	fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		self.web_node(node)?.dyn_ref::<Element>()?.get_attribute(name)
	}

	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
		self.element(node)?.set_attribute(name, value).map_err(|e| js_error(&e))
	}

	fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
		self.element(node)?.remove_attribute(name).map_err(|e| js_error(&e))
	}

	fn style(&self, node: NodeId, property: &str) -> Option<String> {
		let value = self.html_element(node).ok()?.style().get_property_value(property).ok()?;
		if value.is_empty() {
			None
		} else {
			Some(value)
		}
	}

	fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
		let style = self.html_element(node)?.style();
		if value.is_empty() {
			style.remove_property(property).map(|_| ()).map_err(|e| js_error(&e))
		} else {
			style.set_property(property, value).map_err(|e| js_error(&e))
		}
	}

	fn text_content(&self, node: NodeId) -> String {
		self.web_node(node).and_then(|node| node.text_content()).unwrap_or_default()
	}

	fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
		self.get(node)?.set_text_content(Some(text));
		Ok(())
	}

	fn value(&self, node: NodeId) -> Option<String> {
		control_value(&self.web_node(node)?)
	}

	fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
		let web_node = self.get(node)?;
		if let Some(input) = web_node.dyn_ref::<HtmlInputElement>() {
			input.set_value(value);
		} else if let Some(select) = web_node.dyn_ref::<HtmlSelectElement>() {
			select.set_value(value);
		} else {
			self.set_attribute(node, "value", value)?;
		}
		Ok(())
	}

	fn add_event_listener(&mut self, node: NodeId, event: &str, listener: Listener) -> Result<ListenerId, DomError> {
		let target = self.get(node)?;
		let id = self.closures.next_id();
		let rust_listener = listener.clone();
		let closure = Closure::wrap(Box::new(move |web_event: web_sys::Event| {
			let value = web_event.target().and_then(|target| target.dyn_into::<Node>().ok()).and_then(|target| control_value(&target));
			let event = DomEvent { name: web_event.type_(), target: node, value };
			rust_listener(&event);
		}) as Box<dyn Fn(web_sys::Event)>);
		target
			.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
			.map_err(|e| js_error(&e))?;
		self.closures.publish(id, PublishedListener { node, event: event.to_owned(), listener, closure });
		Ok(id)
	}

	fn remove_event_listener(&mut self, listener: ListenerId) {
		let Some(published) = self.closures.unpublish(listener) else { return };
		if let Some(target) = self.web_node(published.node) {
			if let Err(error) = target.remove_event_listener_with_callback(&published.event, published.closure.as_ref().unchecked_ref()) {
				warn!("Failed to remove {} listener: {:?}", published.event, error);
			}
		}
		trace!("{} listener closure(s) remain.", self.closures.len());
	}

	fn listeners(&self, node: NodeId, event: &str) -> Vec<Listener> {
		self.closures.listeners(node, event).into_iter().map(|(_, listener)| listener).collect()
	}

	fn embedded_root(&self, frame: NodeId) -> Option<NodeId> {
		let document = self.content_document(frame)?;
		Some(self.adopt(document.as_ref()))
	}

	fn embedded_head(&self, frame: NodeId) -> Option<NodeId> {
		let head = self.content_document(frame)?.head()?;
		Some(self.adopt(head.as_ref()))
	}

	fn embedded_body(&self, frame: NodeId) -> Option<NodeId> {
		let body = self.content_document(frame)?.body()?;
		Some(self.adopt(body.as_ref()))
	}
}
