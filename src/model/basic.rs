//! A small [`ComponentModel`] over static NOODL definitions.
//!
//! It supports what the renderer relies on: ids, properties, styles, nested children, lists materialized through
//! [`Component::add_data_object`] (with `dataKey` binding against the list's iterator variable) and action chains
//! dispatched to handlers installed with [`ComponentModel::use_action`].

use super::{ActionContext, ActionHandler, ActionKind, Component, ComponentEvent, ComponentEventKind, ComponentListener, ComponentModel, ComponentRef, NuiPage, Viewport};
use crate::{dom::DomEvent, error::ModelError};
use core::cell::{Cell, RefCell};
use futures::{future::LocalBoxFuture, FutureExt};
use hashbrown::HashMap;
use serde_json::{Map, Value};
use std::rc::{Rc, Weak};
use tracing::{trace, warn};

const DEFAULT_ITERATOR_VAR: &str = "itemObject";

#[derive(Default)]
struct ModelState {
	next_id: Cell<u64>,
	actions: RefCell<HashMap<ActionKind, ActionHandler>>,
	pages: RefCell<HashMap<String, Rc<BasicPage>>>,
}

impl ModelState {
	fn generate_id(&self, prefix: &str) -> String {
		let n = self.next_id.get();
		self.next_id.set(n + 1);
		format!("{}-{}", prefix, n)
	}
}

#[derive(Clone, Default)]
pub struct BasicModel {
	state: Rc<ModelState>,
}

impl BasicModel {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The page object registered under `id`.
	#[must_use]
	pub fn page(&self, id: &str) -> Option<Rc<BasicPage>> {
		self.state.pages.borrow().get(id).cloned()
	}

	#[must_use]
	pub fn page_count(&self) -> usize {
		self.state.pages.borrow().len()
	}
}

impl ComponentModel for BasicModel {
	fn create_page(&self, name: &str, id: Option<&str>) -> Rc<dyn NuiPage> {
		let id = id.map_or_else(|| self.state.generate_id("page"), str::to_owned);
		let page = Rc::new(BasicPage {
			id: id.clone(),
			page: RefCell::new(name.to_owned()),
			viewport: Cell::new(Viewport::default()),
		});
		self.state.pages.borrow_mut().insert(id, page.clone());
		page
	}

	fn remove_page(&self, id: &str) {
		self.state.pages.borrow_mut().remove(id);
	}

	fn resolve_components(&self, components: &[Value], page: &Rc<dyn NuiPage>) -> LocalBoxFuture<'static, Result<Vec<ComponentRef>, ModelError>> {
		let page_id = page.id();
		let resolved: Result<Vec<ComponentRef>, ModelError> = components
			.iter()
			.map(|raw| build(&self.state, raw, &page_id, None, None, None).map(|c| c as ComponentRef))
			.collect();
		futures::future::ready(resolved).boxed_local()
	}

	fn use_action(&self, kind: ActionKind, handler: ActionHandler) {
		self.state.actions.borrow_mut().insert(kind, handler);
	}
}

pub struct BasicPage {
	id: String,
	page: RefCell<String>,
	viewport: Cell<Viewport>,
}

impl NuiPage for BasicPage {
	fn id(&self) -> String {
		self.id.clone()
	}

	fn page(&self) -> String {
		self.page.borrow().clone()
	}

	fn set_page(&self, name: &str) {
		*self.page.borrow_mut() = name.to_owned();
	}

	fn viewport(&self) -> Viewport {
		self.viewport.get()
	}

	fn set_viewport(&self, viewport: Viewport) {
		self.viewport.set(viewport);
	}
}

/// Data a list item (and its descendants) binds `dataKey`s against.
#[derive(Clone)]
struct Binding {
	iterator_var: String,
	data: Value,
}

impl Binding {
	fn lookup(&self, data_key: &str) -> Option<Value> {
		let mut segments = data_key.split('.');
		if segments.next()? != self.iterator_var {
			return None;
		}
		let mut current = &self.data;
		for segment in segments {
			current = match current {
				Value::Object(map) => map.get(segment)?,
				Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
				_ => return None,
			};
		}
		Some(current.clone())
	}
}

pub struct BasicComponent {
	id: String,
	component_type: String,
	page_id: String,
	props: RefCell<Map<String, Value>>,
	style: RefCell<Map<String, Value>>,
	children: RefCell<Vec<ComponentRef>>,
	parent: Option<Weak<BasicComponent>>,
	listeners: RefCell<Vec<(ComponentEventKind, String, ComponentListener)>>,
	/// Raw definition of list items.
	blueprint: Option<Value>,
	state: Weak<ModelState>,
	this: Weak<BasicComponent>,
}

fn build(state: &Rc<ModelState>, raw: &Value, page_id: &str, parent: Option<Weak<BasicComponent>>, binding: Option<Binding>, id: Option<String>) -> Result<Rc<BasicComponent>, ModelError> {
	let object = raw.as_object().ok_or_else(|| ModelError(format!("component definition must be an object, got {}", raw)))?;
	let component_type = object.get("type").and_then(Value::as_str).unwrap_or("view").to_owned();
	let id = id.or_else(|| if binding.is_none() { object.get("id").and_then(Value::as_str).map(str::to_owned) } else { None }).unwrap_or_else(|| state.generate_id(&component_type));

	let mut props = Map::new();
	for (key, value) in object {
		if !matches!(key.as_str(), "type" | "style" | "children" | "id") {
			props.insert(key.clone(), value.clone());
		}
	}
	if let (Some(binding), Some(data_key)) = (&binding, object.get("dataKey").and_then(Value::as_str)) {
		if let Some(value) = binding.lookup(data_key) {
			props.insert("data-value".to_owned(), value);
		}
	}
	let style = object.get("style").and_then(Value::as_object).cloned().unwrap_or_default();
	let raw_children: Vec<Value> = object.get("children").and_then(Value::as_array).cloned().unwrap_or_default();
	let blueprint = if component_type == "list" { raw_children.first().cloned() } else { None };

	let component = Rc::new_cyclic(|this| BasicComponent {
		id,
		component_type,
		page_id: page_id.to_owned(),
		props: RefCell::new(props),
		style: RefCell::new(style),
		children: RefCell::new(Vec::new()),
		parent,
		listeners: RefCell::new(Vec::new()),
		blueprint,
		state: Rc::downgrade(state),
		this: this.clone(),
	});

	let mut children: Vec<ComponentRef> = Vec::new();
	if let Some(blueprint) = &component.blueprint {
		// A placeholder item until data objects are replayed.
		let placeholder = build(state, blueprint, page_id, Some(Rc::downgrade(&component)), binding, None)?;
		placeholder.props.borrow_mut().insert("listPlaceholder".to_owned(), Value::Bool(true));
		children.push(placeholder);
	} else {
		for raw_child in &raw_children {
			children.push(build(state, raw_child, page_id, Some(Rc::downgrade(&component)), binding.clone(), None)?);
		}
	}
	*component.children.borrow_mut() = children;
	Ok(component)
}

impl BasicComponent {
	fn iterator_var(&self) -> String {
		self.props.borrow().get("iteratorVar").and_then(Value::as_str).unwrap_or(DEFAULT_ITERATOR_VAR).to_owned()
	}

	fn build_item(&self, data: Value, index: usize, id: Option<String>) -> Option<Rc<BasicComponent>> {
		let state = self.state.upgrade()?;
		let blueprint = self.blueprint.as_ref()?;
		let binding = Binding { iterator_var: self.iterator_var(), data: data.clone() };
		match build(&state, blueprint, &self.page_id, Some(self.this.clone()), Some(binding), id) {
			Ok(item) => {
				{
					let mut props = item.props.borrow_mut();
					props.insert("listIndex".to_owned(), Value::from(index));
					props.insert("dataObject".to_owned(), data);
				}
				Some(item)
			}
			Err(error) => {
				warn!("Failed to build list item {}: {}", index, error);
				None
			}
		}
	}

	/// Appends `data` to `listObject` and materializes it.
	pub fn push_data_object(&self, data: Value) -> Option<ComponentRef> {
		{
			let mut props = self.props.borrow_mut();
			let list_object = props.entry("listObject").or_insert_with(|| Value::Array(Vec::new()));
			if let Value::Array(items) = list_object {
				items.push(data.clone());
			}
		}
		self.add_data_object(data)
	}

	fn reindex(&self) {
		for (index, child) in self.children.borrow().iter().enumerate() {
			child.set("listIndex", Value::from(index));
		}
	}
}

impl Component for BasicComponent {
	fn id(&self) -> String {
		self.id.clone()
	}

	fn component_type(&self) -> String {
		self.component_type.clone()
	}

	fn get(&self, key: &str) -> Option<Value> {
		self.props.borrow().get(key).cloned()
	}

	fn set(&self, key: &str, value: Value) {
		self.props.borrow_mut().insert(key.to_owned(), value);
	}

	fn style(&self) -> Map<String, Value> {
		self.style.borrow().clone()
	}

	fn children(&self) -> Vec<ComponentRef> {
		self.children.borrow().clone()
	}

	fn parent(&self) -> Option<ComponentRef> {
		let parent: ComponentRef = self.parent.as_ref()?.upgrade()?;
		Some(parent)
	}

	fn page_id(&self) -> Option<String> {
		Some(self.page_id.clone())
	}

	fn on(&self, kind: ComponentEventKind, id: &str, listener: ComponentListener) {
		let mut listeners = self.listeners.borrow_mut();
		match listeners.iter_mut().find(|(k, i, _)| *k == kind && i == id) {
			Some(entry) => entry.2 = listener,
			None => listeners.push((kind, id.to_owned(), listener)),
		}
	}

	fn off(&self, kind: ComponentEventKind, id: &str) {
		self.listeners.borrow_mut().retain(|(k, i, _)| !(*k == kind && i == id));
	}

	fn emit(&self, event: ComponentEvent) {
		if let ComponentEvent::DataValue(value) = &event {
			self.set("data-value", value.clone());
		}
		let kind = event.kind();
		let listeners: Vec<ComponentListener> = self.listeners.borrow().iter().filter(|(k, _, _)| *k == kind).map(|(_, _, l)| l.clone()).collect();
		trace!("Component {} emits {:?} to {} listener(s).", self.id, kind, listeners.len());
		for listener in listeners {
			listener(&event);
		}
	}

	fn execute(&self, user_event: &str, event: &DomEvent) -> LocalBoxFuture<'static, Result<(), ModelError>> {
		let chain = match self.get(user_event) {
			Some(Value::Array(actions)) => actions,
			Some(Value::Null) | None => Vec::new(),
			Some(action) => vec![action],
		};
		let (Some(state), Some(component)) = (self.state.upgrade(), self.this.upgrade()) else {
			return futures::future::ready(Err(ModelError("component model was dropped".to_owned()))).boxed_local();
		};
		let user_event = user_event.to_owned();
		let event = event.clone();
		async move {
			for action in chain {
				let action_type = match &action {
					Value::String(name) => name.clone(),
					Value::Object(object) => match object.get("actionType").and_then(Value::as_str) {
						Some(action_type) => action_type.to_owned(),
						None => object.keys().next().cloned().unwrap_or_default(),
					},
					_ => continue,
				};
				let handler = {
					let actions = state.actions.borrow();
					actions.get(&ActionKind::Action(action_type.clone())).or_else(|| actions.get(&ActionKind::Emit(user_event.clone()))).cloned()
				};
				match handler {
					Some(handler) => {
						handler(ActionContext {
							action,
							component: component.clone(),
							user_event: user_event.clone(),
							event: event.clone(),
						})
						.await?
					}
					None => trace!("No handler for action {:?}.", action_type),
				}
			}
			Ok(())
		}
		.boxed_local()
	}

	fn add_data_object(&self, data: Value) -> Option<ComponentRef> {
		let index = self.children.borrow().len();
		let item: ComponentRef = self.build_item(data, index, None)?;
		self.children.borrow_mut().push(item.clone());
		self.emit(ComponentEvent::ChildCreated { child: item.clone(), index });
		Some(item)
	}

	fn update_data_object(&self, index: usize, data: Value) -> Option<ComponentRef> {
		let id = self.children.borrow().get(index)?.id();
		if let Some(Value::Array(items)) = self.props.borrow_mut().get_mut("listObject") {
			if let Some(slot) = items.get_mut(index) {
				*slot = data.clone();
			}
		}
		let item: ComponentRef = self.build_item(data, index, Some(id))?;
		self.children.borrow_mut()[index] = item.clone();
		self.emit(ComponentEvent::ChildUpdated { child: item.clone(), index });
		Some(item)
	}

	fn remove_data_object(&self, index: usize) -> Option<ComponentRef> {
		if index >= self.children.borrow().len() {
			return None;
		}
		let item = self.children.borrow_mut().remove(index);
		if let Some(Value::Array(items)) = self.props.borrow_mut().get_mut("listObject") {
			if index < items.len() {
				items.remove(index);
			}
		}
		self.reindex();
		self.emit(ComponentEvent::ChildRemoved { child: item.clone(), index });
		Some(item)
	}

	fn clear_placeholders(&self) {
		self.children.borrow_mut().retain(|child| !child.get("listPlaceholder").map_or(false, |p| p == Value::Bool(true)));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn resolve(model: &BasicModel, raw: Value) -> Vec<ComponentRef> {
		let page = model.create_page("Test", None);
		futures::executor::block_on(model.resolve_components(&[raw], &page)).unwrap()
	}

	#[test]
	fn lists_bind_data_keys() {
		let model = BasicModel::new();
		let list = resolve(
			&model,
			json!({
				"type": "list",
				"iteratorVar": "itemObject",
				"listObject": [],
				"children": [{ "type": "listItem", "children": [{ "type": "label", "dataKey": "itemObject.firstName" }] }]
			}),
		)
		.remove(0);
		assert_eq!(list.children().len(), 1);
		list.clear_placeholders();
		assert!(list.children().is_empty());

		let item = list.add_data_object(json!({ "firstName": "Mike" })).unwrap();
		assert_eq!(item.get("listIndex"), Some(json!(0)));
		assert_eq!(item.children()[0].get("data-value"), Some(json!("Mike")));
	}

	#[test]
	fn remove_reindexes() {
		let model = BasicModel::new();
		let list = resolve(&model, json!({ "type": "list", "listObject": [], "children": [{ "type": "listItem" }] })).remove(0);
		list.clear_placeholders();
		for name in ["a", "b", "c"] {
			list.add_data_object(json!({ "name": name }));
		}
		let removed = list.remove_data_object(0).unwrap();
		assert_eq!(removed.get("dataObject"), Some(json!({ "name": "a" })));
		assert_eq!(list.children()[0].get("listIndex"), Some(json!(0)));
		assert_eq!(list.children()[1].get("dataObject"), Some(json!({ "name": "c" })));
	}

	#[test]
	fn actions_dispatch_by_type() {
		let model = BasicModel::new();
		let seen = Rc::new(RefCell::new(Vec::new()));
		{
			let seen = seen.clone();
			model.use_action(
				ActionKind::Action("goto".to_owned()),
				Rc::new(move |context: ActionContext| {
					seen.borrow_mut().push(context.action["goto"].clone());
					futures::future::ready(Ok(())).boxed_local()
				}),
			);
		}
		let button = resolve(&model, json!({ "type": "button", "onClick": [{ "goto": "Donut" }] })).remove(0);
		let event = DomEvent::new("click", crate::dom::NodeId(0));
		futures::executor::block_on(button.execute("onClick", &event)).unwrap();
		assert_eq!(*seen.borrow(), vec![json!("Donut")]);
	}
}
