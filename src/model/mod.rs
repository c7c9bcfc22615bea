//! Contract with the component model.
//!
//! The component model owns component trees, styling, data binding and action chains. This crate only consumes it
//! through [`ComponentModel`], [`Component`] and [`NuiPage`]; it never touches a component's internals otherwise.
//! [`basic`] contains a small model for hosts that render static NOODL definitions, and for tests.

use crate::{dom::DomEvent, error::ModelError};
use futures::future::LocalBoxFuture;
use serde_json::{Map, Value};
use std::rc::Rc;

pub mod basic;

pub type ComponentRef = Rc<dyn Component>;

/// Events a component emits towards its renderer.
#[derive(Clone)]
pub enum ComponentEvent {
	/// A child was created from a data object (lists).
	ChildCreated { child: ComponentRef, index: usize },
	/// A child's data object was replaced.
	ChildUpdated { child: ComponentRef, index: usize },
	ChildRemoved { child: ComponentRef, index: usize },
	/// The bound data value changed, in either direction.
	DataValue(Value),
	Custom { name: String, args: Vec<Value> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentEventKind {
	ChildCreated,
	ChildUpdated,
	ChildRemoved,
	DataValue,
	Custom,
}

impl ComponentEvent {
	#[must_use]
	pub fn kind(&self) -> ComponentEventKind {
		match self {
			Self::ChildCreated { .. } => ComponentEventKind::ChildCreated,
			Self::ChildUpdated { .. } => ComponentEventKind::ChildUpdated,
			Self::ChildRemoved { .. } => ComponentEventKind::ChildRemoved,
			Self::DataValue(_) => ComponentEventKind::DataValue,
			Self::Custom { .. } => ComponentEventKind::Custom,
		}
	}
}

pub type ComponentListener = Rc<dyn Fn(&ComponentEvent)>;

/// A resolved component instance.
pub trait Component {
	fn id(&self) -> String;
	fn component_type(&self) -> String;
	fn get(&self, key: &str) -> Option<Value>;
	fn set(&self, key: &str, value: Value);
	/// Computed inline style.
	fn style(&self) -> Map<String, Value>;
	fn children(&self) -> Vec<ComponentRef>;
	fn parent(&self) -> Option<ComponentRef>;
	/// Id of the page object this component is bound to.
	fn page_id(&self) -> Option<String>;

	/// Registers `listener` under `id`, replacing a previous listener with the same kind and id.
	fn on(&self, kind: ComponentEventKind, id: &str, listener: ComponentListener);
	fn off(&self, kind: ComponentEventKind, id: &str);
	fn emit(&self, event: ComponentEvent);

	/// Runs the action chain bound to `user_event` (for example `onClick`).
	fn execute(&self, user_event: &str, event: &DomEvent) -> LocalBoxFuture<'static, Result<(), ModelError>>;

	/// Creates a child from `data` and emits [`ComponentEvent::ChildCreated`]. Lists only.
	fn add_data_object(&self, _data: Value) -> Option<ComponentRef> {
		None
	}

	fn update_data_object(&self, _index: usize, _data: Value) -> Option<ComponentRef> {
		None
	}

	fn remove_data_object(&self, _index: usize) -> Option<ComponentRef> {
		None
	}

	/// Drops children that stand in for data that has not been applied yet.
	fn clear_placeholders(&self) {}

	fn child(&self, index: usize) -> Option<ComponentRef> {
		self.children().into_iter().nth(index)
	}

	fn has(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	fn get_str(&self, key: &str) -> Option<String> {
		match self.get(key)? {
			Value::String(s) => Some(s),
			Value::Number(n) => Some(n.to_string()),
			Value::Bool(b) => Some(b.to_string()),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

/// The model's page object.
pub trait NuiPage {
	fn id(&self) -> String;
	fn page(&self) -> String;
	fn set_page(&self, name: &str);
	fn viewport(&self) -> Viewport;
	fn set_viewport(&self, viewport: Viewport);
}

/// Context handed to action and emit handlers installed through [`Use`](`crate::Use`).
#[derive(Clone)]
pub struct ActionContext {
	/// The action object, as found in the chain.
	pub action: Value,
	pub component: ComponentRef,
	pub user_event: String,
	pub event: DomEvent,
}

pub type ActionHandler = Rc<dyn Fn(ActionContext) -> LocalBoxFuture<'static, Result<(), ModelError>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
	/// Keyed by `actionType`.
	Action(String),
	/// Keyed by emit trigger (for example `onClick`, `path`, `dataValue`).
	Emit(String),
}

pub trait ComponentModel {
	fn create_page(&self, name: &str, id: Option<&str>) -> Rc<dyn NuiPage>;
	fn remove_page(&self, id: &str);
	/// Resolves raw component definitions into component instances bound to `page`.
	fn resolve_components(&self, components: &[Value], page: &Rc<dyn NuiPage>) -> LocalBoxFuture<'static, Result<Vec<ComponentRef>, ModelError>>;
	fn use_action(&self, kind: ActionKind, handler: ActionHandler);
}

/// Whether a component is declared `global: true`.
#[must_use]
pub fn is_global(component: &dyn Component) -> bool {
	component.get("global").map_or(false, |value| crate::hooks::is_truthy(&value))
}
