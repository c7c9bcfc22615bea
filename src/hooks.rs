//! Typed lifecycle hook bus.
//!
//! Each event holds an ordered list of [`HookDescriptor`]s. Registration is keyed by a descriptor id, so registering the
//! same id twice for one event is a no-op. `once` descriptors are removed in the same pass that invokes them.

use core::{cell::RefCell, hash::Hash};
use futures::future::{join_all, LocalBoxFuture};
use hashbrown::HashMap;
use serde_json::Value;
use std::rc::Rc;
use tracing::trace;

pub type SyncHook<A> = Rc<dyn Fn(&A)>;
pub type AsyncHook<A> = Rc<dyn Fn(&A) -> LocalBoxFuture<'static, Option<Value>>>;

pub enum HookFn<A> {
	Sync(SyncHook<A>),
	Async(AsyncHook<A>),
}
impl<A> Clone for HookFn<A> {
	fn clone(&self) -> Self {
		match self {
			Self::Sync(hook) => Self::Sync(hook.clone()),
			Self::Async(hook) => Self::Async(hook.clone()),
		}
	}
}

pub struct HookDescriptor<A> {
	pub id: String,
	pub handler: HookFn<A>,
	pub once: bool,
}
impl<A> Clone for HookDescriptor<A> {
	fn clone(&self) -> Self {
		Self {
			id: self.id.clone(),
			handler: self.handler.clone(),
			once: self.once,
		}
	}
}

/// Whether a hook result counts as an answer for [`Hooks::emit_async`].
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

pub struct Hooks<E, A> {
	hooks: RefCell<HashMap<E, Vec<HookDescriptor<A>>>>,
}

impl<E: Copy + Eq + Hash + core::fmt::Debug, A> Default for Hooks<E, A> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E: Copy + Eq + Hash + core::fmt::Debug, A> Hooks<E, A> {
	#[must_use]
	pub fn new() -> Self {
		Self { hooks: RefCell::new(HashMap::new()) }
	}

	/// Registers `handler` under `id`. Returns `false` (and changes nothing) if `id` is already registered for `event`.
	pub fn on(&self, event: E, id: impl Into<String>, handler: HookFn<A>) -> bool {
		self.insert(event, HookDescriptor { id: id.into(), handler, once: false })
	}

	/// Like [`Hooks::on`], but the descriptor removes itself after its first invocation.
	pub fn once(&self, event: E, id: impl Into<String>, handler: HookFn<A>) -> bool {
		self.insert(event, HookDescriptor { id: id.into(), handler, once: true })
	}

	pub fn on_sync(&self, event: E, id: impl Into<String>, handler: impl Fn(&A) + 'static) -> bool {
		self.on(event, id, HookFn::Sync(Rc::new(handler)))
	}

	fn insert(&self, event: E, descriptor: HookDescriptor<A>) -> bool {
		let mut hooks = self.hooks.borrow_mut();
		let list = hooks.entry(event).or_default();
		if list.iter().any(|existing| existing.id == descriptor.id) {
			trace!("Hook {:?} is already registered for {:?}.", descriptor.id, event);
			return false;
		}
		list.push(descriptor);
		true
	}

	/// Removes the descriptor `id` from `event`. Returns whether it was registered.
	pub fn off(&self, event: E, id: &str) -> bool {
		let mut hooks = self.hooks.borrow_mut();
		let Some(list) = hooks.get_mut(&event) else { return false };
		let before = list.len();
		list.retain(|descriptor| descriptor.id != id);
		before != list.len()
	}

	#[must_use]
	pub fn count(&self, event: E) -> usize {
		self.hooks.borrow().get(&event).map_or(0, Vec::len)
	}

	#[must_use]
	pub fn ids(&self, event: E) -> Vec<String> {
		self.hooks.borrow().get(&event).map(|list| list.iter().map(|d| d.id.clone()).collect()).unwrap_or_default()
	}

	/// Drops every descriptor of every event.
	pub fn clear(&self) {
		self.hooks.borrow_mut().clear();
	}

	/// Snapshot of the descriptors for `event` that this emit invokes. Those marked `once` are removed from the bus.
	fn take_for_emit(&self, event: E, include_async: bool) -> Vec<HookDescriptor<A>> {
		let invoked = |descriptor: &HookDescriptor<A>| include_async || matches!(descriptor.handler, HookFn::Sync(_));
		let mut hooks = self.hooks.borrow_mut();
		let Some(list) = hooks.get_mut(&event) else { return Vec::new() };
		let snapshot = list.iter().filter(|descriptor| invoked(*descriptor)).cloned().collect();
		list.retain(|descriptor| !(descriptor.once && invoked(descriptor)));
		snapshot
	}

	/// Invokes the synchronous handlers for `event` in registration order.
	///
	/// Asynchronous handlers are skipped; they only take part in [`Hooks::emit_async`]. Returns the number of handlers called.
	pub fn emit_sync(&self, event: E, args: &A) -> usize {
		let descriptors = self.take_for_emit(event, false);
		let mut called = 0;
		for descriptor in descriptors {
			if let HookFn::Sync(handler) = &descriptor.handler {
				handler(args);
				called += 1;
			}
		}
		trace!("Emitted {:?} to {} hook(s).", event, called);
		called
	}

	/// Invokes every handler for `event` and awaits the asynchronous ones concurrently.
	///
	/// Returns the first truthy result in registration order.
	pub async fn emit_async(&self, event: E, args: &A) -> Option<Value> {
		let descriptors = self.take_for_emit(event, true);
		let mut pending = Vec::new();
		for descriptor in descriptors {
			match &descriptor.handler {
				HookFn::Sync(handler) => handler(args),
				HookFn::Async(handler) => pending.push(handler(args)),
			}
		}
		join_all(pending).await.into_iter().flatten().find(is_truthy)
	}
}
