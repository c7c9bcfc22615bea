//! Pages: one per navigable surface.
//!
//! A [`Page`] wraps exactly one model page object ([`NuiPage`]) by composition, owns the root container its components
//! are drawn into and carries a typed hook bus for its lifecycle.
//! A page drawn by a `page` component (page-within-page) additionally carries an [`EmbeddedDocumentBinding`].

use crate::{
	dom::NodeId,
	hooks::{HookFn, Hooks},
	model::{ComponentRef, NuiPage, Viewport},
	error::NdomError,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	str::FromStr,
};
use hashbrown::HashMap;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{debug, trace};

pub type PageRef = Rc<Page>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageStatus {
	Idle,
	ResolvingComponents,
	ComponentsReceived,
	RenderingComponents,
	ComponentsRendered,
	NavigateError,
}

impl PageStatus {
	/// Whether entering this status clears `requesting`.
	#[must_use]
	pub fn clears_requesting(self) -> bool {
		matches!(self, Self::Idle | Self::NavigateError)
	}

	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "IDLE",
			Self::ResolvingComponents => "RESOLVING_COMPONENTS",
			Self::ComponentsReceived => "COMPONENTS_RECEIVED",
			Self::RenderingComponents => "RENDERING_COMPONENTS",
			Self::ComponentsRendered => "COMPONENTS_RENDERED",
			Self::NavigateError => "NAVIGATE_ERROR",
		}
	}
}

/// Lifecycle events of a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEvent {
	StatusChange,
	AspectRatioMin,
	AspectRatioMax,
	BeforeClearRootNode,
	BeforeRenderComponents,
	ComponentsRendered,
	RedrawBeforeCleanup,
	SetRootNode,
}

impl FromStr for PageEvent {
	type Err = NdomError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		Ok(match name {
			"ON_STATUS_CHANGE" => Self::StatusChange,
			"ON_ASPECT_RATIO_MIN" => Self::AspectRatioMin,
			"ON_ASPECT_RATIO_MAX" => Self::AspectRatioMax,
			"ON_BEFORE_CLEAR_ROOT_NODE" => Self::BeforeClearRootNode,
			"ON_BEFORE_RENDER_COMPONENTS" => Self::BeforeRenderComponents,
			"ON_COMPONENTS_RENDERED" => Self::ComponentsRendered,
			"ON_REDRAW_BEFORE_CLEANUP" => Self::RedrawBeforeCleanup,
			"ON_SET_ROOT_NODE" => Self::SetRootNode,
			_ => return Err(NdomError::UnknownName { kind: "page event", name: name.to_owned() }),
		})
	}
}

/// Payload of page hooks.
#[derive(Clone)]
pub enum PageHookArgs {
	Status(PageStatus),
	AspectRatio(f64),
	RootNode(NodeId),
	Render { snapshot: PageSnapshot, components: Vec<ComponentRef> },
	Redraw { node: Option<NodeId>, component: ComponentRef },
}

pub type Modifiers = Map<String, Value>;

/// Owned copy of a page's navigation state.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
	pub id: String,
	pub page: String,
	pub previous: String,
	pub requesting: String,
	pub status: PageStatus,
	pub generation: u64,
	pub modifiers: Option<Modifiers>,
}

/// Marks a page as drawn into the embedded document of a `page` component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDocumentBinding {
	/// The `<iframe>` element.
	pub frame: NodeId,
	/// Id of the `page` component owning the frame.
	pub component_id: String,
	/// Id of the page the frame was drawn on.
	pub parent_page_id: String,
	/// Remote content is loaded by the browser, not drawn.
	pub remote: bool,
	pub loaded: bool,
}

struct PageState {
	previous: String,
	requesting: String,
	status: PageStatus,
	aspect_ratio: f64,
	min: f64,
	max: f64,
	modifiers: HashMap<String, Modifiers>,
	root_node: NodeId,
	components: Vec<Value>,
	rendered: Vec<ComponentRef>,
	embedded: Option<EmbeddedDocumentBinding>,
	removed: bool,
}

pub struct Page {
	id: String,
	nui: Rc<dyn NuiPage>,
	state: RefCell<PageState>,
	generation: Cell<u64>,
	hooks: Hooks<PageEvent, PageHookArgs>,
}

impl Debug for Page {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Page")
			.field("id", &self.id)
			.field("page", &self.page())
			.field("status", &self.status())
			.field("requesting", &self.requesting())
			.finish()
	}
}

impl Page {
	/// Wraps `nui`. The page's identity is the page object's id.
	pub fn new(nui: Rc<dyn NuiPage>, root_node: NodeId) -> Self {
		Self {
			id: nui.id(),
			nui,
			state: RefCell::new(PageState {
				previous: String::new(),
				requesting: String::new(),
				status: PageStatus::Idle,
				aspect_ratio: 1.0,
				min: 0.0,
				max: 0.0,
				modifiers: HashMap::new(),
				root_node,
				components: Vec::new(),
				rendered: Vec::new(),
				embedded: None,
				removed: false,
			}),
			generation: Cell::new(0),
			hooks: Hooks::new(),
		}
	}

	#[must_use]
	pub fn id(&self) -> &str {
		&self.id
	}

	#[must_use]
	pub fn nui(&self) -> &Rc<dyn NuiPage> {
		&self.nui
	}

	/// Current page name.
	#[must_use]
	pub fn page(&self) -> String {
		self.nui.page()
	}

	pub fn set_page(&self, name: &str) {
		self.nui.set_page(name);
	}

	#[must_use]
	pub fn previous(&self) -> String {
		self.state.borrow().previous.clone()
	}

	pub fn set_previous(&self, name: &str) {
		self.state.borrow_mut().previous = name.to_owned();
	}

	/// Pending navigation target; empty when idle.
	#[must_use]
	pub fn requesting(&self) -> String {
		self.state.borrow().requesting.clone()
	}

	/// Setting an empty target also clears all modifiers.
	pub fn set_requesting(&self, name: &str) {
		let mut state = self.state.borrow_mut();
		state.requesting = name.to_owned();
		if name.is_empty() {
			state.modifiers.clear();
		}
	}

	#[must_use]
	pub fn status(&self) -> PageStatus {
		self.state.borrow().status
	}

	/// Transitions to `status` and notifies [`PageEvent::StatusChange`] hooks with the new status.
	pub fn set_status(&self, status: PageStatus) {
		{
			let mut state = self.state.borrow_mut();
			trace!(page = %self.id, from = state.status.as_str(), to = status.as_str(), "Status change.");
			state.status = status;
		}
		if status.clears_requesting() {
			self.set_requesting("");
		}
		self.hooks.emit_sync(PageEvent::StatusChange, &PageHookArgs::Status(status));
	}

	#[must_use]
	pub fn modifiers(&self, page_name: &str) -> Option<Modifiers> {
		self.state.borrow().modifiers.get(page_name).cloned()
	}

	pub fn set_modifiers(&self, page_name: &str, modifiers: Modifiers) {
		self.state.borrow_mut().modifiers.insert(page_name.to_owned(), modifiers);
	}

	#[must_use]
	pub fn aspect_ratio(&self) -> f64 {
		self.state.borrow().aspect_ratio
	}

	pub fn set_aspect_ratio(&self, aspect_ratio: f64) {
		self.state.borrow_mut().aspect_ratio = aspect_ratio;
	}

	#[must_use]
	pub fn min(&self) -> f64 {
		self.state.borrow().min
	}

	pub fn set_min(&self, min: f64) {
		self.state.borrow_mut().min = min;
		self.hooks.emit_sync(PageEvent::AspectRatioMin, &PageHookArgs::AspectRatio(min));
	}

	#[must_use]
	pub fn max(&self) -> f64 {
		self.state.borrow().max
	}

	pub fn set_max(&self, max: f64) {
		self.state.borrow_mut().max = max;
		self.hooks.emit_sync(PageEvent::AspectRatioMax, &PageHookArgs::AspectRatio(max));
	}

	#[must_use]
	pub fn viewport(&self) -> Viewport {
		self.nui.viewport()
	}

	/// Proxies to the page object and updates the aspect ratio.
	pub fn set_viewport(&self, width: f64, height: f64) {
		self.nui.set_viewport(Viewport { width, height });
		if height > 0.0 {
			self.set_aspect_ratio(width / height);
		}
	}

	#[must_use]
	pub fn root_node(&self) -> NodeId {
		self.state.borrow().root_node
	}

	/// Replaces the root container and notifies [`PageEvent::SetRootNode`] hooks.
	pub fn set_root_node(&self, node: NodeId) {
		self.state.borrow_mut().root_node = node;
		self.hooks.emit_sync(PageEvent::SetRootNode, &PageHookArgs::RootNode(node));
	}

	/// Raw component definitions of the current page object.
	#[must_use]
	pub fn components(&self) -> Vec<Value> {
		self.state.borrow().components.clone()
	}

	pub fn set_components(&self, components: Vec<Value>) {
		self.state.borrow_mut().components = components;
	}

	/// Components produced by the last completed render.
	#[must_use]
	pub fn rendered(&self) -> Vec<ComponentRef> {
		self.state.borrow().rendered.clone()
	}

	pub(crate) fn set_rendered(&self, rendered: Vec<ComponentRef>) {
		self.state.borrow_mut().rendered = rendered;
	}

	/// Clears what the previous render produced.
	pub(crate) fn reset_render_state(&self) {
		self.state.borrow_mut().rendered.clear();
	}

	/// Navigation generation. Bumped once per navigation request.
	#[must_use]
	pub fn generation(&self) -> u64 {
		self.generation.get()
	}

	pub(crate) fn next_generation(&self) -> u64 {
		let generation = self.generation.get() + 1;
		self.generation.set(generation);
		generation
	}

	#[must_use]
	pub fn embedded(&self) -> Option<EmbeddedDocumentBinding> {
		self.state.borrow().embedded.clone()
	}

	#[must_use]
	pub fn is_embedded(&self) -> bool {
		self.state.borrow().embedded.is_some()
	}

	pub(crate) fn set_embedded(&self, binding: Option<EmbeddedDocumentBinding>) {
		self.state.borrow_mut().embedded = binding;
	}

	pub(crate) fn mark_embedded_loaded(&self) {
		if let Some(binding) = self.state.borrow_mut().embedded.as_mut() {
			binding.loaded = true;
		}
	}

	#[must_use]
	pub fn is_removed(&self) -> bool {
		self.state.borrow().removed
	}

	#[must_use]
	pub fn snapshot(&self) -> PageSnapshot {
		let page = self.page();
		let state = self.state.borrow();
		PageSnapshot {
			id: self.id.clone(),
			modifiers: state.modifiers.get(&page).cloned(),
			page,
			previous: state.previous.clone(),
			requesting: state.requesting.clone(),
			status: state.status,
			generation: self.generation.get(),
		}
	}

	#[must_use]
	pub fn hooks(&self) -> &Hooks<PageEvent, PageHookArgs> {
		&self.hooks
	}

	pub fn on(&self, event: PageEvent, id: impl Into<String>, handler: impl Fn(&PageHookArgs) + 'static) -> bool {
		self.hooks.on(event, id, HookFn::Sync(Rc::new(handler)))
	}

	pub fn once(&self, event: PageEvent, id: impl Into<String>, handler: impl Fn(&PageHookArgs) + 'static) -> bool {
		self.hooks.once(event, id, HookFn::Sync(Rc::new(handler)))
	}

	/// Registers a hook by its external name, for example `ON_STATUS_CHANGE`.
	///
	/// # Errors
	///
	/// Iff `name` is not a page event.
	pub fn on_named(&self, name: &str, id: impl Into<String>, handler: impl Fn(&PageHookArgs) + 'static) -> Result<bool, NdomError> {
		Ok(self.on(name.parse()?, id, handler))
	}

	pub fn off(&self, event: PageEvent, id: &str) -> bool {
		self.hooks.off(event, id)
	}

	pub fn emit_sync(&self, event: PageEvent, args: &PageHookArgs) -> usize {
		self.hooks.emit_sync(event, args)
	}

	/// Releases everything the page holds. Called by the renderer once the page's DOM and timers are gone.
	pub(crate) fn release(&self) {
		{
			let mut state = self.state.borrow_mut();
			state.components.clear();
			state.rendered.clear();
			state.modifiers.clear();
			state.requesting.clear();
			state.removed = true;
		}
		self.hooks.clear();
		debug!(page = %self.id, "Released page.");
	}
}
