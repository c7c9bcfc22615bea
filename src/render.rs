//! The [`Ndom`] orchestrator: page lifecycle, `render`, `draw` and `redraw`.

use crate::{
	cache::ComponentCache,
	config::Config,
	dom::{self, NodeId, SharedDocument},
	error::{DomError, ModelError, NdomError, RequestError, RequestErrorCode},
	global::{global_id_of, GlobalComponentRecord, GlobalStore, ResourceKind},
	hooks::{HookFn, Hooks},
	model::{is_global, ActionContext, ActionHandler, ActionKind, ComponentModel, ComponentRef},
	page::{EmbeddedDocumentBinding, Modifiers, Page, PageEvent, PageHookArgs, PageRef, PageStatus},
	platform::Platform,
	resolver::{builtin, run_resolvers, ResolveArgs, Resolver, ResolverPipeline},
	resource::ResourceOptions,
	transaction::{LoadPlugin, PageObjectResponse, PluginLocation, PluginRequest, RequestPageObject, Transaction, Transactions},
};
use core::{
	cell::{Ref, RefCell, RefMut},
	fmt::{self, Debug, Formatter},
	str::FromStr,
};
use futures::future::LocalBoxFuture;
use hashbrown::HashMap;
use serde_json::Value;
use std::rc::{Rc, Weak};
use tracing::{debug, instrument, trace, warn};

/// Tag of the element drawn for a component type.
#[must_use]
pub fn tag_for(component_type: &str) -> &'static str {
	match component_type {
		"br" => "br",
		"button" => "button",
		"canvas" => "canvas",
		"date" | "dateSelect" | "textField" => "input",
		"divider" => "hr",
		"header" => "header",
		"image" => "img",
		"list" => "ul",
		"listItem" => "li",
		"page" => "iframe",
		"plugin" | "pluginHead" | "pluginBodyTop" | "pluginBodyTail" => "script",
		"select" => "select",
		"span" => "span",
		"textView" => "textarea",
		"video" => "video",
		_ => "div",
	}
}

/// Events of the orchestrator's own hook bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NdomEvent {
	PageCreated,
	PageRemoved,
	/// Before a page's root is wiped for a render. Subscribers detach nodes they own.
	DomCleanup,
	ResourceLoaded,
}

impl FromStr for NdomEvent {
	type Err = NdomError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		Ok(match name {
			"PAGE_CREATED" => Self::PageCreated,
			"PAGE_REMOVED" => Self::PageRemoved,
			"DOM_CLEANUP" => Self::DomCleanup,
			"RESOURCE_LOADED" => Self::ResourceLoaded,
			_ => return Err(NdomError::UnknownName { kind: "ndom event", name: name.to_owned() }),
		})
	}
}

#[derive(Clone)]
pub enum NdomHookArgs {
	Page(PageRef),
	PageRemoved { id: String, name: String },
	DomCleanup { page: PageRef, root: NodeId },
	Resource { kind: ResourceKind, url: String },
}

pub type Register = Rc<dyn Fn(&[Value]) -> Option<Value>>;

enum UseItem {
	Resolver(Resolver),
	Action(ActionKind, ActionHandler),
	Register(String, Register),
	Transaction(Transaction),
	Resource(ResourceOptions),
}

/// What a host installs through [`Ndom::use_`].
#[derive(Default)]
#[must_use]
pub struct Use {
	items: Vec<UseItem>,
}

impl Use {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn resolver(mut self, resolver: Resolver) -> Self {
		self.items.push(UseItem::Resolver(resolver));
		self
	}

	/// Handles actions of `action_type` (for example `goto`).
	pub fn action(mut self, action_type: impl Into<String>, handler: impl Fn(ActionContext) -> LocalBoxFuture<'static, Result<(), ModelError>> + 'static) -> Self {
		self.items.push(UseItem::Action(ActionKind::Action(action_type.into()), Rc::new(handler)));
		self
	}

	/// Handles `emit` actions for `trigger` (for example `onClick`).
	pub fn emit(mut self, trigger: impl Into<String>, handler: impl Fn(ActionContext) -> LocalBoxFuture<'static, Result<(), ModelError>> + 'static) -> Self {
		self.items.push(UseItem::Action(ActionKind::Emit(trigger.into()), Rc::new(handler)));
		self
	}

	pub fn register(mut self, name: impl Into<String>, register: impl Fn(&[Value]) -> Option<Value> + 'static) -> Self {
		self.items.push(UseItem::Register(name.into(), Rc::new(register)));
		self
	}

	pub fn transaction(mut self, transaction: Transaction) -> Self {
		self.items.push(UseItem::Transaction(transaction));
		self
	}

	pub fn request_page_object(self, handler: impl Fn(PageRef) -> LocalBoxFuture<'static, Result<PageObjectResponse, RequestError>> + 'static) -> Self {
		let handler: RequestPageObject = Rc::new(handler);
		self.transaction(Transaction::RequestPageObject(handler))
	}

	pub fn load_plugin(self, handler: impl Fn(PluginRequest) -> LocalBoxFuture<'static, Result<Option<String>, RequestError>> + 'static) -> Self {
		let handler: LoadPlugin = Rc::new(handler);
		self.transaction(Transaction::LoadPlugin(handler))
	}

	pub fn resource(mut self, options: ResourceOptions) -> Self {
		self.items.push(UseItem::Resource(options));
		self
	}
}

pub(crate) struct NdomInner {
	config: Config,
	document: SharedDocument,
	platform: Rc<dyn Platform>,
	model: Rc<dyn ComponentModel>,
	global: RefCell<GlobalStore>,
	cache: RefCell<ComponentCache>,
	resolvers: RefCell<ResolverPipeline>,
	transactions: RefCell<Transactions>,
	registers: RefCell<HashMap<String, Register>>,
	hooks: Hooks<NdomEvent, NdomHookArgs>,
}

/// Renders pages of NOODL components into a [`Document`](`crate::dom::Document`).
///
/// Cloning is cheap and yields a handle to the same renderer.
#[derive(Clone)]
pub struct Ndom {
	inner: Rc<NdomInner>,
}

/// Non-owning [`Ndom`] handle, for closures stored in the document or the component model.
#[derive(Clone)]
pub struct WeakNdom(Weak<NdomInner>);

impl WeakNdom {
	#[must_use]
	pub fn upgrade(&self) -> Option<Ndom> {
		self.0.upgrade().map(|inner| Ndom { inner })
	}
}

impl Debug for Ndom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let global = self.global();
		f.debug_struct("Ndom")
			.field("pages", &global.page_ids())
			.field("cached", &self.cache().len())
			.field("resolvers", &self.inner.resolvers.borrow().names())
			.finish_non_exhaustive()
	}
}

impl Ndom {
	/// Creates a renderer with the built-in resolvers installed.
	pub fn new(document: SharedDocument, platform: Rc<dyn Platform>, model: Rc<dyn ComponentModel>, config: Config) -> Self {
		let mut resolvers = ResolverPipeline::new();
		for resolver in builtin::defaults() {
			resolvers.register(resolver);
		}
		Self {
			inner: Rc::new(NdomInner {
				config,
				document,
				platform,
				model,
				global: RefCell::default(),
				cache: RefCell::default(),
				resolvers: RefCell::new(resolvers),
				transactions: RefCell::default(),
				registers: RefCell::default(),
				hooks: Hooks::new(),
			}),
		}
	}

	#[must_use]
	pub fn downgrade(&self) -> WeakNdom {
		WeakNdom(Rc::downgrade(&self.inner))
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.inner.config
	}

	#[must_use]
	pub fn document(&self) -> &SharedDocument {
		&self.inner.document
	}

	#[must_use]
	pub fn platform(&self) -> &Rc<dyn Platform> {
		&self.inner.platform
	}

	#[must_use]
	pub fn model(&self) -> &Rc<dyn ComponentModel> {
		&self.inner.model
	}

	/// # Panics
	///
	/// Iff the store is mutably borrowed.
	#[must_use]
	pub fn global(&self) -> Ref<'_, GlobalStore> {
		self.inner.global.borrow()
	}

	/// # Panics
	///
	/// Iff the store is borrowed.
	#[must_use]
	pub fn global_mut(&self) -> RefMut<'_, GlobalStore> {
		self.inner.global.borrow_mut()
	}

	#[must_use]
	pub fn cache(&self) -> Ref<'_, ComponentCache> {
		self.inner.cache.borrow()
	}

	#[must_use]
	pub fn cache_mut(&self) -> RefMut<'_, ComponentCache> {
		self.inner.cache.borrow_mut()
	}

	#[must_use]
	pub fn resolvers(&self) -> Ref<'_, ResolverPipeline> {
		self.inner.resolvers.borrow()
	}

	#[must_use]
	pub fn transactions(&self) -> Transactions {
		self.inner.transactions.borrow().clone()
	}

	#[must_use]
	pub fn hooks(&self) -> &Hooks<NdomEvent, NdomHookArgs> {
		&self.inner.hooks
	}

	pub fn on(&self, event: NdomEvent, id: impl Into<String>, handler: impl Fn(&NdomHookArgs) + 'static) -> bool {
		self.inner.hooks.on(event, id, HookFn::Sync(Rc::new(handler)))
	}

	/// Installs resolvers, action and emit handlers, registers, transactions and resources.
	pub fn use_(&self, usage: Use) -> &Self {
		for item in usage.items {
			match item {
				UseItem::Resolver(resolver) => {
					debug!(resolver = resolver.name(), "Using resolver.");
					self.inner.resolvers.borrow_mut().register(resolver);
				}
				UseItem::Action(kind, handler) => self.inner.model.use_action(kind, handler),
				UseItem::Register(name, register) => {
					self.inner.registers.borrow_mut().insert(name, register);
				}
				UseItem::Transaction(transaction) => {
					debug!(transaction = transaction.name().as_str(), "Using transaction.");
					self.inner.transactions.borrow_mut().set(transaction);
				}
				UseItem::Resource(options) => {
					self.use_resource(options);
				}
			}
		}
		self
	}

	/// Invokes the register `name`. Returns [`None`] if there is none.
	pub fn emit_register(&self, name: &str, args: &[Value]) -> Option<Value> {
		let register = self.inner.registers.borrow().get(name).cloned();
		match register {
			Some(register) => register(args),
			None => {
				trace!("No register {:?}.", name);
				None
			}
		}
	}

	/// The first top-level page.
	#[must_use]
	pub fn page(&self) -> Option<PageRef> {
		self.global().pages().into_iter().find(|page| !page.is_embedded())
	}

	/// Creates a top-level page with its root container appended to the body.
	///
	/// Creating an unnamed page disposes of previously created unnamed top-level pages.
	#[instrument(skip(self))]
	pub fn create_page(&self, name: &str) -> PageRef {
		let nui = self.inner.model.create_page(name, None);
		let root = self.document().borrow_mut().create_element(&self.config().root_node_tag);
		let page = Rc::new(Page::new(nui, root));
		if let Err(error) = self.document().borrow_mut().set_attribute(root, "id", page.id()) {
			warn!("Failed to tag root node: {}", error);
		}
		let body = self.document().borrow().body();
		if let Err(error) = dom::append_child(self.document(), body, root) {
			warn!("Failed to attach root node: {}", error);
		}

		if name.is_empty() {
			let superseded: Vec<PageRef> = self.global().pages().into_iter().filter(|existing| !existing.is_embedded() && existing.page().is_empty()).collect();
			for existing in superseded {
				debug!(superseded = %existing.id(), "Disposing unnamed page.");
				self.remove_page(&existing);
			}
		}

		self.global_mut().add_page(page.clone());
		debug!(page = %page.id(), "Page created.");
		self.inner.hooks.emit_sync(NdomEvent::PageCreated, &NdomHookArgs::Page(page.clone()));
		page
	}

	/// The nested page of a `page` component, created on first use.
	///
	/// Its root is the frame until the embedded document loads.
	pub fn create_component_page(&self, component: &ComponentRef, frame: NodeId, parent: &PageRef, path: &str, remote: bool) -> PageRef {
		let component_id = component.id();
		let existing = self.global().pages().into_iter().find(|page| page.embedded().map_or(false, |binding| binding.component_id == component_id));
		let binding = EmbeddedDocumentBinding {
			frame,
			component_id,
			parent_page_id: parent.id().to_owned(),
			remote,
			loaded: false,
		};
		if let Some(page) = existing {
			trace!(page = %page.id(), "Reusing component page.");
			page.set_embedded(Some(binding));
			page.set_root_node(frame);
			return page;
		}

		let nui = self.inner.model.create_page(path, None);
		let page = Rc::new(Page::new(nui, frame));
		page.set_embedded(Some(binding));
		self.global_mut().add_page(page.clone());
		debug!(page = %page.id(), %path, remote, "Component page created.");
		self.inner.hooks.emit_sync(NdomEvent::PageCreated, &NdomHookArgs::Page(page.clone()));
		page
	}

	/// Disposes of `page`: nested pages, timers, cached nodes, global records, the root container and the page object.
	#[instrument(skip(self, page), fields(page = %page.id()))]
	pub fn remove_page(&self, page: &PageRef) {
		if page.is_removed() {
			return;
		}
		let id = page.id().to_owned();
		let name = page.page();
		for nested in self.nested_pages(&id) {
			self.remove_page(&nested);
		}

		let timers = self.global_mut().timers_mut().take_for_page(&name);
		for timer in timers {
			timer.clear();
		}
		self.cache_mut().remove_page(&id);
		let records = self.global_mut().remove_components_of_page(&id);
		for record in records {
			if let Some(node) = record.node {
				self.detach(node);
			}
		}

		let root = page.root_node();
		match page.embedded() {
			Some(binding) if binding.frame != root => dom::clear_children(self.document(), root),
			Some(_) => (),
			None => self.detach(root),
		}

		self.global_mut().remove_page(&id);
		self.inner.model.remove_page(&id);
		page.release();
		self.inner.hooks.emit_sync(NdomEvent::PageRemoved, &NdomHookArgs::PageRemoved { id, name });
	}

	fn nested_pages(&self, parent_id: &str) -> Vec<PageRef> {
		self.global().pages().into_iter().filter(|page| page.embedded().map_or(false, |binding| binding.parent_page_id == parent_id)).collect()
	}

	/// Removes `node` from its parent if it has one.
	fn detach(&self, node: NodeId) {
		let attached = self.document().borrow().parent(node).is_some();
		if attached {
			dom::remove_logged(self.document(), node);
		}
	}

	/// Drops the cache entry of `component_id` along with those of the nodes below `node`, then detaches `node`.
	pub(crate) fn evict(&self, component_id: &str, node: Option<NodeId>) {
		let below = node.map(|node| dom::descendants(&*self.document().borrow(), node, true)).unwrap_or_default();
		{
			let mut cache = self.cache_mut();
			cache.remove(component_id);
			if !below.is_empty() {
				cache.retain(|entry| !below.contains(&entry.node));
			}
		}
		if let Some(node) = node {
			self.detach(node);
		}
	}

	/// Head and body of the document `page` is drawn into.
	#[must_use]
	pub fn sections(&self, page: &Page) -> (NodeId, NodeId) {
		let document = self.document().borrow();
		let embedded = page.embedded().and_then(|binding| Some((document.embedded_head(binding.frame)?, document.embedded_body(binding.frame)?)));
		embedded.unwrap_or_else(|| (document.head(), document.body()))
	}

	/// Inserts a plugin node at `location` in the document of `page`.
	///
	/// # Errors
	///
	/// Iff the insertion fails.
	pub fn mount_plugin(&self, node: NodeId, location: PluginLocation, page: &Page) -> Result<(), DomError> {
		let (head, body) = self.sections(page);
		match location {
			PluginLocation::Head => dom::append_child(self.document(), head, node),
			PluginLocation::BodyTop => {
				let first = self.document().borrow().children(body).first().copied();
				dom::insert_before(self.document(), body, node, first)
			}
			PluginLocation::BodyTail => dom::append_child(self.document(), body, node),
		}
	}

	/// Empties the root container of `page` and makes sure it is attached.
	///
	/// Nested pages drawn into the root are removed with it. Global widgets live outside the root and are kept.
	#[instrument(skip(self, page), fields(page = %page.id()))]
	pub fn clear_root_node(&self, page: &PageRef) {
		let root = page.root_node();
		page.emit_sync(PageEvent::BeforeClearRootNode, &PageHookArgs::RootNode(root));
		for nested in self.nested_pages(page.id()) {
			self.remove_page(&nested);
		}
		dom::clear_children(self.document(), root);
		let page_id = page.id().to_owned();
		self.cache_mut().retain(|entry| entry.page_id.as_deref() != Some(page_id.as_str()) || is_global(&*entry.component));

		if !page.is_embedded() {
			let (connected, body) = {
				let document = self.document().borrow();
				(document.is_connected(root), document.body())
			};
			if !connected {
				if let Err(error) = dom::append_child(self.document(), body, root) {
					warn!("Failed to reattach root node: {}", error);
				}
			}
		}
	}

	/// Resolves the components of `page` and draws them into its root.
	///
	/// Failures to draw single components are logged; the rest of the page is still drawn.
	/// If `page` is removed while its components resolve, nothing is drawn and the result is empty.
	///
	/// # Errors
	///
	/// Iff the component model fails to resolve the page. The page is left in [`PageStatus::NavigateError`].
	#[instrument(skip(self, page), fields(page = %page.id(), name = %page.page()))]
	pub async fn render(&self, page: &PageRef) -> Result<Vec<ComponentRef>, NdomError> {
		let generation = page.generation();
		Ok(self.render_generation(page, generation).await?.unwrap_or_default())
	}

	/// [`Ndom::render`] for the navigation `generation`. Yields [`None`] without touching the document
	/// if `page` was removed or navigated again while its components resolved.
	async fn render_generation(&self, page: &PageRef, generation: u64) -> Result<Option<Vec<ComponentRef>>, NdomError> {
		page.reset_render_state();
		page.set_status(PageStatus::ResolvingComponents);
		let raw = page.components();
		let resolved = self.inner.model.resolve_components(&raw, page.nui()).await;
		if page.is_removed() || page.generation() != generation {
			debug!(generation, current = page.generation(), "Discarding components resolved for a stale navigation.");
			return Ok(None);
		}
		let components = match resolved {
			Ok(components) => components,
			Err(error) => {
				warn!("Failed to resolve components: {}", error);
				page.set_status(PageStatus::NavigateError);
				return Err(error.into());
			}
		};
		page.set_status(PageStatus::ComponentsReceived);

		self.inner.hooks.emit_sync(NdomEvent::DomCleanup, &NdomHookArgs::DomCleanup { page: page.clone(), root: page.root_node() });
		if !page.is_embedded() {
			self.clear_root_node(page);
		}
		self.render_resources();

		page.set_status(PageStatus::RenderingComponents);
		let render_args = PageHookArgs::Render { snapshot: page.snapshot(), components: components.clone() };
		page.emit_sync(PageEvent::BeforeRenderComponents, &render_args);
		let root = page.root_node();
		for component in &components {
			if let Err(error) = self.draw(component, Some(root), page, None) {
				warn!(component = %component.id(), "Failed to draw: {}", error);
			}
		}
		page.set_rendered(components.clone());
		page.emit_sync(PageEvent::ComponentsRendered, &PageHookArgs::Render { snapshot: page.snapshot(), components: components.clone() });
		page.set_status(PageStatus::ComponentsRendered);
		debug!(count = components.len(), "Rendered.");
		Ok(Some(components))
	}

	/// Draws `component` (and, unless it materializes them itself, its children) under `parent`.
	///
	/// `parent` defaults to the root of `page`. Global components are mounted on the body of the page's document instead,
	/// and plugins mount themselves. Any node previously drawn for the same component id or global id is removed first.
	///
	/// # Errors
	///
	/// Iff the node cannot be inserted.
	#[instrument(skip(self, component, page, insert_before), fields(component = %component.id(), component_type = %component.component_type()))]
	pub fn draw(&self, component: &ComponentRef, parent: Option<NodeId>, page: &PageRef, insert_before: Option<NodeId>) -> Result<NodeId, NdomError> {
		let id = component.id();
		let component_type = component.component_type();
		let global_id = is_global(&**component).then(|| component.get_str("data-globalid").unwrap_or_else(|| global_id_of(&**component)));

		if let Some(global_id) = &global_id {
			let previous = self.global().component(global_id).cloned();
			if let Some(previous) = previous {
				trace!(%global_id, previous = %previous.component_id, "Evicting global widget.");
				self.evict(&previous.component_id, previous.node);
			}
		}
		let cached = self.cache().get(&id).map(|entry| entry.node);
		if let Some(cached) = cached {
			self.evict(&id, Some(cached));
		}

		let node = self.document().borrow_mut().create_element(tag_for(&component_type));
		self.cache_mut().insert(component.clone(), node, Some(page.id().to_owned()));
		if let Some(global_id) = &global_id {
			component.set("data-globalid", Value::String(global_id.clone()));
			let mut record = GlobalComponentRecord::new(&**component, Some(global_id.clone()), Some((node, Some(id.clone()))));
			record.page_id = Some(page.id().to_owned());
			record.page_name = Some(page.page());
			self.global_mut().set_component(record);
		}

		#[cfg(feature = "dangerous-logging")]
		trace!(props = ?component.get("data-value"), "Drawing.");

		let resolvers = self.inner.resolvers.borrow().snapshot();
		let report = run_resolvers(&resolvers, &ResolveArgs { node, component, page, ndom: self });
		trace!(ran = report.ran.len(), failed = report.errors.len(), "Resolved.");

		if !builtin::is_plugin(&component_type) {
			let (parent, reference) = if global_id.is_some() { (self.sections(page).1, None) } else { (parent.unwrap_or_else(|| page.root_node()), insert_before) };
			dom::insert_before(self.document(), parent, node, reference)?;
			if !matches!(component_type.as_str(), "list" | "page") {
				for child in component.children() {
					if let Err(error) = self.draw(&child, Some(node), page, None) {
						warn!(child = %child.id(), "Failed to draw child: {}", error);
					}
				}
			}
		}
		Ok(node)
	}

	/// Replaces the node drawn for `component` with a fresh one at the same position.
	///
	/// `node` defaults to the cached node of the component. The old node and its cache entries are gone before the new
	/// node is drawn.
	///
	/// # Errors
	///
	/// [`RequestErrorCode::PageMissing`] if the component's page is not registered, or any error of [`Ndom::draw`].
	#[instrument(skip(self, component), fields(component = %component.id()))]
	pub fn redraw(&self, node: Option<NodeId>, component: &ComponentRef) -> Result<NodeId, NdomError> {
		let id = component.id();
		let page = component
			.page_id()
			.and_then(|page_id| self.global().page(&page_id))
			.ok_or_else(|| RequestError::new(RequestErrorCode::PageMissing, format!("component {} has no live page", id)))?;
		let node = node.or_else(|| self.cache().get(&id).map(|entry| entry.node));
		let (parent, reference) = match node {
			Some(node) => {
				let document = self.document().borrow();
				let parent = document.parent(node);
				let reference = parent.and_then(|parent| {
					let siblings = document.children(parent);
					let index = siblings.iter().position(|&sibling| sibling == node)?;
					siblings.get(index + 1).copied()
				});
				(parent, reference)
			}
			None => (None, None),
		};

		page.emit_sync(PageEvent::RedrawBeforeCleanup, &PageHookArgs::Redraw { node, component: component.clone() });
		self.evict(&id, node);
		self.draw(component, parent, &page, reference)
	}

	/// Navigates `page` to `name`: requests the page object, then renders it.
	///
	/// Returns `Ok(None)` if `name` is already being requested, or if a newer navigation superseded this one while the
	/// page object was requested.
	///
	/// # Errors
	///
	/// - [`RequestErrorCode::TransactionMissing`] if no `REQUEST_PAGE_OBJECT` transaction is installed,
	/// - errors of the transaction (the page is left in [`PageStatus::NavigateError`]),
	/// - [`RequestErrorCode::Aborted`] if the host aborted the request (the page returns to [`PageStatus::Idle`]),
	/// - errors of [`Ndom::render`].
	#[instrument(skip(self, page, modifiers), fields(page = %page.id()))]
	pub async fn request_page_change(&self, page: &PageRef, name: &str, modifiers: Option<Modifiers>) -> Result<Option<Vec<ComponentRef>>, NdomError> {
		if !name.is_empty() && page.requesting() == name {
			debug!("Already requesting {:?}.", name);
			return Ok(None);
		}
		let request = match self.transactions().request_page_object() {
			Ok(request) => request,
			Err(error) => {
				warn!("{}", error);
				page.set_status(PageStatus::NavigateError);
				return Err(error.into());
			}
		};

		let generation = page.next_generation();
		page.set_requesting(name);
		if let Some(modifiers) = modifiers {
			page.set_modifiers(name, modifiers);
		}
		let response = request(page.clone()).await;
		if page.is_removed() || page.generation() != generation {
			debug!(generation, current = page.generation(), "Discarding stale navigation to {:?}.", name);
			return Ok(None);
		}

		match response {
			Err(error) => {
				warn!("Page object request failed: {}", error);
				page.set_status(PageStatus::NavigateError);
				Err(error.into())
			}
			Ok(PageObjectResponse::Aborted) => {
				debug!("Navigation to {:?} aborted.", name);
				page.set_status(PageStatus::Idle);
				Err(RequestError::new(RequestErrorCode::Aborted, format!("navigation to {:?} was aborted", name)).into())
			}
			Ok(PageObjectResponse::Loaded(object)) => {
				let current = page.page();
				if current != name {
					page.set_previous(&current);
					let timers = self.global_mut().timers_mut().take_for_page(&current);
					for timer in timers {
						timer.clear();
					}
				}
				page.set_page(name);
				page.set_components(object.components);
				let components = self.render_generation(page, generation).await?;
				if components.is_some() && page.generation() == generation {
					page.set_requesting("");
				}
				Ok(components)
			}
		}
	}
}
