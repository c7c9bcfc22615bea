#![allow(dead_code)]

use futures::{channel::oneshot, future::LocalBoxFuture, FutureExt};
use noodl_dom::{
	dom::{MemoryDocument, SharedDocument},
	error::ModelError,
	model::{basic::BasicModel, ActionHandler, ActionKind, ComponentModel, ComponentRef, NuiPage},
	platform::ManualPlatform,
	transaction::{PageObject, PageObjectResponse},
	Config, Ndom, Use,
};
use serde_json::Value;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

pub fn init_log() {
	let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).with_test_writer().try_init();
}

pub struct Harness {
	pub document: Rc<RefCell<MemoryDocument>>,
	pub platform: Rc<ManualPlatform>,
	pub model: BasicModel,
	pub ndom: Ndom,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_config(Config::default())
	}

	pub fn with_config(config: Config) -> Self {
		let model = BasicModel::new();
		Self::assemble(config, model.clone(), Rc::new(model))
	}

	/// Holds back resolving any component list containing a label with `text` until the returned sender fires.
	pub fn gated(text: &str) -> (Self, oneshot::Sender<()>) {
		let (sender, receiver) = oneshot::channel();
		let model = BasicModel::new();
		let gated = GatedModel { inner: model.clone(), text: text.to_owned(), gate: RefCell::new(Some(receiver)) };
		(Self::assemble(Config::default(), model, Rc::new(gated)), sender)
	}

	fn assemble(config: Config, model: BasicModel, installed: Rc<dyn ComponentModel>) -> Self {
		init_log();
		let document = Rc::new(RefCell::new(MemoryDocument::new()));
		let shared: SharedDocument = document.clone();
		let platform = Rc::new(ManualPlatform::new());
		let ndom = Ndom::new(shared, platform.clone(), installed, config);
		Self { document, platform, model, ndom }
	}

	/// Serves `pages` (name → component list) through `REQUEST_PAGE_OBJECT`.
	pub fn serve(&self, pages: &[(&str, Value)]) -> Rc<RefCell<Vec<String>>> {
		let pages: HashMap<String, Value> = pages.iter().map(|(name, components)| ((*name).to_owned(), components.clone())).collect();
		let requested = Rc::new(RefCell::new(Vec::new()));
		let log = requested.clone();
		self.ndom.use_(Use::new().request_page_object(move |page| {
			let name = page.requesting();
			log.borrow_mut().push(name.clone());
			let components = pages.get(&name).and_then(Value::as_array).cloned().unwrap_or_default();
			futures::future::ready(Ok(PageObjectResponse::Loaded(PageObject { components, ..PageObject::default() }))).boxed_local()
		}));
		requested
	}

	pub fn html(&self, node: noodl_dom::dom::NodeId) -> String {
		self.document.borrow().outer_html(node)
	}

	pub fn shared(&self) -> SharedDocument {
		self.document.clone()
	}
}

struct GatedModel {
	inner: BasicModel,
	text: String,
	gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl ComponentModel for GatedModel {
	fn create_page(&self, name: &str, id: Option<&str>) -> Rc<dyn NuiPage> {
		self.inner.create_page(name, id)
	}

	fn remove_page(&self, id: &str) {
		self.inner.remove_page(id);
	}

	fn resolve_components(&self, components: &[Value], page: &Rc<dyn NuiPage>) -> LocalBoxFuture<'static, Result<Vec<ComponentRef>, ModelError>> {
		let gated = components.iter().any(|component| component.get("text").and_then(Value::as_str) == Some(self.text.as_str()));
		let gate = if gated { self.gate.borrow_mut().take() } else { None };
		let resolve = self.inner.resolve_components(components, page);
		async move {
			if let Some(gate) = gate {
				let _ = gate.await;
			}
			resolve.await
		}
		.boxed_local()
	}

	fn use_action(&self, kind: ActionKind, handler: ActionHandler) {
		self.inner.use_action(kind, handler);
	}
}
