//! CSS and JS resources, injected at most once per URL.

use crate::{
	dom::{self, DomEvent, NodeId},
	error::NdomError,
	global::{GlobalResourceRecord, ResourceCallback, ResourceKind},
	render::{NdomEvent, NdomHookArgs},
	Ndom,
};
use std::rc::Rc;
use tracing::{debug, instrument, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
	Css { href: String },
	Js { src: String },
}

impl ResourceSource {
	#[must_use]
	pub fn kind(&self) -> ResourceKind {
		match self {
			Self::Css { .. } => ResourceKind::Css,
			Self::Js { .. } => ResourceKind::Js,
		}
	}

	#[must_use]
	pub fn url(&self) -> &str {
		match self {
			Self::Css { href } => href,
			Self::Js { src } => src,
		}
	}
}

/// A resource as installed through [`Use::resource`](`crate::Use::resource`).
#[must_use]
pub struct ResourceOptions {
	pub source: ResourceSource,
	/// Evaluated whenever the resource would be injected.
	pub cond: Option<Rc<dyn Fn() -> bool>>,
	/// Inject with every render.
	pub load_to_dom: bool,
	pub on_load: Option<ResourceCallback>,
	pub on_error: Option<ResourceCallback>,
	pub on_create_record: Option<ResourceCallback>,
}

impl ResourceOptions {
	fn new(source: ResourceSource) -> Self {
		Self {
			source,
			cond: None,
			load_to_dom: false,
			on_load: None,
			on_error: None,
			on_create_record: None,
		}
	}

	pub fn css(href: impl Into<String>) -> Self {
		Self::new(ResourceSource::Css { href: href.into() })
	}

	pub fn js(src: impl Into<String>) -> Self {
		Self::new(ResourceSource::Js { src: src.into() })
	}

	pub fn cond(mut self, cond: impl Fn() -> bool + 'static) -> Self {
		self.cond = Some(Rc::new(cond));
		self
	}

	pub fn load_to_dom(mut self, load_to_dom: bool) -> Self {
		self.load_to_dom = load_to_dom;
		self
	}

	pub fn on_load(mut self, callback: impl Fn(&GlobalResourceRecord) + 'static) -> Self {
		self.on_load = Some(Rc::new(callback));
		self
	}

	pub fn on_error(mut self, callback: impl Fn(&GlobalResourceRecord) + 'static) -> Self {
		self.on_error = Some(Rc::new(callback));
		self
	}

	pub fn on_create_record(mut self, callback: impl Fn(&GlobalResourceRecord) + 'static) -> Self {
		self.on_create_record = Some(Rc::new(callback));
		self
	}
}

impl Ndom {
	/// Records a resource. A second resource with the same URL is ignored.
	///
	/// Returns whether a record was created.
	pub fn use_resource(&self, options: ResourceOptions) -> bool {
		let record = GlobalResourceRecord {
			kind: options.source.kind(),
			url: options.source.url().to_owned(),
			load_to_dom: options.load_to_dom,
			cond: options.cond,
			on_load: options.on_load,
			on_error: options.on_error,
			node: None,
			loaded: false,
			failed: false,
		};
		let created = self.global_mut().add_resource(record.clone());
		if created {
			debug!(url = %record.url, kind = ?record.kind, "Resource recorded.");
			if let Some(on_create_record) = options.on_create_record {
				on_create_record(&record);
			}
		} else {
			trace!(url = %record.url, "Resource already recorded.");
		}
		created
	}

	/// Injects the recorded resource `url` into the document, unless a node for it is already present.
	///
	/// Stylesheets go into the head, scripts to the end of the body. Returns the resource's node, or [`None`] if there
	/// is no such record or its condition is not met.
	///
	/// # Errors
	///
	/// Iff the node cannot be created or inserted.
	#[instrument(skip(self))]
	pub fn render_resource(&self, kind: ResourceKind, url: &str) -> Result<Option<NodeId>, NdomError> {
		let Some(record) = self.global().resource(kind, url).cloned() else { return Ok(None) };
		if let Some(cond) = &record.cond {
			if !cond() {
				trace!("Condition not met.");
				return Ok(None);
			}
		}

		let (section, tag, attribute) = {
			let document = self.document().borrow();
			match kind {
				ResourceKind::Css => (document.head(), "link", "href"),
				ResourceKind::Js => (document.body(), "script", "src"),
			}
		};
		let existing = {
			let document = self.document().borrow();
			let tag_name = tag.to_ascii_uppercase();
			dom::descendants(&*document, section, false)
				.into_iter()
				.find(|&node| document.tag_name(node).as_deref() == Some(tag_name.as_str()) && document.attribute(node, attribute).as_deref() == Some(url))
		};
		if let Some(existing) = existing {
			trace!(?existing, "Already in the document.");
			if let Some(record) = self.global_mut().resource_mut(kind, url) {
				record.node = Some(existing);
			}
			return Ok(Some(existing));
		}

		let node = {
			let mut document = self.document().borrow_mut();
			let node = document.create_element(tag);
			if kind == ResourceKind::Css {
				document.set_attribute(node, "rel", "stylesheet")?;
			}
			document.set_attribute(node, attribute, url)?;
			node
		};
		self.listen_to_resource(node, kind, url)?;
		if let Some(record) = self.global_mut().resource_mut(kind, url) {
			record.node = Some(node);
		}
		dom::append_child(self.document(), section, node)?;
		debug!(?node, "Resource injected.");
		Ok(Some(node))
	}

	fn listen_to_resource(&self, node: NodeId, kind: ResourceKind, url: &str) -> Result<(), NdomError> {
		let loaded = {
			let ndom = self.downgrade();
			let url = url.to_owned();
			Rc::new(move |_: &DomEvent| {
				let Some(ndom) = ndom.upgrade() else { return };
				let record = {
					let mut global = ndom.global_mut();
					let Some(record) = global.resource_mut(kind, &url) else { return };
					if record.loaded {
						return;
					}
					record.loaded = true;
					record.clone()
				};
				if let Some(on_load) = &record.on_load {
					on_load(&record);
				}
				ndom.hooks().emit_sync(NdomEvent::ResourceLoaded, &NdomHookArgs::Resource { kind, url: url.clone() });
			})
		};
		let failed = {
			let ndom = self.downgrade();
			let url = url.to_owned();
			Rc::new(move |_: &DomEvent| {
				let Some(ndom) = ndom.upgrade() else { return };
				warn!("Resource {} failed to load.", url);
				let record = {
					let mut global = ndom.global_mut();
					let Some(record) = global.resource_mut(kind, &url) else { return };
					record.failed = true;
					record.clone()
				};
				if let Some(on_error) = &record.on_error {
					on_error(&record);
				}
			})
		};
		let mut document = self.document().borrow_mut();
		document.add_event_listener(node, "load", loaded)?;
		document.add_event_listener(node, "error", failed)?;
		Ok(())
	}

	/// Injects every resource recorded with `load_to_dom`. Failures are logged.
	pub fn render_resources(&self) -> Vec<NodeId> {
		let mut pending: Vec<(ResourceKind, String)> = {
			let global = self.global();
			[ResourceKind::Css, ResourceKind::Js]
				.into_iter()
				.flat_map(|kind| global.resource_records(kind).filter(|record| record.load_to_dom).map(|record| (record.kind, record.url.clone())).collect::<Vec<_>>())
				.collect()
		};
		pending.sort_by(|a, b| a.1.cmp(&b.1));
		pending
			.into_iter()
			.filter_map(|(kind, url)| match self.render_resource(kind, &url) {
				Ok(node) => node,
				Err(error) => {
					warn!("Failed to inject {}: {}", url, error);
					None
				}
			})
			.collect()
	}
}
