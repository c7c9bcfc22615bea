use super::set_attribute;
use crate::{
	dom::DomEvent,
	page::PageStatus,
	resolver::Resolver,
};
use std::rc::Rc;
use tracing::{debug, warn};

/// `page` components: an `<iframe>` hosting a nested page.
///
/// Remote paths are left to the browser. Local pages are requested and drawn into the embedded body once the frame loads.
pub(super) fn page() -> Resolver {
	Resolver::new("page").for_type("page").resolve(|args| {
		let path = args.component.get_str("path").or_else(|| args.component.get_str("data-src")).unwrap_or_default();
		let remote = args.ndom.config().is_remote_path(&path);
		let component_page = args.ndom.create_component_page(args.component, args.node, args.page, &path, remote);
		if remote {
			return set_attribute(args, "src", &path);
		}

		let frame = args.node;
		{
			let ndom = args.ndom.downgrade();
			let page = Rc::downgrade(&component_page);
			let path = path.clone();
			args.ndom.document().borrow_mut().add_event_listener(
				frame,
				"load",
				Rc::new(move |_: &DomEvent| {
					let (Some(ndom), Some(page)) = (ndom.upgrade(), page.upgrade()) else { return };
					if page.is_removed() {
						return;
					}
					page.mark_embedded_loaded();
					let body = ndom.document().borrow().embedded_body(frame);
					if let Some(body) = body {
						page.set_root_node(body);
					}
					debug!(page = %page.id(), %path, "Embedded document loaded.");
					let path = path.clone();
					let task_ndom = ndom.clone();
					ndom.platform().spawn_local(Box::pin(async move {
						if let Err(error) = task_ndom.request_page_change(&page, &path, None).await {
							warn!("Embedded page {} failed: {}", path, error);
						}
					}));
				}),
			)?;
		}
		{
			let page = Rc::downgrade(&component_page);
			args.ndom.document().borrow_mut().add_event_listener(
				frame,
				"error",
				Rc::new(move |_: &DomEvent| {
					if let Some(page) = page.upgrade() {
						warn!(page = %page.id(), "Embedded document failed to load.");
						page.set_status(PageStatus::NavigateError);
					}
				}),
			)?;
		}
		Ok(())
	})
}
