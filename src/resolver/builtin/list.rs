use crate::{
	dom::NodeId,
	model::{ComponentEvent, ComponentEventKind, ComponentRef},
	page::PageRef,
	resolver::Resolver,
	Ndom,
};
use serde_json::Value;
use std::rc::Rc;
use tracing::{trace, warn};

fn draw_item(ndom: &Ndom, child: &ComponentRef, list_node: NodeId, index: usize, page: &PageRef) {
	let reference = ndom.document().borrow().children(list_node).get(index).copied();
	if let Err(error) = ndom.draw(child, Some(list_node), page, reference) {
		warn!("Failed to draw list item {}: {}", index, error);
	}
}

/// Lists draw their items from model events instead of recursing into children.
///
/// Placeholders are dropped, then each `listObject` entry is replayed through [`Component::add_data_object`](`crate::model::Component::add_data_object`).
/// Items the model already holds (for example after a redraw) are drawn as they are.
pub(super) fn list() -> Resolver {
	Resolver::new("list").for_type("list").resolve(|args| {
		let component = args.component;
		component.clear_placeholders();
		let key = format!("list:{}", component.id());
		let list_node = args.node;

		{
			let ndom = args.ndom.downgrade();
			let page = Rc::downgrade(args.page);
			component.on(
				ComponentEventKind::ChildCreated,
				&key,
				Rc::new(move |event| {
					let ComponentEvent::ChildCreated { child, index } = event else { return };
					if let (Some(ndom), Some(page)) = (ndom.upgrade(), page.upgrade()) {
						draw_item(&ndom, child, list_node, *index, &page);
					}
				}),
			);
		}
		{
			let ndom = args.ndom.downgrade();
			component.on(
				ComponentEventKind::ChildUpdated,
				&key,
				Rc::new(move |event| {
					let ComponentEvent::ChildUpdated { child, index } = event else { return };
					let Some(ndom) = ndom.upgrade() else { return };
					let node = ndom.cache().get(&child.id()).map(|entry| entry.node);
					trace!(index, ?node, "List item updated.");
					if let Err(error) = ndom.redraw(node, child) {
						warn!("Failed to redraw list item {}: {}", index, error);
					}
				}),
			);
		}
		{
			let ndom = args.ndom.downgrade();
			component.on(
				ComponentEventKind::ChildRemoved,
				&key,
				Rc::new(move |event| {
					let ComponentEvent::ChildRemoved { child, .. } = event else { return };
					let Some(ndom) = ndom.upgrade() else { return };
					let node = ndom.cache().get(&child.id()).map(|entry| entry.node);
					ndom.evict(&child.id(), node);
				}),
			);
		}

		let existing = component.children();
		if existing.is_empty() {
			if let Some(Value::Array(items)) = component.get("listObject") {
				trace!(count = items.len(), "Replaying list data.");
				for item in items {
					component.add_data_object(item);
				}
			}
		} else {
			for (index, child) in existing.iter().enumerate() {
				draw_item(args.ndom, child, list_node, index, args.page);
			}
		}
		Ok(())
	})
}
