mod common;

use common::Harness;
use core::time::Duration;
use futures::FutureExt;
use noodl_dom::{
	dom::{self, Document, DomEvent},
	page::PageStatus,
	transaction::PluginLocation,
	QueryScope, Use,
};
use serde_json::json;
use std::{cell::RefCell, rc::Rc};

#[test]
fn page_components_render_into_their_frame() {
	let harness = Harness::new();
	harness.serve(&[
		("Home", json!([{ "type": "label", "id": "outer", "text": "Outer" }, { "type": "page", "id": "frame", "path": "Inner" }])),
		("Inner", json!([{ "type": "label", "id": "inner", "viewTag": "innerLabel", "text": "Nested" }])),
	]);
	let page = harness.ndom.create_page("");
	harness.platform.block_on(harness.ndom.request_page_change(&page, "Home", None)).unwrap();
	harness.platform.run_until_stalled();

	let nested = harness.ndom.global().pages().into_iter().find(|candidate| candidate.is_embedded()).unwrap();
	let binding = nested.embedded().unwrap();
	assert_eq!(binding.component_id, "frame");
	assert_eq!(binding.parent_page_id, page.id());
	assert!(binding.loaded);
	assert_eq!(nested.page(), "Inner");
	assert_eq!(nested.status(), PageStatus::ComponentsRendered);

	let document = harness.document.borrow();
	let frame = harness.ndom.cache().get("frame").unwrap().node;
	assert_eq!(document.tag_name(frame).as_deref(), Some("IFRAME"));
	assert_eq!(Some(nested.root_node()), document.embedded_body(frame));
	assert_eq!(document.text_content(nested.root_node()), "Nested");
	drop(document);

	let inner = harness.ndom.find_by_view_tag("innerLabel", QueryScope::Page(&nested)).unwrap();
	assert_eq!(harness.ndom.find_by_view_tag("innerLabel", QueryScope::Document), Some(inner));
	assert_eq!(harness.ndom.find_by_element_id("inner", QueryScope::Page(&page)), Some(inner));
	assert_eq!(harness.ndom.find_by_element_id("outer", QueryScope::Page(&nested)), None);

	harness.ndom.remove_page(&page);
	assert!(nested.is_removed());
	assert!(harness.ndom.global().page_ids().is_empty());
	assert_eq!(harness.model.page_count(), 0);
}

#[test]
fn remote_page_components_only_get_a_source() {
	let harness = Harness::new();
	harness.serve(&[("Home", json!([{ "type": "page", "id": "terms", "path": "https://example.com/terms.html" }]))]);
	let page = harness.ndom.create_page("");
	harness.platform.block_on(harness.ndom.request_page_change(&page, "Home", None)).unwrap();
	harness.platform.run_until_stalled();

	let frame = harness.ndom.cache().get("terms").unwrap().node;
	assert_eq!(harness.document.borrow().attribute(frame, "src").as_deref(), Some("https://example.com/terms.html"));
	let nested = harness.ndom.global().pages().into_iter().find(|candidate| candidate.is_embedded()).unwrap();
	assert!(nested.embedded().unwrap().remote);
	assert_eq!(nested.status(), PageStatus::Idle);
	assert_eq!(nested.root_node(), frame);
}

#[test]
fn timers_tick_until_their_page_is_removed() {
	let harness = Harness::new();
	harness.serve(&[("VideoChat", json!([{ "type": "label", "id": "clock", "contentType": "timer", "dataKey": "callTime" }]))]);
	let page = harness.ndom.create_page("");
	harness.platform.block_on(harness.ndom.request_page_change(&page, "VideoChat", None)).unwrap();

	let clock = harness.ndom.cache().get("clock").unwrap().node;
	assert_eq!(harness.document.borrow().text_content(clock), "00:00:00");
	harness.platform.advance(Duration::from_secs(2));
	assert_eq!(harness.document.borrow().text_content(clock), "00:00:02");
	assert_eq!(harness.ndom.global().timers().get("callTime").map(|timer| timer.value()), Some(Duration::from_secs(2)));

	harness.ndom.remove_page(&page);
	assert!(harness.ndom.global().timers().is_empty());
	assert_eq!(harness.platform.scheduled_count(), 0);
	harness.platform.advance(Duration::from_secs(2));
	assert_eq!(harness.document.borrow().text_content(clock), "00:00:02");
}

#[test]
fn plugins_mount_at_their_location() {
	let harness = Harness::new();
	harness.serve(&[("Home", json!([
		{ "type": "pluginHead", "id": "analytics", "path": "analytics.js" },
		{ "type": "plugin", "id": "chat", "path": "chat.js", "location": "body-top" },
		{ "type": "label", "text": "Home" }
	]))]);
	let page = harness.ndom.create_page("");
	harness.platform.block_on(harness.ndom.request_page_change(&page, "Home", None)).unwrap();

	let document = harness.document.borrow();
	let analytics = harness.ndom.cache().get("analytics").unwrap().node;
	assert_eq!(document.parent(analytics), Some(document.head()));
	assert_eq!(document.attribute(analytics, "src").as_deref(), Some("analytics.js"));
	let chat = harness.ndom.cache().get("chat").unwrap().node;
	assert_eq!(document.children(document.body()).first().copied(), Some(chat));
	assert!(!dom::contains(&*document, page.root_node(), chat));
}

#[test]
fn loaded_plugins_are_inlined() {
	let harness = Harness::new();
	harness.serve(&[("Home", json!([{ "type": "pluginBodyTail", "id": "widget", "path": "widget.js" }]))]);
	let requests = Rc::new(RefCell::new(Vec::new()));
	{
		let requests = requests.clone();
		harness.ndom.use_(Use::new().load_plugin(move |request| {
			requests.borrow_mut().push((request.path.clone(), request.location));
			futures::future::ready(Ok(Some("window.widget = true;".to_owned()))).boxed_local()
		}));
	}
	let page = harness.ndom.create_page("");
	harness.platform.block_on(harness.ndom.request_page_change(&page, "Home", None)).unwrap();
	harness.platform.run_until_stalled();

	assert_eq!(*requests.borrow(), [("widget.js".to_owned(), PluginLocation::BodyTail)]);
	let document = harness.document.borrow();
	let widget = harness.ndom.cache().get("widget").unwrap().node;
	assert_eq!(document.children(document.body()).last().copied(), Some(widget));
	assert_eq!(document.text_content(widget), "window.widget = true;");
	assert_eq!(document.attribute(widget, "src"), None);
}

#[test]
fn data_attribute_queries() {
	let harness = Harness::new();
	harness.serve(&[("Home", json!([
		{ "type": "label", "id": "greeting", "viewTag": "greeting", "text": "Hi" },
		{ "type": "label", "viewTag": "greeting", "text": "Hello" },
		{ "type": "textField", "id": "email", "dataKey": "formData.email" },
		{ "type": "view", "popUpView": "confirmDialog", "children": [{ "type": "button", "text": "OK" }] }
	]))]);
	let page = harness.ndom.create_page("");
	harness.platform.block_on(harness.ndom.request_page_change(&page, "Home", None)).unwrap();

	let scope = QueryScope::Page(&page);
	assert_eq!(harness.ndom.find_all_by_view_tag("greeting", scope).len(), 2);
	assert_eq!(harness.ndom.find_by_view_tag("greeting", scope), harness.ndom.find_by_element_id("greeting", scope));
	assert_eq!(harness.ndom.find_by_data_key("formData.email", scope), harness.ndom.find_by_element_id("email", scope).into_iter().collect::<Vec<_>>());
	let dialog = harness.ndom.get_by_data_ux("confirmDialog", QueryScope::Document).unwrap();
	assert_eq!(harness.document.borrow().text_content(dialog), "OK");
	assert!(harness.ndom.find_by_data_attrib("data-viewtag", "missing", scope).is_empty());
}

#[test]
fn text_fields_write_back_input() {
	let harness = Harness::new();
	harness.serve(&[("Home", json!([{ "type": "textField", "id": "email", "dataKey": "formData.email", "data-value": "a@b.c" }]))]);
	let page = harness.ndom.create_page("");
	let components = harness.platform.block_on(harness.ndom.request_page_change(&page, "Home", None)).unwrap().unwrap();

	let input = harness.ndom.cache().get("email").unwrap().node;
	assert_eq!(harness.document.borrow().value(input).as_deref(), Some("a@b.c"));
	harness.document.borrow_mut().set_value(input, "x@y.z").unwrap();
	dom::dispatch(&harness.shared(), &DomEvent::new("input", input).with_value("x@y.z"));
	assert_eq!(components[0].get_str("data-value").as_deref(), Some("x@y.z"));
}
