#![cfg(target_arch = "wasm32")]

use futures::FutureExt;
use noodl_dom::{
	dom::{SharedDocument, WebDocument},
	model::basic::BasicModel,
	platform::WebPlatform,
	transaction::{PageObject, PageObjectResponse},
	Config, Ndom, PageStatus, Use,
};
use serde_json::json;
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn init_log() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
}

#[wasm_bindgen_test]
async fn render_into_body() {
	init_log();

	let document: SharedDocument = Rc::new(RefCell::new(WebDocument::from_window().unwrap()));
	let ndom = Ndom::new(document, Rc::new(WebPlatform::new()), Rc::new(BasicModel::new()), Config::default());
	ndom.use_(Use::new().request_page_object(|_| {
		let components = vec![json!({ "type": "view", "id": "web-render-root", "style": { "backgroundColor": "red" }, "children": [
			{ "type": "button", "id": "web-render-button", "text": "Go", "onClick": [{ "actionType": "goto", "goto": "Donut" }] }
		]})];
		futures::future::ready(Ok(PageObjectResponse::Loaded(PageObject { components, ..PageObject::default() }))).boxed_local()
	}));

	let page = ndom.create_page("");
	ndom.request_page_change(&page, "Hello", None).await.unwrap();
	assert_eq!(page.status(), PageStatus::ComponentsRendered);

	let web = window().unwrap().document().unwrap();
	let view: HtmlElement = web.get_element_by_id("web-render-root").unwrap().dyn_into().unwrap();
	assert_eq!(view.style().get_property_value("background-color").unwrap(), "red");
	let button: HtmlElement = web.get_element_by_id("web-render-button").unwrap().dyn_into().unwrap();
	assert_eq!(button.tag_name(), "BUTTON");
	assert_eq!(button.style().get_property_value("cursor").unwrap(), "pointer");
	assert_eq!(button.text_content().as_deref(), Some("Go"));

	ndom.remove_page(&page);
	assert!(web.get_element_by_id("web-render-root").is_none());
}
