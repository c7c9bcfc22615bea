#![cfg(target_arch = "wasm32")]

use futures::FutureExt;
use noodl_dom::{
	dom::{SharedDocument, WebDocument},
	model::basic::BasicModel,
	platform::WebPlatform,
	transaction::{PageObject, PageObjectResponse},
	Config, Ndom, Use,
};
use serde_json::json;
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

async fn sleep(millis: i32) {
	let promise = js_sys::Promise::new(&mut |resolve, _| {
		window().unwrap().set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis).unwrap();
	});
	JsFuture::from(promise).await.unwrap();
}

#[wasm_bindgen_test]
async fn click() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let document: SharedDocument = Rc::new(RefCell::new(WebDocument::from_window().unwrap()));
	let ndom = Ndom::new(document, Rc::new(WebPlatform::new()), Rc::new(BasicModel::new()), Config::default());
	let click_count = Rc::new(RefCell::new(0));
	{
		let click_count = click_count.clone();
		ndom.use_(
			Use::new()
				.request_page_object(|_| {
					let components = vec![json!({ "type": "button", "id": "web-event-button", "text": "Go", "onClick": [{ "actionType": "goto", "goto": "Donut" }] })];
					futures::future::ready(Ok(PageObjectResponse::Loaded(PageObject { components, ..PageObject::default() }))).boxed_local()
				})
				.action("goto", move |_| {
					*click_count.borrow_mut() += 1;
					futures::future::ready(Ok(())).boxed_local()
				}),
		);
	}
	let page = ndom.create_page("");
	ndom.request_page_change(&page, "Hello", None).await.unwrap();

	let button: HtmlElement = window().unwrap().document().unwrap().get_element_by_id("web-event-button").unwrap().dyn_into().unwrap();
	// Listeners attach on the next tick.
	button.click();
	assert_eq!(*click_count.borrow(), 0);
	sleep(10).await;
	button.click();
	sleep(10).await;
	assert_eq!(*click_count.borrow(), 1);

	ndom.remove_page(&page);
}
