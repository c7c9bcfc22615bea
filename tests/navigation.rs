mod common;

use common::Harness;
use futures::{channel::oneshot, FutureExt};
use noodl_dom::{
	dom::Document,
	error::{RequestError, RequestErrorCode},
	transaction::{PageObject, PageObjectResponse},
	NdomEvent, NdomHookArgs, PageStatus, Use,
};
use serde_json::{json, Map, Value};
use std::{cell::RefCell, rc::Rc};

fn label_page(name: &str) -> PageObjectResponse {
	PageObjectResponse::Loaded(PageObject { components: vec![json!({ "type": "label", "text": name })], ..PageObject::default() })
}

#[test]
fn missing_transaction_is_reported() {
	let harness = Harness::new();
	let page = harness.ndom.create_page("");
	let error = harness.platform.block_on(harness.ndom.request_page_change(&page, "Hello", None)).err().unwrap();
	assert_eq!(error.request_code(), Some(RequestErrorCode::TransactionMissing));
	assert_eq!(error.request_code().map(RequestErrorCode::code), Some(1001));
	assert_eq!(page.status(), PageStatus::NavigateError);
	assert_eq!(page.requesting(), "");
}

#[test]
fn failed_transaction_leaves_navigate_error() {
	let harness = Harness::new();
	harness.ndom.use_(Use::new().request_page_object(|_| futures::future::ready(Err::<PageObjectResponse, _>(RequestError::new(RequestErrorCode::TransactionFailed, "offline"))).boxed_local()));
	let page = harness.ndom.create_page("");
	let error = harness.platform.block_on(harness.ndom.request_page_change(&page, "Hello", None)).err().unwrap();
	assert_eq!(error.request_code(), Some(RequestErrorCode::TransactionFailed));
	assert_eq!(page.status(), PageStatus::NavigateError);
	assert_eq!(page.requesting(), "");
	assert_eq!(page.page(), "");
}

#[test]
fn aborted_request_returns_to_idle() {
	let harness = Harness::new();
	harness.ndom.use_(Use::new().request_page_object(|_| futures::future::ready(PageObjectResponse::from_value(json!({ "aborted": true }))).boxed_local()));
	let page = harness.ndom.create_page("");
	let error = harness.platform.block_on(harness.ndom.request_page_change(&page, "Hello", None)).err().unwrap();
	assert_eq!(error.request_code(), Some(RequestErrorCode::Aborted));
	assert_eq!(page.status(), PageStatus::Idle);
	assert_eq!(page.requesting(), "");
}

#[test]
fn navigation_tracks_previous_page_and_modifiers() {
	let harness = Harness::new();
	let seen = Rc::new(RefCell::new(Vec::new()));
	{
		let seen = seen.clone();
		harness.ndom.use_(Use::new().request_page_object(move |page| {
			let name = page.requesting();
			seen.borrow_mut().push((name.clone(), page.modifiers(&name)));
			futures::future::ready(Ok(label_page(&name))).boxed_local()
		}));
	}
	let page = harness.ndom.create_page("");
	harness.platform.block_on(harness.ndom.request_page_change(&page, "SignIn", None)).unwrap();
	let mut modifiers = Map::new();
	modifiers.insert("reload".to_owned(), Value::Bool(true));
	harness.platform.block_on(harness.ndom.request_page_change(&page, "Dashboard", Some(modifiers.clone()))).unwrap();

	assert_eq!(page.page(), "Dashboard");
	assert_eq!(page.previous(), "SignIn");
	assert_eq!(*seen.borrow(), [("SignIn".to_owned(), None), ("Dashboard".to_owned(), Some(modifiers))]);
	assert_eq!(harness.document.borrow().text_content(page.root_node()), "Dashboard");
}

#[test]
fn repeated_request_for_the_same_page_is_ignored() {
	let harness = Harness::new();
	let (sender, receiver) = oneshot::channel::<()>();
	let receiver = Rc::new(RefCell::new(Some(receiver)));
	let count = Rc::new(RefCell::new(0));
	{
		let count = count.clone();
		harness.ndom.use_(Use::new().request_page_object(move |page| {
			*count.borrow_mut() += 1;
			let name = page.requesting();
			let wait = receiver.borrow_mut().take();
			async move {
				if let Some(wait) = wait {
					let _ = wait.await;
				}
				Ok(label_page(&name))
			}
			.boxed_local()
		}));
	}
	let page = harness.ndom.create_page("");
	let first = harness.ndom.request_page_change(&page, "Hello", None);
	let second = async {
		let result = harness.ndom.request_page_change(&page, "Hello", None).await;
		let _ = sender.send(());
		result
	};
	let (first, second) = harness.platform.block_on(futures::future::join(first, second));
	assert!(first.unwrap().is_some());
	assert!(second.unwrap().is_none());
	assert_eq!(*count.borrow(), 1);
	assert_eq!(page.status(), PageStatus::ComponentsRendered);
}

#[test]
fn stale_responses_are_discarded() {
	let harness = Harness::new();
	let (sender, receiver) = oneshot::channel::<()>();
	let receiver = Rc::new(RefCell::new(Some(receiver)));
	harness.ndom.use_(Use::new().request_page_object(move |page| {
		let name = page.requesting();
		let wait = if name == "Slow" { receiver.borrow_mut().take() } else { None };
		async move {
			if let Some(wait) = wait {
				let _ = wait.await;
			}
			Ok(label_page(&name))
		}
		.boxed_local()
	}));
	let page = harness.ndom.create_page("");
	let slow = harness.ndom.request_page_change(&page, "Slow", None);
	let fast = async {
		let result = harness.ndom.request_page_change(&page, "Fast", None).await;
		let _ = sender.send(());
		result
	};
	let (slow, fast) = harness.platform.block_on(futures::future::join(slow, fast));
	assert_eq!(slow.unwrap().map(|components| components.len()), None);
	assert_eq!(fast.unwrap().map(|components| components.len()), Some(1));
	assert_eq!(page.page(), "Fast");
	assert_eq!(page.requesting(), "");
	assert_eq!(harness.document.borrow().text_content(page.root_node()), "Fast");
}

#[test]
fn components_resolved_for_a_stale_navigation_are_not_drawn() {
	let (harness, release) = Harness::gated("Slow");
	harness.serve(&[("Slow", json!([{ "type": "label", "text": "Slow" }])), ("Fast", json!([{ "type": "label", "text": "Fast" }]))]);
	let page = harness.ndom.create_page("");
	let slow = harness.ndom.request_page_change(&page, "Slow", None);
	let fast = async {
		let result = harness.ndom.request_page_change(&page, "Fast", None).await;
		let _ = release.send(());
		result
	};
	let (slow, fast) = harness.platform.block_on(futures::future::join(slow, fast));
	assert!(slow.unwrap().is_none());
	assert_eq!(fast.unwrap().map(|components| components.len()), Some(1));
	assert_eq!(page.page(), "Fast");
	assert_eq!(page.status(), PageStatus::ComponentsRendered);
	assert_eq!(harness.document.borrow().text_content(page.root_node()), "Fast");
	assert_eq!(harness.ndom.cache().len(), 1);
}

#[test]
fn page_removed_while_resolving_is_not_drawn() {
	let (harness, release) = Harness::gated("Hello");
	harness.serve(&[("Hello", json!([{ "type": "label", "text": "Hello" }]))]);
	let page = harness.ndom.create_page("Home");
	let request = harness.ndom.request_page_change(&page, "Hello", None);
	let removal = async {
		harness.ndom.remove_page(&page);
		let _ = release.send(());
	};
	let (result, ()) = harness.platform.block_on(futures::future::join(request, removal));
	assert!(result.unwrap().is_none());
	assert!(page.is_removed());
	assert!(harness.ndom.cache().is_empty());
	assert_ne!(page.status(), PageStatus::ComponentsRendered);
	assert_eq!(harness.document.borrow().text_content(page.root_node()), "");
}

#[test]
fn leaving_a_page_stops_its_timers() {
	let harness = Harness::new();
	harness.serve(&[
		("VideoChat", json!([{ "type": "label", "id": "clock", "contentType": "timer", "dataKey": "callTime" }])),
		("Home", json!([{ "type": "label", "text": "Home" }])),
	]);
	let page = harness.ndom.create_page("");
	harness.platform.block_on(harness.ndom.request_page_change(&page, "VideoChat", None)).unwrap();
	assert_eq!(harness.ndom.global().timers().len(), 1);

	harness.platform.block_on(harness.ndom.request_page_change(&page, "Home", None)).unwrap();
	assert!(harness.ndom.global().timers().is_empty());
	assert_eq!(harness.platform.scheduled_count(), 0);
}

#[test]
fn unnamed_pages_supersede_each_other() {
	let harness = Harness::new();
	let removed = Rc::new(RefCell::new(Vec::new()));
	{
		let removed = removed.clone();
		harness.ndom.on(NdomEvent::PageRemoved, "log", move |args| {
			if let NdomHookArgs::PageRemoved { id, .. } = args {
				removed.borrow_mut().push(id.clone());
			}
		});
	}
	let first = harness.ndom.create_page("");
	let second = harness.ndom.create_page("");

	assert_ne!(first.id(), second.id());
	assert!(first.is_removed());
	assert_eq!(harness.ndom.global().page_ids(), [second.id().to_owned()]);
	assert_eq!(*removed.borrow(), [first.id().to_owned()]);
	assert_eq!(harness.model.page_count(), 1);
	let document = harness.document.borrow();
	assert!(!document.is_connected(first.root_node()));
	assert!(document.is_connected(second.root_node()));

	drop(document);
	let named = harness.ndom.create_page("Settings");
	assert_eq!(harness.ndom.global().page_ids().len(), 2);
	assert_eq!(harness.ndom.page().map(|page| page.id().to_owned()), Some(second.id().to_owned()));
	harness.ndom.remove_page(&named);
	assert_eq!(harness.ndom.global().page_ids(), [second.id().to_owned()]);
}

#[test]
fn removed_page_ignores_late_responses() {
	let harness = Harness::new();
	let (sender, receiver) = oneshot::channel::<()>();
	let receiver = Rc::new(RefCell::new(Some(receiver)));
	harness.ndom.use_(Use::new().request_page_object(move |page| {
		let name = page.requesting();
		let wait = receiver.borrow_mut().take();
		async move {
			if let Some(wait) = wait {
				let _ = wait.await;
			}
			Ok(label_page(&name))
		}
		.boxed_local()
	}));
	let page = harness.ndom.create_page("Home");
	let request = harness.ndom.request_page_change(&page, "Hello", None);
	let removal = async {
		harness.ndom.remove_page(&page);
		let _ = sender.send(());
	};
	let (result, ()) = harness.platform.block_on(futures::future::join(request, removal));
	assert!(result.unwrap().is_none());
	assert!(page.is_removed());
	assert!(harness.ndom.global().page_ids().is_empty());
}

#[test]
fn registers_are_invoked_by_name() {
	let harness = Harness::new();
	harness.ndom.use_(Use::new().register("onNewMessage", |args| Some(json!(args.len()))));
	assert_eq!(harness.ndom.emit_register("onNewMessage", &[json!("hi"), json!(2)]), Some(json!(2)));
	assert_eq!(harness.ndom.emit_register("unknown", &[]), None);
}
