//! Injected async callbacks the renderer depends on but does not implement.

use crate::{
	error::{NdomError, RequestError, RequestErrorCode},
	page::PageRef,
};
use core::str::FromStr;
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::rc::Rc;

pub const REQUEST_PAGE_OBJECT: &str = "REQUEST_PAGE_OBJECT";
pub const LOAD_PLUGIN: &str = "LOAD_PLUGIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionName {
	RequestPageObject,
	LoadPlugin,
}

impl TransactionName {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::RequestPageObject => REQUEST_PAGE_OBJECT,
			Self::LoadPlugin => LOAD_PLUGIN,
		}
	}
}

impl FromStr for TransactionName {
	type Err = NdomError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		match name {
			REQUEST_PAGE_OBJECT => Ok(Self::RequestPageObject),
			LOAD_PLUGIN => Ok(Self::LoadPlugin),
			_ => Err(NdomError::UnknownName { kind: "transaction", name: name.to_owned() }),
		}
	}
}

/// The data of one page, as returned by the host.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageObject {
	#[serde(default)]
	pub components: Vec<Value>,
	#[serde(flatten)]
	pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageObjectResponse {
	Loaded(PageObject),
	/// The host gave up on the request (`{ "aborted": true }`).
	Aborted,
}

impl PageObjectResponse {
	/// Interprets a JSON page object.
	///
	/// # Errors
	///
	/// [`RequestErrorCode::TransactionFailed`] if `value` is not a page object.
	pub fn from_value(value: Value) -> Result<Self, RequestError> {
		if value.get("aborted").and_then(Value::as_bool) == Some(true) {
			return Ok(Self::Aborted);
		}
		serde_json::from_value(value).map(Self::Loaded).map_err(|error| RequestError::new(RequestErrorCode::TransactionFailed, format!("malformed page object: {}", error)))
	}
}

/// Where plugin content is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginLocation {
	Head,
	BodyTop,
	BodyTail,
}

impl PluginLocation {
	/// From a plugin component's type, or its `location` tag for plain `plugin`s.
	#[must_use]
	pub fn from_component(component_type: &str, location: Option<&str>) -> Self {
		match component_type {
			"pluginHead" => Self::Head,
			"pluginBodyTop" => Self::BodyTop,
			"pluginBodyTail" => Self::BodyTail,
			_ => match location {
				Some("head") => Self::Head,
				Some("body-top" | "bodyTop") => Self::BodyTop,
				_ => Self::BodyTail,
			},
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRequest {
	pub component_id: String,
	pub path: String,
	pub location: PluginLocation,
}

pub type RequestPageObject = Rc<dyn Fn(PageRef) -> LocalBoxFuture<'static, Result<PageObjectResponse, RequestError>>>;
/// Resolves to the plugin's inline content, or [`None`] to load it through `src`/`href`.
pub type LoadPlugin = Rc<dyn Fn(PluginRequest) -> LocalBoxFuture<'static, Result<Option<String>, RequestError>>>;

#[derive(Clone)]
pub enum Transaction {
	RequestPageObject(RequestPageObject),
	LoadPlugin(LoadPlugin),
}

impl Transaction {
	#[must_use]
	pub fn name(&self) -> TransactionName {
		match self {
			Self::RequestPageObject(_) => TransactionName::RequestPageObject,
			Self::LoadPlugin(_) => TransactionName::LoadPlugin,
		}
	}
}

#[derive(Default, Clone)]
pub struct Transactions {
	request_page_object: Option<RequestPageObject>,
	load_plugin: Option<LoadPlugin>,
}

impl Transactions {
	pub fn set(&mut self, transaction: Transaction) {
		match transaction {
			Transaction::RequestPageObject(handler) => self.request_page_object = Some(handler),
			Transaction::LoadPlugin(handler) => self.load_plugin = Some(handler),
		}
	}

	#[must_use]
	pub fn has(&self, name: TransactionName) -> bool {
		match name {
			TransactionName::RequestPageObject => self.request_page_object.is_some(),
			TransactionName::LoadPlugin => self.load_plugin.is_some(),
		}
	}

	/// # Errors
	///
	/// [`RequestErrorCode::TransactionMissing`] if no handler is registered.
	pub fn request_page_object(&self) -> Result<RequestPageObject, RequestError> {
		self.request_page_object.clone().ok_or_else(|| RequestError::transaction_missing(REQUEST_PAGE_OBJECT))
	}

	#[must_use]
	pub fn load_plugin(&self) -> Option<LoadPlugin> {
		self.load_plugin.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn page_object_responses() {
		assert_eq!(PageObjectResponse::from_value(json!({ "aborted": true })), Ok(PageObjectResponse::Aborted));
		let Ok(PageObjectResponse::Loaded(page)) = PageObjectResponse::from_value(json!({ "components": [{ "type": "view" }], "title": "Hi" })) else {
			panic!("expected a page object");
		};
		assert_eq!(page.components.len(), 1);
		assert_eq!(page.rest.get("title"), Some(&json!("Hi")));
		assert_eq!(PageObjectResponse::from_value(json!({ "components": 5 })).unwrap_err().code, RequestErrorCode::TransactionFailed);
	}

	#[test]
	fn missing_request_transaction() {
		let transactions = Transactions::default();
		let error = transactions.request_page_object().err().unwrap();
		assert_eq!(error.code, RequestErrorCode::TransactionMissing);
		assert_eq!("LOAD_PLUGIN".parse::<TransactionName>().unwrap(), TransactionName::LoadPlugin);
	}

	#[test]
	fn plugin_locations() {
		assert_eq!(PluginLocation::from_component("pluginHead", None), PluginLocation::Head);
		assert_eq!(PluginLocation::from_component("plugin", Some("head")), PluginLocation::Head);
		assert_eq!(PluginLocation::from_component("plugin", None), PluginLocation::BodyTail);
	}
}
