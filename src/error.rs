use crate::dom::NodeId;
use core::fmt::{self, Display, Formatter};

/// Stable codes carried by [`RequestError`].
///
/// The numeric values are part of the public contract and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestErrorCode {
	/// No handler is registered for the transaction a navigation depends on.
	TransactionMissing,
	/// The transaction handler ran but reported a failure.
	TransactionFailed,
	/// The page addressed by the request is not (or no longer) registered.
	PageMissing,
	/// The request was aborted by the host application.
	Aborted,
}
impl RequestErrorCode {
	#[must_use]
	pub fn code(self) -> u16 {
		match self {
			Self::TransactionMissing => 1001,
			Self::TransactionFailed => 1002,
			Self::PageMissing => 1003,
			Self::Aborted => 1004,
		}
	}
}
impl Display for RequestErrorCode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{:?} ({})", self, self.code())
	}
}

/// A navigation (page object request) failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request error {code}: {message}")]
pub struct RequestError {
	pub code: RequestErrorCode,
	pub message: String,
}
impl RequestError {
	pub fn new(code: RequestErrorCode, message: impl Into<String>) -> Self {
		Self { code, message: message.into() }
	}

	#[must_use]
	pub fn transaction_missing(name: &str) -> Self {
		Self::new(RequestErrorCode::TransactionMissing, format!("no handler registered for transaction {}", name))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
	#[error("node {0:?} does not exist")]
	NodeMissing(NodeId),
	#[error("node {0:?} is not attached to a parent")]
	NotAttached(NodeId),
	#[error("node {child:?} cannot be inserted into {parent:?}")]
	HierarchyRequest { parent: NodeId, child: NodeId },
	#[error("node {0:?} is not an element")]
	NotAnElement(NodeId),
	#[error("JavaScript error: {0}")]
	Js(String),
}

/// Failure inside a single resolver. The pipeline logs it and continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("resolver {resolver} failed: {kind}")]
pub struct ResolveError {
	pub resolver: String,
	pub kind: ResolveErrorKind,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveErrorKind {
	#[error(transparent)]
	Dom(#[from] DomError),
	#[error("component {component} is missing {key}")]
	MissingProperty { component: String, key: String },
	#[error("{0}")]
	Other(String),
}

/// Errors reported by the component model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("component model: {0}")]
pub struct ModelError(pub String);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NdomError {
	#[error(transparent)]
	Request(#[from] RequestError),
	#[error(transparent)]
	Dom(#[from] DomError),
	#[error(transparent)]
	Resolve(#[from] ResolveError),
	#[error(transparent)]
	Model(#[from] ModelError),
	#[error("unknown {kind} name {name:?}")]
	UnknownName { kind: &'static str, name: String },
}

impl NdomError {
	/// The stable request code, if this is a request failure.
	#[must_use]
	pub fn request_code(&self) -> Option<RequestErrorCode> {
		match self {
			Self::Request(error) => Some(error.code),
			_ => None,
		}
	}
}
