#![doc(html_root_url = "https://docs.rs/noodl-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod cache;
mod config;
pub mod dom;
pub mod error;
pub mod global;
pub mod hooks;
pub mod model;
pub mod page;
pub mod platform;
pub mod query;
mod render;
pub mod resolver;
pub mod resource;
pub mod timers;
pub mod transaction;

pub use config::Config;
pub use error::NdomError;
pub use page::{Page, PageEvent, PageRef, PageStatus};
pub use query::QueryScope;
pub use render::{tag_for, Ndom, NdomEvent, NdomHookArgs, Register, Use, WeakNdom};
