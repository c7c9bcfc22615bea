//! Resolvers every [`Ndom`](`crate::Ndom`) starts with.

use super::{ResolveArgs, Resolver};
use crate::error::ResolveErrorKind;
use serde_json::Value;

mod attributes;
mod content;
mod elements;
mod events;
mod list;
mod page;
mod plugin;

pub use plugin::is_plugin;

/// The built-in resolvers in registration order.
#[must_use]
pub fn defaults() -> Vec<Resolver> {
	vec![
		attributes::id(),
		attributes::dataset(),
		attributes::styles(),
		content::content(),
		elements::button(),
		elements::image(),
		elements::label(),
		elements::select(),
		elements::text_field(),
		elements::video(),
		elements::canvas(),
		elements::ecos_doc(),
		elements::timer(),
		events::events(),
		list::list(),
		page::page(),
		plugin::plugin(),
	]
}

/// A string for scalar JSON values.
pub(crate) fn scalar(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

fn set_attribute(args: &ResolveArgs<'_>, name: &str, value: &str) -> Result<(), ResolveErrorKind> {
	args.ndom.document().borrow_mut().set_attribute(args.node, name, value)?;
	Ok(())
}

fn set_style(args: &ResolveArgs<'_>, property: &str, value: &str) -> Result<(), ResolveErrorKind> {
	args.ndom.document().borrow_mut().set_style(args.node, property, value)?;
	Ok(())
}

/// `backgroundColor` → `background-color`. Custom properties and kebab-case names pass through.
#[must_use]
pub fn to_kebab_case(property: &str) -> String {
	if property.starts_with("--") {
		return property.to_owned();
	}
	let mut kebab = String::with_capacity(property.len() + 4);
	for c in property.chars() {
		if c.is_ascii_uppercase() {
			kebab.push('-');
			kebab.push(c.to_ascii_lowercase());
		} else {
			kebab.push(c);
		}
	}
	kebab
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kebab_case() {
		assert_eq!(to_kebab_case("backgroundColor"), "background-color");
		assert_eq!(to_kebab_case("cursor"), "cursor");
		assert_eq!(to_kebab_case("--accent"), "--accent");
	}
}
