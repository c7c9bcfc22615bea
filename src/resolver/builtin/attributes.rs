use super::{scalar, set_attribute, set_style, to_kebab_case};
use crate::resolver::Resolver;

/// Component property → dataset attribute.
const DATASET: &[(&str, &str)] = &[
	("data-key", "data-key"),
	("dataKey", "data-key"),
	("data-listid", "data-listid"),
	("listId", "data-listid"),
	("data-name", "data-name"),
	("data-value", "data-value"),
	("data-ux", "data-ux"),
	("popUpView", "data-ux"),
	("data-viewtag", "data-viewtag"),
	("viewTag", "data-viewtag"),
	("data-globalid", "data-globalid"),
	("data-placeholder", "data-placeholder"),
	("placeholder", "data-placeholder"),
	("data-src", "data-src"),
	("contentType", "data-contenttype"),
];

pub(super) fn id() -> Resolver {
	Resolver::new("id").resolve(|args| set_attribute(args, "id", &args.component.id()))
}

pub(super) fn dataset() -> Resolver {
	Resolver::new("dataset").resolve(|args| {
		for &(key, attribute) in DATASET {
			if let Some(value) = args.component.get(key).as_ref().and_then(scalar) {
				set_attribute(args, attribute, &value)?;
			}
		}
		Ok(())
	})
}

pub(super) fn styles() -> Resolver {
	Resolver::new("styles").resolve(|args| {
		for (property, value) in args.component.style() {
			if let Some(value) = scalar(&value) {
				set_style(args, &to_kebab_case(&property), &value)?;
			}
		}
		Ok(())
	})
}
