use super::scalar;
use crate::resolver::Resolver;

/// Types whose content is not text, or is produced by a dedicated resolver.
const NON_TEXT: &[&str] = &["image", "list", "page", "select", "textField", "textView", "video", "canvas", "ecosDoc", "plugin", "pluginHead", "pluginBodyTop", "pluginBodyTail"];

/// Text content: `data-value`, then `text`, then `placeholder`.
pub(super) fn content() -> Resolver {
	Resolver::new("content")
		.when(|args| {
			let component_type = args.component.component_type();
			!NON_TEXT.contains(&component_type.as_str()) && args.component.get_str("contentType").as_deref() != Some("timer") && !args.component.has("textBoard")
		})
		.resolve(|args| {
			let text = ["data-value", "text", "placeholder"].iter().find_map(|key| args.component.get(key).as_ref().and_then(scalar).filter(|text| !text.is_empty()));
			if let Some(text) = text {
				args.ndom.document().borrow_mut().set_text_content(args.node, &text)?;
			}
			Ok(())
		})
}
