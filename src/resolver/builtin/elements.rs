use super::{scalar, set_attribute, set_style};
use crate::{
	dom::{self, DomEvent, NodeId},
	error::ResolveErrorKind,
	model::{Component, ComponentEvent},
	resolver::{ResolveArgs, Resolver},
	timers::{format_timer, Timer},
};
use core::time::Duration;
use serde_json::Value;
use std::rc::Rc;
use tracing::trace;

fn has_action(component: &dyn Component, user_event: &str) -> bool {
	match component.get(user_event) {
		None | Some(Value::Null) => false,
		Some(Value::Array(actions)) => !actions.is_empty(),
		Some(_) => true,
	}
}

/// `data-src`, then `path`.
fn source(component: &dyn Component) -> Option<String> {
	component.get_str("data-src").or_else(|| component.get_str("path")).filter(|src| !src.is_empty())
}

fn create_child(args: &ResolveArgs<'_>, parent: NodeId, tag: &str) -> Result<NodeId, ResolveErrorKind> {
	let child = args.ndom.document().borrow_mut().create_element(tag);
	dom::append_child(args.ndom.document(), parent, child)?;
	Ok(child)
}

/// Forwards the value of `dom_event` on the node to the component as [`ComponentEvent::DataValue`].
fn forward_value(args: &ResolveArgs<'_>, dom_event: &str) -> Result<(), ResolveErrorKind> {
	let component = Rc::downgrade(args.component);
	let document = Rc::downgrade(args.ndom.document());
	args.ndom.document().borrow_mut().add_event_listener(
		args.node,
		dom_event,
		Rc::new(move |event: &DomEvent| {
			let Some(component) = component.upgrade() else { return };
			let value = event.value.clone().or_else(|| document.upgrade().and_then(|document| document.borrow().value(event.target)));
			if let Some(value) = value {
				component.emit(ComponentEvent::DataValue(Value::String(value)));
			}
		}),
	)?;
	Ok(())
}

pub(super) fn button() -> Resolver {
	Resolver::new("button").for_type("button").resolve(|args| if has_action(&**args.component, "onClick") { set_style(args, "cursor", "pointer") } else { Ok(()) })
}

pub(super) fn image() -> Resolver {
	Resolver::new("image").for_type("image").resolve(|args| {
		if let Some(src) = source(&**args.component) {
			set_attribute(args, "src", &src)?;
		}
		if let Some(alt) = args.component.get_str("alt") {
			set_attribute(args, "alt", &alt)?;
		}
		if has_action(&**args.component, "onClick") {
			set_style(args, "cursor", "pointer")?;
		}
		Ok(())
	})
}

/// Renders `textBoard` items: `{ "text": .. }` as `<span>`, `{ "br": .. }` as `<br>`.
pub(super) fn label() -> Resolver {
	Resolver::new("label").for_type("label").resolve(|args| {
		let Some(Value::Array(items)) = args.component.get("textBoard") else { return Ok(()) };
		for item in &items {
			if item.get("br").is_some() {
				create_child(args, args.node, "br")?;
			} else if let Some(text) = item.get("text").and_then(scalar) {
				let span = create_child(args, args.node, "span")?;
				args.ndom.document().borrow_mut().set_text_content(span, &text)?;
			}
		}
		Ok(())
	})
}

pub(super) fn select() -> Resolver {
	Resolver::new("select").for_type("select").resolve(|args| {
		let selected = args.component.get("data-value").as_ref().and_then(scalar);
		dom::clear_children(args.ndom.document(), args.node);
		if let Some(Value::Array(options)) = args.component.get("options") {
			for option in &options {
				let (value, label) = match option {
					Value::Object(object) => {
						let value = object.get("value").or_else(|| object.get("key")).and_then(scalar).unwrap_or_default();
						let label = object.get("label").and_then(scalar).unwrap_or_else(|| value.clone());
						(value, label)
					}
					other => match scalar(other) {
						Some(value) => (value.clone(), value),
						None => continue,
					},
				};
				let element = create_child(args, args.node, "option")?;
				let mut document = args.ndom.document().borrow_mut();
				document.set_attribute(element, "value", &value)?;
				document.set_text_content(element, &label)?;
				if selected.as_deref() == Some(value.as_str()) {
					document.set_attribute(element, "selected", "selected")?;
				}
			}
		}
		if let Some(selected) = &selected {
			args.ndom.document().borrow_mut().set_value(args.node, selected)?;
		}
		forward_value(args, "change")
	})
}

fn input_type(content_type: Option<&str>) -> &'static str {
	match content_type {
		Some("password") => "password",
		Some("email") => "email",
		Some("number") => "number",
		Some("phone" | "tel") => "tel",
		Some("date") => "date",
		_ => "text",
	}
}

pub(super) fn text_field() -> Resolver {
	Resolver::new("textField").when(|args| matches!(args.component.component_type().as_str(), "textField" | "textView")).resolve(|args| {
		if args.component.component_type() == "textField" {
			set_attribute(args, "type", input_type(args.component.get_str("contentType").as_deref()))?;
		}
		if let Some(placeholder) = args.component.get_str("placeholder") {
			set_attribute(args, "placeholder", &placeholder)?;
		}
		if let Some(value) = args.component.get("data-value").as_ref().and_then(scalar) {
			args.ndom.document().borrow_mut().set_value(args.node, &value)?;
		}
		forward_value(args, "input")
	})
}

pub(super) fn video() -> Resolver {
	Resolver::new("video").for_type("video").resolve(|args| {
		let src = source(&**args.component);
		if let Some(src) = &src {
			set_attribute(args, "src", src)?;
		}
		if let Some(poster) = args.component.get_str("poster") {
			set_attribute(args, "poster", &poster)?;
		}
		if args.component.get("controls").map_or(true, |controls| crate::hooks::is_truthy(&controls)) {
			set_attribute(args, "controls", "")?;
		}
		if let (Some(src), Some(format)) = (src, args.component.get_str("videoFormat")) {
			let source = create_child(args, args.node, "source")?;
			let mut document = args.ndom.document().borrow_mut();
			document.set_attribute(source, "src", &src)?;
			document.set_attribute(source, "type", &format!("video/{}", format))?;
		}
		Ok(())
	})
}

fn pixels(value: &Value) -> Option<String> {
	let value = scalar(value)?;
	let number = value.trim().trim_end_matches("px").trim();
	number.parse::<f64>().ok().map(|n| n.round().to_string())
}

/// Signature pads: sizes the drawing surface and reports strokes on `mouseup`.
pub(super) fn canvas() -> Resolver {
	Resolver::new("canvas").for_type("canvas").resolve(|args| {
		let style = args.component.style();
		for dimension in ["width", "height"] {
			if let Some(size) = style.get(dimension).and_then(pixels) {
				set_attribute(args, dimension, &size)?;
			}
		}
		forward_value(args, "mouseup")
	})
}

/// Picks a viewer for the document's mime type.
pub(super) fn ecos_doc() -> Resolver {
	Resolver::new("ecosDoc").for_type("ecosDoc").resolve(|args| {
		let name = args.component.get("ecosObj").and_then(|ecos| ecos.get("name").cloned()).unwrap_or(Value::Null);
		let mime = name.get("type").and_then(Value::as_str).unwrap_or_default().to_owned();
		let src = source(&**args.component).or_else(|| name.get("data").and_then(Value::as_str).map(str::to_owned));
		set_attribute(args, "data-mime", &mime)?;
		trace!(%mime, "Choosing document viewer.");
		match mime.as_str() {
			"text/html" | "application/pdf" => {
				let frame = create_child(args, args.node, "iframe")?;
				if let Some(src) = src {
					args.ndom.document().borrow_mut().set_attribute(frame, "src", &src)?;
				}
			}
			image if image.starts_with("image/") => {
				let img = create_child(args, args.node, "img")?;
				if let Some(src) = src {
					args.ndom.document().borrow_mut().set_attribute(img, "src", &src)?;
				}
			}
			"text/plain" => {
				let text = name.get("content").or_else(|| name.get("data")).and_then(scalar).or_else(|| args.component.get_str("data-value")).unwrap_or_default();
				let viewer = create_child(args, args.node, "div")?;
				args.ndom.document().borrow_mut().set_text_content(viewer, &text)?;
			}
			_ => {
				let placeholder = create_child(args, args.node, "div")?;
				args.ndom.document().borrow_mut().set_attribute(placeholder, "data-unsupported", &mime)?;
			}
		}
		Ok(())
	})
}

/// `contentType: timer`: a running `HH:MM:SS` counter keyed by the component's data key.
pub(super) fn timer() -> Resolver {
	Resolver::new("timer").when(|args| args.component.get_str("contentType").as_deref() == Some("timer")).resolve(|args| {
		let data_key = args.component.get_str("dataKey").or_else(|| args.component.get_str("data-key")).unwrap_or_else(|| args.component.id());
		let initial = args.component.get("data-value").and_then(|value| value.as_u64()).map_or(Duration::from_secs(0), Duration::from_secs);
		let timer = Timer::new(args.ndom.platform().clone(), data_key, args.page.page(), initial, args.ndom.config().timer_interval);
		args.ndom.document().borrow_mut().set_text_content(args.node, &format_timer(initial))?;

		let document = Rc::downgrade(args.ndom.document());
		let component = Rc::downgrade(args.component);
		let node = args.node;
		timer.on_increment(move |value| {
			if let Some(component) = component.upgrade() {
				component.set("data-value", Value::from(value.as_secs()));
			}
			if let Some(document) = document.upgrade() {
				if let Err(error) = document.borrow_mut().set_text_content(node, &format_timer(value)) {
					trace!("Timer node is gone: {}", error);
				}
			}
		});
		args.ndom.global_mut().timers_mut().set(timer.clone());
		timer.start();
		Ok(())
	})
}
