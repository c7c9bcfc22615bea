use core::time::Duration;

/// Runtime configuration for an [`Ndom`](`crate::Ndom`).
///
/// Every field has a default matching browser behaviour; use the `with_*` setters to adjust.
#[derive(Debug, Clone)]
pub struct Config {
	/// Delay before user-event listeners are attached to a freshly drawn node.
	///
	/// Zero means "next tick", which keeps listeners from racing the data updates of the current draw.
	pub user_event_delay: Duration,
	/// Period of timer components.
	pub timer_interval: Duration,
	/// Tag of the per-page root container.
	pub root_node_tag: String,
	/// Prefixes marking a `page` component path as remote content.
	pub remote_prefixes: Vec<String>,
	/// Suffixes marking a `page` component path as remote content.
	pub remote_suffixes: Vec<String>,
	/// User event key → DOM event name.
	pub event_map: Vec<(String, String)>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			user_event_delay: Duration::from_millis(0),
			timer_interval: Duration::from_millis(1000),
			root_node_tag: "div".to_owned(),
			remote_prefixes: vec!["http://".to_owned(), "https://".to_owned()],
			remote_suffixes: vec![".html".to_owned()],
			event_map: [
				("onClick", "click"),
				("onChange", "change"),
				("onInput", "input"),
				("onBlur", "blur"),
				("onFocus", "focus"),
				("onMouseEnter", "mouseenter"),
				("onMouseLeave", "mouseleave"),
				("onMouseOver", "mouseover"),
				("onMouseOut", "mouseout"),
				("onKeyDown", "keydown"),
				("onKeyUp", "keyup"),
			]
			.iter()
			.map(|&(user, dom)| (user.to_owned(), dom.to_owned()))
			.collect(),
		}
	}
}

impl Config {
	#[must_use]
	pub fn with_user_event_delay(mut self, delay: Duration) -> Self {
		self.user_event_delay = delay;
		self
	}

	#[must_use]
	pub fn with_timer_interval(mut self, interval: Duration) -> Self {
		self.timer_interval = interval;
		self
	}

	#[must_use]
	pub fn with_root_node_tag(mut self, tag: impl Into<String>) -> Self {
		self.root_node_tag = tag.into();
		self
	}

	#[must_use]
	pub fn with_event(mut self, user_event: impl Into<String>, dom_event: impl Into<String>) -> Self {
		let user_event = user_event.into();
		let dom_event = dom_event.into();
		match self.event_map.iter_mut().find(|(user, _)| *user == user_event) {
			Some(entry) => entry.1 = dom_event,
			None => self.event_map.push((user_event, dom_event)),
		}
		self
	}

	/// Whether a `page` component path points at remote content rather than the local page registry.
	#[must_use]
	pub fn is_remote_path(&self, path: &str) -> bool {
		self.remote_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) || self.remote_suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
	}

	/// The DOM event a user event key is bound to.
	#[must_use]
	pub fn dom_event(&self, user_event: &str) -> Option<&str> {
		self.event_map.iter().find(|(user, _)| user == user_event).map(|(_, dom)| dom.as_str())
	}
}
