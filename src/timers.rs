//! Interval counters for timer components.

use crate::platform::{Platform, TimerHandle};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	time::Duration,
};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use tracing::trace;

pub type IncrementCallback = Rc<dyn Fn(Duration)>;

/// Renders a counter value as `HH:MM:SS`.
#[must_use]
pub fn format_timer(value: Duration) -> String {
	let seconds = value.as_secs();
	format!("{:02}:{:02}:{:02}", seconds / 3600, seconds / 60 % 60, seconds % 60)
}

struct TimerInner {
	data_key: String,
	page_name: String,
	value: Cell<Duration>,
	step: Duration,
	period: Duration,
	handle: Cell<Option<TimerHandle>>,
	on_increment: RefCell<Option<IncrementCallback>>,
	on_clear: RefCell<Option<Rc<dyn Fn()>>>,
	platform: Rc<dyn Platform>,
}

/// A counter that advances by one second per `period` while started.
#[derive(Clone)]
pub struct Timer {
	inner: Rc<TimerInner>,
}

impl Debug for Timer {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Timer")
			.field("data_key", &self.inner.data_key)
			.field("page_name", &self.inner.page_name)
			.field("value", &self.inner.value.get())
			.field("running", &self.is_running())
			.finish()
	}
}

impl Timer {
	pub fn new(platform: Rc<dyn Platform>, data_key: impl Into<String>, page_name: impl Into<String>, initial: Duration, period: Duration) -> Self {
		Self {
			inner: Rc::new(TimerInner {
				data_key: data_key.into(),
				page_name: page_name.into(),
				value: Cell::new(initial),
				step: Duration::from_secs(1),
				period,
				handle: Cell::new(None),
				on_increment: RefCell::new(None),
				on_clear: RefCell::new(None),
				platform,
			}),
		}
	}

	#[must_use]
	pub fn data_key(&self) -> &str {
		&self.inner.data_key
	}

	#[must_use]
	pub fn page_name(&self) -> &str {
		&self.inner.page_name
	}

	#[must_use]
	pub fn value(&self) -> Duration {
		self.inner.value.get()
	}

	#[must_use]
	pub fn is_running(&self) -> bool {
		self.inner.handle.get().is_some()
	}

	pub fn on_increment(&self, callback: impl Fn(Duration) + 'static) {
		*self.inner.on_increment.borrow_mut() = Some(Rc::new(callback));
	}

	pub fn on_clear(&self, callback: impl Fn() + 'static) {
		*self.inner.on_clear.borrow_mut() = Some(Rc::new(callback));
	}

	/// Adds one second and returns the new value.
	pub fn increment(&self) -> Duration {
		increment(&self.inner)
	}

	/// Starts the interval. Does nothing if already running.
	pub fn start(&self) {
		if self.is_running() {
			return;
		}
		let weak: Weak<TimerInner> = Rc::downgrade(&self.inner);
		let handle = self.inner.platform.set_interval(
			self.inner.period,
			Rc::new(move || {
				if let Some(inner) = weak.upgrade() {
					let value = increment(&inner);
					let callback = inner.on_increment.borrow().clone();
					if let Some(callback) = callback {
						callback(value);
					}
				}
			}),
		);
		self.inner.handle.set(Some(handle));
		trace!(data_key = %self.inner.data_key, "Timer started.");
	}

	/// Stops the interval and releases both callbacks.
	pub fn clear(&self) {
		if let Some(handle) = self.inner.handle.take() {
			self.inner.platform.clear(handle);
		}
		self.inner.on_increment.borrow_mut().take();
		let on_clear = self.inner.on_clear.borrow_mut().take();
		if let Some(on_clear) = on_clear {
			on_clear();
		}
		trace!(data_key = %self.inner.data_key, "Timer cleared.");
	}
}

fn increment(inner: &TimerInner) -> Duration {
	let value = inner.value.get() + inner.step;
	inner.value.set(value);
	value
}

/// At most one [`Timer`] per data key.
#[derive(Default)]
pub struct Timers {
	timers: HashMap<String, Timer>,
}

impl Timers {
	#[must_use]
	pub fn get(&self, data_key: &str) -> Option<&Timer> {
		self.timers.get(data_key)
	}

	/// Inserts `timer`, clearing the one it replaces.
	pub fn set(&mut self, timer: Timer) -> &Timer {
		let data_key = timer.data_key().to_owned();
		if let Some(previous) = self.timers.insert(data_key.clone(), timer) {
			previous.clear();
		}
		&self.timers[&data_key]
	}

	/// Clears and discards the timer for `data_key`.
	pub fn remove(&mut self, data_key: &str) -> Option<Timer> {
		let timer = self.timers.remove(data_key)?;
		timer.clear();
		Some(timer)
	}

	/// Takes the timers owned by `page_name` out of the registry without clearing them.
	///
	/// The caller must [`Timer::clear`] each of them.
	#[must_use]
	pub fn take_for_page(&mut self, page_name: &str) -> Vec<Timer> {
		let keys: Vec<String> = self.timers.values().filter(|timer| timer.page_name() == page_name).map(|timer| timer.data_key().to_owned()).collect();
		keys.iter().filter_map(|key| self.timers.remove(key)).collect()
	}

	/// Clears and discards every timer owned by `page_name`. Returns how many were removed.
	pub fn remove_for_page(&mut self, page_name: &str) -> usize {
		let timers = self.take_for_page(page_name);
		for timer in &timers {
			timer.clear();
		}
		timers.len()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.timers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.timers.is_empty()
	}
}
