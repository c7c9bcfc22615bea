//! Scheduling seam: spawning local futures, timeouts and intervals.
//!
//! The renderer is single-threaded and cooperative. Everything that runs "later" goes through a [`Platform`],
//! so the browser event loop and a deterministic manual clock are interchangeable.

use core::{cell::Cell, cell::RefCell, future::Future, time::Duration};
use futures::{
	executor::{LocalPool, LocalSpawner},
	future::LocalBoxFuture,
	task::{ArcWake, LocalSpawnExt},
};
use hashbrown::HashMap;
use std::{
	rc::Rc,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
};
use tracing::{error, trace, warn};

/// Handle returned by [`Platform::set_timeout`] and [`Platform::set_interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub(crate) u64);

pub trait Platform {
	/// Runs `future` to completion on the local event loop.
	fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);
	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle;
	fn set_interval(&self, period: Duration, callback: Rc<dyn Fn()>) -> TimerHandle;
	/// Cancels a timeout or interval. Unknown handles are ignored.
	fn clear(&self, handle: TimerHandle);
}

/// Set whenever the future driven by [`ManualPlatform::block_on`] is woken, from inside or outside the pool.
struct WakeFlag(AtomicBool);

impl ArcWake for WakeFlag {
	fn wake_by_ref(arc_self: &Arc<Self>) {
		arc_self.0.store(true, Ordering::SeqCst);
	}
}

enum Scheduled {
	Timeout(Box<dyn FnOnce()>),
	Interval { period: Duration, callback: Rc<dyn Fn()> },
}

struct Entry {
	due: Duration,
	scheduled: Scheduled,
}

/// A deterministic [`Platform`] driven by explicit calls to [`ManualPlatform::advance`] and [`ManualPlatform::run_until_stalled`].
pub struct ManualPlatform {
	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,
	now: Cell<Duration>,
	next: Cell<u64>,
	entries: RefCell<HashMap<TimerHandle, Entry>>,
}

impl Default for ManualPlatform {
	fn default() -> Self {
		Self::new()
	}
}

impl ManualPlatform {
	#[must_use]
	pub fn new() -> Self {
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		Self {
			pool: RefCell::new(pool),
			spawner,
			now: Cell::new(Duration::from_millis(0)),
			next: Cell::new(0),
			entries: RefCell::default(),
		}
	}

	/// Elapsed virtual time.
	#[must_use]
	pub fn now(&self) -> Duration {
		self.now.get()
	}

	/// Number of pending timeouts and intervals.
	#[must_use]
	pub fn scheduled_count(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Drives `future` and all spawned tasks until `future` completes.
	///
	/// When nothing can make progress, the clock jumps to the next scheduled timeout or interval.
	///
	/// # Panics
	///
	/// Iff `future` is still pending once no task, timeout or interval is left that could wake it,
	/// or if called re-entrantly from a task running on this platform.
	pub fn block_on<F: Future>(&self, future: F) -> F::Output {
		use core::task::{Context, Poll};

		let woken = Arc::new(WakeFlag(AtomicBool::new(true)));
		let waker = futures::task::waker(woken.clone());
		let mut cx = Context::from_waker(&waker);
		let mut future = Box::pin(future);
		loop {
			if woken.0.swap(false, Ordering::SeqCst) {
				if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
					return output;
				}
				continue;
			}
			let progressed = self.pool.borrow_mut().try_run_one();
			if progressed || self.fire_due() || woken.0.load(Ordering::SeqCst) {
				continue;
			}
			match self.next_due() {
				Some(due) => self.now.set(due.max(self.now.get())),
				None => panic!("`ManualPlatform::block_on` stalled: the future is pending and nothing is scheduled"),
			}
		}
	}

	/// Runs spawned tasks and due timeouts until nothing is left to do at the current time.
	pub fn run_until_stalled(&self) {
		loop {
			self.pool.borrow_mut().run_until_stalled();
			if !self.fire_due() {
				break;
			}
		}
	}

	/// Moves the clock forward, firing everything that becomes due in order.
	pub fn advance(&self, by: Duration) {
		let target = self.now.get() + by;
		self.run_until_stalled();
		while let Some(due) = self.next_due().filter(|&due| due <= target) {
			self.now.set(due.max(self.now.get()));
			self.run_until_stalled();
		}
		self.now.set(target);
		self.run_until_stalled();
	}

	fn next_due(&self) -> Option<Duration> {
		self.entries.borrow().values().map(|entry| entry.due).min()
	}

	/// Fires the earliest due entry. Returns whether anything ran.
	fn fire_due(&self) -> bool {
		let now = self.now.get();
		let handle = {
			let entries = self.entries.borrow();
			entries.iter().filter(|(_, entry)| entry.due <= now).min_by_key(|(handle, entry)| (entry.due, handle.0)).map(|(&handle, _)| handle)
		};
		let Some(handle) = handle else { return false };
		let entry = self.entries.borrow_mut().remove(&handle);
		match entry {
			Some(Entry { scheduled: Scheduled::Timeout(callback), .. }) => {
				trace!("Firing timeout {:?}.", handle);
				callback();
			}
			Some(Entry { due, scheduled: Scheduled::Interval { period, callback } }) => {
				trace!("Firing interval {:?}.", handle);
				self.entries.borrow_mut().insert(handle, Entry {
					due: due + period.max(Duration::from_millis(1)),
					scheduled: Scheduled::Interval { period, callback: callback.clone() },
				});
				callback();
			}
			None => return false,
		}
		true
	}

	fn schedule(&self, delay: Duration, scheduled: Scheduled) -> TimerHandle {
		let handle = TimerHandle(self.next.get());
		self.next.set(handle.0 + 1);
		self.entries.borrow_mut().insert(handle, Entry { due: self.now.get() + delay, scheduled });
		handle
	}
}

impl Platform for ManualPlatform {
	fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
		if let Err(error) = self.spawner.spawn_local(future) {
			error!("Failed to spawn task: {}", error);
		}
	}

	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
		self.schedule(delay, Scheduled::Timeout(callback))
	}

	fn set_interval(&self, period: Duration, callback: Rc<dyn Fn()>) -> TimerHandle {
		self.schedule(period, Scheduled::Interval { period, callback })
	}

	fn clear(&self, handle: TimerHandle) {
		self.entries.borrow_mut().remove(&handle);
	}
}

/// The browser event loop: [`wasm_bindgen_futures::spawn_local`] and `window.setTimeout`/`setInterval`.
///
/// Only functional on `wasm32` targets.
#[derive(Default)]
pub struct WebPlatform {
	next: Cell<u64>,
	handles: RefCell<HashMap<TimerHandle, (i32, bool)>>,
	intervals: RefCell<HashMap<TimerHandle, wasm_bindgen::closure::Closure<dyn Fn()>>>,
}

impl WebPlatform {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn next_handle(&self) -> TimerHandle {
		let handle = TimerHandle(self.next.get());
		self.next.set(handle.0 + 1);
		handle
	}
}

fn millis(duration: Duration) -> i32 {
	i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

impl Platform for WebPlatform {
	fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(future);
	}

	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
		use wasm_bindgen::{closure::Closure, JsCast};
		let handle = self.next_handle();
		let Some(window) = web_sys::window() else {
			warn!("No window; timeout dropped.");
			return handle;
		};
		let closure = Closure::once_into_js(callback);
		match window.set_timeout_with_callback_and_timeout_and_arguments_0(closure.unchecked_ref(), millis(delay)) {
			Ok(id) => {
				self.handles.borrow_mut().insert(handle, (id, false));
			}
			Err(error) => error!("setTimeout failed: {:?}", error),
		}
		handle
	}

	fn set_interval(&self, period: Duration, callback: Rc<dyn Fn()>) -> TimerHandle {
		use wasm_bindgen::{closure::Closure, JsCast};
		let handle = self.next_handle();
		let Some(window) = web_sys::window() else {
			warn!("No window; interval dropped.");
			return handle;
		};
		let closure = Closure::wrap(Box::new(move || callback()) as Box<dyn Fn()>);
		match window.set_interval_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), millis(period)) {
			Ok(id) => {
				self.handles.borrow_mut().insert(handle, (id, true));
				self.intervals.borrow_mut().insert(handle, closure);
			}
			Err(error) => error!("setInterval failed: {:?}", error),
		}
		handle
	}

	fn clear(&self, handle: TimerHandle) {
		let Some((id, interval)) = self.handles.borrow_mut().remove(&handle) else { return };
		if let Some(window) = web_sys::window() {
			if interval {
				window.clear_interval_with_handle(id);
			} else {
				window.clear_timeout_with_handle(id);
			}
		}
		self.intervals.borrow_mut().remove(&handle);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timeouts_fire_in_order() {
		let platform = ManualPlatform::new();
		let log = Rc::new(RefCell::new(Vec::new()));
		for (delay, tag) in [(20, "b"), (10, "a"), (30, "c")] {
			let log = log.clone();
			platform.set_timeout(Duration::from_millis(delay), Box::new(move || log.borrow_mut().push(tag)));
		}
		platform.advance(Duration::from_millis(25));
		assert_eq!(*log.borrow(), vec!["a", "b"]);
		platform.advance(Duration::from_millis(5));
		assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
	}

	#[test]
	fn intervals_repeat_until_cleared() {
		let platform = ManualPlatform::new();
		let count = Rc::new(Cell::new(0));
		let handle = {
			let count = count.clone();
			platform.set_interval(Duration::from_millis(1000), Rc::new(move || count.set(count.get() + 1)))
		};
		platform.advance(Duration::from_millis(3500));
		assert_eq!(count.get(), 3);
		platform.clear(handle);
		platform.advance(Duration::from_millis(3000));
		assert_eq!(count.get(), 3);
		assert_eq!(platform.scheduled_count(), 0);
	}

	#[test]
	fn block_on_drives_spawned_tasks() {
		let platform = Rc::new(ManualPlatform::new());
		let flag = Rc::new(Cell::new(false));
		{
			let flag = flag.clone();
			platform.spawn_local(Box::pin(async move { flag.set(true) }));
		}
		platform.block_on(async {});
		platform.run_until_stalled();
		assert!(flag.get());
	}

	#[test]
	fn block_on_follows_wakes_from_outside_the_pool() {
		let platform = ManualPlatform::new();
		let (sender, receiver) = futures::channel::oneshot::channel();
		let waiting = async { receiver.await.ok() };
		let sending = async {
			futures::future::ready(()).await;
			let _ = sender.send(7);
		};
		let (received, ()) = platform.block_on(futures::future::join(waiting, sending));
		assert_eq!(received, Some(7));
	}

	#[test]
	fn block_on_waits_for_timeouts() {
		let platform = Rc::new(ManualPlatform::new());
		let (sender, receiver) = futures::channel::oneshot::channel();
		platform.set_timeout(Duration::from_millis(250), Box::new(move || drop(sender.send("late"))));
		assert_eq!(platform.block_on(receiver), Ok("late"));
		assert_eq!(platform.now(), Duration::from_millis(250));
	}
}
