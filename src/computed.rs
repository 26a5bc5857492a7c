use std::cell::{Cell, Ref, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::listeners::Listeners;
use crate::merge::MergedListenable;
use crate::task::ScheduledTask;
use crate::{Listen, Listenable, Listener, ListenerId};

/// A lazily-initialized, memoized value derived from a fixed
/// dependency list. The compute function runs on the first read and
/// again, once per turn, after any dependency fires; plain reads never
/// recompute.
pub struct Computed<T> {
	body: Rc<ComputedBody<T>>,
}

struct ComputedBody<T> {
	value: RefCell<Option<T>>,
	initialized: Cell<bool>,
	func: Box<dyn Fn() -> T>,
	deps: MergedListenable,
	listeners: Listeners,
	recompute: ScheduledTask,
}

impl<T> Clone for Computed<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Computed<T>
where
	T: 'static,
{
	pub fn new(deps: Vec<Listenable>, func: impl Fn() -> T + 'static) -> Self {
		Computed {
			body: Rc::new_cyclic(|this: &Weak<ComputedBody<T>>| {
				let this = this.clone();
				ComputedBody {
					value: RefCell::new(None),
					initialized: Cell::new(false),
					func: Box::new(func),
					deps: MergedListenable::new(deps),
					listeners: Listeners::new(),
					recompute: ScheduledTask::new(move || {
						if let Some(body) = this.upgrade() {
							body.recompute();
						}
					}),
				}
			}),
		}
	}

	/// Returns the cached value, computing it first if this is the
	/// first read. A panicking compute function propagates to the
	/// caller and leaves the cell uninitialized, so the next read
	/// retries.
	pub fn get(&self) -> Ref<'_, T> {
		self.body.ensure_initialized();
		Ref::map(self.body.value.borrow(), |value| value.as_ref().unwrap())
	}

	/// Overwrites the cached value and notifies listeners right away,
	/// bypassing the compute function. Initialization state is left
	/// alone: dependencies are not subscribed by a force, and the next
	/// dependency-triggered recompute overwrites the forced value.
	pub fn force_value(&self, value: T) {
		*self.body.value.borrow_mut() = Some(value);
		self.body.listeners.notify();
	}

	pub fn add_listener(&self, listener: Listener) -> ListenerId {
		self.body.listeners.add(listener)
	}

	pub fn remove_listener(&self, id: ListenerId) {
		self.body.listeners.remove(id);
	}

	pub fn clear_listeners(&self) {
		self.body.listeners.clear();
	}
}

impl<T> ComputedBody<T>
where
	T: 'static,
{
	fn ensure_initialized(&self) {
		if self.initialized.get() {
			return;
		}

		let value = (self.func)();
		*self.value.borrow_mut() = Some(value);
		self.initialized.set(true);

		// Subscribed for the rest of the cell's lifetime.
		let recompute = self.recompute.clone();
		self.deps.add_listener(Rc::new(move || recompute.invoke()));
	}

	fn recompute(&self) {
		tracing::trace!("recomputing");

		// A panic here propagates through the flush, leaves the
		// previous value in place and notifies nobody.
		let value = (self.func)();
		*self.value.borrow_mut() = Some(value);
		self.listeners.notify();
	}
}

impl<T: 'static> Listen for ComputedBody<T> {
	fn add_listener(&self, listener: Listener) -> ListenerId {
		self.listeners.add(listener)
	}

	fn remove_listener(&self, id: ListenerId) {
		self.listeners.remove(id);
	}
}

impl<T> From<&Computed<T>> for Listenable
where
	T: 'static,
{
	fn from(computed: &Computed<T>) -> Self {
		Listenable::new(computed.body.clone())
	}
}

impl<T> Debug for Computed<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.body.value.borrow().fmt(f)
	}
}
