use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::listeners::Listeners;
use crate::task::ScheduledTask;
use crate::{Listen, Listenable, Listener, ListenerId};

/// A mutable single-value container that notifies its listeners, once
/// per turn, whenever the stored value actually changes. Listeners are
/// only ever informed through the cell's [`ScheduledTask`], never
/// synchronously from `set`.
pub struct ValueCell<T> {
	body: Rc<CellBody<T>>,
}

struct CellBody<T> {
	value: RefCell<T>,
	listeners: Listeners,
	notify: ScheduledTask,
}

impl<T> Clone for ValueCell<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for ValueCell<T>
where
	T: Default + PartialEq + 'static,
{
	fn default() -> Self {
		ValueCell::new(Default::default())
	}
}

pub trait Toggle {
	fn toggle(&mut self);
}

impl Toggle for bool {
	fn toggle(&mut self) {
		*self = !*self
	}
}

impl<T> ValueCell<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self {
		ValueCell {
			body: Rc::new_cyclic(|this: &Weak<CellBody<T>>| {
				let this = this.clone();
				CellBody {
					value: RefCell::new(value),
					listeners: Listeners::new(),
					notify: ScheduledTask::new(move || {
						if let Some(body) = this.upgrade() {
							body.listeners.notify();
						}
					}),
				}
			}),
		}
	}

	#[inline]
	pub fn get(&self) -> Ref<'_, T> {
		self.body.value.borrow()
	}

	/// Stores `value` and schedules a notification turn. A value that
	/// compares equal to the current one is absorbed with no effect.
	#[inline]
	pub fn set(&self, value: T)
	where
		T: PartialEq,
	{
		let _ = self.replace(value);
	}

	pub fn replace(&self, value: T) -> T
	where
		T: PartialEq,
	{
		let old = std::mem::replace(&mut *self.body.value.borrow_mut(), value);

		if old != *self.body.value.borrow() {
			self.body.notify.invoke();
		}

		old
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Clone + PartialEq,
	{
		let old = self.body.value.borrow().clone();
		func(&mut self.body.value.borrow_mut());

		if *self.body.value.borrow() != old {
			self.body.notify.invoke();
		}
	}

	#[inline]
	pub fn toggle(&self)
	where
		T: Toggle + Clone + PartialEq,
	{
		self.update(T::toggle)
	}

	pub fn add_listener(&self, listener: Listener) -> ListenerId {
		self.body.listeners.add(listener)
	}

	pub fn remove_listener(&self, id: ListenerId) {
		self.body.listeners.remove(id);
	}

	/// Drops every registered listener. Owners call this on teardown
	/// so no listener outlives the consumer that registered it.
	pub fn clear_listeners(&self) {
		self.body.listeners.clear();
	}

	pub fn listener_count(&self) -> usize {
		self.body.listeners.len()
	}
}

impl<T: 'static> Listen for CellBody<T> {
	fn add_listener(&self, listener: Listener) -> ListenerId {
		self.listeners.add(listener)
	}

	fn remove_listener(&self, id: ListenerId) {
		self.listeners.remove(id);
	}
}

impl<T> From<&ValueCell<T>> for Listenable
where
	T: 'static,
{
	fn from(cell: &ValueCell<T>) -> Self {
		Listenable::new(cell.body.clone())
	}
}

impl<T> Debug for ValueCell<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get().fmt(f)
	}
}
