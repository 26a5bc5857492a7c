use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::listeners::Listeners;
use crate::{Listen, Listenable, Listener, ListenerId};

/// A logical union over N notification sources: a listener attached to
/// the merge fires whenever any member fires. The merge does no
/// coalescing of its own; a member that fires relays straight through,
/// so up to N deliveries per turn reach each listener and it is the
/// consumer's [`ScheduledTask`](crate::ScheduledTask) that collapses
/// them.
///
/// Relay subscriptions on the members exist only while the merge has
/// listeners of its own: attached on the first add, detached on the
/// last remove.
pub struct MergedListenable {
	body: Rc<MergeBody>,
}

struct MergeBody {
	sources: Vec<Listenable>,
	listeners: Listeners,
	relays: RefCell<SmallVec<[ListenerId; 4]>>,
	this: Weak<MergeBody>,
}

impl Clone for MergedListenable {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl MergedListenable {
	pub fn new(sources: Vec<Listenable>) -> Self {
		MergedListenable {
			body: Rc::new_cyclic(|this| MergeBody {
				sources,
				listeners: Listeners::new(),
				relays: RefCell::new(SmallVec::new()),
				this: this.clone(),
			}),
		}
	}

	pub fn add_listener(&self, listener: Listener) -> ListenerId {
		self.body.add_listener(listener)
	}

	pub fn remove_listener(&self, id: ListenerId) {
		self.body.remove_listener(id)
	}
}

impl MergeBody {
	fn attach(&self) {
		let mut relays = self.relays.borrow_mut();
		debug_assert!(relays.is_empty());

		for source in &self.sources {
			let this = self.this.clone();
			relays.push(source.add_listener(Rc::new(move || {
				if let Some(body) = this.upgrade() {
					body.listeners.notify();
				}
			})));
		}
	}

	fn detach(&self) {
		let relays: SmallVec<[ListenerId; 4]> =
			self.relays.borrow_mut().drain(..).collect();

		for (source, relay) in self.sources.iter().zip(relays) {
			source.remove_listener(relay);
		}
	}
}

impl Drop for MergeBody {
	fn drop(&mut self) {
		self.detach();
	}
}

impl Listen for MergeBody {
	fn add_listener(&self, listener: Listener) -> ListenerId {
		if self.listeners.is_empty() {
			self.attach();
		}

		self.listeners.add(listener)
	}

	fn remove_listener(&self, id: ListenerId) {
		if self.listeners.remove(id) && self.listeners.is_empty() {
			self.detach();
		}
	}
}

impl From<&MergedListenable> for Listenable {
	fn from(merge: &MergedListenable) -> Self {
		Listenable::new(merge.body.clone())
	}
}
