use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;

/// A registered change callback.
pub type Listener = Rc<dyn Fn()>;

/// Identifies one registration. Closures have no usable identity in
/// Rust, so removal goes through this handle instead of the listener
/// itself. Ids come from one thread-local counter, so a handle issued
/// by one registry is unknown to every other registry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ListenerId(u64);

thread_local! {
	static NEXT_ID: Cell<u64> = Cell::new(0);
}

fn next_id() -> ListenerId {
	NEXT_ID.with(|next| {
		let id = next.get();
		next.set(id + 1);
		ListenerId(id)
	})
}

/// Listener registry shared by every notification source in this
/// crate. All listeners fire on notify; registration order carries no
/// meaning.
#[derive(Default)]
pub struct Listeners {
	entries: RefCell<SmallVec<[(ListenerId, Listener); 2]>>,
}

impl Listeners {
	pub fn new() -> Self {
		Listeners {
			entries: RefCell::new(SmallVec::new()),
		}
	}

	pub fn add(&self, listener: Listener) -> ListenerId {
		let id = next_id();
		self.entries.borrow_mut().push((id, listener));
		id
	}

	pub fn remove(&self, id: ListenerId) -> bool {
		let mut entries = self.entries.borrow_mut();
		match entries.iter().position(|(entry, _)| *entry == id) {
			Some(index) => {
				entries.remove(index);
				true
			}
			None => false,
		}
	}

	pub fn clear(&self) {
		self.entries.borrow_mut().clear();
	}

	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Calls every listener registered at the moment of the call. The
	/// set is snapshotted first, so a listener may add or remove
	/// listeners while the notification runs.
	pub fn notify(&self) {
		let snapshot: SmallVec<[Listener; 8]> = self
			.entries
			.borrow()
			.iter()
			.map(|(_, listener)| listener.clone())
			.collect();

		for listener in snapshot {
			listener();
		}
	}
}
