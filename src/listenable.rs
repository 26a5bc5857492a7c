use std::rc::Rc;

use crate::{Listen, Listener, ListenerId};

/// A cheap cloneable handle over any notification source. Dependency
/// lists and merges are expressed in terms of this type so that cells,
/// merges and computed values stay interchangeable.
pub struct Listenable {
	source: Rc<dyn Listen>,
}

impl Clone for Listenable {
	fn clone(&self) -> Self {
		Listenable {
			source: self.source.clone(),
		}
	}
}

impl Listenable {
	pub fn new(source: Rc<dyn Listen>) -> Self {
		Listenable { source }
	}

	pub fn add_listener(&self, listener: Listener) -> ListenerId {
		self.source.add_listener(listener)
	}

	pub fn remove_listener(&self, id: ListenerId) {
		self.source.remove_listener(id)
	}
}
