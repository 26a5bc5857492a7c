use std::rc::Rc;

use crate::{Listenable, Listener, ListenerId};

/// Pairs listener registrations with their teardown, scoped to one
/// consumer's lifetime: acquire on start, release on teardown. On
/// disposal every teardown callback runs first, then every registered
/// listener is removed. Disposal also happens on drop and is
/// idempotent.
pub struct ListenerScope {
	listeners: Vec<(Listenable, ListenerId)>,
	teardown: Vec<Box<dyn FnOnce()>>,
	disposed: bool,
}

impl Default for ListenerScope {
	fn default() -> Self {
		ListenerScope::new()
	}
}

impl ListenerScope {
	pub fn new() -> Self {
		ListenerScope {
			listeners: Vec::new(),
			teardown: Vec::new(),
			disposed: false,
		}
	}

	pub fn listen(&mut self, source: &Listenable, listener: impl Fn() + 'static) {
		self.add(source, Rc::new(listener), false)
	}

	/// Like [`listen`](Self::listen), but also invokes the listener
	/// once, immediately.
	pub fn listen_now(&mut self, source: &Listenable, listener: impl Fn() + 'static) {
		self.add(source, Rc::new(listener), true)
	}

	fn add(&mut self, source: &Listenable, listener: Listener, immediate: bool) {
		if immediate {
			listener();
		}

		let id = source.add_listener(listener);
		self.listeners.push((source.clone(), id));
	}

	pub fn on_dispose(&mut self, func: impl FnOnce() + 'static) {
		self.teardown.push(Box::new(func));
	}

	pub fn dispose(&mut self) {
		if self.disposed {
			return;
		}

		self.disposed = true;

		for func in self.teardown.drain(..) {
			func();
		}

		for (source, id) in self.listeners.drain(..) {
			source.remove_listener(id);
		}
	}
}

impl Drop for ListenerScope {
	fn drop(&mut self) {
		self.dispose();
	}
}
