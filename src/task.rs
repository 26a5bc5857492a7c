use std::cell::Cell;
use std::rc::Rc;

use crate::batch;

/// Wraps a callback so that any number of [`invoke`](Self::invoke)
/// calls within one scheduling turn run the callback at most once, on
/// the next turn boundary.
pub struct ScheduledTask {
	body: Rc<TaskBody>,
}

pub(crate) struct TaskBody {
	pending: Cell<bool>,
	callback: Box<dyn Fn()>,
}

impl Clone for ScheduledTask {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl ScheduledTask {
	pub fn new(callback: impl Fn() + 'static) -> Self {
		ScheduledTask {
			body: Rc::new(TaskBody {
				pending: Cell::new(false),
				callback: Box::new(callback),
			}),
		}
	}

	/// Queues the callback for the next turn. A no-op while a run is
	/// already pending for this task.
	pub fn invoke(&self) {
		if self.body.pending.replace(true) {
			return;
		}

		batch::enqueue(Rc::downgrade(&self.body));
	}

	pub fn is_pending(&self) -> bool {
		self.body.pending.get()
	}
}

impl TaskBody {
	pub(crate) fn run(&self) {
		// The pending marker is cleared only once the callback has
		// fully run, panic included, so a failed run never wedges the
		// task.
		struct Reset<'a>(&'a Cell<bool>);

		impl Drop for Reset<'_> {
			fn drop(&mut self) {
				self.0.set(false);
			}
		}

		let _reset = Reset(&self.pending);
		(self.callback)();
	}
}
