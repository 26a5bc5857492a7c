use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Weak;

use crate::task::TaskBody;

thread_local! {
	static QUEUE: RefCell<VecDeque<Weak<TaskBody>>> = RefCell::new(VecDeque::new());
	static STARTED: Cell<bool> = Cell::new(false);
	static FLUSHING: Cell<bool> = Cell::new(false);
}

#[cfg(target_arch = "wasm32")]
thread_local! {
	static MICROTASK: Cell<bool> = Cell::new(false);
}

pub fn in_batch() -> bool {
	STARTED.with(|started| started.get())
}

/// Runs `func` with the turn queue held back, then drains the queue
/// once the outermost batch returns. Nested batches fold into the
/// outermost one.
pub fn batch<R>(func: impl FnOnce() -> R) -> R {
	let is_root = STARTED.with(|started| !started.replace(true));

	struct Stop(bool);

	impl Drop for Stop {
		fn drop(&mut self) {
			if self.0 {
				STARTED.with(|started| started.set(false));
			}
		}
	}

	let stop = Stop(is_root);
	let out = func();
	std::mem::drop(stop);

	if is_root {
		flush();
	}

	out
}

pub(crate) fn enqueue(task: Weak<TaskBody>) {
	QUEUE.with(|queue| queue.borrow_mut().push_back(task));

	#[cfg(target_arch = "wasm32")]
	if !in_batch() {
		schedule_microtask_flush();
	}
}

/// Drains the turn queue, running every scheduled task. Tasks queued
/// while draining run in the same pass. Reentrant calls return
/// immediately. A panicking task propagates to the caller; tasks
/// queued behind it stay queued for the next flush.
pub fn flush() {
	if FLUSHING.with(|flushing| flushing.replace(true)) {
		return;
	}

	struct Stop;

	impl Drop for Stop {
		fn drop(&mut self) {
			FLUSHING.with(|flushing| flushing.set(false));
		}
	}

	let _stop = Stop;

	loop {
		let task = QUEUE.with(|queue| queue.borrow_mut().pop_front());

		let Some(task) = task else {
			break;
		};

		if let Some(task) = task.upgrade() {
			tracing::trace!("running scheduled task");
			task.run();
		}
	}
}

#[cfg(target_arch = "wasm32")]
fn schedule_microtask_flush() {
	if MICROTASK.with(|scheduled| scheduled.replace(true)) {
		return;
	}

	crate::microtask::queue(|| {
		MICROTASK.with(|scheduled| scheduled.set(false));
		flush();
	});
}
