use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;

use crate::listeners::Listeners;
use crate::merge::MergedListenable;
use crate::task::ScheduledTask;
use crate::{batch, Listen, Listenable, Listener, ListenerId};

type ComputeFn<T> = Box<dyn Fn() -> LocalBoxFuture<'static, anyhow::Result<T>>>;

/// Like [`Computed`](crate::Computed), but the recomputation is
/// asynchronous. Exposes the last successful value, the last error and
/// an in-flight flag. An optional [`before_update`](Self::before_update)
/// producer supplies a synchronous placeholder while a computation
/// settles.
///
/// Listeners are notified on success only; a failed computation stores
/// its error, calls [`on_error`](Self::on_error) and keeps the cached
/// value as-is.
///
/// On native targets the computation is spawned with
/// `tokio::task::spawn_local`, so a read that triggers a recompute
/// must happen inside a `tokio::task::LocalSet`.
pub struct AsyncComputed<T> {
	body: Rc<AsyncBody<T>>,
}

struct AsyncBody<T> {
	value: RefCell<Option<T>>,
	error: RefCell<Option<Rc<anyhow::Error>>>,
	loading: Cell<bool>,
	initialized: Cell<bool>,
	func: ComputeFn<T>,
	before_update: RefCell<Option<Box<dyn Fn() -> Option<T>>>>,
	on_error: RefCell<Option<Box<dyn Fn(&anyhow::Error)>>>,
	deps: MergedListenable,
	listeners: Listeners,
	begin: ScheduledTask,
	this: Weak<AsyncBody<T>>,
}

impl<T> Clone for AsyncComputed<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> AsyncComputed<T>
where
	T: 'static,
{
	pub fn new(
		deps: Vec<Listenable>,
		func: impl Fn() -> LocalBoxFuture<'static, anyhow::Result<T>> + 'static,
	) -> Self {
		AsyncComputed {
			body: Rc::new_cyclic(|this: &Weak<AsyncBody<T>>| {
				let weak = this.clone();
				AsyncBody {
					value: RefCell::new(None),
					error: RefCell::new(None),
					loading: Cell::new(false),
					initialized: Cell::new(false),
					func: Box::new(func),
					before_update: RefCell::new(None),
					on_error: RefCell::new(None),
					deps: MergedListenable::new(deps),
					listeners: Listeners::new(),
					begin: ScheduledTask::new(move || {
						if let Some(body) = weak.upgrade() {
							body.begin_recompute();
						}
					}),
					this: this.clone(),
				}
			}),
		}
	}

	/// Installs a producer for a synchronous placeholder, stored as
	/// the cached value each time a computation starts.
	pub fn before_update(self, func: impl Fn() -> Option<T> + 'static) -> Self {
		*self.body.before_update.borrow_mut() = Some(Box::new(func));
		self
	}

	/// Installs a callback invoked with every computation failure.
	pub fn on_error(self, func: impl Fn(&anyhow::Error) + 'static) -> Self {
		*self.body.on_error.borrow_mut() = Some(Box::new(func));
		self
	}

	/// Returns the last known value, if any. The first read subscribes
	/// dependencies and starts the first computation immediately.
	pub fn get(&self) -> Option<Ref<'_, T>> {
		self.body.ensure_initialized();
		Ref::filter_map(self.body.value.borrow(), Option::as_ref).ok()
	}

	/// The error of the most recent failed computation. Cleared by the
	/// next success.
	pub fn error(&self) -> Option<Rc<anyhow::Error>> {
		self.body.error.borrow().clone()
	}

	/// True from the start of a computation until it settles.
	pub fn loading(&self) -> bool {
		self.body.loading.get()
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

impl<T> AsyncBody<T>
where
	T: 'static,
{
	fn ensure_initialized(&self) {
		if self.initialized.replace(true) {
			return;
		}

		// Subscribed for the rest of the cell's lifetime.
		let begin = self.begin.clone();
		self.deps.add_listener(Rc::new(move || begin.invoke()));

		self.begin_recompute();
	}

	fn begin_recompute(&self) {
		self.loading.set(true);

		if let Some(before_update) = self.before_update.borrow().as_ref() {
			*self.value.borrow_mut() = before_update();
		}

		let future = (self.func)();
		let this = self.this.clone();

		spawn(async move {
			let result = future.await;

			let Some(body) = this.upgrade() else {
				return;
			};

			batch(|| body.settle(result));
		});
	}

	// Runs whenever a computation settles, however stale. There is no
	// generation guard: a slow earlier computation that settles after
	// a faster later one overwrites it.
	fn settle(&self, result: anyhow::Result<T>) {
		self.loading.set(false);

		match result {
			Ok(value) => {
				*self.value.borrow_mut() = Some(value);
				*self.error.borrow_mut() = None;
				self.listeners.notify();
			}
			Err(error) => {
				tracing::warn!(%error, "async computation failed");

				let error = Rc::new(error);
				*self.error.borrow_mut() = Some(error.clone());

				if let Some(on_error) = self.on_error.borrow().as_ref() {
					on_error(&error);
				}
			}
		}
	}
}

impl<T: 'static> Listen for AsyncBody<T> {
	fn add_listener(&self, listener: Listener) -> ListenerId {
		self.listeners.add(listener)
	}

	fn remove_listener(&self, id: ListenerId) {
		self.listeners.remove(id);
	}
}

impl<T> From<&AsyncComputed<T>> for Listenable
where
	T: 'static,
{
	fn from(computed: &AsyncComputed<T>) -> Self {
		Listenable::new(computed.body.clone())
	}
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn(future: impl std::future::Future<Output = ()> + 'static) {
	tokio::task::spawn_local(future);
}

#[cfg(target_arch = "wasm32")]
fn spawn(future: impl std::future::Future<Output = ()> + 'static) {
	wasm_bindgen_futures::spawn_local(future);
}
