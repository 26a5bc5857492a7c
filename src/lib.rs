pub mod macros;

mod batch;
mod cell;
mod computed;
mod future;
mod listenable;
mod listeners;
mod merge;
mod microtask;
mod scope;
mod task;

pub use batch::{batch, flush, in_batch};
pub use cell::{Toggle, ValueCell};
pub use computed::Computed;
pub use future::AsyncComputed;
pub use listenable::Listenable;
pub use listeners::{Listener, ListenerId, Listeners};
pub use merge::MergedListenable;
pub use scope::ListenerScope;
pub use task::ScheduledTask;

/// The one capability every notification source satisfies: a
/// no-argument "something changed" callback can be registered and
/// later removed through the handle returned at registration.
pub trait Listen: 'static {
	/// Register `listener`; it fires on every change signal.
	fn add_listener(&self, listener: Listener) -> ListenerId;

	/// Remove the registration behind `id`. Unknown handles are
	/// ignored.
	fn remove_listener(&self, id: ListenerId);
}
