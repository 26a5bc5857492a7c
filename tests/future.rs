use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::FutureExt;
use listenable::{batch, deps, AsyncComputed, ValueCell};
use tokio::sync::oneshot;
use tokio::task::LocalSet;

async fn settled() {
	for _ in 0..10 {
		tokio::task::yield_now().await;
	}
}

#[tokio::test]
async fn placeholder_then_success() {
	LocalSet::new()
		.run_until(async {
			let trigger = ValueCell::new(0);
			let (tx, rx) = oneshot::channel::<i32>();
			let rx = Rc::new(RefCell::new(Some(rx)));

			let comp = AsyncComputed::new(deps![trigger], {
				let rx = rx.clone();
				move || {
					let rx = rx.borrow_mut().take().unwrap();
					async move { anyhow::Ok(rx.await?) }.boxed_local()
				}
			})
			.before_update(|| Some(0));

			let fired = Rc::new(Cell::new(0));
			comp.add_listener(Rc::new({
				let fired = fired.clone();
				move || fired.set(fired.get() + 1)
			}));

			assert_eq!(comp.get().as_deref(), Some(&0));
			assert!(comp.loading());
			assert_eq!(fired.get(), 0);

			tx.send(42).unwrap();
			settled().await;

			assert_eq!(comp.get().as_deref(), Some(&42));
			assert!(!comp.loading());
			assert!(comp.error().is_none());
			assert_eq!(fired.get(), 1);
		})
		.await;
}

#[tokio::test]
async fn failure_keeps_placeholder() {
	LocalSet::new()
		.run_until(async {
			let trigger = ValueCell::new(0);
			let errors = Rc::new(Cell::new(0));

			let comp = AsyncComputed::new(deps![trigger], move || {
				async move { Err(anyhow::anyhow!("backend unavailable")) }.boxed_local()
			})
			.before_update(|| Some(0))
			.on_error({
				let errors = errors.clone();
				move |_| errors.set(errors.get() + 1)
			});

			let fired = Rc::new(Cell::new(0));
			comp.add_listener(Rc::new({
				let fired = fired.clone();
				move || fired.set(fired.get() + 1)
			}));

			assert_eq!(comp.get().as_deref(), Some(&0));
			settled().await;

			assert_eq!(comp.get().as_deref(), Some(&0));
			assert!(comp.error().is_some());
			assert!(!comp.loading());
			assert_eq!(errors.get(), 1);
			assert_eq!(fired.get(), 0);
		})
		.await;
}

#[tokio::test]
async fn dependency_retriggers_computation() {
	LocalSet::new()
		.run_until(async {
			let trigger = ValueCell::new(1);
			let calls = Rc::new(Cell::new(0));

			let comp = AsyncComputed::new(deps![trigger], {
				let trigger = trigger.clone();
				let calls = calls.clone();
				move || {
					calls.set(calls.get() + 1);
					let value = *trigger.get();
					async move { anyhow::Ok(value * 10) }.boxed_local()
				}
			});

			assert!(comp.get().is_none());
			assert_eq!(calls.get(), 1);
			settled().await;
			assert_eq!(comp.get().as_deref(), Some(&10));

			batch(|| trigger.set(2));
			assert_eq!(calls.get(), 2);
			assert!(comp.loading());

			settled().await;
			assert_eq!(comp.get().as_deref(), Some(&20));
			assert!(!comp.loading());
		})
		.await;
}

#[tokio::test]
async fn placeholder_reapplied_on_retrigger() {
	LocalSet::new()
		.run_until(async {
			let trigger = ValueCell::new(1);

			let comp = AsyncComputed::new(deps![trigger], {
				let trigger = trigger.clone();
				move || {
					let value = *trigger.get();
					async move { anyhow::Ok(value * 10) }.boxed_local()
				}
			})
			.before_update(|| Some(0));

			assert_eq!(comp.get().as_deref(), Some(&0));
			settled().await;
			assert_eq!(comp.get().as_deref(), Some(&10));

			// A dependency fire swaps the placeholder back in while
			// the new computation is in flight.
			batch(|| trigger.set(2));
			assert_eq!(comp.get().as_deref(), Some(&0));
			assert!(comp.loading());

			settled().await;
			assert_eq!(comp.get().as_deref(), Some(&20));
			assert!(!comp.loading());
		})
		.await;
}

#[tokio::test]
async fn success_clears_previous_error() {
	LocalSet::new()
		.run_until(async {
			let trigger = ValueCell::new(0);
			let fail = Rc::new(Cell::new(true));

			let comp = AsyncComputed::new(deps![trigger], {
				let fail = fail.clone();
				move || {
					let fail = fail.get();
					async move {
						if fail {
							Err(anyhow::anyhow!("transient"))
						} else {
							Ok(7)
						}
					}
					.boxed_local()
				}
			});

			assert!(comp.get().is_none());
			settled().await;
			assert!(comp.error().is_some());

			fail.set(false);
			batch(|| trigger.set(1));
			settled().await;

			assert_eq!(comp.get().as_deref(), Some(&7));
			assert!(comp.error().is_none());
		})
		.await;
}

#[tokio::test]
async fn stale_settlement_overwrites() {
	LocalSet::new()
		.run_until(async {
			let trigger = ValueCell::new(0);
			let (slow_tx, slow_rx) = oneshot::channel::<i32>();
			let (fast_tx, fast_rx) = oneshot::channel::<i32>();
			let pending = Rc::new(RefCell::new(VecDeque::from([slow_rx, fast_rx])));

			let comp = AsyncComputed::new(deps![trigger], {
				let pending = pending.clone();
				move || {
					let rx = pending.borrow_mut().pop_front().unwrap();
					async move { anyhow::Ok(rx.await?) }.boxed_local()
				}
			});

			assert!(comp.get().is_none());
			batch(|| trigger.set(1));

			fast_tx.send(2).unwrap();
			settled().await;
			assert_eq!(comp.get().as_deref(), Some(&2));

			// No generation guard: the stale computation settles last
			// and wins.
			slow_tx.send(1).unwrap();
			settled().await;
			assert_eq!(comp.get().as_deref(), Some(&1));
			assert!(!comp.loading());
		})
		.await;
}
