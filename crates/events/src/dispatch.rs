//! Fan-out and join of one published event.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use tracing::{error, warn};

use eventbus_core::{EventType, SubscriptionHandle};

use crate::{Event, PanicPolicy, Subscriber};

/// Run every subscriber on its own scoped thread and wait for all of them.
///
/// Under [`PanicPolicy::Propagate`] a subscriber panic is resumed on the
/// calling thread with its original payload, but only after every other
/// invocation has been joined. If several subscribers panic, the first one
/// joined wins.
pub(crate) fn fan_out<D>(
    event_type: &EventType,
    event: &Event<D>,
    subscribers: &[(SubscriptionHandle, Subscriber<D>)],
    policy: PanicPolicy,
) where
    D: Clone + Send,
{
    let first_panic = thread::scope(|scope| {
        let mut running = Vec::with_capacity(subscribers.len());

        for (handle, subscriber) in subscribers {
            let handle = *handle;
            let own_copy = event.clone();

            let spawned = thread::Builder::new()
                .name(format!("eventbus-sub-{handle}"))
                .spawn_scoped(scope, move || {
                    deliver(event_type, handle, subscriber, own_copy, policy)
                });

            match spawned {
                Ok(join) => running.push(join),
                Err(err) => {
                    warn!(%event_type, %handle, error = %err, "could not spawn subscriber thread; delivering inline");
                    deliver(event_type, handle, subscriber, event.clone(), policy);
                }
            }
        }

        // Join explicitly so the scope does not replace the payload with its own.
        let mut first_panic = None;
        for join in running {
            if let Err(payload) = join.join() {
                first_panic.get_or_insert(payload);
            }
        }
        first_panic
    });

    if let Some(payload) = first_panic {
        panic::resume_unwind(payload);
    }
}

fn deliver<D>(
    event_type: &EventType,
    handle: SubscriptionHandle,
    subscriber: &Subscriber<D>,
    event: Event<D>,
    policy: PanicPolicy,
) {
    match policy {
        PanicPolicy::Propagate => subscriber(event),
        PanicPolicy::Isolate => {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| subscriber(event))) {
                error!(
                    %event_type,
                    %handle,
                    panic = panic_message(payload.as_ref()),
                    "subscriber panicked"
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn extracts_panic_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");

        let payload: Box<dyn Any + Send> = Box::new(17_u8);
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic payload>");
    }

    #[test]
    fn runs_each_subscriber_off_the_calling_thread() {
        let caller = thread::current().id();
        let off_thread = Arc::new(AtomicUsize::new(0));

        let subscribers: Vec<(SubscriptionHandle, Subscriber<()>)> = (1..=3)
            .map(|n| {
                let off_thread = off_thread.clone();
                let subscriber: Subscriber<()> = Arc::new(move |_: Event<()>| {
                    if thread::current().id() != caller {
                        off_thread.fetch_add(1, Ordering::SeqCst);
                    }
                });
                (SubscriptionHandle::from_u64(n), subscriber)
            })
            .collect();

        fan_out(
            &EventType::from("tick"),
            &Event::new("tick", "test", ()),
            &subscribers,
            PanicPolicy::Propagate,
        );

        assert_eq!(off_thread.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn propagate_resumes_the_subscriber_payload() {
        fn fails(_: Event<()>) {
            panic!("disk full");
        }

        let finished = Arc::new(AtomicUsize::new(0));
        let failing: Subscriber<()> = Arc::new(fails);
        let slow: Subscriber<()> = {
            let finished = finished.clone();
            Arc::new(move |_: Event<()>| {
                thread::sleep(std::time::Duration::from_millis(30));
                finished.fetch_add(1, Ordering::SeqCst);
            })
        };
        let subscribers = vec![
            (SubscriptionHandle::from_u64(1), failing),
            (SubscriptionHandle::from_u64(2), slow),
        ];

        let payload = panic::catch_unwind(AssertUnwindSafe(|| {
            fan_out(
                &EventType::from("tick"),
                &Event::new("tick", "test", ()),
                &subscribers,
                PanicPolicy::Propagate,
            )
        }))
        .unwrap_err();

        assert_eq!(panic_message(payload.as_ref()), "disk full");
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
