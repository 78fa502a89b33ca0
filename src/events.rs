//! The event bridge: bounded buffer plus multiplexing readers.
//!
//! Native callback notifications arrive on the transport's own thread;
//! streaming subscribers live on the cooperative scheduler. The bridge is
//! the only state shared between those two domains: a fixed-capacity ring
//! of events and the sequence counter, guarded together by one mutex, with
//! a [`Notify`] as the cross-thread wake primitive.
//!
//! Delivery is best-effort under bounded memory: when the ring is full the
//! oldest event is evicted, and a subscriber that lags behind eviction
//! silently misses the evicted events. Each subscriber tracks its own
//! position; none is affected by another's progress.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Notify;

/// One buffered callback event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub sequence_id: u64,
    pub payload: Value,
}

impl Event {
    /// Render this event as one server-sent-events frame.
    pub fn to_sse_frame(&self) -> String {
        format!("data: {}\n\n", self.payload)
    }
}

struct BufferState {
    next_id: u64,
    events: VecDeque<Event>,
}

struct Shared {
    state: Mutex<BufferState>,
    notify: Notify,
    capacity: usize,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Thread-safe bounded event buffer with async multiplexing readers.
#[derive(Clone)]
pub struct EventBridge {
    shared: Arc<Shared>,
}

impl EventBridge {
    /// Create a bridge holding at most `capacity` events.
    ///
    /// A zero capacity is clamped to one; an unbuffered bridge would drop
    /// every event before any reader could see it.
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BufferState {
                    next_id: 0,
                    events: VecDeque::new(),
                }),
                notify: Notify::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Push an event, evicting the oldest if the ring is full.
    ///
    /// Callable from any thread, including ones that are not part of the
    /// consuming scheduler. Returns the assigned sequence id. Waiting
    /// readers are woken after the lock is released.
    pub fn push(&self, payload: Value) -> u64 {
        let sequence_id;
        {
            let mut state = self.shared.lock();
            sequence_id = state.next_id;
            state.next_id += 1;
            while state.events.len() >= self.shared.capacity {
                state.events.pop_front();
            }
            state.events.push_back(Event {
                sequence_id,
                payload,
            });
        }
        self.shared.notify.notify_waiters();
        sequence_id
    }

    /// Start a new independent reader positioned before the oldest
    /// buffered event.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            shared: Arc::clone(&self.shared),
            last_seen: -1,
            pending: VecDeque::new(),
        }
    }

    /// Number of events currently buffered.
    pub fn len(&self) -> usize {
        self.shared.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One reader's cursor over the bridge.
///
/// Dropping the subscriber cancels its pull loop immediately; there is no
/// registration to unwind beyond the pending wake.
pub struct EventSubscriber {
    shared: Arc<Shared>,
    last_seen: i64,
    pending: VecDeque<Event>,
}

impl EventSubscriber {
    /// Snapshot the buffer and queue everything newer than `last_seen`.
    fn drain_new(&mut self) -> bool {
        let snapshot: Vec<Event> = {
            let state = self.shared.lock();
            state.events.iter().cloned().collect()
        };
        let mut found = false;
        for event in snapshot {
            if event.sequence_id as i64 > self.last_seen {
                self.last_seen = event.sequence_id as i64;
                self.pending.push_back(event);
                found = true;
            }
        }
        found
    }

    /// Receive the next unseen event, waiting if none is buffered.
    pub async fn recv(&mut self) -> Event {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }
            // Register interest before the snapshot so a push between the
            // check and the await cannot be lost.
            let shared = self.shared.clone();
            let notified = shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.drain_new() {
                continue;
            }
            notified.await;
        }
    }

    /// Receive the next unseen event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Event> {
        if self.pending.is_empty() {
            self.drain_new();
        }
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn payload(n: u64) -> Value {
        json!({ "n": n })
    }

    #[test]
    fn push_assigns_increasing_ids() {
        let bridge = EventBridge::new(4);
        assert_eq!(bridge.push(payload(0)), 0);
        assert_eq!(bridge.push(payload(1)), 1);
        assert_eq!(bridge.push(payload(2)), 2);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let bridge = EventBridge::new(3);
        for n in 0..10 {
            bridge.push(payload(n));
        }
        assert_eq!(bridge.len(), 3);
    }

    #[test]
    fn overflow_keeps_the_newest_events() {
        let bridge = EventBridge::new(3);
        for n in 0..5 {
            bridge.push(payload(n));
        }
        let mut subscriber = bridge.subscribe();
        let ids: Vec<u64> = std::iter::from_fn(|| subscriber.try_recv())
            .map(|e| e.sequence_id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn subscribers_are_independent() {
        let bridge = EventBridge::new(8);
        bridge.push(payload(0));
        let mut a = bridge.subscribe();
        let mut b = bridge.subscribe();
        assert_eq!(a.try_recv().unwrap().sequence_id, 0);
        // b's cursor is unaffected by a's progress.
        assert_eq!(b.try_recv().unwrap().sequence_id, 0);
        assert!(a.try_recv().is_none());
    }

    #[tokio::test]
    async fn recv_wakes_on_push_from_another_thread() {
        let bridge = EventBridge::new(8);
        let mut subscriber = bridge.subscribe();

        let pusher = {
            let bridge = bridge.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                bridge.push(payload(7));
            })
        };

        let event = tokio::time::timeout(Duration::from_secs(2), subscriber.recv())
            .await
            .expect("subscriber should be woken by the foreign-thread push");
        assert_eq!(event.payload, payload(7));
        pusher.join().unwrap();
    }

    #[tokio::test]
    async fn non_lagging_subscriber_sees_every_event_once_in_order() {
        let bridge = EventBridge::new(64);
        let mut subscriber = bridge.subscribe();
        for n in 0..20 {
            bridge.push(payload(n));
        }
        let mut seen = Vec::new();
        for _ in 0..20 {
            seen.push(subscriber.recv().await.sequence_id);
        }
        assert_eq!(seen, (0..20).collect::<Vec<u64>>());
        assert!(subscriber.try_recv().is_none());
    }

    #[test]
    fn sse_frame_format() {
        let event = Event {
            sequence_id: 3,
            payload: json!({"k": "v"}),
        };
        assert_eq!(event.to_sse_frame(), "data: {\"k\":\"v\"}\n\n");
    }
}
