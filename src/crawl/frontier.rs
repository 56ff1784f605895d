// src/crawl/frontier.rs
// =============================================================================
// The frontier: a bounded, blocking queue of admitted URLs waiting to be
// fetched.
//
// How it works:
// - push() waits while the queue is at capacity (this is the backpressure
//   valve - a page with 10,000 links throttles the worker that found them
//   instead of piling up 10,000 pending pushes)
// - pop() waits until a URL shows up, or returns None once the frontier is
//   closed and empty
// - close() is idempotent and wakes everyone who is waiting
//
// Liveness:
// The workers are both the producers and the consumers of this queue. If
// every worker were stuck in push() with a full queue, nobody would be left
// to pop and the crawl would hang forever. So the frontier knows how many
// producers exist, and the last producer that is not already stalled is
// allowed to push past capacity. The overflow is limited to the children of
// the one page that producer is draining.
//
// Rust concepts:
// - tokio::sync::Notify: async "wake me up" signal, used for not-empty and
//   not-full
// - Mutex<State>: the queue and its flags change together under one lock
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::Notify;
use tracing::debug;
use url::Url;

/// Default number of URLs the frontier holds before push() starts blocking.
pub const DEFAULT_FRONTIER_CAPACITY: usize = 256;

/// Returned by push() after the frontier has been closed.
///
/// Under correct bookkeeping nobody pushes after close, because close only
/// happens once there is no reserved work left.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("the frontier is closed")]
pub struct FrontierClosed;

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<Url>,
    closed: bool,
    stalled_producers: usize,
    peak: usize,
}

#[derive(Debug)]
pub struct Frontier {
    state: Mutex<State>,
    capacity: usize,
    producers: usize,
    not_empty: Notify,
    not_full: Notify,
}

impl Frontier {
    // Creates a frontier holding at most `capacity` URLs, shared by
    // `producers` workers that may push into it
    //
    // Both values are clamped to at least 1.
    pub fn new(capacity: usize, producers: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            capacity: capacity.max(1),
            producers: producers.max(1),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest number of URLs that were ever queued at the same time.
    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Adds a URL to the back of the queue, waiting while the queue is full.
    ///
    /// Not cancel-safe: dropping the future while it waits for room leaves
    /// this call counted as a stalled producer. Workers always drive it to
    /// completion.
    pub async fn push(&self, url: Url) -> Result<(), FrontierClosed> {
        let mut stalled = false;

        loop {
            // Register for the wakeup BEFORE looking at the state, otherwise a
            // pop() between our check and our await would be missed
            let room = self.not_full.notified();
            tokio::pin!(room);
            room.as_mut().enable();

            {
                let mut state = self.lock();

                if state.closed {
                    if stalled {
                        state.stalled_producers -= 1;
                    }
                    return Err(FrontierClosed);
                }

                let others_stalled = state.stalled_producers - usize::from(stalled);
                let has_room = state.queue.len() < self.capacity;
                let last_producer_standing = others_stalled + 1 >= self.producers;

                if has_room || last_producer_standing {
                    if !has_room {
                        debug!(
                            url = %url,
                            queued = state.queue.len(),
                            "every other worker is stalled, pushing past frontier capacity"
                        );
                    }
                    if stalled {
                        state.stalled_producers -= 1;
                    }
                    state.queue.push_back(url);
                    state.peak = state.peak.max(state.queue.len());
                    drop(state);
                    self.not_empty.notify_one();
                    return Ok(());
                }

                if !stalled {
                    state.stalled_producers += 1;
                    stalled = true;
                }
            }

            room.await;
        }
    }

    /// Takes the next URL, waiting until one is available.
    ///
    /// Returns None once the frontier is closed and has nothing left.
    pub async fn pop(&self) -> Option<Url> {
        loop {
            let ready = self.not_empty.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(url) = state.queue.pop_front() {
                    drop(state);
                    self.not_full.notify_one();
                    return Some(url);
                }
                if state.closed {
                    return None;
                }
            }

            ready.await;
        }
    }

    /// Closes the frontier and wakes every waiting push() and pop().
    ///
    /// Returns true only for the call that actually closed it.
    pub fn close(&self) -> bool {
        {
            let mut state = self.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
        }

        self.not_empty.notify_waiters();
        self.not_full.notify_waiters();
        true
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not just use tokio::sync::mpsc?
//    - An mpsc channel has exactly one receiver, but we have N workers popping
//    - The channel only closes when every sender is dropped, and our workers
//      are senders too - so it would never close on its own
//    - We also need to count stalled producers, which a channel can't tell us
//
// 2. What does enable() do on a Notified future?
//    - notify_waiters() only wakes futures that are already registered
//    - enable() registers the future without awaiting it yet
//    - We register first, then check the queue, then await - no lost wakeups
//
// 3. Why std::sync::Mutex inside async code?
//    - The lock is only held for a few lines and never across an .await
//    - That makes a plain blocking mutex fine (and cheaper than tokio's)
// -----------------------------------------------------------------------------
