//! # Session Registry
//!
//! Shared table of live sessions keyed by remote address. Session tasks register
//! themselves before reading and remove themselves exactly once on teardown; the
//! keepalive task reads a snapshot of the logged-in entries.
//!
//! ## Locking
//! - One `tokio::sync::Mutex` guards the map
//! - Nothing is sent while the lock is held; broadcasts copy handles out first
//! - The logged-in count is mirrored in an atomic so synchronous handlers can read it
//! - Player slots are claimed with a compare-and-swap, so concurrent logins cannot
//!   overshoot the cap

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::core::packet::Packet;

/// Identity assigned at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub uuid: Uuid,
    pub name: String,
}

/// Registry view of one session: where to send packets and who it is.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    pub addr: SocketAddr,
    pub outbound: mpsc::Sender<Packet>,
    pub profile: Option<Profile>,
}

impl PlayerHandle {
    pub fn is_logged_in(&self) -> bool {
        self.profile.is_some()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    sessions: Mutex<HashMap<SocketAddr, PlayerHandle>>,
    online: AtomicUsize,
    slots: AtomicUsize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new session. Returns `false` if `addr` is already registered, in
    /// which case the existing entry is kept.
    pub async fn register(&self, addr: SocketAddr, outbound: mpsc::Sender<Packet>) -> bool {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&addr) {
            return false;
        }
        sessions.insert(
            addr,
            PlayerHandle {
                addr,
                outbound,
                profile: None,
            },
        );
        trace!(peer = %addr, total = sessions.len(), "Session registered");
        true
    }

    /// Attach the login identity to a registered session.
    pub async fn mark_logged_in(&self, addr: SocketAddr, profile: Profile) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&addr) {
            Some(handle) => {
                if handle.profile.replace(profile).is_none() {
                    self.online.fetch_add(1, Ordering::Relaxed);
                }
                true
            }
            None => false,
        }
    }

    /// Drop a session; the second call for the same address returns `None`.
    pub async fn remove(&self, addr: &SocketAddr) -> Option<PlayerHandle> {
        let mut sessions = self.sessions.lock().await;
        let removed = sessions.remove(addr);
        if let Some(handle) = &removed {
            if handle.is_logged_in() {
                self.online.fetch_sub(1, Ordering::Relaxed);
            }
            debug!(peer = %addr, total = sessions.len(), "Session removed");
        }
        removed
    }

    /// Claim one of `max` player slots. Returns `false` when all are taken.
    ///
    /// A claimed slot is held from the moment login is accepted until
    /// [`release_slot`](Self::release_slot), covering the window before the
    /// session is published as logged in.
    pub fn try_reserve_slot(&self, max: usize) -> bool {
        self.slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |taken| {
                (taken < max).then_some(taken + 1)
            })
            .is_ok()
    }

    pub fn release_slot(&self) {
        let _ = self
            .slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |taken| {
                taken.checked_sub(1)
            });
    }

    pub fn reserved_slots(&self) -> usize {
        self.slots.load(Ordering::Acquire)
    }

    /// Number of registered sessions, logged in or not.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Logged-in sessions, copied out so the caller can send without the lock.
    pub async fn logged_in(&self) -> Vec<PlayerHandle> {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|handle| handle.is_logged_in())
            .cloned()
            .collect()
    }

    /// Number of logged-in sessions, without taking the lock.
    pub fn online_count(&self) -> usize {
        self.online.load(Ordering::Relaxed)
    }
}
