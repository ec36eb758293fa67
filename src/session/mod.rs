// src/session/mod.rs
//
// Device session lifecycle.
//
// The coordinator owns the single live transport and the two flags that
// arbitrate between the health monitor (background) and the command channel
// (foreground):
//
//   config_sent - parameters were sent during the current connection epoch
//   receiving   - the command channel is the active reader of the transport
//
// Within an epoch each flag has one writer, the health monitor. The command
// channel only reads `receiving`. Initial values for the first epoch are
// fixed when the coordinator is built, before the monitor starts.

pub mod command;
pub mod handshake;
pub mod monitor;
pub mod provision;
#[cfg(test)]
pub(crate) mod sim;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::io::Transport;
use crate::settings::ConfigSnapshot;

pub use command::{parse_frame, resolve_event, CommandChannel, StepOutcome};
pub use handshake::HandshakeEngine;
pub use monitor::{HealthMonitor, TickOutcome};
pub use provision::provision;

// ============================================================================
// Types
// ============================================================================

/// Where a port is in its connection lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    /// Transport opened, nothing read yet.
    Probing,
    /// Waiting for the Ready marker.
    AwaitingReady,
    /// Ready seen and Confirmation sent.
    Confirmed,
    Connected,
}

/// An open transport that completed the handshake.
pub struct DeviceSession {
    pub port_id: String,
    pub transport: Box<dyn Transport>,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("port_id", &self.port_id)
            .finish_non_exhaustive()
    }
}

/// A shared boolean flag.
pub struct Token {
    name: &'static str,
    value: AtomicBool,
    /// Every write with the writing thread, for the single-writer tests
    #[cfg(test)]
    writes: Mutex<Vec<(bool, std::thread::ThreadId)>>,
}

impl Token {
    fn new(name: &'static str, initial: bool) -> Self {
        Self {
            name,
            value: AtomicBool::new(initial),
            #[cfg(test)]
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_set(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self) {
        self.store(true);
    }

    pub(crate) fn clear(&self) {
        self.store(false);
    }

    fn store(&self, value: bool) {
        self.value.store(value, Ordering::Release);
        #[cfg(test)]
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((value, std::thread::current().id()));
    }

    #[cfg(test)]
    pub(crate) fn writes(&self) -> Vec<(bool, std::thread::ThreadId)> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ============================================================================
// Session Coordinator
// ============================================================================

struct Link {
    port_id: String,
    transport: Option<Box<dyn Transport>>,
    epoch: u64,
}

/// Owner of the live transport, the session flags and the current snapshot.
///
/// Nobody else ever holds the transport: callers borrow it for one operation
/// through `with_transport`. Replacing it on reconnection therefore cannot
/// leave a reader with a stale handle.
pub struct SessionCoordinator {
    link: Mutex<Link>,
    config_sent: Token,
    receiving: Token,
    snapshot: RwLock<Arc<ConfigSnapshot>>,
}

impl SessionCoordinator {
    /// Take ownership of a provisioned session. The command channel becomes
    /// the active reader right away.
    pub fn new(session: DeviceSession, snapshot: Arc<ConfigSnapshot>) -> Self {
        Self {
            link: Mutex::new(Link {
                port_id: session.port_id,
                transport: Some(session.transport),
                epoch: 1,
            }),
            config_sent: Token::new("config_sent", true),
            receiving: Token::new("receiving", true),
            snapshot: RwLock::new(snapshot),
        }
    }

    fn lock_link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config_sent(&self) -> &Token {
        &self.config_sent
    }

    pub fn receiving(&self) -> &Token {
        &self.receiving
    }

    /// Port of the current (or last) session.
    pub fn port_id(&self) -> String {
        self.lock_link().port_id.clone()
    }

    /// Incremented on every transport swap.
    pub fn epoch(&self) -> u64 {
        self.lock_link().epoch
    }

    /// Connected or Disconnected. The handshake's transient states only
    /// appear in the log.
    pub fn state(&self) -> LinkState {
        if self.lock_link().transport.is_some() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// Run `f` against the live transport. Returns `None` while disconnected.
    pub fn with_transport<R>(&self, f: impl FnOnce(&mut dyn Transport) -> R) -> Option<R> {
        let mut link = self.lock_link();
        link.transport.as_mut().map(|t| f(t.as_mut()))
    }

    /// Adopt a new transport, closing the previous one. Returns the new epoch.
    pub(crate) fn swap_transport(&self, transport: Box<dyn Transport>) -> u64 {
        let (old, epoch) = {
            let mut link = self.lock_link();
            link.port_id = transport.port_id().to_string();
            link.epoch += 1;
            (link.transport.replace(transport), link.epoch)
        };
        // Closed outside the lock
        drop(old);
        epoch
    }

    /// Stop using the current transport. Returns true if one was live.
    pub(crate) fn invalidate(&self) -> bool {
        let old = self.lock_link().transport.take();
        old.is_some()
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn replace_snapshot(&self, snapshot: Arc<ConfigSnapshot>) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

// ============================================================================
// Tests
// ============================================================================
