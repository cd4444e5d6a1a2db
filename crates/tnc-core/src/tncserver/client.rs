// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-client state and the bounded registered-callsign table (§3 Data
//! Model: "TCP client slot", "Registered-callsign table").

use crate::config::{MAX_REGISTERED_CALLSIGNS, MAX_TNC_CLIENTS};
use crossbeam::channel::{bounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// One connected client's toggles and the sending half of its outbound
/// message queue (K/U pushes land here and are drained by that
/// client's writer thread).
pub struct ClientHandle {
    pub id: usize,
    pub raw: bool,
    pub monitor: bool,
    sender: Sender<Vec<u8>>,
}

impl ClientHandle {
    /// Queue an outbound message for this client's writer thread.
    /// Drops silently if the client has already disconnected.
    pub fn send(&self, message: Vec<u8>) {
        let _ = self.sender.try_send(message);
    }
}

/// Shared table of connected clients plus the callsign registrations
/// that route inbound digipeated/addressed traffic to a `K` push.
pub struct ClientRegistry {
    clients: Mutex<HashMap<usize, ClientHandle>>,
    registered: RwLock<HashMap<String, usize>>,
    next_id: Mutex<usize>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            registered: RwLock::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Register a newly accepted client and return its id plus the
    /// receiving half of its outbound queue, or `None` if the server
    /// is already at [`MAX_TNC_CLIENTS`].
    pub fn accept(&self) -> Option<(usize, Receiver<Vec<u8>>)> {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        if clients.len() >= MAX_TNC_CLIENTS {
            return None;
        }
        let mut next_id = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        let id = *next_id;
        *next_id += 1;
        drop(next_id);

        let (tx, rx) = bounded(256);
        clients.insert(
            id,
            ClientHandle {
                id,
                raw: false,
                monitor: false,
                sender: tx,
            },
        );
        Some((id, rx))
    }

    /// Remove a client and every callsign it had registered.
    pub fn disconnect(&self, id: usize) {
        self.clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        self.registered
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, owner| *owner != id);
    }

    /// Set a client's raw-frame-reception toggle (`k` command).
    pub fn set_raw(&self, id: usize, raw: bool) {
        if let Some(client) = self.clients.lock().unwrap_or_else(|e| e.into_inner()).get_mut(&id) {
            client.raw = raw;
        }
    }

    /// Set a client's monitor-format toggle (`m` command).
    pub fn set_monitor(&self, id: usize, monitor: bool) {
        if let Some(client) = self.clients.lock().unwrap_or_else(|e| e.into_inner()).get_mut(&id) {
            client.monitor = monitor;
        }
    }

    /// Register `callsign` to client `id` (`X` command). Fails if the
    /// table is full or the callsign is already registered elsewhere.
    #[must_use]
    pub fn register_callsign(&self, id: usize, callsign: &str) -> bool {
        let mut registered = self.registered.write().unwrap_or_else(|e| e.into_inner());
        if registered.contains_key(callsign) {
            return false;
        }
        if registered.len() >= MAX_REGISTERED_CALLSIGNS {
            return false;
        }
        registered.insert(callsign.to_string(), id);
        true
    }

    /// Unregister `callsign` (`x` command); always silent per §4.10.
    pub fn unregister_callsign(&self, callsign: &str) {
        self.registered
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(callsign);
    }

    /// Push `message` to every connected client whose `raw` toggle is
    /// set (outbound `K` frames).
    pub fn broadcast_raw(&self, message: &[u8]) {
        for client in self.clients.lock().unwrap_or_else(|e| e.into_inner()).values() {
            if client.raw {
                client.send(message.to_vec());
            }
        }
    }

    /// Push `message` to every connected client whose `monitor` toggle
    /// is set (outbound `U` frames).
    pub fn broadcast_monitor(&self, message: &[u8]) {
        for client in self.clients.lock().unwrap_or_else(|e| e.into_inner()).values() {
            if client.monitor {
                client.send(message.to_vec());
            }
        }
    }

    /// Number of currently connected clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_assigns_distinct_ids() {
        let registry = ClientRegistry::new();
        let (a, _) = registry.accept().unwrap();
        let (b, _) = registry.accept().unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.client_count(), 2);
    }

    #[test]
    fn disconnect_releases_registered_callsigns() {
        let registry = ClientRegistry::new();
        let (id, _rx) = registry.accept().unwrap();
        assert!(registry.register_callsign(id, "N0CALL"));
        registry.disconnect(id);
        assert!(registry.register_callsign(0, "N0CALL")); // free again
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = ClientRegistry::new();
        let (a, _) = registry.accept().unwrap();
        let (b, _) = registry.accept().unwrap();
        assert!(registry.register_callsign(a, "N0CALL"));
        assert!(!registry.register_callsign(b, "N0CALL"));
    }

    #[test]
    fn raw_broadcast_only_reaches_toggled_clients() {
        let registry = ClientRegistry::new();
        let (a, rx_a) = registry.accept().unwrap();
        let (_b, rx_b) = registry.accept().unwrap();
        registry.set_raw(a, true);
        registry.broadcast_raw(b"hi");
        assert_eq!(rx_a.try_recv().unwrap(), b"hi");
        assert!(rx_b.try_recv().is_err());
    }
}
