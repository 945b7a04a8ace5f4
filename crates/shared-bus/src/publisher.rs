//! # Client Directory
//!
//! The relay process's table of registered contexts: who they are, which
//! main context owns them, and how to reach them.

use crate::events::ContextMessage;
use crate::subscriber::Mailbox;
use shared_types::ClientId;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from posting to a context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostError {
    /// No context registered under this id.
    #[error("Client {0} is not registered")]
    UnknownClient(ClientId),

    /// The context dropped its inbox. It has been removed from the directory.
    #[error("Client {0} has closed its inbox")]
    Closed(ClientId),
}

struct ClientEntry {
    mailbox: Mailbox,
    /// Main context that spawned this one, if any.
    owner: Option<ClientId>,
}

/// Registered contexts, keyed by client id.
///
/// Owned by the relay actor; not shared.
#[derive(Default)]
pub struct ClientDirectory {
    clients: HashMap<ClientId, ClientEntry>,
    messages_posted: u64,
}

impl ClientDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context. Returns false if the id was already present (the
    /// previous entry is replaced).
    pub fn register(&mut self, client: ClientId, owner: Option<ClientId>, mailbox: Mailbox) -> bool {
        let fresh = self
            .clients
            .insert(client, ClientEntry { mailbox, owner })
            .is_none();
        debug!(client = %client, owner = ?owner, fresh, "Client registered");
        fresh
    }

    /// Remove a context. Returns false if it was not registered.
    pub fn unregister(&mut self, client: &ClientId) -> bool {
        let removed = self.clients.remove(client).is_some();
        if removed {
            debug!(client = %client, "Client unregistered");
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, client: &ClientId) -> bool {
        self.clients.contains_key(client)
    }

    /// The main context that owns `client`, if it was registered with one.
    #[must_use]
    pub fn owner_of(&self, client: &ClientId) -> Option<ClientId> {
        self.clients.get(client).and_then(|entry| entry.owner)
    }

    /// The context that serves calls made by `client`: its owner, or the
    /// client itself when it has none (or is unknown).
    #[must_use]
    pub fn resolve_owner(&self, client: &ClientId) -> ClientId {
        self.owner_of(client).unwrap_or(*client)
    }

    /// Deliver a message to a registered context.
    ///
    /// A context whose inbox is gone is pruned.
    pub fn post(&mut self, to: &ClientId, message: ContextMessage) -> Result<(), PostError> {
        let Some(entry) = self.clients.get(to) else {
            return Err(PostError::UnknownClient(*to));
        };

        let kind = message.kind();
        match entry.mailbox.deliver(message) {
            Ok(()) => {
                self.messages_posted += 1;
                debug!(client = %to, kind, "Message posted");
                Ok(())
            }
            Err(_) => {
                warn!(client = %to, kind, "Client inbox closed, pruning");
                self.clients.remove(to);
                Err(PostError::Closed(*to))
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Total messages successfully posted.
    #[must_use]
    pub fn messages_posted(&self) -> u64 {
        self.messages_posted
    }
}
