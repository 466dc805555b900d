//! Group name to client mapping.
//!
//! # Design
//! The registry is an ordinary value owned by the caller's composition root.
//! Clients are created lazily, once per group, and keep their GET cache for as
//! long as the registry lives. Every `instance` call hands out a fresh
//! [`Call`] with default options, whatever the previous chain did.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::client::{Call, Client};
use crate::config::RestConfig;
use crate::error::{RestError, Result};
use crate::inspect::Inspector;
use crate::transport::Transport;

pub struct ClientRegistry<T> {
    config: RestConfig,
    transport: T,
    inspector: Option<Arc<dyn Inspector>>,
    clients: HashMap<String, Client<T>>,
}

impl<T> fmt::Debug for ClientRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("groups", &self.config.groups.keys().collect::<Vec<_>>())
            .field("clients", &self.clients.len())
            .finish()
    }
}

impl<T: Transport + Clone> ClientRegistry<T> {
    pub fn new(config: RestConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            inspector: None,
            clients: HashMap::new(),
        }
    }

    /// Report every exchange of clients created from now on to `inspector`.
    pub fn with_inspector(mut self, inspector: impl Inspector + 'static) -> Self {
        self.inspector = Some(Arc::new(inspector));
        self
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// The client for `group`, created on first use.
    pub fn client(&mut self, group: &str) -> Result<&mut Client<T>> {
        if !self.clients.contains_key(group) {
            let config = self.config.group(group)?.clone();
            let mut client = Client::new(group, config, self.transport.clone());
            if let Some(inspector) = &self.inspector {
                client = client.with_inspector(Arc::clone(inspector));
            }
            tracing::debug!(group, "created rest client");
            self.clients.insert(group.to_string(), client);
        }
        self.clients
            .get_mut(group)
            .ok_or_else(|| RestError::config(format!("no client for group \"{group}\"")))
    }

    /// Start a call chain on `group`'s client with cleared headers and
    /// default JSON negotiation.
    pub fn instance(&mut self, group: &str) -> Result<Call<'_, T>> {
        Ok(self.client(group)?.call())
    }

    pub fn contains(&self, group: &str) -> bool {
        self.clients.contains_key(group)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
