//! Session events and subscriptions.
//!
//! A [`Session`](crate::session::Session) emits a [`SessionEvent`] after every
//! state change a presentation layer may want to react to: catalog rebuilds,
//! structural edits, field edits, selection changes, saves and teardown.
//! Subscribers register callbacks on an [`EventRegistry`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::document::Scope;

/// Events emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The catalog was rebuilt from a fresh load.
    CatalogRebuilt {
        /// Document display name.
        name: String,
        /// Session generation after the rebuild.
        #[ts(type = "number")]
        generation: u64,
    },

    /// A property was added.
    PropertyAdded {
        /// Scope of the new property.
        scope: Scope,
        /// Key of the new property.
        key: String,
    },

    /// A property was removed.
    PropertyRemoved {
        /// Scope of the removed property.
        scope: Scope,
        /// Key of the removed property.
        key: String,
        /// Properties whose dependency now dangles.
        #[serde(default)]
        orphaned: Vec<String>,
    },

    /// A property was copied under a new key.
    PropertyDuplicated {
        /// Scope of both properties.
        scope: Scope,
        /// Source key.
        from: String,
        /// Key of the copy.
        to: String,
    },

    /// A top-level property swapped places with a sibling.
    PropertyMoved {
        /// Scope of the property.
        scope: Scope,
        /// Key of the moved property.
        key: String,
        /// Key of the sibling it swapped with.
        swapped_with: String,
    },

    /// Attribute fields of a property changed.
    PropertyChanged {
        /// Scope of the property.
        scope: Scope,
        /// Key of the property.
        key: String,
        /// Ids of the changed fields.
        fields: Vec<String>,
    },

    /// The selection changed.
    SelectionChanged {
        /// Scope of the selected property, `None` for the document root.
        #[serde(default)]
        scope: Option<Scope>,
        /// Key of the selected property, `None` for the document root.
        #[serde(default)]
        key: Option<String>,
    },

    /// The document was written to its backing file.
    Saved {
        /// Path written.
        path: PathBuf,
    },

    /// The session was closed.
    Closed,
}

impl SessionEvent {
    /// Create a SelectionChanged event for the document root.
    pub fn root_selected() -> Self {
        Self::SelectionChanged {
            scope: None,
            key: None,
        }
    }

    /// Create a SelectionChanged event for a property.
    pub fn property_selected(scope: Scope, key: impl Into<String>) -> Self {
        Self::SelectionChanged {
            scope: Some(scope),
            key: Some(key.into()),
        }
    }

    /// Key of the property this event is about, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::PropertyAdded { key, .. }
            | Self::PropertyRemoved { key, .. }
            | Self::PropertyMoved { key, .. }
            | Self::PropertyChanged { key, .. } => Some(key),
            Self::PropertyDuplicated { to, .. } => Some(to),
            Self::SelectionChanged { key, .. } => key.as_deref(),
            Self::CatalogRebuilt { .. } | Self::Saved { .. } | Self::Closed => None,
        }
    }

    /// Returns true for events that change the catalog's shape or order.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::CatalogRebuilt { .. }
                | Self::PropertyAdded { .. }
                | Self::PropertyRemoved { .. }
                | Self::PropertyDuplicated { .. }
                | Self::PropertyMoved { .. }
        )
    }

    /// Get the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CatalogRebuilt { .. } => "CatalogRebuilt",
            Self::PropertyAdded { .. } => "PropertyAdded",
            Self::PropertyRemoved { .. } => "PropertyRemoved",
            Self::PropertyDuplicated { .. } => "PropertyDuplicated",
            Self::PropertyMoved { .. } => "PropertyMoved",
            Self::PropertyChanged { .. } => "PropertyChanged",
            Self::SelectionChanged { .. } => "SelectionChanged",
            Self::Saved { .. } => "Saved",
            Self::Closed => "Closed",
        }
    }
}

/// A unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback function type for session events.
///
/// Callbacks run synchronously inside the emitting operation and should not
/// block.
pub type EventCallback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Registry of event subscriptions.
///
/// # Example
///
/// ```ignore
/// use flowdecl_core::events::{EventRegistry, SessionEvent};
/// use std::sync::Arc;
///
/// let registry = EventRegistry::new();
/// let id = registry.subscribe(Arc::new(|event| {
///     println!("{}", event.event_type());
/// }));
/// registry.emit(&SessionEvent::Closed);
/// registry.unsubscribe(id);
/// ```
pub struct EventRegistry {
    callbacks: RwLock<HashMap<SubscriptionId, EventCallback>>,
    next_id: AtomicU64,
}

impl EventRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to session events.
    ///
    /// Returns a subscription ID that can be used to unsubscribe later.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, callback);
        id
    }

    /// Unsubscribe from session events.
    ///
    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Emit an event to all registered callbacks.
    ///
    /// Callbacks are invoked in subscription order. A panicking callback does
    /// not stop delivery to the others.
    pub fn emit(&self, event: &SessionEvent) {
        let mut callbacks: Vec<(SubscriptionId, EventCallback)> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();
        callbacks.sort_by_key(|(id, _)| *id);

        log::debug!(
            "Emitting {} to {} subscriber(s)",
            event.event_type(),
            callbacks.len()
        );
        for (id, callback) in callbacks {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(event);
            }));
            if result.is_err() {
                log::warn!("Subscriber {} panicked handling {}", id, event.event_type());
            }
        }
    }

    /// Get the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Clear all subscriptions.
    pub fn clear(&self) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("subscriber_count", &self.subscriber_count())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}
