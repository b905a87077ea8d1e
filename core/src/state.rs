//! Reactive dashboard state container.
//!
//! RULES:
//!   - No ambient globals. The store instance is constructed once and
//!     passed to every component that reads or writes shared state.
//!   - `set` never creates missing intermediate containers. Writing
//!     through a path whose parent is absent is a PathNotFound error,
//!     not a silent no-op.
//!   - Subscribers run synchronously, in registration order, after
//!     every successful write. Mutation and notification never
//!     interleave: the engine is single-threaded by design.

use crate::error::{EngineError, EngineResult};
use crate::transaction::{DataStatus, UserProfile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default global risk cutoff before the analyst touches the slider.
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.6;

/// The fixed set of selectable time windows. Rolling windows are
/// anchored at the dataset's load time, "all" disables the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    All,
    Last7,
    Last30,
    Last90,
}

impl TimeRange {
    pub fn days(self) -> Option<i64> {
        match self {
            TimeRange::All => None,
            TimeRange::Last7 => Some(7),
            TimeRange::Last30 => Some(30),
            TimeRange::Last90 => Some(90),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeRange::All => "All time",
            TimeRange::Last7 => "Last 7 days",
            TimeRange::Last30 => "Last 30 days",
            TimeRange::Last90 => "Last 90 days",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    pub time_range: TimeRange,
    pub risk_threshold: f64,
    pub chart_type: String,
    pub advanced_mode: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            time_range: TimeRange::All,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            chart_type: "category".into(),
            advanced_mode: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DataState {
    pub status: DataStatus,
    pub row_count: usize,
}

/// The typed schema behind the store's document tree. The transaction
/// set itself is owned by the dashboard controller, not serialized here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppState {
    pub ui: UiState,
    pub profile: UserProfile,
    pub data: DataState,
    pub theme: String,
}

/// Listener invoked with `(path, new_value)` after each write.
pub type Subscriber = Box<dyn FnMut(&str, &Value)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Store {
    root: Value,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl Store {
    pub fn new() -> EngineResult<Self> {
        Self::with_schema(&AppState {
            theme: "light".into(),
            ..AppState::default()
        })
    }

    /// Build a store from any serializable schema. The document shape
    /// fixed here is the shape `set` may write into later.
    pub fn with_schema<S: Serialize>(schema: &S) -> EngineResult<Self> {
        Ok(Self {
            root: serde_json::to_value(schema)?,
            subscribers: Vec::new(),
            next_id: 0,
        })
    }

    /// Value at a dot-separated key path, or None if any segment is
    /// missing along the way.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path.split('.') {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// Typed read of a subtree.
    pub fn read<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let value = self.get(path).ok_or_else(|| EngineError::PathNotFound {
            path: path.to_string(),
        })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Write the leaf at `path` and notify all subscribers.
    ///
    /// Every intermediate segment must already exist as an object; the
    /// leaf key itself may be new. This strict contract replaces the
    /// undefined behaviour a permissive deep-write would reintroduce.
    pub fn set(&mut self, path: &str, value: Value) -> EngineResult<()> {
        if path.is_empty() {
            return Err(EngineError::PathNotFound { path: path.into() });
        }
        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop().unwrap_or_default();

        let mut node = &mut self.root;
        for segment in &segments {
            node = node
                .as_object_mut()
                .and_then(|obj| obj.get_mut(*segment))
                .ok_or_else(|| EngineError::PathNotFound { path: path.into() })?;
        }
        let parent = node
            .as_object_mut()
            .ok_or_else(|| EngineError::PathNotFound { path: path.into() })?;
        parent.insert(leaf.to_string(), value.clone());

        for (_, callback) in self.subscribers.iter_mut() {
            callback(path, &value);
        }
        Ok(())
    }

    /// Register a listener. Dropping the returned id does nothing;
    /// call `unsubscribe` to detach.
    pub fn subscribe(&mut self, callback: Subscriber) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Snapshot of the UI preferences. Falls back to defaults if the
    /// subtree was overwritten with something unreadable.
    pub fn ui(&self) -> UiState {
        self.read("ui").unwrap_or_default()
    }

    /// Read-only view of the whole document, for export collaborators.
    pub fn document(&self) -> &Value {
        &self.root
    }
}
