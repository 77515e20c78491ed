//! Behavior registry.
//!
//! Elements opt into behaviors with a serialized descriptor attribute:
//!
//! ```html
//! <div data-behavior='["poll", "/status", 2000]'></div>
//! ```
//!
//! The first entry names a registered behavior, the rest are passed to it
//! as arguments. Behaviors are (re)invoked after every mount that touches
//! the element.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use super::MountError;
use crate::dom::{Document, NodeId};
use crate::page::{AttachedJobs, PageEvent};

/// Arguments of one behavior invocation.
pub struct BehaviorCall<'a> {
    pub document: &'a mut Document,
    /// Element carrying the descriptor
    pub element: NodeId,
    /// Update that triggered the invocation
    pub event: &'a PageEvent,
    pub args: &'a [Value],
    /// Element-owned background jobs
    pub jobs: &'a AttachedJobs,
}

impl BehaviorCall<'_> {
    /// String argument at `index`.
    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(Value::as_str)
    }

    /// Integer argument at `index`.
    pub fn u64_arg(&self, index: usize) -> Option<u64> {
        self.args.get(index).and_then(Value::as_u64)
    }
}

pub type Behavior = Arc<dyn Fn(&mut BehaviorCall<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Name to behavior mapping, populated before the first mount.
#[derive(Default)]
pub struct BehaviorRegistry {
    behaviors: DashMap<String, Behavior>,
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.behaviors.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        f.debug_struct("BehaviorRegistry").field("names", &names).finish()
    }
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a behavior, replacing any previous one with the same name.
    pub fn register<F>(&self, name: impl Into<String>, behavior: F)
    where
        F: Fn(&mut BehaviorCall<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.behaviors.insert(name.into(), Arc::new(behavior));
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.behaviors.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Behavior> {
        self.behaviors.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }

    pub fn clear(&self) {
        self.behaviors.clear();
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

/// Parsed behavior descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub name: String,
    pub args: Vec<Value>,
}

impl Descriptor {
    pub fn parse(raw: &str) -> Result<Self, MountError> {
        let malformed = |reason: &str| MountError::Descriptor {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut items: Vec<Value> =
            serde_json::from_str(raw).map_err(|e| malformed(&e.to_string()))?;
        if items.is_empty() {
            return Err(malformed("empty descriptor"));
        }
        let Value::String(name) = items.remove(0) else {
            return Err(malformed("behavior name must be a string"));
        };
        Ok(Self { name, args: items })
    }
}
