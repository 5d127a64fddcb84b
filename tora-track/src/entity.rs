// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A tracked entity.
//!
//! Each stage of a placement (planner, escalation, allocator) owns an entity
//! so that its messages can be filtered by hierarchical name, for example
//! `tora::job0::allocator`.

use std::fmt;
use std::sync::Arc;

use crate::{Id, Tracker, create, destroy};

/// Separator between the levels of a hierarchical name.
pub const JOIN: &str = "::";

/// A tracked entity
///
/// Only the top-level entity, created with [`toplevel`], has no parent. The
/// hierarchical name is fixed when the entity is created, which is also when
/// the tracker decides its log level.
pub struct Entity {
    /// Name of this entity within its parent.
    pub name: String,

    /// Parent entity (only the top-level is None).
    pub parent: Option<Arc<Entity>>,

    /// Unique identifier used for log messages.
    pub id: Id,

    /// [`Tracker`] used to handle trace/log events.
    pub tracker: Tracker,

    full_name: String,
}

impl Entity {
    /// Create a new entity below `parent`.
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str) -> Self {
        let full_name = format!("{}{JOIN}{name}", parent.full_name);
        Self::register(parent.tracker.clone(), Some(parent.clone()), name, full_name)
    }

    /// Create a shared child of this entity.
    #[must_use]
    pub fn child(self: &Arc<Self>, name: &str) -> Arc<Entity> {
        Arc::new(Self::new(self, name))
    }

    fn register(
        tracker: Tracker,
        parent: Option<Arc<Entity>>,
        name: &str,
        full_name: String,
    ) -> Self {
        let id = tracker.unique_id();
        tracker.add_entity(id, &full_name);

        let entity = Self {
            name: name.to_string(),
            parent,
            id,
            tracker,
            full_name,
        };
        create!(entity);
        entity
    }

    /// Returns the full hierarchical name of this entity.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Number of ancestors, zero for the top-level.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut parent = &self.parent;
        while let Some(p) = parent {
            depth += 1;
            parent = &p.parent;
        }
        depth
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        destroy!(self);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("full_name", &self.full_name)
            .field("id", &self.id)
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Create the top-level entity.
pub fn toplevel(tracker: &Tracker, name: &str) -> Arc<Entity> {
    Arc::new(Entity::register(
        tracker.clone(),
        None,
        name,
        name.to_string(),
    ))
}
