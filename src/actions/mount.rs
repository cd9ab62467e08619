//! Mount action records
//!
//! A mount action asserts that a platform or device was attached to a
//! parent (or to the configuration's reference frame) during a half-open
//! `[begin_date, end_date)` interval. These records arrive from the
//! external fetch layer; the engine never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hierarchy::{EntityId, EntityRef, Offset};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MountAction {
    pub id: Uuid,
    /// Configuration this mount belongs to.
    pub configuration_id: EntityId,
    /// The platform or device being mounted.
    pub entity: EntityRef,
    /// Entity id of the parent platform; `None` when mounted directly on
    /// the configuration's reference frame.
    pub parent_id: Option<EntityId>,
    pub begin_date: DateTime<Utc>,
    /// Absent while the entity is still mounted.
    pub end_date: Option<DateTime<Utc>>,
    /// Position relative to the parent's frame, as recorded at mount time.
    pub offset: Offset,
}

impl MountAction {
    /// An open-ended mount starting at `begin_date`, with a fresh record id.
    pub fn open(
        configuration_id: impl Into<EntityId>,
        entity: EntityRef,
        parent_id: Option<EntityId>,
        begin_date: DateTime<Utc>,
        offset: Offset,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            configuration_id: configuration_id.into(),
            entity,
            parent_id,
            begin_date,
            end_date: None,
            offset,
        }
    }

    /// Close this mount at `end_date` (the unmount instant, exclusive).
    pub fn ended(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Half-open containment: `begin_date <= t` and, when an end date
    /// exists, `t < end_date`. `None` asks about "now" and matches only
    /// open-ended actions.
    pub fn is_active_at(&self, at: Option<DateTime<Utc>>) -> bool {
        match at {
            None => self.end_date.is_none(),
            Some(t) => self.begin_date <= t && self.end_date.map_or(true, |end| t < end),
        }
    }

    /// Half-open overlap against a query window. An absent end on either
    /// side means "unbounded future".
    pub fn overlaps(&self, begin: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
        let starts_before_window_ends = end.map_or(true, |window_end| self.begin_date < window_end);
        let ends_after_window_begins = self.end_date.map_or(true, |own_end| begin < own_end);
        starts_before_window_ends && ends_after_window_begins
    }
}
