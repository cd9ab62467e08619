//! The merged location timeline
//!
//! Static and dynamic location events fold into one chronological
//! sequence, most recent first, the way a timeline panel renders it. The
//! location active at an instant is decided by the latest event at or
//! before that instant: a begin puts the configuration somewhere, an end
//! takes it away again.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use super::IntegrityError;
use crate::actions::{LocationAction, LocationKind};

/// A paired begin/end from the location timeline. An absent end means the
/// configuration still occupies this location.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationInterval {
    start: LocationAction,
    end: Option<LocationAction>,
}

impl LocationInterval {
    pub fn start(&self) -> &LocationAction {
        &self.start
    }

    pub fn end(&self) -> Option<&LocationAction> {
        self.end.as_ref()
    }

    pub fn id(&self) -> Uuid {
        self.start.id
    }

    pub fn kind(&self) -> LocationKind {
        self.start.kind()
    }

    /// The label is carried by the begin edge.
    pub fn label(&self) -> Option<&str> {
        self.start.label.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Half-open containment over `[start, end)`.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start.timepoint <= t
            && self.end.as_ref().map_or(true, |end| t < end.timepoint)
    }
}

/// The merged, chronologically ordered location history of one
/// configuration.
#[derive(Clone, Debug, Default)]
pub struct LocationTimeline {
    events: Vec<LocationAction>,
}

impl LocationTimeline {
    /// Merge static and dynamic events into one sequence, sorted
    /// descending by timepoint. The sort is stable: ties keep their input
    /// order, static before dynamic.
    pub fn merge(static_events: &[LocationAction], dynamic_events: &[LocationAction]) -> Self {
        let mut events: Vec<LocationAction> = static_events
            .iter()
            .chain(dynamic_events)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.timepoint.cmp(&a.timepoint));
        Self { events }
    }

    /// Events most recent first.
    pub fn events(&self) -> &[LocationAction] {
        &self.events
    }

    /// Match every begin with the nearest chronologically later end of
    /// the same id and kind. Begins with no end are open. Intervals come
    /// back ordered by begin timepoint, ascending.
    pub fn pair(&self) -> Result<Vec<LocationInterval>, IntegrityError> {
        let mut ascending: Vec<&LocationAction> = self.events.iter().collect();
        ascending.sort_by_key(|e| e.timepoint);

        let mut intervals: Vec<LocationInterval> = Vec::new();
        let mut open: HashMap<Uuid, usize> = HashMap::new();
        for event in ascending {
            if event.is_start() {
                if open.contains_key(&event.id) {
                    return Err(IntegrityError::DuplicateLocationEdge { id: event.id });
                }
                open.insert(event.id, intervals.len());
                intervals.push(LocationInterval {
                    start: event.clone(),
                    end: None,
                });
            } else {
                match open.remove(&event.id) {
                    Some(index) if intervals[index].kind() == event.kind() => {
                        intervals[index].end = Some(event.clone());
                    }
                    _ => return Err(IntegrityError::UnmatchedEnd { id: event.id }),
                }
            }
        }
        Ok(intervals)
    }

    /// The location active at `t`, if any.
    ///
    /// The latest event at or before `t` decides: a begin makes its
    /// location the active one, an end leaves the configuration without a
    /// declared location. A location that was never explicitly ended is
    /// therefore superseded by whatever event comes after it. More than
    /// one begin at the decisive timepoint is a data error, reported
    /// rather than resolved by picking one.
    pub fn active_at(
        &self,
        t: DateTime<Utc>,
    ) -> Result<Option<LocationInterval>, IntegrityError> {
        let intervals = self.pair()?;

        let Some(decisive) = self
            .events
            .iter()
            .filter(|e| e.timepoint <= t)
            .map(|e| e.timepoint)
            .max()
        else {
            return Ok(None);
        };

        let starts_at_decisive: Vec<&LocationAction> = self
            .events
            .iter()
            .filter(|e| e.timepoint == decisive && e.is_start())
            .collect();

        match starts_at_decisive.len() {
            0 => Ok(None),
            1 => {
                let winner = starts_at_decisive[0];
                Ok(intervals
                    .into_iter()
                    .find(|i| i.id() == winner.id && i.contains(t)))
            }
            count => {
                log::warn!("{} locations declared active at once", count);
                Err(IntegrityError::AmbiguousActiveLocation { count })
            }
        }
    }
}
