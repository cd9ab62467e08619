//! Location action records
//!
//! A configuration's declared geographic location over time is expressed
//! as paired begin/end timepoints, separately for static (surveyed
//! coordinates) and dynamic (externally tracked) locations. A begin with
//! no matching end is a location the configuration still occupies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static vs dynamic location.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocationKind {
    Static,
    Dynamic,
}

/// The four location timepoint types.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocationActionType {
    StaticStart,
    StaticEnd,
    DynamicStart,
    DynamicEnd,
}

impl LocationActionType {
    pub fn kind(&self) -> LocationKind {
        match self {
            LocationActionType::StaticStart | LocationActionType::StaticEnd => {
                LocationKind::Static
            }
            LocationActionType::DynamicStart | LocationActionType::DynamicEnd => {
                LocationKind::Dynamic
            }
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(
            self,
            LocationActionType::StaticStart | LocationActionType::DynamicStart
        )
    }
}

/// One timepoint in a configuration's location history.
///
/// The id pairs a begin with its end: both edges of one occupancy carry
/// the same id and kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationAction {
    pub id: Uuid,
    pub action_type: LocationActionType,
    pub timepoint: DateTime<Utc>,
    pub label: Option<String>,
}

impl LocationAction {
    pub fn new(
        id: Uuid,
        action_type: LocationActionType,
        timepoint: DateTime<Utc>,
        label: Option<String>,
    ) -> Self {
        Self {
            id,
            action_type,
            timepoint,
            label,
        }
    }

    /// A static location begin with a fresh id.
    pub fn static_start(timepoint: DateTime<Utc>, label: impl Into<String>) -> Self {
        Self::new(
            Uuid::new_v4(),
            LocationActionType::StaticStart,
            timepoint,
            Some(label.into()),
        )
    }

    /// A dynamic location begin with a fresh id.
    pub fn dynamic_start(timepoint: DateTime<Utc>, label: impl Into<String>) -> Self {
        Self::new(
            Uuid::new_v4(),
            LocationActionType::DynamicStart,
            timepoint,
            Some(label.into()),
        )
    }

    /// The end edge matching this start edge.
    pub fn ended_at(&self, timepoint: DateTime<Utc>) -> Self {
        let action_type = match self.action_type.kind() {
            LocationKind::Static => LocationActionType::StaticEnd,
            LocationKind::Dynamic => LocationActionType::DynamicEnd,
        };
        Self::new(self.id, action_type, timepoint, self.label.clone())
    }

    pub fn kind(&self) -> LocationKind {
        self.action_type.kind()
    }

    pub fn is_start(&self) -> bool {
        self.action_type.is_start()
    }
}
