//! Drag-and-drop payloads exchanged between the asset pool and the timeline.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What is being dragged. Serialized as
/// `{"kind": "libraryAsset" | "timelineAsset", "sourceId": .., "timelineId": ..}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DragPayload {
    #[serde(rename_all = "camelCase")]
    LibraryAsset { source_id: Uuid },
    #[serde(rename_all = "camelCase")]
    TimelineAsset { source_id: Uuid, timeline_id: Uuid },
}

impl DragPayload {
    pub fn library(source_id: Uuid) -> Self {
        DragPayload::LibraryAsset { source_id }
    }

    pub fn timeline(source_id: Uuid, timeline_id: Uuid) -> Self {
        DragPayload::TimelineAsset { source_id, timeline_id }
    }

    pub fn source_id(&self) -> Uuid {
        match self {
            DragPayload::LibraryAsset { source_id } => *source_id,
            DragPayload::TimelineAsset { source_id, .. } => *source_id,
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| CoreError::MalformedDropPayload(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
