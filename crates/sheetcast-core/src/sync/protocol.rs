//! Wire-level request/response types and the endpoint sessions talk to.

use super::Version;
use crate::error::{Result, SheetcastError};
use serde::{Deserialize, Serialize};

/// A request naming a sheet by owner, with an optional cursor and payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub publisher: String,
    #[serde(default)]
    pub sheet: String,
    /// First version id wanted by update queries.
    #[serde(default)]
    pub id: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
}

impl SyncRequest {
    pub fn new(publisher: &str, sheet: &str) -> Self {
        SyncRequest {
            publisher: publisher.to_string(),
            sheet: sheet.to_string(),
            ..Default::default()
        }
    }

    pub fn since(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// One entry of a response: a version, a sheet name or a publisher name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub publisher: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sheet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
}

impl VersionEntry {
    pub fn publisher(publisher: &str) -> Self {
        VersionEntry {
            publisher: publisher.to_string(),
            ..Default::default()
        }
    }

    pub fn sheet(publisher: &str, sheet: &str) -> Self {
        VersionEntry {
            publisher: publisher.to_string(),
            sheet: sheet.to_string(),
            ..Default::default()
        }
    }

    pub fn version(publisher: &str, sheet: &str, version: &Version) -> Self {
        VersionEntry {
            publisher: publisher.to_string(),
            sheet: sheet.to_string(),
            id: Some(version.id),
            payload: version.payload.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

impl SyncResponse {
    pub fn ok(message: &str) -> Self {
        SyncResponse {
            success: true,
            message: message.to_string(),
            versions: Vec::new(),
        }
    }

    pub fn failure(err: &SheetcastError) -> Self {
        SyncResponse {
            success: false,
            message: err.to_string(),
            versions: Vec::new(),
        }
    }

    pub fn with_versions(mut self, versions: Vec<VersionEntry>) -> Self {
        self.versions = versions;
        self
    }

    /// Entries of a successful response, or the failure message as `Rejected`.
    pub fn into_result(self) -> Result<Vec<VersionEntry>> {
        if self.success {
            Ok(self.versions)
        } else {
            Err(SheetcastError::Rejected(self.message))
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// The operations client sessions call.
///
/// [`super::SyncService`] implements it in-process; a network transport
/// implements it by forwarding requests.
pub trait SyncEndpoint {
    fn create_sheet(&self, requester: &str, request: &SyncRequest) -> SyncResponse;
    fn update_published(&self, request: &SyncRequest) -> SyncResponse;
    fn update_subscription(&self, request: &SyncRequest) -> SyncResponse;
    fn get_updates_for_subscription(&self, request: &SyncRequest) -> SyncResponse;
    fn get_updates_for_published(&self, request: &SyncRequest) -> SyncResponse;
}
