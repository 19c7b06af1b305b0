//! Request handling for the sync server.

use super::{
    Channel, MemoryDirectory, SyncEndpoint, SyncRequest, SyncResponse, User, UserDirectory,
    VersionEntry, VersionStore,
};
use crate::error::{Result, SheetcastError};
use sheetcast_engine::engine::GridSize;
use std::sync::Arc;

pub const SHEET_CREATED: &str = "Sheet created successfully";
pub const SHEET_DELETED: &str = "Sheet deleted successfully";
pub const SHEET_UPDATED: &str = "Sheet updated successfully";
pub const UPDATES_RECEIVED: &str = "Updates received";
pub const SHEETS_RETRIEVED: &str = "Sheets retrieved successfully";
pub const PUBLISHER_REGISTERED: &str = "Publisher registered successfully";
pub const PUBLISHERS_RETRIEVED: &str = "Publishers retrieved successfully";

/// Owns the user directory and every sheet's histories.
///
/// All methods take `&self` and may be called from many threads at once.
pub struct SyncService {
    directory: Arc<dyn UserDirectory>,
    store: VersionStore,
    sheet_size: GridSize,
}

impl SyncService {
    pub fn new(directory: Arc<dyn UserDirectory>, sheet_size: GridSize) -> Self {
        SyncService {
            directory,
            store: VersionStore::new(),
            sheet_size,
        }
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    pub fn register(&self, username: &str) -> SyncResponse {
        respond("register", self.directory.add(User::new(username)).map(|()| {
            tracing::info!(user = username, "publisher registered");
            SyncResponse::ok(PUBLISHER_REGISTERED)
        }))
    }

    pub fn get_publishers(&self) -> SyncResponse {
        let publishers = self
            .directory
            .usernames()
            .iter()
            .map(|name| VersionEntry::publisher(name))
            .collect();
        SyncResponse::ok(PUBLISHERS_RETRIEVED).with_versions(publishers)
    }

    pub fn delete_sheet(&self, requester: &str, request: &SyncRequest) -> SyncResponse {
        respond("delete_sheet", self.try_delete_sheet(requester, request))
    }

    pub fn get_sheets(&self, request: &SyncRequest) -> SyncResponse {
        respond("get_sheets", self.try_get_sheets(request))
    }

    fn require_user(&self, username: &str) -> Result<()> {
        if self.directory.exists(username) {
            Ok(())
        } else {
            Err(SheetcastError::UserNotFound(username.to_string()))
        }
    }

    fn try_create_sheet(&self, requester: &str, request: &SyncRequest) -> Result<SyncResponse> {
        if requester != request.publisher {
            return Err(SheetcastError::NotOwner);
        }
        self.require_user(&request.publisher)?;
        self.store
            .create_sheet(&request.publisher, &request.sheet, self.sheet_size)?;
        Ok(SyncResponse::ok(SHEET_CREATED))
    }

    fn try_delete_sheet(&self, requester: &str, request: &SyncRequest) -> Result<SyncResponse> {
        if requester != request.publisher {
            return Err(SheetcastError::NotOwner);
        }
        self.require_user(&request.publisher)?;
        self.store.delete_sheet(&request.publisher, &request.sheet)?;
        Ok(SyncResponse::ok(SHEET_DELETED))
    }

    fn try_get_sheets(&self, request: &SyncRequest) -> Result<SyncResponse> {
        self.require_user(&request.publisher)?;
        let sheets = self
            .store
            .sheet_names(&request.publisher)
            .iter()
            .map(|sheet| VersionEntry::sheet(&request.publisher, sheet))
            .collect();
        Ok(SyncResponse::ok(SHEETS_RETRIEVED).with_versions(sheets))
    }

    fn try_append(&self, request: &SyncRequest, channel: Channel) -> Result<SyncResponse> {
        self.require_user(&request.publisher)?;
        let version =
            self.store
                .append_payload(&request.publisher, &request.sheet, channel, &request.payload)?;
        let entry = VersionEntry {
            payload: String::new(),
            ..VersionEntry::version(&request.publisher, &request.sheet, &version)
        };
        Ok(SyncResponse::ok(SHEET_UPDATED).with_versions(vec![entry]))
    }

    fn try_updates(&self, request: &SyncRequest, channel: Channel) -> Result<SyncResponse> {
        self.require_user(&request.publisher)?;
        let versions = self
            .store
            .updates_since(&request.publisher, &request.sheet, channel, request.id)?
            .iter()
            .map(|v| VersionEntry::version(&request.publisher, &request.sheet, v))
            .collect();
        Ok(SyncResponse::ok(UPDATES_RECEIVED).with_versions(versions))
    }
}

impl Default for SyncService {
    fn default() -> Self {
        SyncService::new(Arc::new(MemoryDirectory::new()), GridSize::default())
    }
}

impl SyncEndpoint for SyncService {
    fn create_sheet(&self, requester: &str, request: &SyncRequest) -> SyncResponse {
        respond("create_sheet", self.try_create_sheet(requester, request))
    }

    /// Publish: the payload becomes the next published version.
    fn update_published(&self, request: &SyncRequest) -> SyncResponse {
        respond(
            "update_published",
            self.try_append(request, Channel::Published),
        )
    }

    /// A subscriber's change, appended to the subscribed history.
    fn update_subscription(&self, request: &SyncRequest) -> SyncResponse {
        respond(
            "update_subscription",
            self.try_append(request, Channel::Subscribed),
        )
    }

    /// Published versions since `request.id`.
    fn get_updates_for_subscription(&self, request: &SyncRequest) -> SyncResponse {
        respond(
            "get_updates_for_subscription",
            self.try_updates(request, Channel::Published),
        )
    }

    /// Subscriber changes since `request.id`.
    fn get_updates_for_published(&self, request: &SyncRequest) -> SyncResponse {
        respond(
            "get_updates_for_published",
            self.try_updates(request, Channel::Subscribed),
        )
    }
}

fn respond(operation: &str, result: Result<SyncResponse>) -> SyncResponse {
    match result {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(operation, error = %err, "request rejected");
            SyncResponse::failure(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with(users: &[&str]) -> SyncService {
        let service = SyncService::new(Arc::new(MemoryDirectory::new()), GridSize::new(2, 2));
        for user in users {
            assert!(service.register(user).success);
        }
        service
    }

    #[test]
    fn test_register_twice() {
        let service = service_with(&["ann"]);
        let response = service.register("ann");
        assert!(!response.success);
        assert_eq!(response.message, "User already exists: ann");
    }

    #[test]
    fn test_get_publishers() {
        let service = service_with(&["bob", "ann"]);
        let names: Vec<String> = service
            .get_publishers()
            .versions
            .into_iter()
            .map(|v| v.publisher)
            .collect();
        assert_eq!(names, vec!["ann", "bob"]);
    }

    #[test]
    fn test_create_sheet_rules() {
        let service = service_with(&["ann"]);
        let request = SyncRequest::new("ann", "s");
        assert_eq!(service.create_sheet("ann", &request).message, SHEET_CREATED);
        assert_eq!(
            service.create_sheet("bob", &request).message,
            "Unauthorized: sender is not owner of sheet"
        );
        assert!(!service.create_sheet("ann", &request).success);
        assert!(!service.create_sheet("ann", &SyncRequest::new("ann", "")).success);
        assert_eq!(
            service.create_sheet("cat", &SyncRequest::new("cat", "s")).message,
            "User not found: cat"
        );
    }

    #[test]
    fn test_get_and_delete_sheets() {
        let service = service_with(&["ann"]);
        service.create_sheet("ann", &SyncRequest::new("ann", "b"));
        service.create_sheet("ann", &SyncRequest::new("ann", "a"));
        let response = service.get_sheets(&SyncRequest::new("ann", ""));
        assert_eq!(response.message, SHEETS_RETRIEVED);
        let sheets: Vec<String> = response.versions.into_iter().map(|v| v.sheet).collect();
        assert_eq!(sheets, vec!["a", "b"]);

        assert!(!service.delete_sheet("bob", &SyncRequest::new("ann", "a")).success);
        assert_eq!(
            service.delete_sheet("ann", &SyncRequest::new("ann", "a")).message,
            SHEET_DELETED
        );
        assert_eq!(service.get_sheets(&SyncRequest::new("ann", "")).versions.len(), 1);
    }

    #[test]
    fn test_publish_and_fetch() {
        let service = service_with(&["ann"]);
        service.create_sheet("ann", &SyncRequest::new("ann", "s"));
        let publish = SyncRequest::new("ann", "s").with_payload("$A1 1\\n$B1 2\\n$A2 =A1+B1\\n");
        let response = service.update_published(&publish);
        assert_eq!(response.message, SHEET_UPDATED);
        assert_eq!(response.versions[0].id, Some(0));

        let updates = service.get_updates_for_subscription(&SyncRequest::new("ann", "s"));
        assert_eq!(updates.message, UPDATES_RECEIVED);
        assert_eq!(updates.versions.len(), 1);
        assert_eq!(updates.versions[0].payload, "$A1 1\\n$B1 2\\n$A2 =A1+B1\\n");

        let up_to_date = service.get_updates_for_subscription(&SyncRequest::new("ann", "s").since(1));
        assert!(up_to_date.success);
        assert!(up_to_date.versions.is_empty());
    }

    #[test]
    fn test_unknown_sheet_updates() {
        let service = service_with(&["ann"]);
        let response = service.get_updates_for_subscription(&SyncRequest::new("ann", "nope"));
        assert!(!response.success);
        assert_eq!(response.message, "Sheet not found: nope");
    }

    #[test]
    fn test_subscriber_changes_reach_publisher() {
        let service = service_with(&["ann"]);
        service.create_sheet("ann", &SyncRequest::new("ann", "s"));
        let change = SyncRequest::new("ann", "s").with_payload("$B2 9\\n");
        assert!(service.update_subscription(&change).success);

        let for_publisher = service.get_updates_for_published(&SyncRequest::new("ann", "s"));
        assert_eq!(for_publisher.versions.len(), 1);
        assert!(service
            .get_updates_for_subscription(&SyncRequest::new("ann", "s"))
            .versions
            .is_empty());
    }

    #[test]
    fn test_malformed_publish_rejected() {
        let service = service_with(&["ann"]);
        service.create_sheet("ann", &SyncRequest::new("ann", "s"));
        let response = service.update_published(&SyncRequest::new("ann", "s").with_payload("oops"));
        assert!(!response.success);
        assert!(response.message.starts_with("Malformed payload entry 1"));
    }
}
