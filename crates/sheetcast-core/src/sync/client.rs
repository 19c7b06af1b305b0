//! Client-side sessions: a publisher's working sheet and a reader's subscription.

use super::{Notifier, SyncEndpoint, SyncRequest, VersionEntry};
use crate::document::Sheet;
use crate::error::{Result, SheetcastError};
use sheetcast_engine::engine::GridSize;
use std::sync::Arc;

/// Report a result through the notifier and hand it back unchanged.
fn report<T>(
    notifier: &dyn Notifier,
    result: Result<T>,
    success: impl FnOnce(&T) -> String,
) -> Result<T> {
    match &result {
        Ok(value) => notifier.message(&success(value)),
        Err(err) => notifier.error(&err.to_string()),
    }
    result
}

/// Apply fetched versions in id order, advancing `cursor` past each one.
fn apply_versions(
    sheet: &mut Sheet,
    cursor: &mut usize,
    versions: &[VersionEntry],
) -> Result<usize> {
    let mut applied = 0;
    for entry in versions {
        let Some(id) = entry.id else {
            return Err(SheetcastError::Rejected("version without an id".to_string()));
        };
        if id < *cursor {
            continue;
        }
        sheet.apply_payload(&entry.payload)?;
        let snapshot = sheet.snapshot();
        sheet.append_subscribed_version(snapshot);
        *cursor = id + 1;
        applied += 1;
    }
    Ok(applied)
}

/// The owner's live sheet.
pub struct PublisherSession {
    pub user: String,
    pub sheet: Sheet,
    /// Next subscriber-change id to fetch.
    pub cursor: usize,
    notifier: Arc<dyn Notifier>,
}

impl PublisherSession {
    pub fn new(user: &str, sheet: &str, size: GridSize, notifier: Arc<dyn Notifier>) -> Self {
        PublisherSession {
            user: user.to_string(),
            sheet: Sheet::with_size(sheet, size),
            cursor: 0,
            notifier,
        }
    }

    fn request(&self) -> SyncRequest {
        SyncRequest::new(&self.user, &self.sheet.name)
    }

    /// Create the sheet on the server.
    pub fn create(&self, endpoint: &dyn SyncEndpoint) -> Result<()> {
        let result = endpoint.create_sheet(&self.user, &self.request()).into_result();
        report(self.notifier.as_ref(), result.map(|_| ()), |_| {
            format!("Created sheet {}", self.sheet.name)
        })
    }

    /// Send the working sheet as the next published version.
    /// Returns the id the server assigned.
    pub fn publish(&mut self, endpoint: &dyn SyncEndpoint) -> Result<usize> {
        let request = self.request().with_payload(self.sheet.encode_payload());
        let result = endpoint
            .update_published(&request)
            .into_result()
            .and_then(|versions| {
                versions
                    .first()
                    .and_then(|v| v.id)
                    .ok_or_else(|| SheetcastError::Rejected("no version id returned".to_string()))
            });
        if result.is_ok() {
            self.sheet.append_published_version();
        }
        report(self.notifier.as_ref(), result, |id| {
            format!("Published {} version {}", self.sheet.name, id)
        })
    }

    /// Merge subscriber changes made since the last pull.
    pub fn pull_changes(&mut self, endpoint: &dyn SyncEndpoint) -> Result<usize> {
        let request = self.request().since(self.cursor);
        let result = endpoint
            .get_updates_for_published(&request)
            .into_result()
            .and_then(|versions| apply_versions(&mut self.sheet, &mut self.cursor, &versions));
        report(self.notifier.as_ref(), result, |n| {
            format!("Applied {} subscriber change(s)", n)
        })
    }
}

/// A reader's copy of someone else's sheet.
pub struct Subscription {
    pub publisher: String,
    pub sheet: Sheet,
    /// Next published id to fetch.
    pub cursor: usize,
    notifier: Arc<dyn Notifier>,
}

impl Subscription {
    pub fn new(publisher: &str, sheet: &str, size: GridSize, notifier: Arc<dyn Notifier>) -> Self {
        Subscription {
            publisher: publisher.to_string(),
            sheet: Sheet::with_size(sheet, size),
            cursor: 0,
            notifier,
        }
    }

    fn request(&self) -> SyncRequest {
        SyncRequest::new(&self.publisher, &self.sheet.name)
    }

    /// Overwrite-merge one payload and record the result as a subscribed version.
    pub fn apply_update(&mut self, payload: &str) -> Result<usize> {
        self.sheet.apply_payload(payload)?;
        let snapshot = self.sheet.snapshot();
        Ok(self.sheet.append_subscribed_version(snapshot))
    }

    /// Fetch and apply every published version from the cursor on.
    pub fn sync(&mut self, endpoint: &dyn SyncEndpoint) -> Result<usize> {
        let request = self.request().since(self.cursor);
        let result = endpoint
            .get_updates_for_subscription(&request)
            .into_result()
            .and_then(|versions| apply_versions(&mut self.sheet, &mut self.cursor, &versions));
        tracing::debug!(
            publisher = %self.publisher,
            sheet = %self.sheet.name,
            cursor = self.cursor,
            "synced"
        );
        report(self.notifier.as_ref(), result, |n| {
            format!("Received {} update(s)", n)
        })
    }

    /// Send the local copy back to the publisher as a subscriber change.
    pub fn push(&self, endpoint: &dyn SyncEndpoint) -> Result<()> {
        let request = self.request().with_payload(self.sheet.encode_payload());
        let result = endpoint.update_subscription(&request).into_result();
        report(self.notifier.as_ref(), result.map(|_| ()), |_| {
            format!("Sent changes to {}", self.publisher)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{Notice, RecordingNotifier, SyncService};

    fn setup() -> (SyncService, Arc<RecordingNotifier>) {
        let service = SyncService::default();
        assert!(service.register("ann").success);
        (service, Arc::new(RecordingNotifier::new()))
    }

    #[test]
    fn test_publish_then_subscribe() {
        let (service, notifier) = setup();
        let mut publisher = PublisherSession::new("ann", "s", GridSize::new(2, 2), notifier.clone());
        publisher.create(&service).unwrap();
        publisher.sheet.write_label("A2", "3").unwrap();
        publisher
            .sheet
            .apply_payload("$A1 1\\n$B1 2\\n$A2 =A1+B1\\n")
            .unwrap();
        assert_eq!(publisher.publish(&service).unwrap(), 0);
        assert_eq!(publisher.sheet.published.len(), 1);

        let mut reader = Subscription::new("ann", "s", GridSize::new(2, 2), notifier.clone());
        assert_eq!(reader.sync(&service).unwrap(), 1);
        assert_eq!(reader.cursor, 1);
        assert_eq!(reader.sheet.get_by_label("A2").unwrap().value, "3");
        assert_eq!(reader.sheet.subscribed.len(), 1);

        assert_eq!(reader.sync(&service).unwrap(), 0);
        assert_eq!(reader.sheet.subscribed.len(), 1);
        assert!(matches!(notifier.notices().last(), Some(Notice::Message(_))));
    }

    #[test]
    fn test_subscriber_push_reaches_publisher() {
        let (service, notifier) = setup();
        let mut publisher = PublisherSession::new("ann", "s", GridSize::new(3, 3), notifier.clone());
        publisher.create(&service).unwrap();
        publisher.sheet.write_label("A1", "10").unwrap();
        publisher.publish(&service).unwrap();

        let mut reader = Subscription::new("ann", "s", GridSize::new(3, 3), notifier.clone());
        reader.sync(&service).unwrap();
        reader.sheet.write_label("B1", "=A1*2").unwrap();
        reader.push(&service).unwrap();

        assert_eq!(publisher.pull_changes(&service).unwrap(), 1);
        assert_eq!(publisher.cursor, 1);
        assert_eq!(publisher.sheet.get_by_label("B1").unwrap().value, "20");
        assert_eq!(publisher.pull_changes(&service).unwrap(), 0);
    }

    #[test]
    fn test_failures_are_reported() {
        let (service, notifier) = setup();
        let mut reader = Subscription::new("ann", "missing", GridSize::new(2, 2), notifier.clone());
        assert!(matches!(reader.sync(&service), Err(SheetcastError::Rejected(_))));
        assert_eq!(
            notifier.drain(),
            vec![Notice::Error("Request rejected: Sheet not found: missing".to_string())]
        );
    }

    #[test]
    fn test_apply_update_appends_snapshot() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut reader = Subscription::new("ann", "s", GridSize::new(2, 2), notifier);
        assert_eq!(reader.apply_update("$A1 5\\n").unwrap(), 0);
        assert_eq!(reader.apply_update("$B1 =A1+1\\n").unwrap(), 1);
        assert_eq!(reader.sheet.get_by_label("B1").unwrap().value, "6");
        assert_eq!(reader.sheet.subscribed[0].len(), 1);
        assert!(reader.apply_update("$Q9 x\\n").is_err());
        assert_eq!(reader.sheet.subscribed.len(), 2);
    }
}
