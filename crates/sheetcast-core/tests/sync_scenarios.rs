use sheetcast_core::sync::{
    Channel, PublisherSession, RecordingNotifier, Subscription, SyncEndpoint, SyncRequest,
    SyncService, UPDATES_RECEIVED,
};
use sheetcast_core::{GridSize, Sheet};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const SCENARIO_PAYLOAD: &str = "$A1 1\\n$B1 2\\n$A2 =A1+B1\\n";

fn service_with_sheet(owner: &str, sheet: &str) -> SyncService {
    let service = SyncService::default();
    assert!(service.register(owner).success);
    assert!(service.create_sheet(owner, &SyncRequest::new(owner, sheet)).success);
    service
}

#[test]
fn payload_apply_evaluates_formula() {
    let mut sheet = Sheet::new("scenario", 2, 2);
    sheet.write(1, 0, "3").unwrap();
    sheet.apply_payload(SCENARIO_PAYLOAD).unwrap();

    assert_eq!(sheet.get(0, 0).unwrap().value, "1");
    assert_eq!(sheet.get(0, 1).unwrap().value, "2");
    assert_eq!(sheet.get(1, 0).unwrap().raw, "=A1+B1");
    assert_eq!(sheet.get(1, 0).unwrap().value, "3");
    assert_eq!(sheet.encode_payload(), SCENARIO_PAYLOAD);
}

#[test]
fn sum_over_column() {
    let mut sheet = Sheet::new("sum", 5, 5);
    sheet.write_label("A1", "1").unwrap();
    sheet.write_label("A2", "2").unwrap();
    sheet.write_label("A3", "3").unwrap();
    sheet.write_label("B1", "=SUM(A1:A3)").unwrap();
    assert_eq!(sheet.get_by_label("B1").unwrap().value, "6");
}

#[test]
fn circular_reference_terminates_as_error() {
    let mut sheet = Sheet::new("cycle", 5, 5);
    sheet.write_label("A1", "=B1").unwrap();
    sheet.write_label("B1", "=A1").unwrap();
    assert_eq!(sheet.get_by_label("A1").unwrap().value, "Error");
    assert_eq!(sheet.get_by_label("B1").unwrap().value, "Error");
}

#[test]
fn version_ids_are_monotonic() {
    let service = service_with_sheet("ann", "s");
    for expected in 0..5 {
        let payload = format!("$A1 {}\\n", expected);
        let response = service.update_published(&SyncRequest::new("ann", "s").with_payload(payload));
        assert_eq!(response.versions[0].id, Some(expected));
    }
    let all = service.get_updates_for_subscription(&SyncRequest::new("ann", "s"));
    let ids: Vec<usize> = all.versions.iter().filter_map(|v| v.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[test]
fn refetching_is_idempotent() {
    let service = service_with_sheet("ann", "s");
    service.update_published(&SyncRequest::new("ann", "s").with_payload("$A1 1\\n"));
    service.update_published(&SyncRequest::new("ann", "s").with_payload("$A1 2\\n"));

    let request = SyncRequest::new("ann", "s").since(1);
    let first = service.get_updates_for_subscription(&request);
    let second = service.get_updates_for_subscription(&request);
    assert_eq!(first, second);
    assert_eq!(first.message, UPDATES_RECEIVED);
    assert_eq!(first.versions.len(), 1);
    assert_eq!(first.versions[0].payload, "$A1 2\\n");

    let current = service.get_updates_for_subscription(&SyncRequest::new("ann", "s").since(2));
    assert!(current.success);
    assert!(current.versions.is_empty());
}

#[test]
fn publisher_and_subscriber_round_trip() {
    let service = SyncService::default();
    assert!(service.register("ann").success);
    let notifier = Arc::new(RecordingNotifier::new());

    let mut publisher = PublisherSession::new("ann", "budget", GridSize::new(2, 2), notifier.clone());
    publisher.create(&service).unwrap();
    publisher.sheet.apply_payload(SCENARIO_PAYLOAD).unwrap();
    publisher.publish(&service).unwrap();

    let mut reader = Subscription::new("ann", "budget", GridSize::new(2, 2), notifier.clone());
    assert_eq!(reader.sync(&service).unwrap(), 1);
    assert_eq!(reader.sheet.get(1, 0).unwrap().value, "3");

    publisher.sheet.write_label("A1", "10").unwrap();
    publisher.publish(&service).unwrap();
    assert_eq!(reader.sync(&service).unwrap(), 1);
    assert_eq!(reader.sheet.get(1, 0).unwrap().value, "12");
    assert_eq!(reader.cursor, 2);
    assert_eq!(reader.sheet.subscribed.len(), 2);

    reader.sheet.write_label("B2", "=A2*2").unwrap();
    reader.push(&service).unwrap();
    assert_eq!(publisher.pull_changes(&service).unwrap(), 1);
    assert_eq!(publisher.sheet.get_by_label("B2").unwrap().value, "24");
}

#[test]
fn concurrent_publishers_get_dense_ids() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 10;

    let service = Arc::new(service_with_sheet("ann", "shared"));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|i| {
                        let payload = format!("$A1 {}\\n$B1 =A1*2\\n", t * PER_THREAD + i);
                        let request = SyncRequest::new("ann", "shared").with_payload(payload);
                        let response = service.update_published(&request);
                        assert!(response.success, "{}", response.message);
                        response.versions[0].id.unwrap()
                    })
                    .collect::<Vec<usize>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(ids.insert(id), "duplicate id {}", id);
        }
    }
    let total = THREADS * PER_THREAD;
    assert_eq!(ids, (0..total).collect::<HashSet<_>>());

    let versions = service
        .store()
        .updates_since("ann", "shared", Channel::Published, 0)
        .unwrap();
    assert_eq!(versions.len(), total);
    for (position, version) in versions.iter().enumerate() {
        assert_eq!(version.id, position);
    }
}

#[test]
fn concurrent_readers_see_whole_versions() {
    let service = Arc::new(service_with_sheet("ann", "live"));
    let writer = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            for i in 0..50 {
                let payload = format!("$A1 {}\\n$A2 =A1+1\\n", i);
                service.update_published(&SyncRequest::new("ann", "live").with_payload(payload));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for _ in 0..50 {
                    let response =
                        service.get_updates_for_subscription(&SyncRequest::new("ann", "live"));
                    for (position, entry) in response.versions.iter().enumerate() {
                        assert_eq!(entry.id, Some(position));
                        assert!(entry.payload.ends_with("$A2 =A1+1\\n"));
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn delete_racing_publishers_never_orphans_a_version() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 50;

    let service = Arc::new(service_with_sheet("ann", "doomed"));
    let old = service.store().sheet("ann", "doomed").unwrap();
    let publishers: Vec<_> = (0..THREADS)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                (0..PER_THREAD)
                    .filter(|i| {
                        let payload = format!("$A1 {}\\n", t * PER_THREAD + i);
                        let request = SyncRequest::new("ann", "doomed").with_payload(payload);
                        service.update_published(&request).success
                    })
                    .count()
            })
        })
        .collect();

    let deleter = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            thread::yield_now();
            let request = SyncRequest::new("ann", "doomed");
            assert!(service.delete_sheet("ann", &request).success);
            let frozen = old.history(Channel::Published).len();
            assert!(service.create_sheet("ann", &request).success);
            (old, frozen)
        })
    };

    let succeeded: usize = publishers.into_iter().map(|h| h.join().unwrap()).sum();
    let (old, frozen) = deleter.join().unwrap();

    // Nothing lands in the removed record once the delete has returned.
    assert_eq!(old.history(Channel::Published).len(), frozen);
    let current = service
        .store()
        .updates_since("ann", "doomed", Channel::Published, 0)
        .unwrap();
    assert_eq!(succeeded, frozen + current.len());
    for (position, version) in current.iter().enumerate() {
        assert_eq!(version.id, position);
    }
}
