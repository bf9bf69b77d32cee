//! Integration tests for the live board.

use liveboard::{
    collections, Announcement, BackingStore, ChangeFeedClient, ClaimOutcome, DropReason,
    FeedConfig, FsAttachmentStore, Identity, MaterialRequest, MutationGateway, PaymentLedger,
    PaymentObligation, RecordUpdate, Role, ANNOUNCEMENT_SCHEMA, MATERIAL_SCHEMA, PAYMENT_SCHEMA,
};
use liveboard::{ClaimArbiter, Timestamp};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn alice() -> Identity {
    Identity::new("A", "Alice", Role::Standard)
}

fn bob() -> Identity {
    Identity::new("B", "Bob", Role::Standard)
}

// --- Generic collection workflow ---

#[test]
fn test_create_then_snapshot_shows_record() {
    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);
    let client = ChangeFeedClient::subscribe(store, collections::ANNOUNCEMENTS);

    let id = gateway
        .create(Announcement::fields("Field trip", "Friday, bring lunch"))
        .unwrap();

    client.poll();
    let view = client.view();
    let record = view.get(id).unwrap();
    assert!(record.id.0 > 0);
    assert!(record.created_at.0 > 0);
    assert_eq!(record.str_field("title"), Some("Field trip"));
    assert_eq!(record.str_field("description"), Some("Friday, bring lunch"));
}

#[test]
fn test_update_changes_only_provided_fields() {
    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);
    let client = ChangeFeedClient::subscribe(store, collections::ANNOUNCEMENTS);

    let id = gateway
        .create(Announcement::fields("original", "body"))
        .unwrap();

    gateway
        .update(id, RecordUpdate::new().set("title", json!("changed")))
        .unwrap();

    client.poll();
    let view = client.view();
    let announcement = Announcement::from_record(view.get(id).unwrap());
    assert_eq!(announcement.title, "changed");
    assert_eq!(announcement.description, "body");
}

#[test]
fn test_listing_order_is_created_at_descending() {
    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);
    let client = ChangeFeedClient::subscribe(store, collections::ANNOUNCEMENTS);

    let first = gateway.create(Announcement::fields("first", "-")).unwrap();
    let second = gateway.create(Announcement::fields("second", "-")).unwrap();
    let third = gateway.create(Announcement::fields("third", "-")).unwrap();

    client.poll();
    let view = client.view();
    let order: Vec<_> = view.iter().map(|r| r.id).collect();
    assert_eq!(order, vec![third, second, first]);

    // Updating an old record does not move it: created_at never changes.
    gateway
        .update(first, RecordUpdate::new().set("title", json!("bumped?")))
        .unwrap();
    client.poll();
    let view = client.view();
    let order: Vec<_> = view.iter().map(|r| r.id).collect();
    assert_eq!(order, vec![third, second, first]);
}

#[test]
fn test_two_participants_converge_through_the_store() {
    let store = Arc::new(BackingStore::new());
    let gateway_a = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);
    let client_a = ChangeFeedClient::subscribe(store.clone(), collections::ANNOUNCEMENTS);
    let client_b = ChangeFeedClient::subscribe(store, collections::ANNOUNCEMENTS);

    let id = gateway_a
        .create(Announcement::fields("shared", "visible to everyone"))
        .unwrap();

    client_a.poll();
    client_b.poll();
    assert!(client_a.view().get(id).is_some());
    assert!(client_b.view().get(id).is_some());
}

#[test]
fn test_suspension_then_resume_redelivers_full_state() {
    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);
    let client = ChangeFeedClient::subscribe(store, collections::ANNOUNCEMENTS);

    client.suspend();
    gateway.create(Announcement::fields("a", "-")).unwrap();
    gateway.create(Announcement::fields("b", "-")).unwrap();
    assert_eq!(client.poll(), 0);
    assert!(client.view().is_empty());

    client.resume();
    assert_eq!(client.view().len(), 2);
    assert!(client.is_live());
}

#[test]
fn test_slow_subscriber_is_dropped() {
    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);
    let client = ChangeFeedClient::subscribe_with(
        store.clone(),
        collections::ANNOUNCEMENTS,
        FeedConfig { buffer_size: 2 },
    );

    for i in 0..10 {
        gateway
            .create(Announcement::fields(&format!("{}", i), "-"))
            .unwrap();
    }

    assert_eq!(store.subscriber_count(), 0);
    client.poll();
    // Either the explicit overflow event made it through, or the channel was
    // already too full to carry it and the client saw the disconnect.
    assert!(matches!(
        client.drop_reason(),
        Some(DropReason::BufferOverflow) | Some(DropReason::Disconnected)
    ));
    assert!(!client.is_live());
}

#[test]
fn test_resubscribe_starts_from_current_state() {
    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);

    let client = ChangeFeedClient::subscribe(store.clone(), collections::ANNOUNCEMENTS);
    gateway.create(Announcement::fields("early", "-")).unwrap();
    client.unsubscribe();

    gateway.create(Announcement::fields("late", "-")).unwrap();

    // A fresh subscription sees everything committed so far, with no replay
    // of intermediate snapshots.
    let client = ChangeFeedClient::subscribe(store, collections::ANNOUNCEMENTS);
    assert_eq!(client.view().len(), 2);
}

// --- Materials scenario ---

#[test]
fn test_material_claim_scenario() {
    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), MATERIAL_SCHEMA);
    let client = Arc::new(ChangeFeedClient::subscribe(
        store.clone(),
        collections::MATERIALS,
    ));
    let arbiter = ClaimArbiter::new(gateway.clone(), client.clone());

    let items = vec!["glue".to_string(), "scissors".to_string()];
    let id = gateway
        .create(MaterialRequest::fields("Art class", "per child", &items))
        .unwrap();

    // Participant A takes index 0
    let outcome = arbiter.take(id, 0, &alice()).unwrap();
    assert_eq!(outcome, ClaimOutcome::Taken);

    client.poll();
    let request = MaterialRequest::from_record(client.view().get(id).unwrap());
    let claim = request.assignment(0).unwrap();
    assert_eq!(claim.claimant_id.as_deref(), Some("A"));
    assert_eq!(claim.claimant_name, "Alice");

    // Participant B is rejected, assignments unchanged
    let err = arbiter.take(id, 0, &bob()).unwrap_err();
    match err {
        liveboard::SyncError::AlreadyClaimed { held_by } => assert_eq!(held_by, "Alice"),
        other => panic!("expected AlreadyClaimed, got {:?}", other),
    }
    client.poll();
    let request = MaterialRequest::from_record(client.view().get(id).unwrap());
    assert_eq!(request.assignment(0).unwrap().claimant_name, "Alice");

    // A takes again: toggle releases
    let outcome = arbiter.take(id, 0, &alice()).unwrap();
    assert_eq!(outcome, ClaimOutcome::Released);

    client.poll();
    let request = MaterialRequest::from_record(client.view().get(id).unwrap());
    assert!(request.assignment(0).is_none());

    // Index 1 was never involved
    assert!(request.assignment(1).is_none());
    assert_eq!(request.items, vec!["glue", "scissors"]);
}

// --- Payments scenario ---

#[test]
fn test_payment_settlement_scenario() {
    let dir = TempDir::new().unwrap();
    let attachments = Arc::new(FsAttachmentStore::new(dir.path().join("files"), 16).unwrap());

    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), PAYMENT_SCHEMA);
    let client = Arc::new(ChangeFeedClient::subscribe(
        store.clone(),
        collections::PAYMENTS,
    ));
    let ledger = PaymentLedger::new(gateway, client.clone(), attachments);

    let id = ledger.add_payment("Photo", 100.0).unwrap();

    ledger.settle(id, "parent7").unwrap();
    client.poll();
    let payment = PaymentObligation::from_record(client.view().get(id).unwrap());
    assert_eq!(payment.settled_by, vec!["parent7"]);

    // Settling twice keeps exactly one membership entry
    ledger.settle(id, "parent7").unwrap();
    client.poll();
    let payment = PaymentObligation::from_record(client.view().get(id).unwrap());
    assert_eq!(payment.settled_by, vec!["parent7"]);

    // A receipt is evidence, not settlement
    let reference = ledger
        .attach_receipt(id, "parent8", b"scan bytes", "receipt.png")
        .unwrap();
    client.poll();
    let payment = PaymentObligation::from_record(client.view().get(id).unwrap());
    assert_eq!(payment.settled_by, vec!["parent7"]);
    assert_eq!(payment.receipts.get("parent8"), Some(&reference));
    assert!(!payment.is_settled_by("parent8"));

    ledger.unsettle(id, "parent7").unwrap();
    client.poll();
    let payment = PaymentObligation::from_record(client.view().get(id).unwrap());
    assert!(payment.settled_by.is_empty());
    // The receipt stays
    assert!(payment.receipts.contains_key("parent8"));
}

#[test]
fn test_monotonic_created_at_within_one_tick() {
    let store = Arc::new(BackingStore::new());
    let gateway = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);
    let client = ChangeFeedClient::subscribe(store, collections::ANNOUNCEMENTS);

    for i in 0..50 {
        gateway
            .create(Announcement::fields(&format!("{}", i), "-"))
            .unwrap();
    }

    client.poll();
    let view = client.view();
    let stamps: Vec<Timestamp> = view.iter().map(|r| r.created_at).collect();
    for pair in stamps.windows(2) {
        assert!(pair[0] > pair[1], "created_at must be strictly decreasing");
    }
}
