mod common;

use civic_core::fixtures;
use civic_core::model::{ComplaintId, Status};
use civic_core::ranking::Projection;
use civic_core::session::Role;
use civic_core::view::{Screen, ToastKind, ViewState};
use civic_core::{ErrorKind, Event};
use common::{
    ack, failure, header, http_requests, kv_requests, ok, respond, signed_in, single_http,
    timed_out, Tester,
};
use crux_kv::KeyValueOperation;

fn id() -> ComplaintId {
    ComplaintId::new("c1")
}

#[test]
fn test_status_change_applies_then_commits() {
    let app = Tester::default();
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![fixtures::complaint("c1", "Pothole")]);

    let update = app.update(
        Event::StatusChangeRequested {
            id: id(),
            status: Status::InProgress,
        },
        &mut model,
    );

    let local = model.store.get(&id()).unwrap();
    assert_eq!(local.status, Status::InProgress);
    assert!(local.timestamps.in_progress.is_some());
    assert!(model.mutations.has_pending_for(&id()));

    let mut request = single_http(update.effects);
    assert_eq!(request.operation.method, "PUT");
    assert!(request.operation.url.ends_with("/admin/complaints/c1/status"));
    assert_eq!(header(&request, "authorization"), Some("Bearer token-1"));

    let mut server = fixtures::complaint("c1", "Pothole");
    server.status = Status::InProgress;
    server.timestamps.in_progress = local.timestamps.in_progress;
    server.upvotes = 7;
    respond(
        &app,
        &mut request,
        ok(serde_json::json!({ "complaint": server })),
        &mut model,
    );

    assert!(model.mutations.is_empty());
    let committed = model.store.get(&id()).unwrap();
    assert_eq!(committed.status, Status::InProgress);
    assert_eq!(committed.upvotes, 7);
    assert_eq!(model.toast.as_ref().unwrap().kind, ToastKind::Success);
}

#[test]
fn test_failed_status_change_rolls_back() {
    let app = Tester::default();
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![fixtures::complaint("c1", "Pothole")]);

    let update = app.update(
        Event::StatusChangeRequested {
            id: id(),
            status: Status::Resolved,
        },
        &mut model,
    );
    assert_eq!(model.store.get(&id()).unwrap().status, Status::Resolved);

    let mut request = single_http(update.effects);
    respond(&app, &mut request, failure(500, "Database unavailable"), &mut model);

    let restored = model.store.get(&id()).unwrap();
    assert_eq!(restored.status, Status::Pending);
    assert!(restored.timestamps.in_progress.is_none());
    assert!(restored.timestamps.resolved.is_none());
    assert!(model.mutations.is_empty());
    let toast = model.toast.as_ref().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, "Database unavailable");
}

#[test]
fn test_transport_error_rolls_back() {
    let app = Tester::default();
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![fixtures::complaint("c1", "Pothole")]);

    let update = app.update(Event::AssignRequested { id: id() }, &mut model);
    let mut request = single_http(update.effects);
    assert!(request.operation.url.ends_with("/assign"));

    respond(&app, &mut request, timed_out(), &mut model);
    assert_eq!(model.store.get(&id()).unwrap().status, Status::Pending);
}

#[test]
fn test_rollback_keeps_a_refetch_that_landed_in_flight() {
    let app = Tester::default();
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![fixtures::complaint("c1", "Pothole")]);
    model.projection = Projection::AdminAll;

    let change = app.update(
        Event::StatusChangeRequested {
            id: id(),
            status: Status::Resolved,
        },
        &mut model,
    );
    let mut change_request = single_http(change.effects);

    let refresh = app.update(Event::RefreshRequested, &mut model);
    let mut refresh_request = single_http(refresh.effects);
    let mut fresh = fixtures::complaint("c1", "Pothole");
    fresh.status = Status::Resolved;
    fresh.timestamps.in_progress = fresh.timestamps.filed;
    fresh.timestamps.resolved = fresh.timestamps.filed;
    fresh.upvotes = 42;
    fresh.admin_notes = Some("crew dispatched".into());
    respond(
        &app,
        &mut refresh_request,
        ok(serde_json::json!({ "complaints": [fresh] })),
        &mut model,
    );

    respond(&app, &mut change_request, failure(500, "Database unavailable"), &mut model);

    let complaint = model.store.get(&id()).unwrap();
    assert_eq!(complaint.status, Status::Pending);
    assert!(complaint.timestamps.resolved.is_none());
    assert_eq!(complaint.upvotes, 42);
    assert_eq!(complaint.admin_notes.as_deref(), Some("crew dispatched"));
}

#[test]
fn test_my_complaints_without_reporter_are_listed() {
    let app = Tester::default();
    let mut model = signed_in(&app, "citizen-1", Role::Citizen, vec![]);

    let update = app.update(Event::ProjectionSelected(Projection::MyActive), &mut model);
    let mut request = single_http(update.effects);
    assert!(request.operation.url.contains("my-complaints"));

    let mut mine = fixtures::complaint("m1", "Broken streetlight");
    mine.reporter = None;
    respond(
        &app,
        &mut request,
        ok(serde_json::json!({ "complaints": [mine] })),
        &mut model,
    );

    let ViewState::Complaints { rows, .. } = app.view(&model).state else {
        panic!("expected the complaint list");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "m1");
}

#[test]
fn test_second_change_waits_for_the_first() {
    let app = Tester::default();
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![fixtures::complaint("c1", "Pothole")]);

    let first = app.update(
        Event::StatusChangeRequested {
            id: id(),
            status: Status::InProgress,
        },
        &mut model,
    );
    let mut request = single_http(first.effects);

    let second = app.update(
        Event::StatusChangeRequested {
            id: id(),
            status: Status::Resolved,
        },
        &mut model,
    );
    assert!(http_requests(second.effects).is_empty());
    assert_eq!(model.store.get(&id()).unwrap().status, Status::InProgress);
    assert_eq!(model.toast.as_ref().unwrap().kind, ToastKind::Error);

    respond(&app, &mut request, ack(), &mut model);
    assert!(model.mutations.is_empty());
    assert_eq!(model.store.get(&id()).unwrap().status, Status::InProgress);
}

#[test]
fn test_row_shows_updating_while_in_flight() {
    let app = Tester::default();
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![fixtures::complaint("c1", "Pothole")]);
    model.projection = Projection::AdminAll;

    app.update(
        Event::StatusChangeRequested {
            id: id(),
            status: Status::InProgress,
        },
        &mut model,
    );

    let ViewState::Complaints { rows, can_manage, .. } = app.view(&model).state else {
        panic!("expected the complaint list");
    };
    assert!(can_manage);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_updating);
    assert_eq!(rows[0].status, Status::InProgress);
}

#[test]
fn test_citizen_cannot_change_status() {
    let app = Tester::default();
    let mut model = signed_in(&app, "citizen-1", Role::Citizen, vec![fixtures::complaint("c1", "Pothole")]);

    let update = app.update(
        Event::StatusChangeRequested {
            id: id(),
            status: Status::Resolved,
        },
        &mut model,
    );

    assert!(http_requests(update.effects).is_empty());
    assert_eq!(model.store.get(&id()).unwrap().status, Status::Pending);
    assert_eq!(model.error.as_ref().unwrap().kind, ErrorKind::Authorization);
}

#[test]
fn test_assign_requires_pending() {
    let app = Tester::default();
    let mut resolved = fixtures::complaint("c1", "Pothole");
    resolved.status = Status::Resolved;
    resolved.timestamps.in_progress = resolved.timestamps.filed;
    resolved.timestamps.resolved = resolved.timestamps.filed;
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![resolved]);

    let update = app.update(Event::AssignRequested { id: id() }, &mut model);

    assert!(http_requests(update.effects).is_empty());
    assert_eq!(model.store.get(&id()).unwrap().status, Status::Resolved);
    assert_eq!(model.error.as_ref().unwrap().kind, ErrorKind::Validation);
}

#[test]
fn test_expired_token_signs_out() {
    let app = Tester::default();
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![fixtures::complaint("c1", "Pothole")]);

    let update = app.update(
        Event::StatusChangeRequested {
            id: id(),
            status: Status::InProgress,
        },
        &mut model,
    );
    let mut request = single_http(update.effects);
    let effects = respond(&app, &mut request, failure(401, "Token expired"), &mut model);

    assert!(model.session.is_none());
    assert_eq!(model.screen, Screen::Login);
    assert!(model.mutations.is_empty());
    assert!(model.store.is_empty());
    assert_eq!(model.toast.as_ref().unwrap().kind, ToastKind::Warning);

    let deletes = kv_requests(effects);
    assert_eq!(deletes.len(), 1);
    assert!(matches!(deletes[0].operation, KeyValueOperation::Delete { .. }));
}

#[test]
fn test_stale_page_is_ignored() {
    let app = Tester::default();
    let mut model = signed_in(&app, "admin-1", Role::Admin, vec![]);

    let pending = app.update(
        Event::ProjectionSelected(Projection::AdminPending),
        &mut model,
    );
    let mut pending_request = single_http(pending.effects);
    assert!(pending_request.operation.url.contains("status=pending"));

    let resolved = app.update(
        Event::ProjectionSelected(Projection::AdminResolved),
        &mut model,
    );
    let mut resolved_request = single_http(resolved.effects);

    let mut late = fixtures::complaint("p1", "Late pending page");
    late.status = Status::Pending;
    respond(
        &app,
        &mut pending_request,
        ok(serde_json::json!({ "complaints": [late] })),
        &mut model,
    );
    assert!(model.store.is_empty());

    let mut done = fixtures::complaint("r1", "Fixed");
    done.status = Status::Resolved;
    done.timestamps.in_progress = done.timestamps.filed;
    done.timestamps.resolved = done.timestamps.filed;
    respond(
        &app,
        &mut resolved_request,
        ok(serde_json::json!([done])),
        &mut model,
    );
    assert_eq!(model.store.len(), 1);
    assert!(model.store.contains(&ComplaintId::new("r1")));
    assert!(!model.is_loading);
}
