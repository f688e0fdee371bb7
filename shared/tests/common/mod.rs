#![allow(dead_code)]

use civic_core::capabilities::HttpError;
use civic_core::model::{Complaint, UserId};
use civic_core::session::{Role, Session, UserProfile};
use civic_core::{App, Effect, Event, Model};
use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use crux_kv::KeyValueOperation;
use serde_json::json;

pub type Tester = AppTester<App, Effect>;

pub fn profile(id: &str, role: Role) -> UserProfile {
    UserProfile {
        id: UserId::new(id),
        username: format!("{id}-name"),
        email: format!("{id}@example.com"),
        role,
        mobile: None,
        address: None,
    }
}

pub fn stored_session(token: &str, user_id: &str, role: Role) -> Vec<u8> {
    Session::new(token, profile(user_id, role))
        .unwrap()
        .to_bytes()
        .unwrap()
}

/// A model whose session was restored from storage, holding `complaints`.
pub fn signed_in(app: &Tester, user_id: &str, role: Role, complaints: Vec<Complaint>) -> Model {
    let mut model = Model::default();
    let bytes = stored_session("token-1", user_id, role);
    app.update(Event::SessionLoaded(Box::new(Ok(Some(bytes)))), &mut model);
    model.is_loading = false;
    model.store.replace_all(complaints);
    model.upvotes.reconcile(model.store.iter());
    model
}

pub fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn kv_requests(effects: Vec<Effect>) -> Vec<Request<KeyValueOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::KeyValue(request) => Some(request),
            _ => None,
        })
        .collect()
}

/// Separates HTTP and storage requests, dropping renders.
pub fn split(
    effects: Vec<Effect>,
) -> (Vec<Request<HttpRequest>>, Vec<Request<KeyValueOperation>>) {
    let mut http = Vec::new();
    let mut kv = Vec::new();
    for effect in effects {
        match effect {
            Effect::Http(request) => http.push(request),
            Effect::KeyValue(request) => kv.push(request),
            Effect::Render(_) => {}
        }
    }
    (http, kv)
}

pub fn single_http(effects: Vec<Effect>) -> Request<HttpRequest> {
    let mut requests = http_requests(effects);
    assert_eq!(requests.len(), 1, "expected exactly one HTTP request");
    requests.remove(0)
}

pub fn header<'a>(request: &'a Request<HttpRequest>, name: &str) -> Option<&'a str> {
    request
        .operation
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Feeds events produced by a resolved effect back into the app and
/// collects whatever effects they raise.
pub fn apply(app: &Tester, events: Vec<Event>, model: &mut Model) -> Vec<Effect> {
    let mut effects = Vec::new();
    for event in events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

pub fn respond(
    app: &Tester,
    request: &mut Request<HttpRequest>,
    result: HttpResult,
    model: &mut Model,
) -> Vec<Effect> {
    let update = app.resolve(request, result).expect("request resolves");
    apply(app, update.events, model)
}

pub fn reply(status: u16, body: &serde_json::Value) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(status).json(body).build())
}

pub fn ok(data: serde_json::Value) -> HttpResult {
    reply(200, &json!({ "success": true, "data": data }))
}

pub fn ack() -> HttpResult {
    reply(200, &json!({ "success": true, "message": "ok" }))
}

pub fn failure(status: u16, message: &str) -> HttpResult {
    reply(status, &json!({ "success": false, "message": message }))
}

pub fn timed_out() -> HttpResult {
    HttpResult::Err(HttpError::Timeout)
}
