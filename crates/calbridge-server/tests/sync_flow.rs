//! End-to-end dispatcher flows against scripted providers.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tempfile::TempDir;

use calbridge_core::{EventParams, SourceType, VEvent};
use calbridge_providers::{
    AccessInfoEntry, AccessInfoStore, BoxFuture, EwsEventData, EwsGateway, EwsProvider,
    EwsSession, GoogleProvider, HttpTransport, HttpVerb, Office365Provider, ProviderRegistry,
    SyncResult, TokenRefresher, WireResponse,
};
use calbridge_server::{Dispatcher, MutationRequest};
use calbridge_store::{EventStore, MemoryEventStore};

struct ScriptedTransport {
    responses: Mutex<Vec<Option<WireResponse>>>,
    calls: Mutex<Vec<(HttpVerb, String, Vec<(String, String)>, Option<String>)>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Option<WireResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute<'a>(
        &'a self,
        verb: HttpVerb,
        url: &'a str,
        headers: &'a [(String, String)],
        body: Option<&'a str>,
    ) -> BoxFuture<'a, Option<WireResponse>> {
        self.calls.lock().unwrap().push((
            verb,
            url.to_string(),
            headers.to_vec(),
            body.map(String::from),
        ));
        let response = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                responses.remove(0)
            }
        };
        Box::pin(async move { response })
    }
}

struct ScriptedEwsSession {
    results: Arc<Mutex<Vec<EwsEventData>>>,
}

impl EwsSession for ScriptedEwsSession {
    fn create_event<'a>(
        &'a self,
        _params: &'a EventParams,
    ) -> BoxFuture<'a, SyncResult<EwsEventData>> {
        let data = self.results.lock().unwrap().remove(0);
        Box::pin(async move { Ok(data) })
    }

    fn update_event<'a>(
        &'a self,
        params: &'a EventParams,
    ) -> BoxFuture<'a, SyncResult<EwsEventData>> {
        self.create_event(params)
    }

    fn delete_event<'a>(&'a self, _event: &'a VEvent) -> BoxFuture<'a, SyncResult<String>> {
        Box::pin(async { Ok("OK".to_string()) })
    }
}

struct ScriptedEwsGateway {
    results: Arc<Mutex<Vec<EwsEventData>>>,
}

impl EwsGateway for ScriptedEwsGateway {
    fn open<'a>(
        &'a self,
        _account: &'a str,
        _password: &'a str,
        _url: &'a str,
    ) -> BoxFuture<'a, SyncResult<Box<dyn EwsSession>>> {
        let results = Arc::clone(&self.results);
        Box::pin(async move { Ok(Box::new(ScriptedEwsSession { results }) as Box<dyn EwsSession>) })
    }
}

struct Harness {
    _dir: TempDir,
    dispatcher: Dispatcher,
    store: Arc<dyn EventStore>,
    access_store: Arc<AccessInfoStore>,
    provider_transport: Arc<ScriptedTransport>,
    token_transport: Arc<ScriptedTransport>,
}

fn google_entry() -> AccessInfoEntry {
    AccessInfoEntry {
        src_type: "Google".to_string(),
        src_account_name: "alice@example.com".to_string(),
        access_token: "token-1".to_string(),
        refresh_token: "refresh-1".to_string(),
        calendar_id: "primary".to_string(),
        ..AccessInfoEntry::default()
    }
}

fn ews_entry() -> AccessInfoEntry {
    AccessInfoEntry {
        src_type: "EWS".to_string(),
        src_account_name: "alice@corp.example".to_string(),
        pw: "hunter2".to_string(),
        src_url: "https://mail.corp.example/EWS/Exchange.asmx".to_string(),
        ..AccessInfoEntry::default()
    }
}

fn harness(
    provider_responses: Vec<Option<WireResponse>>,
    token_responses: Vec<Option<WireResponse>>,
    ews_results: Vec<EwsEventData>,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn EventStore> = Arc::new(MemoryEventStore::new());
    let access_store = Arc::new(AccessInfoStore::with_entries(
        dir.path().join("access_info.json"),
        vec![google_entry(), ews_entry()],
    ));

    let provider_transport = ScriptedTransport::new(provider_responses);
    let token_transport = ScriptedTransport::new(token_responses);
    let refresher = TokenRefresher::new(
        "https://token.example/exchange",
        token_transport.clone() as Arc<dyn HttpTransport>,
    );

    let registry = ProviderRegistry::new()
        .with(Arc::new(GoogleProvider::new(
            "https://www.googleapis.com/calendar/v3/calendars",
            provider_transport.clone() as Arc<dyn HttpTransport>,
            refresher.clone(),
            Arc::clone(&access_store),
        )))
        .with(Arc::new(Office365Provider::new(
            "https://outlook.office.com/api/v2.0/me/events",
            provider_transport.clone() as Arc<dyn HttpTransport>,
            refresher,
            Arc::clone(&access_store),
        )))
        .with(Arc::new(EwsProvider::new(Arc::new(ScriptedEwsGateway {
            results: Arc::new(Mutex::new(ews_results)),
        }))));

    let dispatcher = Dispatcher::new(
        Arc::clone(&store),
        Arc::clone(&access_store),
        registry,
        64,
    );

    Harness {
        _dir: dir,
        dispatcher,
        store,
        access_store,
        provider_transport,
        token_transport,
    }
}

fn google_event_body(id: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "start": {{"dateTime": "2024-03-15T10:30:00Z"}},
            "end": {{"dateTime": "2024-03-15T11:00:00Z"}},
            "updated": "2024-03-15T09:00:00Z",
            "summary": "Standup",
            "organizer": {{"email": "alice@example.com"}},
            "attendees": [{{"email": "bob@example.com"}}]
        }}"#
    )
}

fn create_request() -> MutationRequest {
    MutationRequest::with_body(
        "POST",
        r#"{
            "srcType": "Google",
            "srcAccountName": "alice@example.com",
            "dtstart": "2024-03-15T10:30:00.000Z",
            "dtend": "2024-03-15T11:00:00.000Z",
            "summary": "Standup",
            "attendees": ["bob@example.com"]
        }"#,
    )
}

fn ews_data(ical_uid: &str, uid: &str) -> EwsEventData {
    EwsEventData {
        i_cal_uid: ical_uid.to_string(),
        uid: uid.to_string(),
        start: "2024-03-15T10:30:00Z".to_string(),
        end: "2024-03-15T11:00:00Z".to_string(),
        updated: "2024-03-15T09:00:00Z".to_string(),
        subject: Some("Recurring".to_string()),
        attendees: String::new(),
        ..EwsEventData::default()
    }
}

fn body_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn create_stores_provider_confirmed_event() {
    let h = harness(
        vec![Some(WireResponse::new(200, google_event_body("gcal-1")))],
        vec![],
        vec![],
    );

    let response = h.dispatcher.handle(&create_request()).await;
    assert_eq!(response.status, 200);

    let event = body_json(&response.body);
    assert_eq!(event["id"], "gcal-1");
    assert_eq!(event["srcType"], "Google");
    assert_eq!(event["srcAccountName"], "alice@example.com");
    assert_eq!(event["dtstart"], "/Date(1710498600000)/");
    assert_eq!(event["attendees"][0], "bob@example.com");

    let stored = h.store.retrieve("gcal-1").unwrap();
    assert_eq!(stored.src_id, "gcal-1");
}

#[tokio::test]
async fn unknown_method_is_405() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body("GET", "{}"))
        .await;
    assert_eq!(response.status, 405);
    assert_eq!(body_json(&response.body)["error"], "method not allowed");
}

#[tokio::test]
async fn empty_body_is_400() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body("POST", ""))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        body_json(&response.body)["error"],
        "required parameter not exist."
    );
}

#[tokio::test]
async fn create_missing_dtend_names_the_field() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body(
            "POST",
            r#"{"srcType": "Google", "srcAccountName": "alice@example.com",
                "dtstart": "2024-03-15T10:30:00.000Z"}"#,
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        body_json(&response.body)["error"],
        "missing required(dtend) parameter."
    );
}

#[tokio::test]
async fn create_numeric_dtstart_is_client_error() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body(
            "POST",
            r#"{"srcType": "Google", "srcAccountName": "alice@example.com",
                "dtstart": 123, "dtend": "2024-03-15T11:00:00.000Z"}"#,
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        body_json(&response.body)["error"],
        "missing required(dtstart) parameter."
    );
}

#[tokio::test]
async fn create_empty_string_attendees_is_rejected() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body(
            "POST",
            r#"{"srcType": "Google", "srcAccountName": "alice@example.com",
                "dtstart": "x", "dtend": "y", "attendees": ""}"#,
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        body_json(&response.body)["error"],
        "missing required(array of attendees) parameter."
    );
}

#[tokio::test]
async fn update_wrong_typed_summary_is_client_error() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body(
            "PUT",
            r#"{"id": "ev-1", "dtstart": "x", "dtend": "y",
                "summary": 123, "location": null, "description": null}"#,
        ))
        .await;
    assert_eq!(response.status, 400);
    let error = body_json(&response.body)["error"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(error.starts_with("malformed parameter:"), "{error}");
}

#[tokio::test]
async fn create_non_array_attendees_is_rejected() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body(
            "POST",
            r#"{"srcType": "Google", "srcAccountName": "alice@example.com",
                "dtstart": "x", "dtend": "y", "attendees": "bob@example.com"}"#,
        ))
        .await;
    assert_eq!(
        body_json(&response.body)["error"],
        "missing required(array of attendees) parameter."
    );
}

#[tokio::test]
async fn create_unknown_account_reports_missing_entry() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body(
            "POST",
            r#"{"srcType": "Google", "srcAccountName": "nobody@example.com",
                "dtstart": "x", "dtend": "y"}"#,
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        body_json(&response.body)["error"],
        "no such srcType or srcAccountName"
    );
}

#[tokio::test]
async fn create_unsupported_provider_with_entry_is_rejected_as_unsupported() {
    // An entry exists for a provider the adapter does not speak.
    let dir = tempfile::tempdir().unwrap();
    let access_store = AccessInfoStore::with_entries(
        dir.path().join("access_info.json"),
        vec![AccessInfoEntry {
            src_type: "Yahoo".to_string(),
            src_account_name: "alice@example.com".to_string(),
            ..AccessInfoEntry::default()
        }],
    );
    let dispatcher = Dispatcher::new(
        Arc::new(MemoryEventStore::new()),
        Arc::new(access_store),
        ProviderRegistry::new(),
        64,
    );

    let response = dispatcher
        .handle(&MutationRequest::with_body(
            "POST",
            r#"{"srcType": "Yahoo", "srcAccountName": "alice@example.com",
                "dtstart": "x", "dtend": "y"}"#,
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        body_json(&response.body)["error"],
        "Required srcType is not supported."
    );
}

#[tokio::test]
async fn update_defaults_src_id_and_keeps_src_type() {
    let h = harness(
        vec![
            Some(WireResponse::new(200, google_event_body("gcal-1"))),
            Some(WireResponse::new(200, google_event_body("gcal-1"))),
        ],
        vec![],
        vec![],
    );
    h.dispatcher.handle(&create_request()).await;

    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body(
            "PUT",
            r#"{
                "id": "gcal-1",
                "srcType": "Office365",
                "dtstart": "2024-03-15T12:00:00.000Z",
                "dtend": "2024-03-15T12:30:00.000Z",
                "summary": "Moved", "location": null, "description": null
            }"#,
        ))
        .await;
    assert_eq!(response.status, 200);

    // Caller's srcType is ignored; the stored binding wins.
    let event = body_json(&response.body);
    assert_eq!(event["srcType"], "Google");

    // The provider-native id came from the stored record.
    let calls = h.provider_transport.calls.lock().unwrap();
    assert_eq!(calls[1].0, HttpVerb::Put);
    assert!(calls[1].1.ends_with("/events/gcal-1"));
}

#[tokio::test]
async fn update_unknown_id_is_no_such_id() {
    let h = harness(vec![], vec![], vec![]);
    let response = h
        .dispatcher
        .handle(&MutationRequest::with_body(
            "PUT",
            r#"{"id": "ghost", "dtstart": "x", "dtend": "y",
                "summary": null, "location": null, "description": null}"#,
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(body_json(&response.body)["error"], "no such id");
}

#[tokio::test]
async fn delete_tolerates_already_gone_event() {
    let h = harness(
        vec![
            Some(WireResponse::new(200, google_event_body("gcal-1"))),
            Some(WireResponse::new(404, "")),
        ],
        vec![],
        vec![],
    );
    h.dispatcher.handle(&create_request()).await;

    let response = h
        .dispatcher
        .handle(&MutationRequest::with_query("DELETE", "id=gcal-1"))
        .await;
    assert_eq!(response.status, 204);
    assert_eq!(response.body, "[]");
    assert!(h.store.retrieve("gcal-1").is_err());
}

#[tokio::test]
async fn delete_provider_failure_keeps_record() {
    let h = harness(
        vec![
            Some(WireResponse::new(200, google_event_body("gcal-1"))),
            Some(WireResponse::new(500, "")),
        ],
        vec![],
        vec![],
    );
    h.dispatcher.handle(&create_request()).await;

    let response = h
        .dispatcher
        .handle(&MutationRequest::with_query("DELETE", "id=gcal-1"))
        .await;
    assert_eq!(response.status, 500);
    assert_eq!(
        body_json(&response.body)["error"],
        "Not delete vEvent of Google server."
    );
    // Remote delete unconfirmed; the internal record survives.
    assert!(h.store.retrieve("gcal-1").is_ok());
}

#[tokio::test]
async fn expired_token_refreshes_retries_and_persists() {
    let h = harness(
        vec![
            Some(WireResponse::new(401, "")),
            Some(WireResponse::new(200, google_event_body("gcal-1"))),
        ],
        vec![Some(WireResponse::new(200, r#"{"access_token": "fresh"}"#))],
        vec![],
    );

    let response = h.dispatcher.handle(&create_request()).await;
    assert_eq!(response.status, 200);
    assert_eq!(h.provider_transport.call_count(), 2);
    assert_eq!(h.token_transport.call_count(), 1);

    let entry = h
        .access_store
        .resolve_entry(SourceType::Google, "alice@example.com")
        .unwrap();
    assert_eq!(entry.access_token, "fresh");
}

#[tokio::test]
async fn second_401_after_refresh_is_auth_failure_with_token_persisted() {
    let h = harness(
        vec![
            Some(WireResponse::new(401, "")),
            Some(WireResponse::new(401, "")),
        ],
        vec![Some(WireResponse::new(200, r#"{"access_token": "fresh"}"#))],
        vec![],
    );

    let response = h.dispatcher.handle(&create_request()).await;
    assert_eq!(response.status, 400);
    assert_eq!(body_json(&response.body)["error"], "refresh token is wrong");

    // The refreshed token outlives the failed retry.
    let entry = h
        .access_store
        .resolve_entry(SourceType::Google, "alice@example.com")
        .unwrap();
    assert_eq!(entry.access_token, "fresh");
}

#[tokio::test]
async fn recurring_instances_get_suffixed_ids() {
    let h = harness(
        vec![],
        vec![],
        vec![
            ews_data("master-uid", "item-1"),
            ews_data("master-uid", "item-2"),
            ews_data("master-uid", "item-3"),
        ],
    );
    let request = MutationRequest::with_body(
        "POST",
        r#"{"srcType": "EWS", "srcAccountName": "alice@corp.example",
            "dtstart": "2024-03-15T10:30:00Z", "dtend": "2024-03-15T11:00:00Z"}"#,
    );

    let first = h.dispatcher.handle(&request).await;
    assert_eq!(body_json(&first.body)["id"], "master-uid");
    assert_eq!(
        body_json(&first.body)["srcUrl"],
        "https://mail.corp.example/EWS/Exchange.asmx"
    );

    let second = h.dispatcher.handle(&request).await;
    assert_eq!(body_json(&second.body)["id"], "master-uid_recur_1");

    let third = h.dispatcher.handle(&request).await;
    assert_eq!(body_json(&third.body)["id"], "master-uid_recur_2");
}

#[tokio::test]
async fn duplicate_provider_event_is_a_strange_condition() {
    let h = harness(
        vec![],
        vec![],
        vec![
            ews_data("master-uid", "item-1"),
            ews_data("master-uid", "item-1"),
        ],
    );
    let request = MutationRequest::with_body(
        "POST",
        r#"{"srcType": "EWS", "srcAccountName": "alice@corp.example",
            "dtstart": "2024-03-15T10:30:00Z", "dtend": "2024-03-15T11:00:00Z"}"#,
    );

    h.dispatcher.handle(&request).await;
    let response = h.dispatcher.handle(&request).await;
    assert_eq!(response.status, 400);
    assert_eq!(
        body_json(&response.body)["error"],
        "A strange condition occurred."
    );
}
