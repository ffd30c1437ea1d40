/// Control API client against a fake core
mod common;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fedi3_follow::{
    control::{ControlApi, CoreClient, CoreClientConfig, FollowStatus},
    migration::MigrationService,
    policy::Outcome,
    ClientError,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const TOKEN: &str = "s3cret";

#[derive(Default)]
struct FakeCore {
    following: Mutex<HashMap<String, String>>,
    aliases: Mutex<Vec<String>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("X-Fedi3-Internal")
        .and_then(|v| v.to_str().ok())
        == Some(TOKEN)
}

async fn status(
    State(core): State<Arc<FakeCore>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::FORBIDDEN, "forbidden").into_response();
    }
    let Some(actor) = query.get("actor") else {
        return (StatusCode::BAD_REQUEST, "missing actor").into_response();
    };
    let status = core
        .following
        .lock()
        .get(actor)
        .cloned()
        .unwrap_or_else(|| "none".to_string());
    Json(json!({ "status": status })).into_response()
}

async fn follow(State(core): State<Arc<FakeCore>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::FORBIDDEN, "forbidden").into_response();
    }
    let actor = body["actor"].as_str().unwrap_or_default().to_string();
    core.following.lock().insert(actor.clone(), "pending".to_string());
    Json(json!({"ok": true, "pending": 1, "target": actor})).into_response()
}

async fn unfollow(State(core): State<Arc<FakeCore>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::FORBIDDEN, "forbidden").into_response();
    }
    let actor = body["actor"].as_str().unwrap_or_default().to_string();
    core.following.lock().remove(&actor);
    Json(json!({"ok": true, "pending": 1, "target": actor})).into_response()
}

async fn migration_status(State(core): State<Arc<FakeCore>>) -> Json<Value> {
    Json(json!({
        "actor": "https://relay.example/users/me",
        "key_id": "https://relay.example/users/me#main-key",
        "did": "did:fedi3:abc",
        "domain": "relay.example",
        "public_base_url": "https://relay.example",
        "followers_count": 4,
        "legacy_followers_count": 2,
        "also_known_as": core.aliases.lock().clone(),
        "legacy_aliases": core.aliases.lock().clone(),
        "relay_migration": {"has_previous_actor_alias": false, "note": "Ok"},
        "legacy_guides": {"mastodon": {"notes": ["Move"]}}
    }))
}

async fn set_aliases(State(core): State<Arc<FakeCore>>, Json(body): Json<Value>) -> Json<Value> {
    let mut aliases: Vec<String> = body["aliases"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    aliases.sort();
    *core.aliases.lock() = aliases.clone();
    Json(json!({"ok": true, "aliases": aliases, "restart_required": true}))
}

async fn spawn_core() -> (String, Arc<FakeCore>) {
    let core = Arc::new(FakeCore::default());
    let app = Router::new()
        .route("/_fedi3/social/status", get(status))
        .route("/_fedi3/social/follow", post(follow))
        .route("/_fedi3/social/unfollow", post(unfollow))
        .route("/_fedi3/migration/status", get(migration_status))
        .route("/_fedi3/migration/legacy_aliases", post(set_aliases))
        .with_state(core.clone());
    (common::spawn_server(app).await, core)
}

fn client(base_url: &str, token: &str) -> CoreClient {
    CoreClient::new(CoreClientConfig {
        base_url: base_url.to_string(),
        internal_token: token.to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_follow_unfollow_round_trip() {
    let (base, _core) = spawn_core().await;
    let client = client(&base, TOKEN);
    let actor = "https://social.example/users/alice?x=1&y=2";

    assert_eq!(client.fetch_following_status(actor).await.unwrap(), FollowStatus::None);

    client.follow(actor).await.unwrap();
    assert_eq!(client.fetch_following_status(actor).await.unwrap(), FollowStatus::Pending);

    client.unfollow(actor).await.unwrap();
    assert_eq!(client.fetch_following_status(actor).await.unwrap(), FollowStatus::None);
}

#[tokio::test]
async fn test_missing_token_is_status_error() {
    let (base, _core) = spawn_core().await;
    let client = client(&base, "");

    let err = client.follow("https://social.example/users/alice").await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 403, .. }));
}

#[tokio::test]
async fn test_migration_status_and_aliases() {
    let (base, core) = spawn_core().await;
    let control: Arc<dyn ControlApi> = Arc::new(client(&base, TOKEN));
    let service = MigrationService::new(control);

    let saved = match service
        .save_aliases("https://old.example/users/me,\nhttps://a.example/@me,,")
        .await
    {
        Outcome::Done(saved) => saved,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert!(saved.restart_required);
    assert_eq!(
        saved.aliases,
        vec!["https://a.example/@me", "https://old.example/users/me"]
    );
    assert_eq!(core.aliases.lock().len(), 2);

    let status = match service.load().await {
        Outcome::Done(status) => status,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(status.actor, "https://relay.example/users/me");
    assert_eq!(status.followers_count, 4);
    assert_eq!(status.legacy_followers_count, 2);
    assert_eq!(status.legacy_aliases.len(), 2);
    assert_eq!(status.relay_migration.note, "Ok");
    assert!(status.legacy_guides["mastodon"].is_object());
}

#[tokio::test]
async fn test_migration_failure_is_surfaced() {
    let control: Arc<dyn ControlApi> = Arc::new(client("http://127.0.0.1:9", TOKEN));
    let service = MigrationService::new(control);

    assert!(matches!(service.load().await, Outcome::Failed(_)));
    assert!(matches!(service.save_aliases("a.example").await, Outcome::Failed(_)));
}
