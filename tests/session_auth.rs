//! Sign-in, sign-out and session persistence through `AuthService`.

use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use recipeez::application::{AuthService, FetchPolicy, RecipeService, ServiceError};
use recipeez::cache::{CacheConfig, ListKey, RecipeCache};
use recipeez::client::{ApiClient, ClientError};
use recipeez::session::{AuthState, FileSessionStorage, SessionStorage, SessionStore};
use reqwest::Url;
use serde_json::json;
use tempfile::TempDir;

struct Harness {
    server: MockServer,
    dir: TempDir,
    session: Arc<SessionStore>,
    cache: Arc<RecipeCache>,
    auth: AuthService,
    recipes: RecipeService,
}

fn harness() -> Harness {
    let server = MockServer::start();
    let dir = TempDir::new().expect("temp dir");
    let storage = FileSessionStorage::new(dir.path().join("session.json"));
    let session = Arc::new(SessionStore::restore(storage));
    let cache = Arc::new(RecipeCache::new(CacheConfig::default()));
    let base = Url::parse(&server.base_url()).expect("mock base url");
    let client =
        ApiClient::with_base(base, Duration::from_secs(5), Arc::clone(&session)).expect("client");
    let auth = AuthService::new(client.clone(), Arc::clone(&session), Arc::clone(&cache));
    let recipes = RecipeService::new(client, Arc::clone(&session), Arc::clone(&cache), 1024);
    Harness {
        server,
        dir,
        session,
        cache,
        auth,
        recipes,
    }
}

fn empty_page() -> serde_json::Value {
    json!({"recipes": [], "meta": {"pageIndex": 0, "perPage": 10, "totalCount": 0}})
}

#[tokio::test]
async fn sign_in_persists_session_for_next_process() -> Result<(), ServiceError> {
    let h = harness();
    let sign_in = h.server.mock(|when, then| {
        when.method("POST")
            .path("/auth/sign-in")
            .json_body(json!({"email": "ana@example.com", "password": "s3cret"}));
        then.status(200)
            .json_body(json!({"token": "tok-1", "email": "ana@example.com"}));
    });

    let session = h.auth.sign_in(" ana@example.com ", "s3cret").await?;
    sign_in.assert();
    assert_eq!(session.user, "ana@example.com");
    assert_eq!(h.session.token().as_deref(), Some("tok-1"));

    let restored = SessionStore::restore(FileSessionStorage::new(h.dir.path().join("session.json")));
    assert_eq!(restored.token().as_deref(), Some("tok-1"));
    assert_eq!(
        restored.state(),
        AuthState::SignedIn {
            user: "ana@example.com".into()
        }
    );
    Ok(())
}

#[tokio::test]
async fn rejected_credentials_create_no_session() {
    let h = harness();
    h.server.mock(|when, then| {
        when.method("POST").path("/auth/sign-in");
        then.status(401).json_body(json!({"error": "invalid credentials"}));
    });

    let err = h
        .auth
        .sign_in("ana@example.com", "wrong")
        .await
        .expect_err("rejected");
    assert!(matches!(
        err,
        ServiceError::Client(ClientError::InvalidCredentials)
    ));
    assert!(!err.is_session_expired());
    assert!(h.auth.current().is_none());
    assert_eq!(h.session.state(), AuthState::SignedOut);
}

#[tokio::test]
async fn blank_credentials_are_rejected_locally() {
    let h = harness();
    let sign_in = h.server.mock(|when, then| {
        when.method("POST").path("/auth/sign-in");
        then.status(200).json_body(json!({"token": "tok"}));
    });

    let err = h.auth.sign_in("", "pw").await.expect_err("blank email");
    assert!(matches!(err, ServiceError::Validation(_)));
    sign_in.assert_calls(0);
}

#[tokio::test]
async fn sign_out_clears_session_storage_and_cache() -> Result<(), ServiceError> {
    let h = harness();
    h.server.mock(|when, then| {
        when.method("POST").path("/auth/sign-in");
        then.status(200)
            .json_body(json!({"token": "tok-1", "name": "Ana"}));
    });
    let list = h.server.mock(|when, then| {
        when.method("GET")
            .path("/recipes")
            .header("authorization", "Bearer tok-1");
        then.status(200).json_body(empty_page());
    });

    h.auth.sign_in("ana@example.com", "s3cret").await?;
    h.recipes
        .list_recipes(ListKey::first_page(), FetchPolicy::CacheFirst)
        .await?;
    list.assert();
    assert!(!h.cache.resident_keys().is_empty());

    let mut state = h.session.subscribe();
    state.mark_unchanged();
    h.auth.sign_out();
    h.auth.sign_out();

    assert!(h.session.token().is_none());
    assert!(h.cache.resident_keys().is_empty());
    assert!(state.has_changed().expect("store alive"));
    assert_eq!(*state.borrow_and_update(), AuthState::SignedOut);
    let storage = FileSessionStorage::new(h.dir.path().join("session.json"));
    assert!(storage.load().expect("readable storage").is_none());
    Ok(())
}

#[tokio::test]
async fn expiry_is_observed_by_subscribers() -> Result<(), ServiceError> {
    let h = harness();
    h.server.mock(|when, then| {
        when.method("POST").path("/auth/sign-in");
        then.status(200).json_body(json!({"token": "tok-1"}));
    });
    h.server.mock(|when, then| {
        when.method("GET").path("/recipes");
        then.status(401);
    });

    h.auth.sign_in("ana@example.com", "s3cret").await?;
    let mut state = h.session.subscribe();
    state.mark_unchanged();

    let err = h
        .recipes
        .list_recipes(ListKey::first_page(), FetchPolicy::NetworkOnly)
        .await
        .expect_err("expired");
    assert!(err.is_session_expired());
    assert!(state.has_changed().expect("store alive"));
    assert_eq!(*state.borrow_and_update(), AuthState::Expired);
    Ok(())
}

#[tokio::test]
async fn signing_in_as_someone_else_drops_cached_entries() -> Result<(), ServiceError> {
    let h = harness();
    h.server.mock(|when, then| {
        when.method("POST")
            .path("/auth/sign-in")
            .json_body_includes(r#"{"email":"ana@example.com"}"#);
        then.status(200).json_body(json!({"token": "tok-ana", "name": "Ana"}));
    });
    h.server.mock(|when, then| {
        when.method("POST")
            .path("/auth/sign-in")
            .json_body_includes(r#"{"email":"bia@example.com"}"#);
        then.status(200).json_body(json!({"token": "tok-bia", "name": "Bia"}));
    });
    h.server.mock(|when, then| {
        when.method("GET").path("/recipes");
        then.status(200).json_body(empty_page());
    });

    h.auth.sign_in("ana@example.com", "pw").await?;
    h.recipes
        .list_recipes(ListKey::first_page(), FetchPolicy::CacheFirst)
        .await?;
    h.auth.sign_in("ana@example.com", "pw").await?;
    assert!(!h.cache.resident_keys().is_empty());

    h.auth.sign_in("bia@example.com", "pw").await?;
    assert!(h.cache.resident_keys().is_empty());
    assert_eq!(h.session.token().as_deref(), Some("tok-bia"));
    Ok(())
}

#[tokio::test]
async fn same_user_signing_back_in_after_expiry_keeps_cache() -> Result<(), ServiceError> {
    let h = harness();
    h.server.mock(|when, then| {
        when.method("POST").path("/auth/sign-in");
        then.status(200).json_body(json!({"token": "tok-ana", "name": "Ana"}));
    });
    h.server.mock(|when, then| {
        when.method("GET").path("/recipes");
        then.status(200).json_body(empty_page());
    });
    h.server.mock(|when, then| {
        when.method("GET").path("/recipes/r9");
        then.status(401).json_body(json!({"error": "jwt expired"}));
    });

    h.auth.sign_in("ana@example.com", "pw").await?;
    h.recipes
        .list_recipes(ListKey::first_page(), FetchPolicy::CacheFirst)
        .await?;

    let err = h
        .recipes
        .get_recipe("r9", FetchPolicy::NetworkOnly)
        .await
        .expect_err("expired");
    assert!(err.is_session_expired());
    assert_eq!(h.session.state(), AuthState::Expired);
    assert_eq!(h.cache.resident_keys().len(), 1);

    h.auth.sign_in("ana@example.com", "pw").await?;
    assert_eq!(h.cache.resident_keys().len(), 1);
    assert!(h.cache.get_list(&ListKey::first_page()).is_some());
    Ok(())
}
