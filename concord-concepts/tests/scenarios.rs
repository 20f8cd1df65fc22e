//! Request scenarios driven through the full sync catalog

use concord_concepts::{App, AppError, Concepts, RequestSettings};
use concord_engine::{EngineError, EngineSettings, Record, Value};
use serde_json::json;

fn app() -> App {
    App::new(EngineSettings::default(), RequestSettings::default()).unwrap()
}

fn body(value: Value) -> Record {
    value.as_object().cloned().expect("request bodies are objects")
}

async fn register(app: &App, username: &str, password: &str) -> String {
    let response = app
        .handle(
            "/UserAuthentication/register",
            body(json!({ "username": username, "password": password })),
        )
        .await
        .unwrap();
    response["user"].as_str().unwrap().to_string()
}

async fn login(app: &App, username: &str, password: &str) -> String {
    let response = app
        .handle(
            "/UserAuthentication/authenticate",
            body(json!({ "username": username, "password": password })),
        )
        .await
        .unwrap();
    response["session"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login_chain_runs_in_order() {
    let app = app();
    let alice = register(&app, "alice", "pw1").await;

    let handled = app
        .dispatch(
            "/UserAuthentication/authenticate",
            body(json!({ "username": "alice", "password": "pw1" })),
        )
        .await
        .unwrap();

    assert_eq!(
        handled.trace.methods(),
        [
            "Requesting.request",
            "UserAuthentication.authenticate",
            "Sessioning.create",
            "Requesting.respond",
        ]
    );
    let created = handled.trace.completions[2].output.to_record();
    assert_eq!(handled.response["session"], created["session"]);
    assert_eq!(handled.response["user"], json!(alice));
    assert_eq!(handled.trace.completions[1].output.to_record(), Record::new());
}

#[tokio::test]
async fn test_bad_password_responds_with_error_and_no_session() {
    let app = app();
    register(&app, "alice", "pw1").await;

    let handled = app
        .dispatch(
            "/UserAuthentication/authenticate",
            body(json!({ "username": "alice", "password": "wrong" })),
        )
        .await
        .unwrap();

    assert_eq!(
        handled.response,
        body(json!({ "error": "invalid username or password" }))
    );
    assert!(!handled
        .trace
        .methods()
        .iter()
        .any(|method| method == "Sessioning.create"));
    assert_eq!(handled.trace.fired("LoginError"), 1);
    assert!(handled.trace.unhandled_errors.is_empty());
}

#[tokio::test]
async fn test_duplicate_registration_is_reported() {
    let app = app();
    register(&app, "bob", "x").await;
    let response = app
        .handle(
            "/UserAuthentication/register",
            body(json!({ "username": "bob", "password": "y" })),
        )
        .await
        .unwrap();
    assert_eq!(response["error"], json!("username bob is already taken"));
}

#[tokio::test]
async fn test_empty_wishlist_answers_once_with_empty_results() {
    let app = app();
    register(&app, "carol", "pw").await;
    let session = login(&app, "carol", "pw").await;

    let handled = app
        .dispatch("/Wishlist/_getPlaces", body(json!({ "session": session })))
        .await
        .unwrap();

    assert_eq!(handled.response, body(json!({ "results": [] })));
    let respond = concord_concepts::concepts::Requesting::RESPOND;
    assert_eq!(handled.trace.completions_of(&respond).count(), 1);
}

#[tokio::test]
async fn test_wishlist_collects_places_in_order() {
    let app = app();
    register(&app, "dana", "pw").await;
    let session = login(&app, "dana", "pw").await;

    for place in ["Kyoto", "Lisbon"] {
        let added = app
            .handle(
                "/Wishlist/addPlace",
                body(json!({ "session": session, "place": place })),
            )
            .await
            .unwrap();
        assert_eq!(added["place"], json!(place));
    }
    let again = app
        .handle(
            "/Wishlist/addPlace",
            body(json!({ "session": session, "place": "Kyoto" })),
        )
        .await
        .unwrap();
    assert_eq!(again["error"], json!("Kyoto is already in the wishlist"));

    let listed = app
        .handle("/Wishlist/_getPlaces", body(json!({ "session": session })))
        .await
        .unwrap();
    assert_eq!(
        listed["results"],
        json!([{ "place": "Kyoto" }, { "place": "Lisbon" }])
    );

    let removed = app
        .handle(
            "/Wishlist/removePlace",
            body(json!({ "session": session, "place": "Kyoto" })),
        )
        .await
        .unwrap();
    assert_eq!(removed["removed"], json!("Kyoto"));
}

#[tokio::test]
async fn test_invalid_session_is_rejected() {
    let app = app();
    let response = app
        .handle("/Wishlist/_getPlaces", body(json!({ "session": "nope" })))
        .await
        .unwrap();
    assert_eq!(response, body(json!({ "error": "invalid session" })));
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = app();
    register(&app, "erin", "pw").await;
    let session = login(&app, "erin", "pw").await;

    let whoami = app
        .handle(
            "/UserAuthentication/_getUsername",
            body(json!({ "session": session })),
        )
        .await
        .unwrap();
    assert_eq!(whoami["username"], json!("erin"));

    let logout = app
        .handle("/Sessioning/delete", body(json!({ "session": session })))
        .await
        .unwrap();
    assert_eq!(logout, Record::new());

    let again = app
        .handle("/Sessioning/delete", body(json!({ "session": session })))
        .await
        .unwrap();
    assert!(again.contains_key("error"));

    let whoami = app
        .handle(
            "/UserAuthentication/_getUsername",
            body(json!({ "session": session })),
        )
        .await
        .unwrap();
    assert_eq!(whoami["error"], json!("invalid session"));
}

#[tokio::test]
async fn test_posts_are_deleted_only_by_their_author() {
    let app = app();
    register(&app, "fay", "pw").await;
    register(&app, "gus", "pw").await;
    let fay = login(&app, "fay", "pw").await;
    let gus = login(&app, "gus", "pw").await;

    let created = app
        .handle(
            "/Posting/create",
            body(json!({ "session": fay, "content": "hello" })),
        )
        .await
        .unwrap();
    let post = created["post"].clone();

    let mine = app
        .handle("/Posting/_getPostsByAuthor", body(json!({ "session": fay })))
        .await
        .unwrap();
    assert_eq!(mine["results"], json!([{ "post": post, "content": "hello" }]));

    let stolen = app
        .handle(
            "/Posting/delete",
            body(json!({ "session": gus, "post": post })),
        )
        .await
        .unwrap();
    assert_eq!(stolen["error"], json!("post not found"));

    let deleted = app
        .handle(
            "/Posting/delete",
            body(json!({ "session": fay, "post": post })),
        )
        .await
        .unwrap();
    assert_eq!(deleted["deleted"], post);

    let empty = app
        .handle("/Posting/_getPostsByAuthor", body(json!({ "session": fay })))
        .await
        .unwrap();
    assert_eq!(empty["results"], json!([]));
}

#[tokio::test]
async fn test_friend_posts_require_friendship() {
    let app = app();
    let hal = register(&app, "hal", "pw").await;
    let ivy = register(&app, "ivy", "pw").await;
    let hal_session = login(&app, "hal", "pw").await;
    let ivy_session = login(&app, "ivy", "pw").await;

    app.handle(
        "/Posting/create",
        body(json!({ "session": ivy_session, "content": "from ivy" })),
    )
    .await
    .unwrap();

    let stranger = app
        .handle(
            "/Posting/_getFriendPosts",
            body(json!({ "session": hal_session, "friend": ivy })),
        )
        .await
        .unwrap();
    assert_eq!(stranger["error"], json!("not friends"));

    let sent = app
        .handle(
            "/Friending/sendRequest",
            body(json!({ "session": hal_session, "target": ivy })),
        )
        .await
        .unwrap();
    assert_eq!(sent["target"], json!(ivy));

    let accepted = app
        .handle(
            "/Friending/acceptRequest",
            body(json!({ "session": ivy_session, "requester": hal })),
        )
        .await
        .unwrap();
    assert_eq!(accepted["friend"], json!(hal));

    let friends = app
        .handle("/Friending/_getFriends", body(json!({ "session": hal_session })))
        .await
        .unwrap();
    assert_eq!(friends["results"], json!([{ "friend": ivy }]));

    let posts = app
        .handle(
            "/Posting/_getFriendPosts",
            body(json!({ "session": hal_session, "friend": ivy })),
        )
        .await
        .unwrap();
    let results = posts["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["content"], json!("from ivy"));
}

#[tokio::test]
async fn test_unrouted_path_gets_no_response() {
    let app = app();
    let err = app
        .handle("/Nowhere/atAll", Record::new())
        .await
        .unwrap_err();
    match err {
        AppError::NoResponse { path, trace } => {
            assert_eq!(path, "/Nowhere/atAll");
            assert_eq!(trace.methods(), ["Requesting.request"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_aborted_flow_releases_its_request() {
    let concepts = Concepts::new();
    let requesting = concepts.requesting.clone();
    let app = App::with_concepts(
        concepts,
        EngineSettings::default(),
        RequestSettings::default(),
    )
    .unwrap();

    let err = app
        .handle(
            "/UserAuthentication/authenticate",
            body(json!({ "username": 5, "password": "x" })),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Engine(EngineError::SyncFailed { ref sync, .. }) if sync == "LoginRequest"
    ));
    assert_eq!(requesting.pending(), 0);

    app.handle("/Nowhere/atAll", Record::new()).await.unwrap_err();
    assert_eq!(requesting.pending(), 0);
}

#[tokio::test]
async fn test_accept_without_request_is_a_domain_error() {
    let app = app();
    register(&app, "jo", "pw").await;
    let session = login(&app, "jo", "pw").await;
    let response = app
        .handle(
            "/Friending/acceptRequest",
            body(json!({ "session": session, "requester": "someone" })),
        )
        .await
        .unwrap();
    assert_eq!(response["error"], json!("no pending friend request"));
}
