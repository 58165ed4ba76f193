//! End-to-end scenarios through a configured application.

use encore::prelude::*;
use encore_test::{CountingAuthenticator, InMemoryStore, RecordingTemplateEngine, TestEnv, TestResponse};
use http::{Method, StatusCode};
use bytes::Bytes;
use http_body_util::Full;
use serde_json::json;
use std::sync::Arc;

const ALBUM_FORM: &str = "Title=Foo&ArtistId=1&GenreId=2&Price=9.99&ArtUrl=http://x";

struct Fixture {
    app: Encore,
    store: Arc<InMemoryStore>,
    templates: Arc<RecordingTemplateEngine>,
    albums: Resource,
}

fn fixture(gates: Vec<AuthGate>) -> Fixture {
    fixture_with(EncoreConfig::default(), gates)
}

fn fixture_with(config: EncoreConfig, gates: Vec<AuthGate>) -> Fixture {
    let app = Encore::new(config).unwrap();
    let store = Arc::new(InMemoryStore::new().with_cart_line("c-9", 7, 2).with_cart_line("alice", 3, 4));
    let templates = Arc::new(RecordingTemplateEngine::new());
    let negotiator = app.negotiator(Arc::clone(&store), Arc::clone(&templates));

    let mut builder = app.resource("albums", &negotiator);
    for gate in gates {
        builder = builder.gate(gate);
    }

    let parser = app.body_parser().clone();
    let albums = builder.handler(move |env, negotiation| {
        let parser = parser.clone();
        let negotiator = negotiator.clone();
        Box::pin(async move {
            if *env.method() == Method::POST {
                let album = parser.read_album().run(env).await?;
                negotiator
                    .represent(env, &negotiation, "created", |_| Ok(album))
                    .await
            } else {
                negotiator
                    .represent(env, &negotiation, "album", |_| Ok(json!({"title": "Foo"})))
                    .await
            }
        })
    });

    Fixture {
        app,
        store,
        templates,
        albums,
    }
}

fn caller(name: &str, role: &str) -> Arc<CountingAuthenticator> {
    Arc::new(CountingAuthenticator::signed_in(name, role))
}

async fn send(resource: &Resource, env: &RequestEnv) -> TestResponse {
    TestResponse::from_http(resource.serve(env).await).await.unwrap()
}

#[tokio::test]
async fn test_admin_posts_album_form_as_json() {
    let fixture = fixture(vec![
        AuthGate::authenticated([Method::POST]),
        AuthGate::admin([Method::POST]),
    ]);
    let auth = caller("alice", "admin");
    let env = TestEnv::post("/albums")
        .accept("application/json")
        .form(ALBUM_FORM)
        .authenticator(auth.clone())
        .build();

    let response = send(&fixture.albums, &env).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["title"], "Foo");
    assert_eq!(body["artistId"], 1);
    assert_eq!(body["genreId"], 2);
    assert_eq!(body["price"], "9.99");
    assert_eq!(body["albumArtUrl"], "http://x");
    assert_eq!(fixture.templates.render_count(), 0);
}

#[tokio::test]
async fn test_json_body_round_trips_to_identical_bytes() {
    let fixture = fixture(vec![AuthGate::authenticated([Method::POST])]);
    let submitted = json!({
        "title": "Foo",
        "artistId": 1,
        "genreId": 2,
        "price": "9.99",
        "albumArtUrl": "http://x",
        "ignored": true,
    });
    let env = TestEnv::post("/albums")
        .accept("application/json")
        .json(&submitted)
        .authenticator(caller("bob", "customer"))
        .build();

    let response = send(&fixture.albums, &env).await;

    let expected = AlbumForm {
        title: "Foo".to_string(),
        artist_id: 1,
        genre_id: 2,
        price: "9.99".parse().unwrap(),
        album_art_url: "http://x".to_string(),
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.bytes().as_ref(), serde_json::to_vec(&expected).unwrap().as_slice());
}

#[tokio::test]
async fn test_malformed_form_yields_null_not_error() {
    let fixture = fixture(vec![]);
    let env = TestEnv::post("/albums")
        .accept("application/json")
        .form("Title=Foo&ArtistId=one&GenreId=2&Price=9.99&ArtUrl=http://x")
        .build();

    let response = send(&fixture.albums, &env).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "null");
}

#[tokio::test]
async fn test_unsupported_content_type_yields_null() {
    let fixture = fixture(vec![]);
    let env = TestEnv::post("/albums")
        .accept("application/json")
        .body("text/plain", "Title=Foo")
        .build();

    let response = send(&fixture.albums, &env).await;
    assert_eq!(response.text(), "null");
}

#[tokio::test]
async fn test_get_passes_post_only_gate() {
    let fixture = fixture(vec![AuthGate::authenticated([Method::POST])]);
    let auth = Arc::new(CountingAuthenticator::anonymous());
    let env = TestEnv::get("/albums/1")
        .accept("text/html")
        .authenticator(auth.clone())
        .build();

    let response = send(&fixture.albums, &env).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
    assert_eq!(response.text(), r#"<album>{"title":"Foo"}"#);
    assert_eq!(fixture.templates.last().unwrap().view, "album");
}

#[tokio::test]
async fn test_anonymous_post_gets_logon_page_with_return_url() {
    let fixture = fixture(vec![AuthGate::authenticated([Method::POST])]);
    let env = TestEnv::post("/albums?page=2")
        .accept("application/json")
        .form(ALBUM_FORM)
        .authenticator(Arc::new(CountingAuthenticator::anonymous()))
        .build();

    let response = send(&fixture.albums, &env).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
    let call = fixture.templates.last().unwrap();
    assert_eq!(call.view, "logon");
    assert_eq!(call.model, json!({"ReturnUrl": "/albums?page=2", "ValidationMsg": ""}));
}

#[tokio::test]
async fn test_non_admin_gets_forbidden_page() {
    let fixture = fixture(vec![
        AuthGate::authenticated([Method::POST]),
        AuthGate::admin([Method::POST]),
    ]);
    let env = TestEnv::post("/albums")
        .accept("application/json")
        .form(ALBUM_FORM)
        .authenticator(caller("bob", "customer"))
        .build();

    let response = send(&fixture.albums, &env).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let call = fixture.templates.last().unwrap();
    assert_eq!(call.view, "forbidden");
    assert_eq!(call.model, json!({}));
    assert_eq!(call.bag.get("user"), Some(&json!({"userName": "bob", "role": "customer"})));
}

#[tokio::test]
async fn test_identity_looked_up_once_across_gates_and_view() {
    let fixture = fixture(vec![AuthGate::authenticated([]), AuthGate::admin([])]);
    let auth = caller("alice", "admin");
    let env = TestEnv::get("/albums/1")
        .accept("text/html")
        .authenticator(auth.clone())
        .build();

    let response = send(&fixture.albums, &env).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(auth.authenticate_calls(), 1);
    let bag = fixture.templates.last().unwrap().bag;
    assert_eq!(bag.get("cartId"), Some(&json!("alice")));
    assert_eq!(bag.get("cartCount"), Some(&json!(4)));
}

#[tokio::test]
async fn test_anonymous_cart_cookie_counts_cart() {
    let fixture = fixture(vec![]);
    let env = TestEnv::get("/albums/1")
        .accept("text/html")
        .cookie("cartId", "c-9")
        .build();

    send(&fixture.albums, &env).await;

    let bag = fixture.templates.last().unwrap().bag;
    assert_eq!(bag.get("cartId"), Some(&json!("c-9")));
    assert_eq!(bag.get("cartCount"), Some(&json!(2)));
    assert!(!bag.contains("user"));
}

#[tokio::test]
async fn test_no_identity_and_no_cookie_means_no_cart() {
    let fixture = fixture(vec![]);
    let env = TestEnv::get("/albums/1").accept("text/html").build();

    send(&fixture.albums, &env).await;

    let bag = fixture.templates.last().unwrap().bag;
    assert!(bag.is_empty());
}

#[tokio::test]
async fn test_configured_cart_cookie_name() {
    let mut config = EncoreConfig::default();
    config.session.cart_cookie = "basket".to_string();
    let fixture = fixture_with(config, vec![]);

    let env = TestEnv::get("/albums/1")
        .accept("text/html")
        .cookie("cartId", "c-9")
        .cookie("basket", "c-9")
        .build();
    send(&fixture.albums, &env).await;

    let bag = fixture.templates.last().unwrap().bag;
    assert_eq!(bag.get("cartCount"), Some(&json!(2)));
}

#[tokio::test]
async fn test_nothing_acceptable_is_406_without_rendering() {
    let fixture = fixture(vec![]);
    let env = TestEnv::get("/albums/1").accept("image/png").build();

    let response = send(&fixture.albums, &env).await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(fixture.templates.render_count(), 0);
    assert_eq!(fixture.store.opened(), 0);
}

#[tokio::test]
async fn test_no_accept_header_renders_json() {
    let fixture = fixture(vec![]);
    let env = TestEnv::get("/albums/1").build();

    let response = send(&fixture.albums, &env).await;

    assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
    assert_eq!(response.text(), r#"{"title":"Foo"}"#);
}

#[tokio::test]
async fn test_failing_authenticator_surfaces_as_error() {
    let fixture = fixture(vec![AuthGate::authenticated([])]);
    let env = TestEnv::get("/albums/1")
        .authenticator(Arc::new(CountingAuthenticator::failing("directory down")))
        .build();

    let err = fixture.albums.respond(&env).await.unwrap_err();
    assert!(matches!(err, EncoreError::Authentication { .. }));
}

fn request(method: Method, uri: &str, cookie: Option<&str>) -> http::Request<Full<Bytes>> {
    let mut builder = http::Request::builder()
        .method(method)
        .uri(uri)
        .header("accept", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Full::new(Bytes::new())).unwrap()
}

#[tokio::test]
async fn test_sign_in_and_sign_out_through_session_cookie() {
    let fixture = fixture(vec![AuthGate::admin([Method::POST])]);
    let session = fixture.app.session().clone();

    let logon = {
        let session = session.clone();
        let negotiator = fixture.app.negotiator(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingTemplateEngine::new()),
        );
        fixture.app.resource("logon", &negotiator).handler(move |env, _| {
            let session = session.clone();
            Box::pin(async move {
                if *env.method() == Method::DELETE {
                    session.sign_out().run(env).await?;
                } else {
                    session.sign_in(Identity::new("alice", "admin")).run(env).await?;
                }
                Ok::<_, EncoreError>(Representation::json("{}"))
            })
        })
    };

    let env = fixture.app.request_env(request(Method::POST, "/logon", None));
    let response = send(&logon, &env).await;
    let set_cookie = response.set_cookies()[0].to_string();
    assert!(set_cookie.starts_with(".encore.session="));
    assert!(set_cookie.contains("HttpOnly"));
    let pair = set_cookie.split(';').next().unwrap().to_string();

    let env = fixture.app.request_env(request(Method::GET, "/albums/1", Some(&pair)));
    assert_eq!(session.get_auth().run(&env).await.unwrap(), Some(Identity::new("alice", "admin")));

    let env = fixture.app.request_env(request(Method::DELETE, "/logon", Some(&pair)));
    let response = send(&logon, &env).await;
    assert!(response.set_cookies()[0].starts_with(".encore.session=;"));

    let env = fixture.app.request_env(request(Method::GET, "/albums/1", Some(&pair)));
    assert_eq!(session.get_auth().run(&env).await.unwrap(), None);
}
