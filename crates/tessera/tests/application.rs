//! Configuration to response, through the facade.

use std::sync::Arc;

use http::StatusCode;
use parking_lot::Mutex;
use serde_json::json;
use tessera::prelude::*;
use tessera::server::SessionConfig;
use tessera_test::TestClient;

fn config(middleware: serde_json::Value) -> TesseraConfig {
    let mut config = TesseraConfig::default();
    config.middleware = serde_json::from_value(middleware).unwrap();
    config
}

fn trace() -> impl Middleware {
    FnMiddleware::new("trace", |ctx, request, next| {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await?;
            response
                .headers_mut()
                .insert("x-trace", http::HeaderValue::from_static("1"));
            Ok(response)
        })
    })
}

struct Recorder {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Bootstrap for Recorder {
    fn start(&self, _host: Option<&mut HostHandle>) -> TesseraResult<()> {
        self.log.lock().push(self.label);
        Ok(())
    }
}

/// Reports the session cookie name published at startup.
struct SessionName;

impl Handler for SessionName {
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, TesseraResult<Response>> {
        Box::pin(async move {
            let name = ctx
                .extensions()
                .get::<SessionConfig>()
                .map(|session| session.session_name.clone())
                .unwrap_or_default();
            Ok(response::html(name))
        })
    }
}

#[tokio::test]
async fn global_middleware_from_config_wraps_controller() {
    let target = RouteTarget::new("admin", "index", "index");
    let dispatcher = Application::new(config(json!({"@": ["trace"]})))
        .middleware("trace", trace())
        .routes(|r| r.get("/admin/index", RouteTarget::new("admin", "index", "index")))
        .controller(target, handler_fn(|_req| async { Ok(response::html("admin home")) }))
        .into_dispatcher()
        .unwrap();

    TestClient::new(Arc::new(dispatcher))
        .get("/admin/index")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_header("x-trace", "1")
        .assert_body_contains("admin home");
}

#[tokio::test]
async fn bootstraps_run_in_order_and_publish_session() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut config = config(json!({}));
    config.bootstrap = vec!["first".into(), "session".into(), "unknown".into()];
    config.session = serde_json::from_value(json!({"session_name": "TSID"})).unwrap();
    let mut shop = tessera::config::PluginConfig::default();
    shop.bootstrap = vec!["second".into()];
    config.plugin.insert("shop".into(), shop);

    let target = RouteTarget::new("", "session", "name");
    let dispatcher = Application::new(config)
        .bootstrap("first", Recorder { label: "first", log: Arc::clone(&log) })
        .bootstrap("second", Recorder { label: "second", log: Arc::clone(&log) })
        .routes(|r| r.get("/session", RouteTarget::new("", "session", "name")))
        .controller(target, SessionName)
        .into_dispatcher()
        .unwrap();

    assert_eq!(*log.lock(), vec!["first", "second"]);
    let response = TestClient::new(Arc::new(dispatcher)).get("/session").send().await;
    assert_eq!(response.text().unwrap(), "TSID");
}

#[tokio::test]
async fn debug_mode_exposes_error_details() {
    let mut config = config(json!({}));
    config.app.debug = true;
    let target = RouteTarget::new("", "index", "boom");
    let dispatcher = Application::new(config)
        .routes(|r| r.get("/boom", RouteTarget::new("", "index", "boom")))
        .controller(target, handler_fn(|_req| async { Err(TesseraError::internal("cache offline")) }))
        .into_dispatcher()
        .unwrap();

    let response = TestClient::new(Arc::new(dispatcher))
        .get("/boom")
        .header("accept", "application/json")
        .send()
        .await;
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["code"], 500);
    assert_eq!(body["msg"], "cache offline");
    assert!(body["traces"].as_str().unwrap().contains("cache offline"));
}

#[test]
fn failing_bootstrap_aborts_startup() {
    struct Broken;
    impl Bootstrap for Broken {
        fn start(&self, _host: Option<&mut HostHandle>) -> TesseraResult<()> {
            Err(TesseraError::config("redis unreachable"))
        }
    }

    let mut config = config(json!({}));
    config.bootstrap = vec!["broken".into()];
    let err = Application::new(config).bootstrap("broken", Broken).into_dispatcher().unwrap_err();
    assert!(matches!(err, ApplicationError::Bootstrap(_)));
}

#[tokio::test]
async fn default_static_config_hides_dotfiles() {
    let public = tempfile::tempdir().unwrap();
    std::fs::write(public.path().join(".env"), "DB_PASSWORD=secret").unwrap();
    std::fs::write(public.path().join("app.js"), "console.log(1)").unwrap();

    let mut config = TesseraConfig::default();
    config.app.public_path = public.path().to_path_buf();
    let client = TestClient::new(Arc::new(Application::new(config).into_dispatcher().unwrap()));

    let hidden = client.get("/.env").send().await;
    hidden.assert_status(StatusCode::FORBIDDEN);
    assert!(!hidden.text().unwrap().contains("DB_PASSWORD"));

    client
        .get("/app.js")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_header("access-control-allow-origin", "*")
        .assert_body_contains("console.log");
}
