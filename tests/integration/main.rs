//! Integration tests for jsrelay

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn jsrelay(config_dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("jsrelay");
        cmd.env_remove("JSRELAY_CONFIG")
            .arg("--config")
            .arg(config_dir.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        jsrelay(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Minifying JavaScript relay"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        jsrelay(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("jsrelay"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        jsrelay(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        jsrelay(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[server]"))
            .stdout(predicate::str::contains("mySite-js"));
    }

    #[test]
    fn config_init_then_set() {
        let dir = TempDir::new().unwrap();
        jsrelay(&dir).args(["config", "init"]).assert().success();
        jsrelay(&dir)
            .args(["config", "set", "server.default_port", "8001"])
            .assert()
            .success();
        jsrelay(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("default_port = 8001"));
    }

    #[test]
    fn config_set_unknown_key() {
        let dir = TempDir::new().unwrap();
        jsrelay(&dir)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn invalid_config_file_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[upstream]\norigin = \"not a url\"\n",
        )
        .unwrap();
        jsrelay(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("upstream.origin"));
    }

    #[test]
    fn compile_rejects_non_script_path() {
        let dir = TempDir::new().unwrap();
        jsrelay(&dir)
            .args(["compile", "style.css"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not a script path"));
    }
}

mod http_tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use jsrelay::cache::CodeCache;
    use jsrelay::compiler::Compile;
    use jsrelay::config::Config;
    use jsrelay::error::{RelayError, RelayResult};
    use jsrelay::server::{build_router, AppState};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const ORIGIN: &str = "http://js-raw.abhishekmunie.com";
    const SITE_URL: &str = "https://github.com/mySite/mySite-js";

    /// Records every compile call and answers with a fixed outcome
    struct CountingCompiler {
        calls: Mutex<Vec<String>>,
        fail_with_status: Option<u16>,
        clear_during_compile: Option<Arc<CodeCache>>,
    }

    impl CountingCompiler {
        fn succeeding() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with_status: None,
                clear_during_compile: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Compile for CountingCompiler {
        async fn compile(&self, source_url: &str) -> RelayResult<String> {
            self.calls.lock().unwrap().push(source_url.to_string());
            if let Some(cache) = &self.clear_during_compile {
                cache.clear();
            }
            match self.fail_with_status {
                Some(status) => Err(RelayError::UnexpectedStatus(status)),
                None => Ok("var a=1;".to_string()),
            }
        }
    }

    fn app(compiler: Arc<CountingCompiler>, cache: Arc<CodeCache>) -> Router {
        app_with(&Config::default(), compiler, cache)
    }

    fn app_with(
        config: &Config,
        compiler: Arc<CountingCompiler>,
        cache: Arc<CodeCache>,
    ) -> Router {
        build_router(AppState::new(config, cache, compiler))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (
            status,
            content_type,
            String::from_utf8_lossy(&bytes).to_string(),
        )
    }

    async fn post_webhook(
        app: &Router,
        source_id: &str,
        event: &str,
        content_type: &str,
        body: String,
    ) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/{source_id}"))
                    .header("x-github-event", event)
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    fn json_push(repo_url: &str) -> String {
        serde_json::json!({
            "payload": { "ref": "refs/heads/master", "repository": { "url": repo_url } }
        })
        .to_string()
    }

    #[tokio::test]
    async fn miss_compiles_once_then_serves_from_cache() {
        let compiler = Arc::new(CountingCompiler::succeeding());
        let cache = Arc::new(CodeCache::new());
        let app = app(Arc::clone(&compiler), Arc::clone(&cache));

        let (status, content_type, body) = get(&app, "/foo/bar.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/javascript"));
        assert_eq!(body, "var a=1;");
        assert_eq!(compiler.calls(), vec![format!("{ORIGIN}/foo/bar.js")]);

        let (status, _, body) = get(&app, "/foo/bar.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "var a=1;");
        assert_eq!(compiler.calls().len(), 1);
        assert_eq!(
            cache.lookup(&format!("{ORIGIN}/foo/bar.js")).as_deref(),
            Some("var a=1;")
        );
    }

    #[tokio::test]
    async fn clear_query_flushes_cache() {
        let compiler = Arc::new(CountingCompiler::succeeding());
        let cache = Arc::new(CodeCache::new());
        let app = app(Arc::clone(&compiler), Arc::clone(&cache));

        get(&app, "/foo/bar.js").await;
        let (status, _, _) = get(&app, "/?clear").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(cache.is_empty());

        get(&app, "/foo/bar.js").await;
        assert_eq!(compiler.calls().len(), 2);
    }

    #[tokio::test]
    async fn non_script_path_is_not_found() {
        let compiler = Arc::new(CountingCompiler::succeeding());
        let app = app(Arc::clone(&compiler), Arc::new(CodeCache::new()));

        let (status, _, _) = get(&app, "/style.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(compiler.calls().is_empty());
    }

    #[tokio::test]
    async fn compile_failure_is_bad_gateway_and_not_cached() {
        let compiler = Arc::new(CountingCompiler {
            fail_with_status: Some(503),
            ..CountingCompiler::succeeding()
        });
        let cache = Arc::new(CodeCache::new());
        let app = app(Arc::clone(&compiler), Arc::clone(&cache));

        let (status, _, body) = get(&app, "/foo/bar.js").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("503"));
        assert!(cache.is_empty());

        get(&app, "/foo/bar.js").await;
        assert_eq!(compiler.calls().len(), 2);
    }

    #[tokio::test]
    async fn clear_during_compile_wins() {
        let cache = Arc::new(CodeCache::new());
        let compiler = Arc::new(CountingCompiler {
            clear_during_compile: Some(Arc::clone(&cache)),
            ..CountingCompiler::succeeding()
        });
        let app = app(Arc::clone(&compiler), Arc::clone(&cache));

        let (status, _, body) = get(&app, "/foo/bar.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "var a=1;");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn accepted_push_clears_cache() {
        let compiler = Arc::new(CountingCompiler::succeeding());
        let cache = Arc::new(CodeCache::new());
        let app = app(Arc::clone(&compiler), Arc::clone(&cache));

        get(&app, "/foo/bar.js").await;
        assert_eq!(cache.len(), 1);

        let (status, _) = post_webhook(
            &app,
            "mySite-js",
            "push",
            "application/json",
            json_push(SITE_URL),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn accepted_form_push_clears_cache() {
        let cache = Arc::new(CodeCache::new());
        cache.insert(format!("{ORIGIN}/a.js"), "a();");
        let app = app(Arc::new(CountingCompiler::succeeding()), Arc::clone(&cache));

        let payload = serde_json::json!({ "repository": { "url": SITE_URL } }).to_string();
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload)
            .finish();

        let (status, _) = post_webhook(
            &app,
            "mySite-js",
            "push",
            "application/x-www-form-urlencoded",
            body,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn rejected_webhooks_keep_cache() {
        let cache = Arc::new(CodeCache::new());
        cache.insert(format!("{ORIGIN}/a.js"), "a();");
        let app = app(Arc::new(CountingCompiler::succeeding()), Arc::clone(&cache));

        let cases = [
            ("mySite-js", "push", json_push("https://evil.example/x"), "repository URL mismatch"),
            ("unknown-id", "push", json_push(SITE_URL), "unknown source"),
            ("mySite-js", "issue_comment", json_push(SITE_URL), "not a push event"),
        ];

        for (source_id, event, body, reason) in cases {
            let (status, text) =
                post_webhook(&app, source_id, event, "application/json", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{source_id}/{event}");
            assert_eq!(text, reason);
        }

        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn source_id_is_percent_decoded() {
        let mut config = Config::default();
        config.webhooks.sources.insert(
            "my site".to_string(),
            "https://github.com/example/my-site".to_string(),
        );
        let cache = Arc::new(CodeCache::new());
        cache.insert(format!("{ORIGIN}/a.js"), "a();");
        let app = app_with(&config, Arc::new(CountingCompiler::succeeding()), Arc::clone(&cache));

        let (status, _) = post_webhook(
            &app,
            "my%20site",
            "push",
            "application/json",
            json_push("https://github.com/example/my-site"),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn post_to_root_is_unknown_source() {
        let app = app(Arc::new(CountingCompiler::succeeding()), Arc::new(CodeCache::new()));

        let (status, text) =
            post_webhook(&app, "", "push", "application/json", json_push(SITE_URL)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "unknown source");
    }

    #[tokio::test]
    async fn malformed_webhook_payload_is_bad_request() {
        let cache = Arc::new(CodeCache::new());
        cache.insert(format!("{ORIGIN}/a.js"), "a();");
        let app = app(Arc::new(CountingCompiler::succeeding()), Arc::clone(&cache));

        let (status, _) = post_webhook(
            &app,
            "mySite-js",
            "push",
            "application/json",
            r#"{"payload":"{broken"}"#.to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(cache.len(), 1);
    }
}
