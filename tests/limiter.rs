use jellyfin_client::Api;
use jellyfin_time_limiter::{
    clock::Clock,
    config::{ConfFile, Config},
    error::Error,
    logger::{Logger, Sink},
    policy::Mode,
    run_once,
    usage::Usage,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::{collections::HashMap, fs, path::Path};
use time::UtcOffset;

const USER_ID: &str = "4f6e8c1a9b2d4e7f8a1b2c3d4e5f6a7b";
const AUTHORIZATION: &str = "MediaBrowser Client=\"jellyfin-time-limiter\", Token=\"secret\"";

fn config(server: &ServerGuard, extra: &[(&str, &str)]) -> Config {
    let url = server.url();
    let mut env = HashMap::new();
    env.insert("BASE_URL".to_string(), url);
    env.insert("AUTH_TOKEN".to_string(), "secret".to_string());
    env.insert("USER_NAME".to_string(), "kodi".to_string());
    for (key, value) in extra {
        env.insert(key.to_string(), value.to_string());
    }
    Config::from_sources(ConfFile::default(), move |key| env.get(key).cloned()).unwrap()
}

fn clock() -> Clock {
    Clock::with_offset(UtcOffset::UTC)
}

fn logger(path: &Path) -> Logger {
    Logger::new(Sink::File(path.to_path_buf()), log::Level::Info, clock())
}

fn mock_users(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/Users")
        .match_header("authorization", AUTHORIZATION)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"Id": "0000", "Name": "Kodi"},
                {"Id": USER_ID, "Name": "kodi", "HasPassword": false},
            ])
            .to_string(),
        )
        .create()
}

fn mock_usage(server: &mut ServerGuard, durations: &[&str]) -> Mock {
    let results: Vec<_> = durations
        .iter()
        .enumerate()
        .map(|(i, d)| json!([i.to_string(), USER_ID, d]))
        .collect();
    server
        .mock("POST", "/user_usage_stats/submit_custom_query")
        .match_query(Matcher::Regex(r"^stamp=\d+$".to_string()))
        .match_header("accept", "application/json")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"ReplaceUserId": false})),
            Matcher::Regex(format!("UserId = '{}'", USER_ID)),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "colums": ["rowid", "UserId", "PlayDuration"],
                "results": results,
                "message": ""
            })
            .to_string(),
        )
        .create()
}

fn mock_user(server: &mut ServerGuard, enable_all: bool, folders: &[&str]) -> Mock {
    server
        .mock("GET", format!("/Users/{}", USER_ID).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "Name": "kodi",
                "Id": USER_ID,
                "Policy": {"EnableAllFolders": enable_all, "EnabledFolders": folders}
            })
            .to_string(),
        )
        .create()
}

fn disable_body() -> Matcher {
    Matcher::Json(json!({
        "AuthenticationProviderId": "Jellyfin.Server.Implementations.Users.DefaultAuthenticationProvider",
        "PasswordResetProviderId": "Jellyfin.Server.Implementations.Users.DefaultPasswordResetProvider",
        "EnableAllFolders": false,
        "EnabledFolders": []
    }))
}

fn enable_body() -> Matcher {
    Matcher::Json(json!({
        "AuthenticationProviderId": "Jellyfin.Server.Implementations.Users.DefaultAuthenticationProvider",
        "PasswordResetProviderId": "Jellyfin.Server.Implementations.Users.DefaultPasswordResetProvider",
        "EnableAllFolders": true
    }))
}

#[test]
fn disables_when_over_limit_then_stays_idle() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("limiter.log");
    let mut server = Server::new();
    let config = config(&server, &[("MAX_WATCH_TIME_MINUTES", "90")]);
    let api = Api::new(&config.api_options()).unwrap();
    let logger = logger(&log_path);

    let _users = mock_users(&mut server);
    let _usage = mock_usage(&mut server, &["3600", "1800", "60"]);
    let enabled = mock_user(&mut server, true, &[]);
    let update = server
        .mock("POST", format!("/Users/{}/Policy", USER_ID).as_str())
        .match_body(disable_body())
        .with_status(204)
        .expect(1)
        .create();

    let outcome = run_once(&api, &config, &logger, &clock(), Mode::Enforce).unwrap();
    assert_eq!(outcome.account.id, USER_ID);
    assert!(matches!(outcome.usage, Usage::Known(u) if u.total_seconds == 5460.0));
    assert!(!outcome.decision.desired_enabled);
    assert!(outcome.decision.current_enabled);
    assert!(outcome.decision.needs_update);

    // The server now reports the policy written above.
    enabled.remove();
    let disabled = mock_user(&mut server, false, &[]);

    let outcome = run_once(&api, &config, &logger, &clock(), Mode::Enforce).unwrap();
    assert!(!outcome.decision.needs_update);

    disabled.assert();
    update.assert();

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("91.0 minutes"));
    assert!(log.contains("exceeds limit (90 min)"));
    assert!(log.contains("Successfully disabled library access"));
    assert!(log.contains("Library access remains disabled"));
}

#[test]
fn enables_when_under_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let config = config(&server, &[]);
    let api = Api::new(&config.api_options()).unwrap();

    let _users = mock_users(&mut server);
    let _usage = mock_usage(&mut server, &["120", "bad", "60"]);
    let _user = mock_user(&mut server, false, &[]);
    let update = server
        .mock("POST", format!("/Users/{}/Policy", USER_ID).as_str())
        .match_body(enable_body())
        .with_status(200)
        .expect(1)
        .create();

    let outcome = run_once(
        &api,
        &config,
        &logger(&dir.path().join("limiter.log")),
        &clock(),
        Mode::Enforce,
    )
    .unwrap();
    match outcome.usage {
        Usage::Known(usage) => {
            assert_eq!(usage.total_minutes(), 3.0);
            assert_eq!(usage.skipped, 1);
        }
        Usage::Unknown(err) => panic!("usage unknown: {}", err),
    }
    assert!(outcome.decision.desired_enabled);
    update.assert();
}

#[test]
fn exactly_at_limit_disables() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let config = config(&server, &[("MAX_WATCH_TIME_MINUTES", "1")]);
    let api = Api::new(&config.api_options()).unwrap();

    let _users = mock_users(&mut server);
    let _usage = mock_usage(&mut server, &["60"]);
    let _user = mock_user(&mut server, false, &["library-a"]);
    let update = server
        .mock("POST", format!("/Users/{}/Policy", USER_ID).as_str())
        .match_body(disable_body())
        .with_status(204)
        .expect(1)
        .create();

    let outcome = run_once(
        &api,
        &config,
        &logger(&dir.path().join("limiter.log")),
        &clock(),
        Mode::Enforce,
    )
    .unwrap();
    assert!(!outcome.decision.desired_enabled);
    update.assert();
}

#[test]
fn usage_query_failure_uses_configured_default() {
    for (fallback, enable_all, writes) in [("enable", true, 0), ("disable", true, 1)] {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("limiter.log");
        let mut server = Server::new();
        let config = config(&server, &[("ON_USAGE_UNAVAILABLE", fallback)]);
        let api = Api::new(&config.api_options()).unwrap();

        let _users = mock_users(&mut server);
        let _mock = server
            .mock("POST", "/user_usage_stats/submit_custom_query")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("plugin exploded")
            .create();
        let _user = mock_user(&mut server, enable_all, &[]);
        let update = server
            .mock("POST", format!("/Users/{}/Policy", USER_ID).as_str())
            .with_status(204)
            .expect(writes)
            .create();

        let outcome = run_once(&api, &config, &logger(&log_path), &clock(), Mode::Enforce).unwrap();
        assert!(matches!(outcome.usage, Usage::Unknown(Error::RemoteUnavailable(_))));
        assert_eq!(outcome.decision.desired_enabled, fallback == "enable");
        update.assert();

        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("Could not fetch activity data: 500"));
        assert!(log.contains("plugin exploded"));
    }
}

#[test]
fn missing_duration_column_uses_default() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("limiter.log");
    let mut server = Server::new();
    let config = config(&server, &[("ON_USAGE_UNAVAILABLE", "disable")]);
    let api = Api::new(&config.api_options()).unwrap();

    let _users = mock_users(&mut server);
    let _mock = server
        .mock("POST", "/user_usage_stats/submit_custom_query")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"colums": ["rowid"], "results": [["1"]]}).to_string())
        .create();
    let _user = mock_user(&mut server, false, &[]);
    let update = server
        .mock("POST", format!("/Users/{}/Policy", USER_ID).as_str())
        .expect(0)
        .create();

    let outcome = run_once(&api, &config, &logger(&log_path), &clock(), Mode::Enforce).unwrap();
    assert!(matches!(outcome.usage, Usage::Unknown(Error::DataShape(_))));
    assert!(!outcome.decision.desired_enabled);
    assert!(!outcome.decision.needs_update);
    update.assert();

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("WARN  Warning: unexpected response shape: PlayDuration column not found"));
    assert!(!log.contains("ERROR"));
}

#[test]
fn dry_run_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let config = config(&server, &[]);
    let api = Api::new(&config.api_options()).unwrap();

    let _users = mock_users(&mut server);
    let _usage = mock_usage(&mut server, &[]);
    let _user = mock_user(&mut server, false, &[]);
    let update = server
        .mock("POST", format!("/Users/{}/Policy", USER_ID).as_str())
        .expect(0)
        .create();

    let outcome = run_once(
        &api,
        &config,
        &logger(&dir.path().join("limiter.log")),
        &clock(),
        Mode::DryRun,
    )
    .unwrap();
    assert!(matches!(outcome.usage, Usage::Known(u) if u.total_seconds == 0.0));
    assert!(outcome.decision.desired_enabled);
    assert!(outcome.decision.needs_update);
    update.assert();
}

#[test]
fn unknown_user_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let config = config(&server, &[("USER_NAME", "KODI")]);
    let api = Api::new(&config.api_options()).unwrap();

    let _users = mock_users(&mut server);
    let usage = server
        .mock("POST", "/user_usage_stats/submit_custom_query")
        .match_query(Matcher::Any)
        .expect(0)
        .create();
    let policy = server
        .mock("GET", format!("/Users/{}", USER_ID).as_str())
        .expect(0)
        .create();

    let err = run_once(
        &api,
        &config,
        &logger(&dir.path().join("limiter.log")),
        &clock(),
        Mode::Enforce,
    )
    .unwrap_err();
    assert!(matches!(err, Error::UserNotFound(ref name) if name == "KODI"));
    usage.assert();
    policy.assert();
}

#[test]
fn remote_failures_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let config = config(&server, &[]);
    let api = Api::new(&config.api_options()).unwrap();
    let logger = logger(&dir.path().join("limiter.log"));

    let users = server.mock("GET", "/Users").with_status(401).create();
    let err = run_once(&api, &config, &logger, &clock(), Mode::Enforce).unwrap_err();
    match err {
        Error::RemoteUnavailable(err) => assert_eq!(err.status(), Some(401)),
        err => panic!("unexpected error: {}", err),
    }
    users.remove();

    let _users = mock_users(&mut server);
    let _usage = mock_usage(&mut server, &["10"]);
    let user = server
        .mock("GET", format!("/Users/{}", USER_ID).as_str())
        .with_status(503)
        .create();
    let err = run_once(&api, &config, &logger, &clock(), Mode::Enforce).unwrap_err();
    assert!(matches!(err, Error::RemoteUnavailable(_)));
    user.remove();

    let _user = mock_user(&mut server, false, &[]);
    let _mock = server
        .mock("POST", format!("/Users/{}/Policy", USER_ID).as_str())
        .with_status(400)
        .with_body("missing AuthenticationProviderId")
        .create();
    let err = run_once(&api, &config, &logger, &clock(), Mode::Enforce).unwrap_err();
    assert!(err.to_string().contains("400"));
    assert!(err.to_string().contains("missing AuthenticationProviderId"));
}
