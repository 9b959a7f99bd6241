// HttpApi against an in-process server speaking the Hardlink UI wire format

use hardlink_client::api::{HttpApi, JobApi, LinkApi, PollOutcome};
use hardlink_client::confirm::AutoConfirm;
use hardlink_client::duplicates::{convert_duplicates, ConversionVerdict};
use hardlink_client::error::ClientError;
use hardlink_client::executor::{SequentialExecutor, WorkItem};
use hardlink_client::job_monitor::{
    DuplicateGroup, JobId, JobMonitor, JobStatus, MonitorHandle, PollPolicy,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use warp::http::StatusCode;
use warp::reply::{json as reply_json, with_header, with_status};
use warp::Filter;

const SESSION: &str = "test-session";

const SSE_BODY: &str = concat!(
    ": ping\n\n",
    "event: connected\ndata: {\"job_id\":\"job-42\"}\n\n",
    "data: {\"status\":\"running\",\"processed\":1,\"total_files\":2,\"groups_found\":0}\n\n",
    "data: {\"status\":\"completed\",\"processed\":2,\"total_files\":2,\"groups_found\":1,",
    "\"results\":[{\"master\":\"/a/x\",\"others\":[\"/a/y\"],\"size\":5}]}\n\n",
);

const SSE_UNKNOWN_JOB: &str = "event: error\ndata: {\"error\":\"Job not found\"}\n\n";

fn job_id(query: &HashMap<String, String>) -> &str {
    query.get("job_id").map(String::as_str).unwrap_or_default()
}

async fn start_server() -> String {
    let scan = warp::path!("api" / "duplicates" / "scan")
        .and(warp::get())
        .and(warp::cookie::optional("hardlink_session"))
        .map(|session: Option<String>| {
            if session.as_deref() == Some(SESSION) {
                with_status(reply_json(&json!({ "job_id": "job-42" })), StatusCode::OK)
            } else {
                with_status(
                    reply_json(&json!({ "error": "Not authenticated" })),
                    StatusCode::UNAUTHORIZED,
                )
            }
        });

    let progress = warp::path!("api" / "duplicates" / "progress")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .map(|query: HashMap<String, String>| {
            let body = if job_id(&query) == "job-42" {
                SSE_BODY
            } else {
                SSE_UNKNOWN_JOB
            };
            with_header(body, "content-type", "text/event-stream")
        });

    let results = warp::path!("api" / "duplicates" / "results")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .map(|query: HashMap<String, String>| match job_id(&query) {
            "done" => with_status(
                reply_json(&json!({
                    "items": [{ "master": "/a/x", "others": ["/a/y", "/a/z"], "size": 7 }]
                })),
                StatusCode::OK,
            ),
            "running" => with_status(
                reply_json(&json!({ "error": "Job not completed, status: running" })),
                StatusCode::BAD_REQUEST,
            ),
            "broken" => with_status(
                reply_json(&json!({ "error": "Job not completed, status: failed" })),
                StatusCode::BAD_REQUEST,
            ),
            _ => with_status(
                reply_json(&json!({ "error": "Job not found" })),
                StatusCode::NOT_FOUND,
            ),
        });

    let link = warp::path!("api" / "create-hardlink")
        .and(warp::post())
        .and(warp::body::json::<Value>())
        .map(|body: Value| {
            if body["dest"] == "/b/exists" {
                with_status(
                    reply_json(&json!({ "error": "Destination already exists" })),
                    StatusCode::CONFLICT,
                )
            } else {
                with_status(reply_json(&json!({ "ok": true })), StatusCode::OK)
            }
        });

    let folder = warp::path!("api" / "create-hardlinks-folder")
        .and(warp::post())
        .and(warp::body::json::<Value>())
        .map(|body: Value| {
            if body["source"] == "/a/dir/" && body["dest_root"] == "/b/dir" {
                with_status(
                    reply_json(&json!({
                        "ok": true,
                        "created": 2,
                        "errors": ["c.txt: permission denied"]
                    })),
                    StatusCode::OK,
                )
            } else {
                with_status(
                    reply_json(&json!({ "error": "Invalid request" })),
                    StatusCode::BAD_REQUEST,
                )
            }
        });

    let convert = warp::path!("api" / "duplicates" / "convert")
        .and(warp::post())
        .and(warp::body::json::<Value>())
        .map(|body: Value| {
            let created: usize = body["groups"]
                .as_array()
                .map(|groups| {
                    groups
                        .iter()
                        .map(|g| g["others"].as_array().map_or(0, Vec::len))
                        .sum()
                })
                .unwrap_or(0);
            reply_json(&json!({
                "ok": true,
                "created": created,
                "bytes_saved": created * 5,
                "errors": null
            }))
        });

    let routes = scan
        .or(progress)
        .or(results)
        .or(link)
        .or(folder)
        .or(convert);

    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{}", addr)
}

async fn api() -> HttpApi {
    HttpApi::new(&start_server().await)
        .unwrap()
        .with_session_cookie(SESSION)
}

#[tokio::test]
async fn test_start_job_sends_session_cookie() {
    let api = api().await;
    assert_eq!(api.start_job().await.unwrap().as_str(), "job-42");

    let anonymous = HttpApi::new(&start_server().await).unwrap();
    match anonymous.start_job().await.unwrap_err() {
        ClientError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Not authenticated");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_monitor_over_event_stream() {
    let monitor = JobMonitor::new(api().await);
    let mut statuses = Vec::new();

    let (job_id, outcome) = monitor
        .start_and_monitor(&MonitorHandle::new(), |s| statuses.push(s.status))
        .await
        .unwrap();

    assert_eq!(job_id.as_str(), "job-42");
    assert_eq!(statuses, vec![JobStatus::Running, JobStatus::Completed]);

    let snapshot = outcome.into_snapshot().unwrap();
    assert_eq!(
        snapshot.results,
        vec![DuplicateGroup {
            master: "/a/x".to_string(),
            others: vec!["/a/y".to_string()],
            size: 5,
        }]
    );
}

#[tokio::test]
async fn test_monitor_falls_back_to_polling_for_unknown_job() {
    let policy = PollPolicy {
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(20),
        max_attempts: 3,
        ..PollPolicy::default()
    };
    let monitor = JobMonitor::with_policy(api().await, policy);

    let outcome = monitor
        .monitor(&JobId::new("missing"), &MonitorHandle::new(), |_| {})
        .await;

    let snapshot = outcome.into_snapshot().unwrap();
    let message = snapshot.failure_message().unwrap();
    assert!(message.starts_with("Polling gave up after 3 attempts"), "{}", message);
    assert!(message.contains("Job not found"), "{}", message);
}

#[tokio::test]
async fn test_poll_result_statuses() {
    let api = api().await;

    match api.poll_result(&JobId::new("done")).await.unwrap() {
        PollOutcome::Completed(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].others.len(), 2);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(
        api.poll_result(&JobId::new("running")).await.unwrap(),
        PollOutcome::NotReady("Job not completed, status: running".to_string())
    );
    assert!(matches!(
        api.poll_result(&JobId::new("broken")).await.unwrap(),
        PollOutcome::Failed(_)
    ));

    let err = api.poll_result(&JobId::new("missing")).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 404, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_link_error_body_is_decoded() {
    let api = api().await;

    assert!(api.link("/a/f1", "/b/f1").await.unwrap().ok);

    let rejected = api.link("/a/exists", "/b/exists").await.unwrap();
    assert!(!rejected.ok);
    assert_eq!(rejected.error.as_deref(), Some("Destination already exists"));
}

#[tokio::test]
async fn test_executor_against_server() {
    let mut executor = SequentialExecutor::new(api().await, AutoConfirm::proceed());
    let items = vec![
        WorkItem::leaf("/a/f1"),
        WorkItem::leaf("/a/exists"),
        WorkItem::container("/a/dir/"),
    ];

    let outcome = executor.run(&items, "/b").await;

    assert_eq!(outcome.items_created, 3);
    assert_eq!(
        outcome.failures,
        vec![
            "exists: Destination already exists",
            "dir: c.txt: permission denied"
        ]
    );
    assert_eq!(outcome.summary(), "Hardlink creation finished: 3 created, errors: 2");
}

#[tokio::test]
async fn test_convert_against_server() {
    let api = api().await;
    let groups = vec![
        DuplicateGroup {
            master: "/a/x".to_string(),
            others: vec!["/a/y".to_string(), "/a/z".to_string()],
            size: 5,
        },
        DuplicateGroup {
            master: "/a/lonely".to_string(),
            others: Vec::new(),
            size: 9,
        },
    ];

    let response = convert_duplicates(&api, &mut AutoConfirm::proceed(), &groups)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.created, 2);
    assert_eq!(response.bytes_saved, 10);
    assert!(response.errors.is_empty());
    assert_eq!(response.verdict(), ConversionVerdict::Converted);
}
