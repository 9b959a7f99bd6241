// Ordering and confirmation behavior of the sequential executor

use hardlink_client::api::{
    ConvertRequest, ConvertResponse, LinkApi, LinkResponse, SubtreeResponse,
};
use hardlink_client::confirm::{ConfirmationGate, Decision};
use hardlink_client::error::Result;
use hardlink_client::executor::{SequentialExecutor, WorkItem};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Slow server that records the call log and the highest concurrency seen
#[derive(Clone, Default)]
struct SlowApi {
    log: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl SlowApi {
    async fn call(&self, entry: String) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("start {}", entry));

        tokio::time::sleep(Duration::from_millis(250)).await;

        self.log.lock().unwrap().push(format!("end {}", entry));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LinkApi for SlowApi {
    async fn link(&self, source: &str, dest: &str) -> Result<LinkResponse> {
        self.call(format!("{} -> {}", source, dest)).await;
        if dest.ends_with("taken") {
            return Ok(LinkResponse {
                ok: false,
                error: Some("Destination already exists".to_string()),
            });
        }
        Ok(LinkResponse { ok: true, error: None })
    }

    async fn link_subtree(&self, source_root: &str, dest_root: &str) -> Result<SubtreeResponse> {
        self.call(format!("{} => {}", source_root, dest_root)).await;
        Ok(SubtreeResponse {
            ok: true,
            created: 5,
            errors: Vec::new(),
            error: None,
        })
    }

    async fn convert(&self, _request: &ConvertRequest) -> Result<ConvertResponse> {
        unreachable!("executor never converts")
    }
}

/// Answers from a script and logs each prompt into the shared call log
struct ScriptedGate {
    answers: VecDeque<Decision>,
    log: Arc<Mutex<Vec<String>>>,
}

impl ConfirmationGate for ScriptedGate {
    async fn confirm(&mut self, title: &str, message: &str) -> Decision {
        self.log
            .lock()
            .unwrap()
            .push(format!("prompt {}: {}", title, message.lines().nth(1).unwrap_or("")));
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.answers.pop_front().unwrap_or(Decision::Decline)
    }
}

#[tokio::test(start_paused = true)]
async fn test_items_run_one_at_a_time_in_order() {
    let api = SlowApi::default();
    let gate = ScriptedGate {
        answers: VecDeque::from([Decision::Proceed, Decision::Decline]),
        log: api.log.clone(),
    };
    let mut executor = SequentialExecutor::new(api.clone(), gate);

    let items = vec![
        WorkItem::leaf("/a/f1"),
        WorkItem::container("/a/photos"),
        WorkItem::leaf("/a/taken"),
        WorkItem::container("/a/music"),
        WorkItem::leaf("/a/f2"),
    ];
    let outcome = executor.run(&items, "/b").await;

    assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(
        *api.log.lock().unwrap(),
        vec![
            "start /a/f1 -> /b/f1",
            "end /a/f1 -> /b/f1",
            "prompt Create hardlinks: /a/photos",
            "start /a/photos => /b/photos",
            "end /a/photos => /b/photos",
            "start /a/taken -> /b/taken",
            "end /a/taken -> /b/taken",
            "prompt Create hardlinks: /a/music",
            "start /a/f2 -> /b/f2",
            "end /a/f2 -> /b/f2",
        ]
    );

    assert_eq!(outcome.items_created, 7);
    assert_eq!(outcome.failures, vec!["taken: Destination already exists"]);
    assert_eq!(outcome.skipped, vec!["/a/music"]);
}

#[tokio::test(start_paused = true)]
async fn test_declining_every_container_makes_no_calls() {
    let api = SlowApi::default();
    let gate = ScriptedGate {
        answers: VecDeque::new(),
        log: api.log.clone(),
    };
    let mut executor = SequentialExecutor::new(api.clone(), gate);

    let items = vec![WorkItem::container("/a/one"), WorkItem::container("/a/two/")];
    let outcome = executor.run(&items, "/").await;

    assert!(api
        .log
        .lock()
        .unwrap()
        .iter()
        .all(|entry| entry.starts_with("prompt")));
    assert_eq!(outcome.items_created, 0);
    assert!(outcome.is_clean());
    assert_eq!(outcome.skipped, vec!["/a/one", "/a/two/"]);
    assert_eq!(outcome.summary(), "Hardlink creation finished: 0 created");
}
