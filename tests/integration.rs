//! Integration tests: full searches over exports written to a temp dir.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chatgrep::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

const BASE_UNIX: u64 = 1_705_000_000;

/// Writes `<file>` with ids `1..=count`; `text(id)` picks each message's text.
fn write_export(dir: &Path, file: &str, id: i64, name: &str, count: u64, text: impl Fn(u64) -> Value) {
    let messages: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "id": i,
                "type": "message",
                "date_unixtime": (BASE_UNIX + i * 3_600).to_string(),
                "from": format!("User {}", i % 3),
                "from_id": format!("user{}", i % 3),
                "text": text(i),
                "views": i * 10,
            })
        })
        .collect();
    let export = json!({"name": name, "type": "public_supergroup", "id": id, "messages": messages});
    fs::write(dir.join(file), export.to_string()).unwrap();
}

async fn sessions(provider: &ExportHistorySource, count: usize) -> Vec<Session> {
    let accounts: Vec<AccountConfig> = (1..=count)
        .map(|i| AccountConfig::new("1", "hash", format!("+1555000{}", i)).with_label(format!("acc{}", i)))
        .collect();
    let auth = authorize_accounts(provider, &accounts, &NoCodes).await;
    assert!(auth.failures.is_empty());
    auth.sessions
}

fn search(keyword: &str) -> SearchConfig {
    SearchConfig::new(keyword).with_inter_batch_delay(0.0)
}

#[tokio::test]
async fn test_cap_hides_old_match_and_finds_recent_one() {
    let dir = TempDir::new().unwrap();
    // 60 messages, the only match is the 51st newest (id 10)
    write_export(dir.path(), "group_a.json", 1, "Group A", 60, |i| {
        json!(if i == 10 { "a test message" } else { "nothing here" })
    });
    // 40 messages, the match is the 11th newest (id 30)
    write_export(dir.path(), "group_b.json", 2, "Group B", 40, |i| {
        json!(if i == 30 { "Test run tonight" } else { "chatter" })
    });

    let provider = ExportHistorySource::new(dir.path());
    let sessions = sessions(&provider, 1).await;
    let request = ExtractionRequest::new(
        "@group_a\nhttps://t.me/group_b",
        search("test").with_message_cap(50).with_batch_size(25),
    );
    let progress = ProgressEstimator::new();

    let report = run_extraction(&provider, &request, sessions, &progress).await.unwrap();

    assert_eq!(report.matches.len(), 1);
    let m = &report.matches[0];
    assert_eq!(m.group, "Group B");
    assert_eq!(m.group_link, "https://t.me/group_b");
    assert_eq!(m.message_id, 30);
    assert_eq!(m.sender, "User 0");
    assert_eq!(m.url.as_deref(), Some("https://t.me/group_b/30"));
    assert_eq!(m.views, 300);

    assert!(report.failures.is_empty());
    assert_eq!(report.stats.groups_total, 2);
    assert_eq!(report.stats.messages_processed, 50 + 40);
    assert_eq!(provider.closed_sessions(), 1);
    assert!(progress.snapshot().is_complete());
}

#[tokio::test]
async fn test_matches_across_sessions_are_newest_first() {
    let dir = TempDir::new().unwrap();
    for (g, name) in ["alpha", "beta", "gamma"].iter().enumerate() {
        write_export(dir.path(), &format!("{}.json", name), g as i64 + 1, name, 20, move |i| {
            json!(if (i + g as u64) % 4 == 0 { "HIRING now" } else { "hello" })
        });
    }

    let provider = ExportHistorySource::new(dir.path());
    let sessions = sessions(&provider, 2).await;
    let request = ExtractionRequest::from_links(["@alpha", "@beta", "@gamma"], search("hiring").with_message_cap(0));

    let report = run_extraction(&provider, &request, sessions, &ProgressEstimator::new())
        .await
        .unwrap();

    assert_eq!(report.matches.len(), 15);
    assert!(report.matches.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(report.stats.sessions, 2);
    assert_eq!(provider.closed_sessions(), 2);
}

#[tokio::test]
async fn test_missing_and_broken_groups_are_isolated() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "good.json", 1, "Good", 10, |_| json!("rust rocks"));
    fs::write(dir.path().join("broken.json"), "{\"messages\": [").unwrap();

    let provider = ExportHistorySource::new(dir.path());
    let sessions = sessions(&provider, 1).await;
    let request = ExtractionRequest::new(
        "@missing\n@broken\n\nnot a link at all\n@good",
        search("rust").with_message_cap(0),
    );

    let report = run_extraction(&provider, &request, sessions, &ProgressEstimator::new())
        .await
        .unwrap();

    assert_eq!(report.matches.len(), 10);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].link, "@missing");
    assert_eq!(report.failures[1].link, "@broken");
    assert_eq!(report.rejected_links, vec!["not a link at all"]);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_date_window_and_regex() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "jobs.json", 1, "Jobs", 100, |i| {
        json!(if i % 2 == 0 { format!("job #{} remote", i) } else { "meh".to_string() })
    });

    // Ids 29..=52 fall on 2024-01-13 (UTC)
    let range = DateRange::new().with_date_from("2024-01-13").unwrap().with_date_to("2024-01-13").unwrap();
    let provider = ExportHistorySource::new(dir.path());
    let sessions = sessions(&provider, 1).await;
    let request = ExtractionRequest::new(
        "@jobs",
        search(r"job #\d+ REMOTE")
            .with_mode(MatchMode::Regex)
            .with_message_cap(0)
            .with_batch_size(10)
            .with_date_range(range),
    );

    let report = run_extraction(&provider, &request, sessions, &ProgressEstimator::new())
        .await
        .unwrap();

    assert_eq!(report.matches.len(), 12);
    for m in &report.matches {
        assert_eq!(m.timestamp.format("%Y-%m-%d").to_string(), "2024-01-13");
        assert_eq!(m.message_id % 2, 0);
    }
    // Only the 24 in-window messages count
    assert_eq!(report.stats.messages_processed, 24);
}

#[tokio::test]
async fn test_cap_counts_only_messages_inside_the_window() {
    let dir = TempDir::new().unwrap();
    // 300 hourly messages; the newest 100 are all after the window
    write_export(dir.path(), "busy.json", 1, "Busy", 300, |i| json!(format!("deal {}", i)));

    // Window ends with message 200
    let to = chrono::DateTime::from_timestamp((BASE_UNIX + 200 * 3_600) as i64, 0).unwrap();
    let provider = ExportHistorySource::new(dir.path());
    let sessions = sessions(&provider, 1).await;
    let request = ExtractionRequest::new(
        "@busy",
        search("deal")
            .with_message_cap(50)
            .with_batch_size(30)
            .with_date_range(DateRange::new().with_to(to)),
    );

    let report = run_extraction(&provider, &request, sessions, &ProgressEstimator::new())
        .await
        .unwrap();

    let ids: Vec<u64> = report.matches.iter().map(|m| m.message_id).collect();
    assert_eq!(ids, (151..=200).rev().collect::<Vec<_>>());
    assert_eq!(report.stats.messages_processed, 50);
}

#[tokio::test(start_paused = true)]
async fn test_flood_waits_are_waited_out() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "slow.json", 1, "Slow", 30, |i| json!(format!("flood {}", i)));

    let provider = ExportHistorySource::new(dir.path()).with_flood_every(2, 7);
    let sessions = sessions(&provider, 1).await;
    let request = ExtractionRequest::new("@slow", search("flood").with_message_cap(0).with_batch_size(10));

    let report = run_extraction(&provider, &request, sessions, &ProgressEstimator::new())
        .await
        .unwrap();

    // Every match survives the retries
    assert_eq!(report.matches.len(), 30);
    assert!(report.failures.is_empty());
    // Three of the seven history requests hit a flood wait
    assert!(report.stats.elapsed >= Duration::from_secs(21));
}

#[tokio::test]
async fn test_fatal_setup_errors() {
    let dir = TempDir::new().unwrap();
    let provider = ExportHistorySource::new(dir.path());

    let no_links = ExtractionRequest::new("\n  \n", search("x"));
    let err = run_extraction(&provider, &no_links, sessions(&provider, 1).await, &ProgressEstimator::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatgrepError::NoTargets));

    let bad_regex = ExtractionRequest::new("@a", search("(unclosed").with_mode(MatchMode::Regex));
    let err = run_extraction(&provider, &bad_regex, sessions(&provider, 1).await, &ProgressEstimator::new())
        .await
        .unwrap_err();
    assert!(err.is_invalid_pattern());

    let err = run_extraction(&provider, &ExtractionRequest::new("@a", search("x")), Vec::new(), &ProgressEstimator::new())
        .await
        .unwrap_err();
    assert!(err.is_no_active_sessions());

    // Sessions handed in are closed even when nothing runs
    assert_eq!(provider.closed_sessions(), 2);
}
