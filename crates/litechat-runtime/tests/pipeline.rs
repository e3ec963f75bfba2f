//! End-to-end carry-over against saved pages and a file-backed store.

use std::path::Path;

use litechat_core::{DataPaths, Error, LiteConfig};
use litechat_dom::FilePage;
use litechat_runtime::Orchestrator;

const CONVERSATION: &str = r#"<!doctype html>
<html><head><title>Tokio scheduling | ChatGPT</title></head>
<body><main>
  <article data-testid="conversation-turn-1">
    <div data-message-author-role="user"><p>How does the Tokio Scheduler pick tasks?</p></div>
  </article>
  <article data-testid="conversation-turn-2">
    <div data-message-author-role="assistant">
      <img alt="ChatGPT avatar">
      <p>It uses work stealing. For example:</p>
      <pre><div><span>rust</span><button class="copy-button">Copy code</button></div><code class="hljs language-rust">let rt = tokio::runtime::Runtime::new()?;</code></pre>
      <p>Each worker has a local queue.</p>
      <button>Regenerate</button>
    </div>
  </article>
  <article data-testid="conversation-turn-3">
    <div data-message-author-role="user"><p>What about blocking tasks in the pool?</p></div>
  </article>
</main></body></html>"#;

fn config(dir: &Path) -> LiteConfig {
    LiteConfig {
        message_count: 8,
        wait_timeout_ms: 40,
        poll_interval_ms: 5,
        data_paths: DataPaths::new(dir.join("data")).unwrap(),
    }
}

fn write_page(dir: &Path, name: &str, html: &str) -> FilePage {
    let path = dir.join(name);
    std::fs::write(&path, html).unwrap();
    FilePage::new(&path)
}

#[tokio::test]
async fn test_carry_from_saved_page() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path(), "chat.html", CONVERSATION);
    let orch = Orchestrator::open(config(dir.path()));

    let handoff = orch.carry(&page).await.unwrap();
    assert_eq!(handoff.original_title, "Tokio scheduling");
    assert_eq!(handoff.versioned_title, "Tokio scheduling – Part 1");
    assert_eq!(handoff.message_count, 3);

    let text = &handoff.context_summary;
    assert!(text.contains("Source: Tokio scheduling\n"));
    assert!(text.contains("```rust\nlet rt = tokio::runtime::Runtime::new()?;\n```"));
    assert_eq!(text.matches("```").count(), 2);
    assert!(!text.contains("Copy code"));
    assert!(!text.contains("Regenerate"));
    assert!(text.contains("• Concepts covered: code examples, programming\n"));
    assert!(text.contains("What about blocking tasks in the pool?"));
    assert!(text.ends_with("please set this chat's title to: \"Tokio scheduling – Part 1\""));

    assert!(dir.path().join("data/storage.json").exists());
}

#[tokio::test]
async fn test_versions_persist_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path(), "chat.html", CONVERSATION);

    let first = Orchestrator::open(config(dir.path()));
    assert_eq!(
        first.carry(&page).await.unwrap().versioned_title,
        "Tokio scheduling – Part 1"
    );

    let second = Orchestrator::open(config(dir.path()));
    assert_eq!(
        second.carry(&page).await.unwrap().versioned_title,
        "Tokio scheduling – Part 2"
    );

    // The continued chat is renamed; carrying from it keeps counting.
    let renamed = CONVERSATION.replace(
        "<title>Tokio scheduling | ChatGPT</title>",
        "<title>Tokio scheduling — Part 2 | ChatGPT</title>",
    );
    let page = write_page(dir.path(), "chat-2.html", &renamed);
    assert_eq!(
        second.carry(&page).await.unwrap().versioned_title,
        "Tokio scheduling – Part 3"
    );

    let versions = second.versioner().all_versions().await.unwrap();
    assert_eq!(versions.get("Tokio scheduling"), Some(&3));
}

#[tokio::test]
async fn test_handoff_delivered_once() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path(), "chat.html", CONVERSATION);
    let orch = Orchestrator::open(config(dir.path()));
    let handoff = orch.carry(&page).await.unwrap();

    let fresh = Orchestrator::open(config(dir.path()));
    let pending = fresh.take_pending().await.unwrap().unwrap();
    assert_eq!(pending.id, handoff.id);
    assert_eq!(pending.context_summary, handoff.context_summary);
    assert!(fresh.take_pending().await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_page_reports_empty_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(
        dir.path(),
        "new.html",
        r#"<html><body><main><textarea id="prompt-textarea"></textarea></main></body></html>"#,
    );
    let orch = Orchestrator::open(config(dir.path()));

    assert!(matches!(
        orch.carry(&page).await,
        Err(Error::EmptyConversation)
    ));
    let input = orch.wait_for_input(&page, None).await.unwrap();
    assert_eq!(input.rule, "#prompt-textarea");
}

#[tokio::test]
async fn test_message_count_setting_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path(), "chat.html", CONVERSATION);

    Orchestrator::open(config(dir.path()))
        .set_message_count(2)
        .await
        .unwrap();

    let orch = Orchestrator::open(config(dir.path()));
    assert_eq!(orch.message_count().await.unwrap(), 2);
    let handoff = orch.carry(&page).await.unwrap();
    assert_eq!(handoff.message_count, 2);
    assert!(!handoff.context_summary.contains("How does the Tokio Scheduler"));
}
