//! LiteChat: carry the recent part of a long conversation into a fresh one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use litechat_dom::FilePage;
use litechat_runtime::{describe, Orchestrator};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod report;

fn resolve_data_dir() -> PathBuf {
    std::env::var("LITECHAT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("LiteChat: continue a long conversation in a fresh one");
    println!();
    println!("Usage: litechat <command> [args]");
    println!();
    println!("Commands:");
    println!("  carry <page.html>              Extract, version and store a handoff");
    println!("  pending                        Deliver (and consume) the pending handoff");
    println!("  wait-input <page.html> [ms]    Wait for the prompt input to appear");
    println!("  validate <page.html>           Check which selectors resolve");
    println!("  versions [title]               List title versions, or inspect one title");
    println!("  set-version <base> <n>         Overwrite the stored version of a title");
    println!("  reset                          Clear all stored title versions");
    println!("  set-count <n>                  Set how many recent messages to carry (2-50)");
    println!("  help                           Show this help message");
    println!();
    println!("Environment:");
    println!("  LITECHAT_DATA_DIR              Data directory (default: ./data)");
    println!("  LITECHAT_MESSAGE_COUNT         Default message window");
    println!("  LITECHAT_WAIT_TIMEOUT_MS       Input wait timeout");
    println!("  RUST_LOG                       Log filter (default: info)");
}

fn page_arg(args: &[String], usage: &str) -> anyhow::Result<FilePage> {
    let path = args
        .get(2)
        .with_context(|| format!("Usage: litechat {}", usage))?;
    let path = Path::new(path);
    anyhow::ensure!(path.is_file(), "Page not found: {}", path.display());
    Ok(FilePage::new(path))
}

fn number_arg<T: std::str::FromStr>(args: &[String], i: usize, usage: &str) -> anyhow::Result<T> {
    args.get(i)
        .and_then(|v| v.parse().ok())
        .with_context(|| format!("Usage: litechat {}", usage))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    if matches!(command, "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let config = litechat_core::LiteConfig::from_env(&data_dir)?;
    let orch = Orchestrator::open(config);

    if let Err(e) = run(&orch, command, &args).await {
        match e.downcast_ref::<litechat_core::Error>() {
            Some(err) => eprintln!("Error: {}", describe(err)),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(orch: &Orchestrator, command: &str, args: &[String]) -> anyhow::Result<()> {
    match command {
        "carry" => {
            let page = page_arg(args, "carry <page.html>")?;
            orch.prune_stale_pending().await?;
            let handoff = orch.carry(&page).await?;
            report::print_handoff(&handoff);
        }
        "pending" => match orch.take_pending().await? {
            Some(handoff) => report::print_handoff(&handoff),
            None => println!("No pending handoff."),
        },
        "wait-input" => {
            let page = page_arg(args, "wait-input <page.html> [timeout-ms]")?;
            let timeout = match args.get(3) {
                Some(_) => Some(Duration::from_millis(number_arg(
                    args,
                    3,
                    "wait-input <page.html> [timeout-ms]",
                )?)),
                None => None,
            };
            let found = orch.wait_for_input(&page, timeout).await?;
            println!("Input ready: <{}> via {}", found.tag, found.rule);
        }
        "validate" => {
            let page = page_arg(args, "validate <page.html>")?;
            let report = orch.validate_selectors(&page)?;
            report::print_selector_report(&report);
            if !report.all_found() {
                std::process::exit(2);
            }
        }
        "versions" => match args.get(2) {
            Some(title) => {
                let info = orch.versioner().version_info(title).await?;
                report::print_version_info(&info);
            }
            None => report::print_versions(&orch.versioner().all_versions().await?),
        },
        "set-version" => {
            let usage = "set-version <base> <n>";
            let base = args
                .get(2)
                .with_context(|| format!("Usage: litechat {}", usage))?;
            let version: u32 = number_arg(args, 3, usage)?;
            orch.versioner().update_index(base, version).await?;
            println!("{} is now at Part {}", base.trim(), version);
        }
        "reset" => {
            orch.versioner().reset_index().await?;
            println!("Title versions cleared.");
        }
        "set-count" => {
            let count: usize = number_arg(args, 2, "set-count <n>")?;
            let count = orch.set_message_count(count).await?;
            println!("Carrying the last {} messages.", count);
        }
        other => {
            anyhow::bail!("Unknown command: {}. Use 'litechat help' for usage.", other);
        }
    }
    Ok(())
}
