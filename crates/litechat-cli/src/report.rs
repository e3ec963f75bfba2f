//! Plain-text rendering of command results.

use chrono::Utc;
use litechat_runtime::{Handoff, SelectorReport};
use litechat_store::{TitleIndex, VersionInfo};

pub fn print_selector_report(report: &SelectorReport) {
    println!("=== LiteChat Selector Report ===");
    println!();
    for check in &report.checks {
        match &check.rule {
            Some(rule) => println!(
                "{:<10} OK       {} match(es) via {}",
                check.chain, check.count, rule
            ),
            None => println!("{:<10} MISSING", check.chain),
        }
    }
    println!();
    println!("Checked at: {}", report.checked_at.to_rfc3339());
    if report.all_found() {
        println!("Status: ALL SELECTORS RESOLVE");
    } else {
        println!("Status: SOME SELECTORS FAILED");
    }
}

pub fn print_handoff(handoff: &Handoff) {
    let age = handoff.age(Utc::now()).num_seconds();
    println!("Handoff:        {}", handoff.id);
    println!("Original title: {}", handoff.original_title);
    println!("New title:      {}", handoff.versioned_title);
    println!("Messages:       {}", handoff.message_count);
    println!("Created:        {} ({}s ago)", handoff.created_at.to_rfc3339(), age);
    println!();
    println!("{}", handoff.context_summary);
}

pub fn print_versions(index: &TitleIndex) {
    if index.is_empty() {
        println!("No versioned titles recorded.");
        return;
    }
    let width = index.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    for (base, version) in index {
        println!("{:<width$}  Part {}", base, version, width = width);
    }
}

pub fn print_version_info(info: &VersionInfo) {
    println!("Base:            {}", info.base);
    println!("Current version: {}", info.current_version);
    println!("Next version:    {}", info.next_version);
}
