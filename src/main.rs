//! # chatgrep CLI
//!
//! Command-line interface for the chatgrep library, searching Telegram
//! Desktop exports.

use std::io::Write;
use std::pin::pin;
use std::process;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use chatgrep::cli::Args;
use chatgrep::core::stats::ActivityStats;
use chatgrep::extract::{ExtractionReport, ExtractionRequest, run_extraction};
use chatgrep::format::{OutputFormat, write_to_format};
use chatgrep::progress::{ProgressEstimator, ProgressSnapshot};
use chatgrep::session::{NoCodes, authorize_accounts};
use chatgrep::source::ExportHistorySource;
use chatgrep::{ChatgrepError, config::MatchMode};

const TOP_SENDERS: usize = 10;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatgrep=warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ChatgrepError> {
    let args = Args::parse();
    let app = args.to_app_config()?;
    let output_path = args.output_path();
    let format: OutputFormat = args.format.into();
    let export_dir = app.export_dir.clone().unwrap_or_default();

    println!("🔎 chatgrep v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🔑 Keyword:  {}", app.search.keyword);
    if app.search.mode == MatchMode::Regex {
        println!("🧩 Mode:     regex");
    }
    println!("🔗 Groups:   {}", app.links.iter().filter(|l| !l.trim().is_empty()).count());
    println!("📂 Exports:  {}", export_dir.display());
    println!("💾 Output:   {}", output_path);
    println!("📄 Format:   {}", format);
    if let Some(from) = app.search.date_range.from {
        println!("📅 After:    {}", from.format("%Y-%m-%d"));
    }
    if let Some(to) = app.search.date_range.to {
        println!("📅 Before:   {}", to.format("%Y-%m-%d"));
    }
    println!();

    let mut provider = ExportHistorySource::new(export_dir);
    if let Some(every) = args.flood_every {
        provider = provider.with_flood_every(every, 1);
    }

    println!("👥 Signing in {} account(s)...", app.active_accounts().len());
    let auth = authorize_accounts(&provider, &app.accounts, &NoCodes).await;
    for failure in &auth.failures {
        println!("   ⚠️  {}", failure);
    }
    println!("   {} session(s) ready", auth.sessions.len());

    let request = ExtractionRequest::new(app.links.join("\n"), app.search.clone());
    let progress = ProgressEstimator::new();
    let mut updates = progress.subscribe();

    println!("⏳ Searching...");
    let mut extraction = pin!(run_extraction(&provider, &request, auth.sessions, &progress));
    let mut last_percent = None;
    let report = loop {
        tokio::select! {
            result = &mut extraction => break result?,
            changed = updates.changed() => {
                if changed.is_ok() {
                    let snapshot = *updates.borrow_and_update();
                    print_progress(&snapshot, &mut last_percent);
                }
            }
        }
    };
    if last_percent.is_some() {
        eprintln!();
    }

    print_report(&report);

    println!("💾 Writing {}...", format);
    write_to_format(&report.matches, &output_path, format)?;
    println!();
    println!("✅ Done! {} match(es) saved to {}", report.matches.len(), output_path);

    if args.stats {
        print_stats(&ActivityStats::from_matches(&report.matches, TOP_SENDERS));
    }

    Ok(())
}

fn print_progress(snapshot: &ProgressSnapshot, last_percent: &mut Option<u64>) {
    let percent = snapshot.percentage().floor() as u64;
    if *last_percent == Some(percent) {
        return;
    }
    *last_percent = Some(percent);

    let remaining = snapshot
        .estimated_remaining()
        .map(|d| format!(", ~{}s left", d.as_secs()))
        .unwrap_or_default();
    eprint!(
        "\r   {:>3}% | groups {}/{} | {} messages | {} matches{}   ",
        percent,
        snapshot.groups_completed,
        snapshot.groups_total,
        snapshot.messages_processed,
        snapshot.matches_found,
        remaining
    );
    let _ = std::io::stderr().flush();
}

fn print_report(report: &ExtractionReport) {
    for line in &report.rejected_links {
        println!("   ⚠️  Not a group link: {}", line);
    }
    for failure in &report.failures {
        println!("   ⚠️  {}", failure);
    }

    let stats = &report.stats;
    println!();
    println!("📊 Summary:");
    println!("   Groups:    {} ({} failed)", stats.groups_total, stats.groups_failed);
    println!("   Sessions:  {}", stats.sessions);
    println!("   Messages:  {}", stats.messages_processed);
    println!("   Matches:   {}", stats.matches);
    println!("   Time:      {:.2}s", stats.elapsed.as_secs_f64());
    println!();
}

fn print_stats(stats: &ActivityStats) {
    println!();
    println!("📈 Activity:");
    for day in &stats.days {
        println!(
            "   {}  {:>5} messages  {:>7} views  {:>5} forwards  {:>5} reactions",
            day.date, day.messages, day.views, day.forwards, day.reactions
        );
    }
    if !stats.top_senders.is_empty() {
        println!();
        println!("🏆 Top senders:");
        for (rank, sender) in stats.top_senders.iter().enumerate() {
            println!("   {:>2}. {} ({})", rank + 1, sender.sender, sender.messages);
        }
    }
    println!();
    println!("   Average views: {:.1}", stats.average_views());
}
