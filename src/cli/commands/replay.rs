//! Replay command - rank evictable images from an event log

use crate::cache::{format_bytes, gb_to_bytes, CacheSizeStatus};
use crate::cli::args::{OutputFormat, ReplayArgs};
use crate::config::Config;
use crate::error::ImgCacheResult;
use crate::replay::{read_events, start_time, RankedImage, ReplayReport, Replayer};
use chrono::{DateTime, Utc};
use console::style;
use tracing::debug;

/// Execute the replay command
pub async fn execute(args: ReplayArgs, config: &Config) -> ImgCacheResult<()> {
    let max_size = args
        .max_size_gb
        .map(gb_to_bytes)
        .unwrap_or_else(|| config.cache.max_size_bytes());
    let order = args.order.unwrap_or(config.cache.order);

    let events = read_events(&args.events).await?;
    debug!(
        "Loaded {} event(s) from {}",
        events.len(),
        args.events.display()
    );

    let mut replayer = Replayer::new(max_size, order, start_time(&events)).strict(args.strict);
    replayer.apply_all(events)?;
    let report = replayer.report(args.now);

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => print_plain(&report.evictable),
    }

    Ok(())
}

fn print_table(report: &ReplayReport) {
    if report.evictable.is_empty() {
        println!("No evictable images.");
    } else {
        println!(
            "{:<5} {:<14} {:<32} {:>10} {:>6} {:>12} {:<16}",
            style("RANK").bold(),
            style("ID").bold(),
            style("IMAGE").bold(),
            style("SIZE").bold(),
            style("USES").bold(),
            style("SCORE").bold(),
            style("LAST USED").bold()
        );
        println!("{}", "-".repeat(101));

        for image in &report.evictable {
            println!(
                "{:<5} {:<14} {:<32} {:>10} {:>6} {:>12} {:<16}",
                image.rank,
                crate::artifact::short_id(&image.id),
                truncate(&image.name, 32),
                format_bytes(image.size),
                image.uses,
                format_score(image.score),
                format_time(image.last_used_at)
            );
        }
    }

    println!();
    if !report.pinned.is_empty() {
        println!("Pinned: {}", report.pinned.join(", "));
    }

    let status = match report.size_status {
        CacheSizeStatus::Ok => style("ok").green(),
        CacheSizeStatus::Warning => style("warning").yellow(),
        CacheSizeStatus::Exceeded => style("over limit").red(),
    };
    println!(
        "Total: {} image(s), {} of {} ({:.0}%) [{}]",
        report.tracked,
        format_bytes(report.total_size),
        format_bytes(report.max_size),
        CacheSizeStatus::percentage(report.total_size, report.max_size),
        status
    );
    println!(
        "Ranked {} as of {}",
        report.order,
        format_time(report.evaluated_at)
    );

    if report.failed > 0 {
        println!(
            "{} {} event(s) referenced untracked images and were skipped",
            style("!").yellow(),
            report.failed
        );
    }
}

fn print_plain(images: &[RankedImage]) {
    for image in images {
        println!("{}", image.id);
    }
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.1}", s),
        None => "inf".to_string(),
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
