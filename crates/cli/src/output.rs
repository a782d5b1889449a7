// Table rendering for command results

use chrono::{TimeZone, Utc};
use colored::Colorize;
use jobharvest_core::application::{CrawlReport, ExperienceCount, GroupCount, SourceStatus};
use jobharvest_core::domain::{JobPosting, RawPosting, StringOrList};
use jobharvest_infra_sqlite::StoredPosting;
use tabled::{Table, Tabled};

const EMPTY: &str = "-";

fn or_dash(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| EMPTY.to_string())
}

fn format_millis(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Links")]
    discovered: String,
    #[tabled(rename = "Pages")]
    pages: String,
    #[tabled(rename = "Stop")]
    stop: String,
    #[tabled(rename = "Inserted")]
    inserted: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Unchanged")]
    unchanged: String,
    #[tabled(rename = "Skipped")]
    skipped: String,
    #[tabled(rename = "Failed")]
    failed: String,
}

pub fn print_crawl_report(report: &CrawlReport) {
    let rows: Vec<SourceRow> = report
        .sources
        .iter()
        .map(|source| match &source.status {
            SourceStatus::Completed(summary) => SourceRow {
                source: source.source.to_string(),
                status: if summary.cancelled { "cancelled".to_string() } else { "completed".to_string() },
                discovered: summary.discovered.to_string(),
                pages: summary.pages_visited.to_string(),
                stop: summary.stop_reason.to_string(),
                inserted: summary.inserted.to_string(),
                updated: summary.updated.to_string(),
                unchanged: summary.unchanged.to_string(),
                skipped: summary.skipped.to_string(),
                failed: summary.failed.to_string(),
            },
            SourceStatus::Failed { reason } => SourceRow {
                source: source.source.to_string(),
                status: format!("failed: {}", reason),
                discovered: EMPTY.to_string(),
                pages: EMPTY.to_string(),
                stop: EMPTY.to_string(),
                inserted: EMPTY.to_string(),
                updated: EMPTY.to_string(),
                unchanged: EMPTY.to_string(),
                skipped: EMPTY.to_string(),
                failed: EMPTY.to_string(),
            },
        })
        .collect();

    println!("{}", Table::new(rows));
    println!(
        "Run {}: {} postings reconciled in {}ms",
        report.run_id.dimmed(),
        report.total_reconciled().to_string().bold(),
        report.finished_at - report.started_at
    );
    if report.failed_sources() > 0 {
        println!("{}", format!("{} source(s) failed", report.failed_sources()).red().bold());
    } else {
        println!("{}", "✓ Crawl complete".green().bold());
    }
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Value")]
    key: String,
    #[tabled(rename = "Count")]
    count: u64,
}

pub fn print_group_counts(field: &str, counts: &[GroupCount]) {
    if counts.is_empty() {
        println!("{}", format!("No values recorded for {}", field).yellow());
        return;
    }
    let rows: Vec<CountRow> = counts
        .iter()
        .map(|c| CountRow {
            key: c.key.clone(),
            count: c.count,
        })
        .collect();
    println!("{}", Table::new(rows));
}

pub fn print_experience_counts(counts: &[ExperienceCount]) {
    let rows: Vec<CountRow> = counts
        .iter()
        .map(|c| CountRow {
            key: c.level.to_string(),
            count: c.count,
        })
        .collect();
    println!("{}", Table::new(rows));
}

#[derive(Tabled)]
struct PostingRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Salary")]
    salary: String,
    #[tabled(rename = "Experience")]
    experience: String,
    #[tabled(rename = "First seen")]
    first_seen: String,
    #[tabled(rename = "Last seen")]
    last_seen: String,
}

pub fn print_postings(postings: &[StoredPosting]) {
    if postings.is_empty() {
        println!("{}", "No postings stored yet".yellow());
        return;
    }
    let rows: Vec<PostingRow> = postings
        .iter()
        .map(|stored| PostingRow {
            title: stored.posting.title.clone(),
            company: or_dash(&stored.posting.company),
            location: or_dash(&stored.posting.location),
            salary: or_dash(&stored.posting.salary),
            experience: or_dash(&stored.posting.requirement.experience),
            first_seen: format_millis(stored.first_seen_at),
            last_seen: format_millis(stored.last_seen_at),
        })
        .collect();
    println!("{}", Table::new(rows));
    println!("{} postings", postings.len().to_string().bold());
}

pub fn print_links(links: &[String]) {
    for link in links {
        println!("{}", link);
    }
    println!("{} links", links.len().to_string().bold());
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn print_posting(posting: &JobPosting) {
    let join = |values: &[String]| {
        if values.is_empty() {
            EMPTY.to_string()
        } else {
            values.join(", ")
        }
    };
    let rows = vec![
        FieldRow { field: "title", value: posting.title.clone() },
        FieldRow { field: "company", value: or_dash(&posting.company) },
        FieldRow { field: "location", value: or_dash(&posting.location) },
        FieldRow { field: "salary", value: or_dash(&posting.salary) },
        FieldRow { field: "keywords", value: join(&posting.keywords) },
        FieldRow { field: "education", value: or_dash(&posting.requirement.education) },
        FieldRow { field: "experience", value: or_dash(&posting.requirement.experience) },
        FieldRow { field: "languages", value: join(&posting.requirement.languages) },
        FieldRow { field: "skills", value: join(&posting.requirement.skills) },
    ];
    println!("{}", Table::new(rows));
}

pub fn print_raw_posting(raw: &RawPosting) {
    let list = |value: &Option<StringOrList>| match value {
        Some(StringOrList::One(s)) => s.clone(),
        Some(StringOrList::Many(items)) => items.join(", "),
        None => EMPTY.to_string(),
    };
    let rows = vec![
        FieldRow { field: "title", value: or_dash(&raw.title) },
        FieldRow { field: "company", value: or_dash(&raw.company) },
        FieldRow { field: "location", value: or_dash(&raw.location) },
        FieldRow { field: "salary", value: or_dash(&raw.salary) },
        FieldRow { field: "keywords", value: list(&raw.keywords) },
        FieldRow { field: "languages", value: list(&raw.languages) },
        FieldRow { field: "requirements", value: raw.requirement_lines.join(" | ") },
    ];
    println!("{}", Table::new(rows));
}
