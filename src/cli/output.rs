//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::sync::SyncStatus;
use crate::vault::{Record, RecordKind};

const MASK: &str = "••••••••";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Print a table of records (ID, Title, Category, Username, Updated).
/// Secret fields never appear here.
pub fn print_records_table(records: &[Record]) {
    if records.is_empty() {
        info("No records found.");
        tip("Run `notevault add <TITLE>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Title", "Category", "Username", "Updated"]);

    for r in records {
        table.add_row(vec![
            r.id.clone(),
            r.title.clone(),
            r.category().to_string(),
            r.username().unwrap_or_default().to_string(),
            timestamp(&r.updated_at),
        ]);
    }

    println!("{table}");
}

/// Print every field of one record.  Secret fields are masked unless
/// `reveal` is set.
pub fn print_record(record: &Record, reveal: bool) {
    let hide = |v: &str| {
        if reveal || v.is_empty() {
            v.to_string()
        } else {
            MASK.to_string()
        }
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["ID".to_string(), record.id.clone()]);
    table.add_row(vec!["Title".to_string(), record.title.clone()]);
    table.add_row(vec!["Category".to_string(), record.category().to_string()]);

    match &record.kind {
        RecordKind::Credential {
            username,
            secret,
            url,
        } => {
            table.add_row(vec!["Username".to_string(), username.clone()]);
            table.add_row(vec!["Secret".to_string(), hide(secret)]);
            table.add_row(vec!["URL".to_string(), url.clone()]);
        }
        RecordKind::Card {
            card_number,
            expiry,
            cvv,
            holder,
        } => {
            table.add_row(vec!["Card number".to_string(), hide(card_number)]);
            table.add_row(vec!["Expiry".to_string(), expiry.clone()]);
            table.add_row(vec!["CVV".to_string(), hide(cvv)]);
            table.add_row(vec!["Holder".to_string(), holder.clone()]);
        }
        RecordKind::Document | RecordKind::Other => {}
    }

    if !record.content.is_empty() {
        table.add_row(vec!["Notes".to_string(), record.content.clone()]);
    }
    table.add_row(vec!["Created".to_string(), timestamp(&record.created_at)]);
    table.add_row(vec!["Updated".to_string(), timestamp(&record.updated_at)]);

    println!("{table}");
}

pub fn print_sync_status(status: &SyncStatus, auto_sync: bool) {
    if !status.connected {
        info("Sync is off.");
        tip("Run `notevault sync connect` to enable it.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![
        "Account".to_string(),
        status
            .account_identity
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    ]);
    table.add_row(vec![
        "Last sync".to_string(),
        status
            .last_sync
            .as_ref()
            .map(timestamp)
            .unwrap_or_else(|| "never".to_string()),
    ]);
    table.add_row(vec![
        "Auto-sync".to_string(),
        if auto_sync { "on" } else { "off" }.to_string(),
    ]);

    println!("{table}");
}
