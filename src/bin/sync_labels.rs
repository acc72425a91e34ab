//! Maintenance binary for the nightly tag-sync pipeline.
//!
//! Runs bulk label reconciliation for one label group (or all three) to
//! completion, then exits. Usage:
//!
//!   sync_labels [classification|locale|competitor|all] [fiscal_year]
//!
//! With no fiscal year argument, derives the current one from today's date
//! (school fiscal years run July through June). Must not run while another
//! writer is syncing the same label group — the pipeline serializes this.

use chrono::{Datelike, Utc};

use vendorpulse::db::PulseDb;
use vendorpulse::hierarchy::EngagementConfig;
use vendorpulse::labels::LabelGroup;
use vendorpulse::sync::sync_all_labels;

/// School fiscal years run July–June: July 2025 is already FY26.
fn current_fiscal_year() -> i32 {
    let now = Utc::now();
    if now.month() >= 7 {
        now.year() + 1
    } else {
        now.year()
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let group_arg = args.first().map(|s| s.as_str()).unwrap_or("all");

    let groups: Vec<LabelGroup> = if group_arg == "all" {
        LabelGroup::ALL.to_vec()
    } else {
        match LabelGroup::parse(group_arg) {
            Some(group) => vec![group],
            None => {
                eprintln!(
                    "Unknown label group '{group_arg}'. \
                     Usage: sync_labels [classification|locale|competitor|all] [fiscal_year]"
                );
                std::process::exit(2);
            }
        }
    };

    let fiscal_year = match args.get(1) {
        Some(raw) => match raw.parse::<i32>() {
            Ok(fy) => fy,
            Err(_) => {
                eprintln!("Invalid fiscal year '{raw}'");
                std::process::exit(2);
            }
        },
        None => current_fiscal_year(),
    };

    let db = match PulseDb::open() {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let config = EngagementConfig::default();
    let mut failed = false;

    for group in groups {
        match sync_all_labels(&db, &config, group, fiscal_year) {
            Ok(written) => log::info!(
                "Synced label group '{}' for FY{}: {} assignments",
                group.as_str(),
                fiscal_year,
                written
            ),
            Err(e) => {
                log::error!("Label group '{}' failed: {}", group.as_str(), e);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
