use super::formatter::{format_time_human_readable, format_timestamp};
use super::queue::FailedWorklog;
use super::segmenter::{WorklogEntry, MIN_BILLABLE_SECONDS};
use anyhow::Result;
use prettytable::{row, Table};

pub struct View {}

impl View {
    pub fn queue(entries: &[FailedWorklog]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["#", "ISSUE", "TIME", "STARTED", "COMMENT", "ERROR"]);
        for (index, entry) in entries.iter().enumerate() {
            table.add_row(row![
                index,
                entry.issue_key,
                format_time_human_readable(entry.time_spent_seconds),
                entry.started,
                entry.comment,
                entry.error
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn entries(entries: &[WorklogEntry]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["#", "STARTED", "DURATION", "LOGGED AS"]);
        for (index, entry) in entries.iter().enumerate() {
            table.add_row(row![
                index + 1,
                format_timestamp(entry.started_at),
                format_time_human_readable(entry.duration_seconds),
                format_time_human_readable(entry.duration_seconds.max(MIN_BILLABLE_SECONDS))
            ]);
        }
        table.printstd();

        Ok(())
    }
}
