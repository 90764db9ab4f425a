//! Entry filtering and display ordering

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};

use crate::domain::Entry;

/// Filter parameters shared by the listing and statistics endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    /// Inclusive lower date bound
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of the application name
    pub application: Option<String>,
    /// Exact `quality_status` value
    pub quality_status: Option<String>,
    pub prb_only: bool,
    pub hiim_only: bool,
    pub years: Vec<i32>,
    /// Calendar months, 1-12
    pub months: Vec<u32>,
}

impl EntryFilter {
    /// Keep only the date range and year/month selection
    pub fn period_only(&self) -> EntryFilter {
        EntryFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            years: self.years.clone(),
            months: self.months.clone(),
            ..Default::default()
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        if self.start_date.is_some_and(|start| entry.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| entry.date > end) {
            return false;
        }
        if !self.years.is_empty() && !self.years.contains(&entry.date.year()) {
            return false;
        }
        if !self.months.is_empty() && !self.months.contains(&entry.date.month()) {
            return false;
        }

        if let Some(application) = self.application.as_deref().filter(|a| !a.is_empty()) {
            let needle = application.to_lowercase();
            if !entry.application_name.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(quality) = self.quality_status.as_deref().filter(|q| !q.is_empty()) {
            if entry.quality_status.as_deref() != Some(quality) {
                return false;
            }
        }

        if self.prb_only && !entry.has_prb() {
            return false;
        }
        if self.hiim_only && !entry.has_hiim() {
            return false;
        }

        true
    }
}

pub fn filter_entries(entries: &[Entry], filter: &EntryFilter) -> Vec<Entry> {
    entries.iter().filter(|e| filter.matches(e)).cloned().collect()
}

/// Newest date first; entries on the same date newest-created first
pub fn sort_for_display(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by(|a, b| display_order(b, a));
    entries
}

fn display_order(a: &Entry, b: &Entry) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.created_at.cmp(&b.created_at))
}
