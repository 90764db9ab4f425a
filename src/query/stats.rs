//! Chart statistics

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use serde::Serialize;

use crate::domain::{month_key, month_label, Entry, TicketStatus, TriColor, XVA};

use super::filter::EntryFilter;

/// Counts per tri-color status, serialized with the status names as keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColorCounts {
    #[serde(rename = "Red")]
    pub red: u64,
    #[serde(rename = "Yellow")]
    pub yellow: u64,
    #[serde(rename = "Green")]
    pub green: u64,
}

impl ColorCounts {
    pub fn add(&mut self, color: TriColor) {
        match color {
            TriColor::Red => self.red += 1,
            TriColor::Yellow => self.yellow += 1,
            TriColor::Green => self.green += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TicketCounts {
    pub active: u64,
    pub closed: u64,
}

impl TicketCounts {
    pub fn add(&mut self, status: TicketStatus) {
        match status {
            TicketStatus::Active => self.active += 1,
            TicketStatus::Closed => self.closed += 1,
        }
    }
}

/// One month of a breakdown: label plus the counts, flattened into one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCounts<C> {
    pub month_name: String,
    #[serde(flatten)]
    pub counts: C,
}

/// Month-keyed breakdown, sorted by `YYYY-MM` key
pub type MonthlyBreakdown<C> = Vec<(String, MonthlyCounts<C>)>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub total_entries: usize,
    pub quality_distribution: ColorCounts,
    pub punctuality_distribution: ColorCounts,
    pub prb_distribution: TicketCounts,
    pub hiim_distribution: TicketCounts,
    pub application_distribution: BTreeMap<String, u64>,
    pub monthly_quality: MonthlyBreakdown<ColorCounts>,
    pub monthly_punctuality: MonthlyBreakdown<ColorCounts>,
    pub monthly_prb: MonthlyBreakdown<TicketCounts>,
    pub monthly_hiim: MonthlyBreakdown<TicketCounts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct XvaRedCounts {
    pub valo_red: u64,
    pub sensi_red: u64,
    pub cf_ra_red: u64,
    pub total_red: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootCauseCount {
    pub root_cause_application: String,
    pub root_cause_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XvaStatsReport {
    pub monthly_red_counts: MonthlyBreakdown<XvaRedCounts>,
    pub root_cause_analysis: Vec<RootCauseCount>,
    pub grand_total: u64,
}

/// Months accumulated by key, each carrying its label
struct MonthTable<C> {
    months: BTreeMap<String, MonthlyCounts<C>>,
}

impl<C: Default> MonthTable<C> {
    fn seeded(seeds: &BTreeSet<(i32, u32)>) -> Self {
        let mut table = MonthTable {
            months: BTreeMap::new(),
        };
        for (year, month) in seeds {
            table.slot(*year, *month);
        }
        table
    }

    fn slot(&mut self, year: i32, month: u32) -> &mut C {
        &mut self
            .months
            .entry(month_key(year, month))
            .or_insert_with(|| MonthlyCounts {
                month_name: month_label(year, month).unwrap_or_default(),
                counts: C::default(),
            })
            .counts
    }

    fn into_breakdown(self) -> MonthlyBreakdown<C> {
        self.months.into_iter().collect()
    }
}

/// Months to show even when they hold no entries.
///
/// Years and months: their cross product. Years only: every month of those years.
/// Months only: those months in every year present in `entries`.
fn seed_months(filter: &EntryFilter, entries: &[&Entry]) -> BTreeSet<(i32, u32)> {
    let mut seeds = BTreeSet::new();

    if !filter.years.is_empty() {
        let months: Vec<u32> = if filter.months.is_empty() {
            (1..=12).collect()
        } else {
            filter.months.clone()
        };
        for year in &filter.years {
            for month in &months {
                seeds.insert((*year, *month));
            }
        }
    } else if !filter.months.is_empty() {
        let years: BTreeSet<i32> = entries.iter().map(|e| e.date.year()).collect();
        for year in years {
            for month in &filter.months {
                seeds.insert((year, *month));
            }
        }
    }

    seeds
}

/// Aggregate the entries matching `filter` for the dashboard charts
pub fn compute_stats(entries: &[Entry], filter: &EntryFilter) -> StatsReport {
    let entries: Vec<&Entry> = entries.iter().filter(|e| filter.matches(e)).collect();

    let seeds = seed_months(filter, &entries);

    let mut quality = ColorCounts::default();
    let mut punctuality = ColorCounts::default();
    let mut prb = TicketCounts::default();
    let mut hiim = TicketCounts::default();
    let mut applications: BTreeMap<String, u64> = BTreeMap::new();

    let mut monthly_quality = MonthTable::<ColorCounts>::seeded(&seeds);
    let mut monthly_punctuality = MonthTable::<ColorCounts>::seeded(&seeds);
    let mut monthly_prb = MonthTable::<TicketCounts>::seeded(&seeds);
    let mut monthly_hiim = MonthTable::<TicketCounts>::seeded(&seeds);

    for entry in &entries {
        let (year, month) = (entry.date.year(), entry.date.month());
        let month_quality = monthly_quality.slot(year, month);

        if let Some(color) = parse_present::<TriColor>(&entry.quality_status) {
            quality.add(color);
            month_quality.add(color);
        }

        let month_punctuality = monthly_punctuality.slot(year, month);
        if let Some(color) = entry
            .prc_mail_status
            .as_deref()
            .and_then(TriColor::punctuality_bucket)
        {
            punctuality.add(color);
            month_punctuality.add(color);
        }

        let month_prb = monthly_prb.slot(year, month);
        if let Some(status) = parse_present::<TicketStatus>(&entry.prb_id_status) {
            prb.add(status);
            month_prb.add(status);
        }

        let month_hiim = monthly_hiim.slot(year, month);
        if let Some(status) = parse_present::<TicketStatus>(&entry.hiim_id_status) {
            hiim.add(status);
            month_hiim.add(status);
        }

        *applications.entry(entry.application_name.clone()).or_default() += 1;
    }

    StatsReport {
        total_entries: entries.len(),
        quality_distribution: quality,
        punctuality_distribution: punctuality,
        prb_distribution: prb,
        hiim_distribution: hiim,
        application_distribution: applications,
        monthly_quality: monthly_quality.into_breakdown(),
        monthly_punctuality: monthly_punctuality.into_breakdown(),
        monthly_prb: monthly_prb.into_breakdown(),
        monthly_hiim: monthly_hiim.into_breakdown(),
    }
}

/// Red-card counts and root causes for XVA entries in the selected period
pub fn compute_xva_stats(entries: &[Entry], filter: &EntryFilter) -> XvaStatsReport {
    let period = filter.period_only();
    let entries: Vec<&Entry> = entries
        .iter()
        .filter(|e| e.application_name == XVA && period.matches(e))
        .collect();

    let mut monthly = MonthTable::<XvaRedCounts>::seeded(&seed_months(&period, &entries));
    let mut root_causes: BTreeMap<(String, String), u64> = BTreeMap::new();

    for entry in entries {
        let counts = monthly.slot(entry.date.year(), entry.date.month());
        if !entry.is_xva_red() {
            continue;
        }

        if is_red(&entry.valo_status) {
            counts.valo_red += 1;
        }
        if is_red(&entry.sensi_status) {
            counts.sensi_red += 1;
        }
        if is_red(&entry.cf_ra_status) {
            counts.cf_ra_red += 1;
        }
        counts.total_red += 1;

        let key = (
            or_unknown(&entry.root_cause_application),
            or_unknown(&entry.root_cause_type),
        );
        *root_causes.entry(key).or_default() += 1;
    }

    let root_cause_analysis: Vec<RootCauseCount> = root_causes
        .into_iter()
        .map(|((application, kind), count)| RootCauseCount {
            root_cause_application: application,
            root_cause_type: kind,
            count,
        })
        .collect();
    let grand_total = root_cause_analysis.iter().map(|r| r.count).sum();

    XvaStatsReport {
        monthly_red_counts: monthly.into_breakdown(),
        root_cause_analysis,
        grand_total,
    }
}

/// Parse a non-empty stored value; values outside the enumeration are skipped
fn parse_present<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

fn is_red(value: &Option<String>) -> bool {
    value.as_deref() == Some(TriColor::Red.as_str())
}

fn or_unknown(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}
