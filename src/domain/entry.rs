//! Entry domain model - one production status record per application and day

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::status::TriColor;

/// Date format used on the wire and in storage
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A daily production status entry with its child collections attached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub id: i64,
    pub date: NaiveDate,
    pub day: Option<String>,
    pub application_name: String,

    // CVAR punctuality and quality
    pub prc_mail_text: Option<String>,
    pub prc_mail_status: Option<String>,
    pub cp_alerts_text: Option<String>,
    pub cp_alerts_status: Option<String>,
    pub quality_status: Option<String>,

    // XVA punctuality, quality and root cause
    pub valo_text: Option<String>,
    pub valo_status: Option<String>,
    pub sensi_text: Option<String>,
    pub sensi_status: Option<String>,
    pub cf_ra_text: Option<String>,
    pub cf_ra_status: Option<String>,
    pub acq_text: Option<String>,
    pub quality_legacy: Option<String>,
    pub quality_target: Option<String>,
    pub root_cause_application: Option<String>,
    pub root_cause_type: Option<String>,
    pub xva_remarks: Option<String>,

    pub remarks: Option<String>,

    // Legacy single-valued incident columns, filled from the first child at creation
    pub prb_id_number: Option<String>,
    pub prb_id_status: Option<String>,
    pub prb_link: Option<String>,
    pub hiim_id_number: Option<String>,
    pub hiim_id_status: Option<String>,
    pub hiim_link: Option<String>,
    pub issue_description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub issues: Vec<Issue>,
    pub prbs: Vec<ProblemRecord>,
    pub hiims: Vec<IncidentRecord>,
}

impl Entry {
    /// Has a problem record, either through the legacy column or the child list
    pub fn has_prb(&self) -> bool {
        !is_blank(&self.prb_id_number) || !self.prbs.is_empty()
    }

    /// Has an incident record, either through the legacy column or the child list
    pub fn has_hiim(&self) -> bool {
        !is_blank(&self.hiim_id_number) || !self.hiims.is_empty()
    }

    /// An XVA entry is red when any punctuality or quality indicator is Red
    pub fn is_xva_red(&self) -> bool {
        [
            &self.valo_status,
            &self.sensi_status,
            &self.cf_ra_status,
            &self.quality_legacy,
            &self.quality_target,
        ]
        .into_iter()
        .any(|status| is_red(status))
    }

    /// Project the stored entry back into the write shape, for merge-validation
    pub fn to_input(&self) -> EntryInput {
        EntryInput {
            date: Some(self.date.format(DATE_FORMAT).to_string()),
            day: self.day.clone(),
            application_name: Some(self.application_name.clone()),
            prc_mail_text: self.prc_mail_text.clone(),
            prc_mail_status: self.prc_mail_status.clone(),
            cp_alerts_text: self.cp_alerts_text.clone(),
            cp_alerts_status: self.cp_alerts_status.clone(),
            quality_status: self.quality_status.clone(),
            valo_text: self.valo_text.clone(),
            valo_status: self.valo_status.clone(),
            sensi_text: self.sensi_text.clone(),
            sensi_status: self.sensi_status.clone(),
            cf_ra_text: self.cf_ra_text.clone(),
            cf_ra_status: self.cf_ra_status.clone(),
            acq_text: self.acq_text.clone(),
            quality_legacy: self.quality_legacy.clone(),
            quality_target: self.quality_target.clone(),
            root_cause_application: self.root_cause_application.clone(),
            root_cause_type: self.root_cause_type.clone(),
            xva_remarks: self.xva_remarks.clone(),
            remarks: self.remarks.clone(),
            prb_id_number: self.prb_id_number.clone().map(TicketNumber::Text),
            prb_id_status: self.prb_id_status.clone(),
            prb_link: self.prb_link.clone(),
            hiim_id_number: self.hiim_id_number.clone().map(TicketNumber::Text),
            hiim_id_status: self.hiim_id_status.clone(),
            hiim_link: self.hiim_link.clone(),
            issue_description: self.issue_description.clone(),
            issues: Some(self.issues.iter().map(Issue::to_input).collect()),
            prbs: Some(self.prbs.iter().map(ProblemRecord::to_input).collect()),
            hiims: Some(self.hiims.iter().map(IncidentRecord::to_input).collect()),
        }
    }
}

/// Free-text issue attached to an entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: i64,
    pub description: String,
    pub remarks: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    fn to_input(&self) -> IssueInput {
        IssueInput {
            description: Some(self.description.clone()),
            remarks: Some(self.remarks.clone()),
        }
    }
}

/// Linked problem-tracking ticket (PRB)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemRecord {
    pub id: i64,
    pub prb_id_number: String,
    pub prb_id_status: String,
    pub prb_link: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl ProblemRecord {
    fn to_input(&self) -> ProblemRecordInput {
        ProblemRecordInput {
            prb_id_number: non_empty(&self.prb_id_number).map(TicketNumber::Text),
            prb_id_status: non_empty(&self.prb_id_status),
            prb_link: non_empty(&self.prb_link),
        }
    }
}

/// Linked high-impact incident ticket (HIIM)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentRecord {
    pub id: i64,
    pub hiim_id_number: String,
    pub hiim_id_status: String,
    pub hiim_link: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl IncidentRecord {
    fn to_input(&self) -> IncidentRecordInput {
        IncidentRecordInput {
            hiim_id_number: non_empty(&self.hiim_id_number).map(TicketNumber::Text),
            hiim_id_status: non_empty(&self.hiim_id_status),
            hiim_link: non_empty(&self.hiim_link),
        }
    }
}

/// Ticket number as sent by clients: a JSON integer or a string of digits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TicketNumber {
    Integer(i64),
    Text(String),
}

impl TicketNumber {
    pub fn as_text(&self) -> String {
        match self {
            TicketNumber::Integer(n) => n.to_string(),
            TicketNumber::Text(s) => s.clone(),
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            TicketNumber::Integer(_) => true,
            TicketNumber::Text(s) => s.trim().parse::<i64>().is_ok(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueInput {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecordInput {
    #[serde(default)]
    pub prb_id_number: Option<TicketNumber>,
    #[serde(default)]
    pub prb_id_status: Option<String>,
    #[serde(default)]
    pub prb_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecordInput {
    #[serde(default)]
    pub hiim_id_number: Option<TicketNumber>,
    #[serde(default)]
    pub hiim_id_status: Option<String>,
    #[serde(default)]
    pub hiim_link: Option<String>,
}

/// Write shape for creating an entry or patching one.
///
/// A `Some` scalar is written; `None` leaves the column alone on update. A `Some`
/// child list replaces the stored collection wholesale. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryInput {
    pub date: Option<String>,
    pub day: Option<String>,
    pub application_name: Option<String>,
    pub prc_mail_text: Option<String>,
    pub prc_mail_status: Option<String>,
    pub cp_alerts_text: Option<String>,
    pub cp_alerts_status: Option<String>,
    pub quality_status: Option<String>,
    pub valo_text: Option<String>,
    pub valo_status: Option<String>,
    pub sensi_text: Option<String>,
    pub sensi_status: Option<String>,
    pub cf_ra_text: Option<String>,
    pub cf_ra_status: Option<String>,
    pub acq_text: Option<String>,
    pub quality_legacy: Option<String>,
    pub quality_target: Option<String>,
    pub root_cause_application: Option<String>,
    pub root_cause_type: Option<String>,
    pub xva_remarks: Option<String>,
    pub remarks: Option<String>,
    pub prb_id_number: Option<TicketNumber>,
    pub prb_id_status: Option<String>,
    pub prb_link: Option<String>,
    pub hiim_id_number: Option<TicketNumber>,
    pub hiim_id_status: Option<String>,
    pub hiim_link: Option<String>,
    pub issue_description: Option<String>,
    pub issues: Option<Vec<IssueInput>>,
    pub prbs: Option<Vec<ProblemRecordInput>>,
    pub hiims: Option<Vec<IncidentRecordInput>>,
}

impl EntryInput {
    /// Scalar columns of the `entries` table paired with the supplied value.
    ///
    /// The order is fixed and matches the insert statement in the store.
    pub fn columns(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("date", self.date.clone()),
            ("day", self.day.clone()),
            ("application_name", self.application_name.clone()),
            ("prc_mail_text", self.prc_mail_text.clone()),
            ("prc_mail_status", self.prc_mail_status.clone()),
            ("cp_alerts_text", self.cp_alerts_text.clone()),
            ("cp_alerts_status", self.cp_alerts_status.clone()),
            ("quality_status", self.quality_status.clone()),
            ("quality_legacy", self.quality_legacy.clone()),
            ("quality_target", self.quality_target.clone()),
            ("prb_id_number", self.prb_id_number.as_ref().map(TicketNumber::as_text)),
            ("prb_id_status", self.prb_id_status.clone()),
            ("prb_link", self.prb_link.clone()),
            ("hiim_id_number", self.hiim_id_number.as_ref().map(TicketNumber::as_text)),
            ("hiim_id_status", self.hiim_id_status.clone()),
            ("hiim_link", self.hiim_link.clone()),
            ("valo_text", self.valo_text.clone()),
            ("valo_status", self.valo_status.clone()),
            ("sensi_text", self.sensi_text.clone()),
            ("sensi_status", self.sensi_status.clone()),
            ("cf_ra_text", self.cf_ra_text.clone()),
            ("cf_ra_status", self.cf_ra_status.clone()),
            ("acq_text", self.acq_text.clone()),
            ("root_cause_application", self.root_cause_application.clone()),
            ("root_cause_type", self.root_cause_type.clone()),
            ("issue_description", self.issue_description.clone()),
            ("remarks", self.remarks.clone()),
            ("xva_remarks", self.xva_remarks.clone()),
        ]
    }

    /// Overlay `patch` on top of `self`: supplied fields win, absent ones keep ours
    pub fn merged_with(&self, patch: &EntryInput) -> EntryInput {
        fn pick<T: Clone>(patch: &Option<T>, base: &Option<T>) -> Option<T> {
            patch.clone().or_else(|| base.clone())
        }

        EntryInput {
            date: pick(&patch.date, &self.date),
            day: pick(&patch.day, &self.day),
            application_name: pick(&patch.application_name, &self.application_name),
            prc_mail_text: pick(&patch.prc_mail_text, &self.prc_mail_text),
            prc_mail_status: pick(&patch.prc_mail_status, &self.prc_mail_status),
            cp_alerts_text: pick(&patch.cp_alerts_text, &self.cp_alerts_text),
            cp_alerts_status: pick(&patch.cp_alerts_status, &self.cp_alerts_status),
            quality_status: pick(&patch.quality_status, &self.quality_status),
            valo_text: pick(&patch.valo_text, &self.valo_text),
            valo_status: pick(&patch.valo_status, &self.valo_status),
            sensi_text: pick(&patch.sensi_text, &self.sensi_text),
            sensi_status: pick(&patch.sensi_status, &self.sensi_status),
            cf_ra_text: pick(&patch.cf_ra_text, &self.cf_ra_text),
            cf_ra_status: pick(&patch.cf_ra_status, &self.cf_ra_status),
            acq_text: pick(&patch.acq_text, &self.acq_text),
            quality_legacy: pick(&patch.quality_legacy, &self.quality_legacy),
            quality_target: pick(&patch.quality_target, &self.quality_target),
            root_cause_application: pick(&patch.root_cause_application, &self.root_cause_application),
            root_cause_type: pick(&patch.root_cause_type, &self.root_cause_type),
            xva_remarks: pick(&patch.xva_remarks, &self.xva_remarks),
            remarks: pick(&patch.remarks, &self.remarks),
            prb_id_number: pick(&patch.prb_id_number, &self.prb_id_number),
            prb_id_status: pick(&patch.prb_id_status, &self.prb_id_status),
            prb_link: pick(&patch.prb_link, &self.prb_link),
            hiim_id_number: pick(&patch.hiim_id_number, &self.hiim_id_number),
            hiim_id_status: pick(&patch.hiim_id_status, &self.hiim_id_status),
            hiim_link: pick(&patch.hiim_link, &self.hiim_link),
            issue_description: pick(&patch.issue_description, &self.issue_description),
            issues: pick(&patch.issues, &self.issues),
            prbs: pick(&patch.prbs, &self.prbs),
            hiims: pick(&patch.hiims, &self.hiims),
        }
    }

    /// Reset one field by key: scalars become absent, child lists empty
    pub fn clear(&mut self, key: &str) {
        match key {
            "date" => self.date = None,
            "day" => self.day = None,
            "application_name" => self.application_name = None,
            "prc_mail_text" => self.prc_mail_text = None,
            "prc_mail_status" => self.prc_mail_status = None,
            "cp_alerts_text" => self.cp_alerts_text = None,
            "cp_alerts_status" => self.cp_alerts_status = None,
            "quality_status" => self.quality_status = None,
            "quality_legacy" => self.quality_legacy = None,
            "quality_target" => self.quality_target = None,
            "prb_id_number" => self.prb_id_number = None,
            "prb_id_status" => self.prb_id_status = None,
            "prb_link" => self.prb_link = None,
            "hiim_id_number" => self.hiim_id_number = None,
            "hiim_id_status" => self.hiim_id_status = None,
            "hiim_link" => self.hiim_link = None,
            "valo_text" => self.valo_text = None,
            "valo_status" => self.valo_status = None,
            "sensi_text" => self.sensi_text = None,
            "sensi_status" => self.sensi_status = None,
            "cf_ra_text" => self.cf_ra_text = None,
            "cf_ra_status" => self.cf_ra_status = None,
            "acq_text" => self.acq_text = None,
            "root_cause_application" => self.root_cause_application = None,
            "root_cause_type" => self.root_cause_type = None,
            "issue_description" => self.issue_description = None,
            "remarks" => self.remarks = None,
            "xva_remarks" => self.xva_remarks = None,
            "issues" => self.issues = Some(Vec::new()),
            "prbs" => self.prbs = Some(Vec::new()),
            "hiims" => self.hiims = Some(Vec::new()),
            _ => {}
        }
    }

    /// Whether any child list is present and non-empty
    pub fn has_children(&self) -> bool {
        self.issues.as_ref().is_some_and(|v| !v.is_empty())
            || self.prbs.as_ref().is_some_and(|v| !v.is_empty())
            || self.hiims.as_ref().is_some_and(|v| !v.is_empty())
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok())
    }

    /// Fill `day` from `date` when the caller left it blank
    pub fn with_derived_day(mut self) -> Self {
        if is_blank(&self.day) {
            if let Some(date) = self.parsed_date() {
                self.day = Some(weekday_name(date));
            }
        }
        self
    }

    /// Copy the first child of each collection into the legacy single-value
    /// columns the caller did not fill in
    pub fn with_legacy_backfill(mut self) -> Self {
        if is_blank(&self.issue_description) {
            if let Some(first) = self.issues.as_ref().and_then(|v| v.first()) {
                self.issue_description = Some(first.description.clone().unwrap_or_default());
            }
        }

        let prb_blank = self
            .prb_id_number
            .as_ref()
            .map_or(true, |n| n.as_text().is_empty());
        if prb_blank {
            if let Some(first) = self.prbs.as_ref().and_then(|v| v.first()) {
                self.prb_id_number = Some(TicketNumber::Text(
                    first.prb_id_number.as_ref().map(TicketNumber::as_text).unwrap_or_default(),
                ));
                self.prb_id_status = Some(first.prb_id_status.clone().unwrap_or_default());
                self.prb_link = Some(first.prb_link.clone().unwrap_or_default());
            }
        }

        let hiim_blank = self
            .hiim_id_number
            .as_ref()
            .map_or(true, |n| n.as_text().is_empty());
        if hiim_blank {
            if let Some(first) = self.hiims.as_ref().and_then(|v| v.first()) {
                self.hiim_id_number = Some(TicketNumber::Text(
                    first.hiim_id_number.as_ref().map(TicketNumber::as_text).unwrap_or_default(),
                ));
                self.hiim_id_status = Some(first.hiim_id_status.clone().unwrap_or_default());
                self.hiim_link = Some(first.hiim_link.clone().unwrap_or_default());
            }
        }

        self
    }
}

/// Every key an entry payload may carry, scalars first then child lists
pub const ENTRY_FIELDS: [&str; 31] = [
    "date",
    "day",
    "application_name",
    "prc_mail_text",
    "prc_mail_status",
    "cp_alerts_text",
    "cp_alerts_status",
    "quality_status",
    "quality_legacy",
    "quality_target",
    "prb_id_number",
    "prb_id_status",
    "prb_link",
    "hiim_id_number",
    "hiim_id_status",
    "hiim_link",
    "valo_text",
    "valo_status",
    "sensi_text",
    "sensi_status",
    "cf_ra_text",
    "cf_ra_status",
    "acq_text",
    "root_cause_application",
    "root_cause_type",
    "issue_description",
    "remarks",
    "xva_remarks",
    "issues",
    "prbs",
    "hiims",
];

/// Partial update of an entry.
///
/// `set` holds the supplied values. `cleared` names the known keys sent as JSON
/// `null`: a cleared scalar is written as NULL and a cleared child list is
/// emptied. Keys absent from the payload are left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct EntryPatch {
    pub set: EntryInput,
    pub cleared: BTreeSet<&'static str>,
}

impl EntryPatch {
    pub fn clears(&self, key: &str) -> bool {
        self.cleared.contains(key)
    }

    /// The stored entry with this patch applied, as validation sees it
    pub fn apply_to(&self, base: &EntryInput) -> EntryInput {
        let mut merged = base.merged_with(&self.set);
        for key in &self.cleared {
            merged.clear(key);
        }
        merged
    }
}

impl From<EntryInput> for EntryPatch {
    fn from(set: EntryInput) -> Self {
        Self {
            set,
            cleared: BTreeSet::new(),
        }
    }
}

impl TryFrom<Map<String, Value>> for EntryPatch {
    type Error = serde_json::Error;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let cleared = ENTRY_FIELDS
            .into_iter()
            .filter(|key| map.get(*key).is_some_and(Value::is_null))
            .collect();
        let set = serde_json::from_value(Value::Object(map))?;

        Ok(Self { set, cleared })
    }
}

/// Full English weekday name, e.g. `Monday`
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

pub fn month_key(year: i32, month: u32) -> String {
    format!("{}-{:02}", year, month)
}

/// Human-readable month label, e.g. `January 2025`
pub fn month_label(year: i32, month: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.format("%B %Y").to_string())
}

pub fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn is_red(value: &Option<String>) -> bool {
    value.as_deref() == Some(TriColor::Red.as_str())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
