//! Query & aggregation over hydrated entries
//!
//! Everything here is a pure function of an in-memory entry list; callers load
//! entries from the store first.

mod filter;
mod stats;

pub use filter::*;
pub use stats::*;

#[cfg(test)]
mod fixtures {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::domain::Entry;

    /// Bare entry whose creation time increases with its id
    pub fn entry(id: i64, date: &str, app: &str) -> Entry {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(id);
        Entry {
            id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            day: None,
            application_name: app.to_string(),
            prc_mail_text: None,
            prc_mail_status: None,
            cp_alerts_text: None,
            cp_alerts_status: None,
            quality_status: None,
            valo_text: None,
            valo_status: None,
            sensi_text: None,
            sensi_status: None,
            cf_ra_text: None,
            cf_ra_status: None,
            acq_text: None,
            quality_legacy: None,
            quality_target: None,
            root_cause_application: None,
            root_cause_type: None,
            xva_remarks: None,
            remarks: None,
            prb_id_number: None,
            prb_id_status: None,
            prb_link: None,
            hiim_id_number: None,
            hiim_id_status: None,
            hiim_link: None,
            issue_description: None,
            created_at: created,
            updated_at: created,
            issues: Vec::new(),
            prbs: Vec::new(),
            hiims: Vec::new(),
        }
    }
}
