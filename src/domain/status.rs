//! Status enumerations and application families

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Health indicator used by every punctuality and quality field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriColor {
    Red,
    Yellow,
    Green,
}

impl TriColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriColor::Red => "Red",
            TriColor::Yellow => "Yellow",
            TriColor::Green => "Green",
        }
    }

    /// Bucket a PRC mail status for the punctuality chart.
    ///
    /// Older rows carry `late`/`warning`/`on-time` and lowercase colors; any
    /// other non-empty value lands in Yellow. Blank values are not counted.
    pub fn punctuality_bucket(raw: &str) -> Option<TriColor> {
        match raw {
            "" => None,
            "Red" | "red" | "late" => Some(TriColor::Red),
            "Yellow" | "yellow" | "warning" => Some(TriColor::Yellow),
            "Green" | "green" | "on-time" => Some(TriColor::Green),
            _ => Some(TriColor::Yellow),
        }
    }
}

impl fmt::Display for TriColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TriColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Red" => Ok(TriColor::Red),
            "Yellow" => Ok(TriColor::Yellow),
            "Green" => Ok(TriColor::Green),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Lifecycle of a linked PRB or HIIM ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Active,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TicketStatus::Active),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!("Unknown ticket status: {}", s)),
        }
    }
}

/// The one application with its own field set; every other name is CVAR-like
pub const XVA: &str = "XVA";

/// Status-bearing field of an entry, named by its JSON key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    PrcMail,
    CpAlerts,
    Quality,
    Valo,
    Sensi,
    CfRa,
    QualityLegacy,
    QualityTarget,
}

impl StatusField {
    pub fn key(&self) -> &'static str {
        match self {
            StatusField::PrcMail => "prc_mail_status",
            StatusField::CpAlerts => "cp_alerts_status",
            StatusField::Quality => "quality_status",
            StatusField::Valo => "valo_status",
            StatusField::Sensi => "sensi_status",
            StatusField::CfRa => "cf_ra_status",
            StatusField::QualityLegacy => "quality_legacy",
            StatusField::QualityTarget => "quality_target",
        }
    }

    /// Message returned when the field holds something other than a tri-color value
    pub fn invalid_message(&self) -> &'static str {
        match self {
            StatusField::PrcMail => "Invalid PRC mail status",
            StatusField::CpAlerts => "Invalid CP alerts status",
            StatusField::Quality => "Invalid quality status",
            StatusField::Valo => "Invalid VALO status",
            StatusField::Sensi => "Invalid SENSI status",
            StatusField::CfRa => "Invalid CF RA status",
            StatusField::QualityLegacy => "Invalid quality legacy status",
            StatusField::QualityTarget => "Invalid quality target status",
        }
    }
}

/// Scalar fields that may be required by a family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Date,
    ApplicationName,
    PrcMailText,
    PrcMailStatus,
}

impl RequiredField {
    pub fn key(&self) -> &'static str {
        match self {
            RequiredField::Date => "date",
            RequiredField::ApplicationName => "application_name",
            RequiredField::PrcMailText => "prc_mail_text",
            RequiredField::PrcMailStatus => "prc_mail_status",
        }
    }

    /// Whether a non-empty child collection satisfies this requirement
    pub fn waived_by_children(&self) -> bool {
        matches!(self, RequiredField::PrcMailText | RequiredField::PrcMailStatus)
    }
}

/// Application family an entry belongs to; decides which fields apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationFamily {
    /// CVAR ALL, CVAR NYQ and anything that is not XVA
    Cvar,
    Xva,
}

impl ApplicationFamily {
    pub fn of(application_name: &str) -> Self {
        if application_name == XVA {
            ApplicationFamily::Xva
        } else {
            ApplicationFamily::Cvar
        }
    }

    pub fn required_fields(&self) -> &'static [RequiredField] {
        match self {
            ApplicationFamily::Xva => &[RequiredField::Date, RequiredField::ApplicationName],
            ApplicationFamily::Cvar => &[
                RequiredField::Date,
                RequiredField::ApplicationName,
                RequiredField::PrcMailText,
                RequiredField::PrcMailStatus,
            ],
        }
    }

    pub fn status_fields(&self) -> &'static [StatusField] {
        match self {
            ApplicationFamily::Xva => &[
                StatusField::Valo,
                StatusField::Sensi,
                StatusField::CfRa,
                StatusField::QualityLegacy,
                StatusField::QualityTarget,
            ],
            ApplicationFamily::Cvar => &[
                StatusField::PrcMail,
                StatusField::CpAlerts,
                StatusField::Quality,
            ],
        }
    }
}
