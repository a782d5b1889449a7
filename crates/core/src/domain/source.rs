// Job Source Identifiers

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Job sites with a registered adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Computrabajo,
    GetManfred,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Computrabajo, SourceKind::GetManfred];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Computrabajo => "computrabajo",
            SourceKind::GetManfred => "getmanfred",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "computrabajo" => Ok(SourceKind::Computrabajo),
            "getmanfred" | "manfred" => Ok(SourceKind::GetManfred),
            other => Err(DomainError::UnknownSource(other.to_string())),
        }
    }
}

/// Publication-date filter understood by Computrabajo (`pubdate` query value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublicationWindow {
    Urgent,
    #[default]
    Today,
    LastThreeDays,
    LastWeek,
    LastFifteenDays,
    LastMonth,
}

impl PublicationWindow {
    /// Value of the `pubdate` query parameter
    pub fn query_value(&self) -> u32 {
        match self {
            PublicationWindow::Urgent => 99,
            PublicationWindow::Today => 1,
            PublicationWindow::LastThreeDays => 3,
            PublicationWindow::LastWeek => 7,
            PublicationWindow::LastFifteenDays => 15,
            PublicationWindow::LastMonth => 30,
        }
    }
}

impl FromStr for PublicationWindow {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "urgent" => Ok(PublicationWindow::Urgent),
            "today" => Ok(PublicationWindow::Today),
            "last_three_days" | "3d" => Ok(PublicationWindow::LastThreeDays),
            "last_week" | "7d" => Ok(PublicationWindow::LastWeek),
            "last_fifteen_days" | "15d" => Ok(PublicationWindow::LastFifteenDays),
            "last_month" | "30d" => Ok(PublicationWindow::LastMonth),
            other => Err(DomainError::ValidationError(format!(
                "unknown publication window: {}",
                other
            ))),
        }
    }
}
