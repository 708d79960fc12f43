use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Coordinate;
use crate::ids::ReportId;

/// Fixed set of incident categories a user can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    Danger,
    Darkness,
    Desolate,
    Stray,
    Suspicious,
    Weather,
}

/// How a category is drawn: marker label, icon glyph name and colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// Indexed by `ReportCategory as usize`; order must match `ReportCategory::ALL`.
const CATEGORY_STYLES: [CategoryStyle; 6] = [
    CategoryStyle {
        label: "Pericolo",
        icon: "warning-outline",
        color: "#e74c3c",
    },
    CategoryStyle {
        label: "Scarsa illuminazione",
        icon: "moon-outline",
        color: "#2c3e50",
    },
    CategoryStyle {
        label: "Zona isolata",
        icon: "walk-outline",
        color: "#8e44ad",
    },
    CategoryStyle {
        label: "Animali randagi",
        icon: "paw-outline",
        color: "#d35400",
    },
    CategoryStyle {
        label: "Persona sospetta",
        icon: "eye-outline",
        color: "#c0392b",
    },
    CategoryStyle {
        label: "Maltempo",
        icon: "rainy-outline",
        color: "#2980b9",
    },
];

impl ReportCategory {
    pub const ALL: [ReportCategory; 6] = [
        Self::Danger,
        Self::Darkness,
        Self::Desolate,
        Self::Stray,
        Self::Suspicious,
        Self::Weather,
    ];

    pub fn style(&self) -> &'static CategoryStyle {
        &CATEGORY_STYLES[*self as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Danger => "danger",
            Self::Darkness => "darkness",
            Self::Desolate => "desolate",
            Self::Stray => "stray",
            Self::Suspicious => "suspicious",
            Self::Weather => "weather",
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown report category: {}", s))
    }
}

/// A user-submitted incident marker. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub coordinate: Coordinate,
    pub category: ReportCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Build a report. Notes are trimmed and an empty note becomes `None`.
    pub fn new(
        id: ReportId,
        coordinate: Coordinate,
        category: ReportCategory,
        note: Option<String>,
    ) -> Self {
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Self {
            id,
            coordinate,
            category,
            note,
            created_at: Utc::now(),
        }
    }
}
