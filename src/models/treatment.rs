// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Treatment catalogue model (read-only from the client).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{de_id, display_scalar};

/// Row of the `treatments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Minutes as a number, or free text
    #[serde(default)]
    pub duration: Option<serde_json::Value>,
    #[serde(default)]
    pub cost: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One line of the treatments table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct Treatment {
    pub id: String,
    pub name: String,
    pub duration: String,
    pub cost: String,
    pub description: String,
}

impl From<TreatmentRow> for Treatment {
    fn from(row: TreatmentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            duration: row.duration.as_ref().map(display_scalar).unwrap_or_default(),
            cost: match row.cost {
                Some(cost) if !cost.is_null() => format_cost(&cost),
                _ => "N/A".to_string(),
            },
            description: row.description.unwrap_or_default(),
        }
    }
}

/// Cost as a currency string: a literal `$` followed by the value as sent.
pub fn format_cost(cost: &serde_json::Value) -> String {
    format!("${}", display_scalar(cost))
}
