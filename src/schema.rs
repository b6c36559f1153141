//! Response schemas for the two card sides.
//!
//! The front and the back of an ARC carry different fields, so they are two
//! distinct contracts rather than one merged struct. Field names on the wire
//! are the human-readable keys the prompts ask for (`"Registration No."`,
//! `"Duration of Stay"`, …); serde renames map them onto Rust fields.
//!
//! Any value may be the literal [`MASKED`] sentinel. It is passed through
//! untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value the service returns for a field it cannot read in the image.
pub const MASKED: &str = "masked";

/// Which face of the physical card an image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// Both sides in display order.
    pub const ALL: [Side; 2] = [Side::Front, Side::Back];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Fields printed on the front of the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontFields {
    /// 13 digits, `XXXXXX-XXXXXXX`.
    #[serde(rename = "Registration No.")]
    pub registration_no: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Country/Region")]
    pub country_region: String,

    /// `Korean explanation(letter-digit)`, e.g. `유학(D-2)`.
    #[serde(rename = "Status")]
    pub status: String,

    /// `YYYY.MM.DD`.
    #[serde(rename = "Issue Date")]
    pub issue_date: String,
}

/// One row of the back-side "Duration of Stay" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayPeriod {
    /// Permission date (허가일자), `YYYY.MM.DD`.
    #[serde(rename = "Start Date")]
    pub start_date: String,

    /// Expiry date (만료일자), `YYYY.MM.DD`.
    #[serde(rename = "End Date")]
    pub end_date: String,

    /// Confirmation (확인), Korean text.
    #[serde(rename = "Check")]
    pub check: String,
}

/// Fields printed on the back of the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackFields {
    /// 10 digits, `X-XXX-XXX-XXXX`.
    #[serde(rename = "Serial No.")]
    pub serial_no: String,

    #[serde(rename = "Duration of Stay")]
    pub duration_of_stay: StayTable,
}

/// The "Duration of Stay" table: its rows, or a single sentinel when the
/// whole table is unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StayTable {
    /// Rows in the order they appear on the card.
    Rows(Vec<StayPeriod>),
    /// The table as a single string, normally [`MASKED`]. Kept verbatim.
    Masked(String),
}

impl StayTable {
    /// Readable rows; empty when the table is masked.
    pub fn rows(&self) -> &[StayPeriod] {
        match self {
            StayTable::Rows(rows) => rows,
            StayTable::Masked(_) => &[],
        }
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, StayTable::Masked(_))
    }
}

impl Default for StayTable {
    fn default() -> Self {
        StayTable::Rows(Vec::new())
    }
}

impl From<Vec<StayPeriod>> for StayTable {
    fn from(rows: Vec<StayPeriod>) -> Self {
        StayTable::Rows(rows)
    }
}

/// Parsed answer for one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "lowercase")]
pub enum ExtractionResult {
    Front(FrontFields),
    Back(BackFields),
}

impl ExtractionResult {
    pub fn side(&self) -> Side {
        match self {
            ExtractionResult::Front(_) => Side::Front,
            ExtractionResult::Back(_) => Side::Back,
        }
    }

    /// Scalar fields as `(wire key, value)` pairs, in prompt order.
    ///
    /// Table rows of the back side are not included; see [`BackFields::duration_of_stay`].
    pub fn scalar_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            ExtractionResult::Front(f) => vec![
                ("Registration No.", f.registration_no.as_str()),
                ("Name", f.name.as_str()),
                ("Country/Region", f.country_region.as_str()),
                ("Status", f.status.as_str()),
                ("Issue Date", f.issue_date.as_str()),
            ],
            ExtractionResult::Back(b) => vec![("Serial No.", b.serial_no.as_str())],
        }
    }

    /// Number of values (scalars and table cells) equal to [`MASKED`].
    ///
    /// A fully masked stay table counts once.
    pub fn masked_count(&self) -> usize {
        let scalars = self
            .scalar_fields()
            .into_iter()
            .filter(|(_, v)| is_masked(v))
            .count();
        let cells = match self {
            ExtractionResult::Front(_) => 0,
            ExtractionResult::Back(b) => match &b.duration_of_stay {
                StayTable::Masked(value) => usize::from(is_masked(value)),
                StayTable::Rows(rows) => rows
                    .iter()
                    .flat_map(|r| [&r.start_date, &r.end_date, &r.check])
                    .filter(|v| is_masked(v))
                    .count(),
            },
        };
        scalars + cells
    }
}

/// True when a value is the masked sentinel.
pub fn is_masked(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(MASKED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_display_is_lowercase() {
        assert_eq!(Side::Front.to_string(), "front");
        assert_eq!(Side::Back.to_string(), "back");
        assert_eq!(format!("{:<5}|", Side::Back), "back |");
    }

    #[test]
    fn front_fields_use_wire_keys() {
        let f = FrontFields {
            registration_no: "900101-5123456".into(),
            name: "JOHN DOE".into(),
            country_region: "USA".into(),
            status: "유학(D-2)".into(),
            issue_date: "2023.01.15".into(),
        };
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["Registration No."], "900101-5123456");
        assert_eq!(json["Country/Region"], "USA");
        assert_eq!(json["Issue Date"], "2023.01.15");
    }

    #[test]
    fn masked_count_covers_table_cells() {
        let b = ExtractionResult::Back(BackFields {
            serial_no: "masked".into(),
            duration_of_stay: StayTable::Rows(vec![
                StayPeriod {
                    start_date: "2023.01.15".into(),
                    end_date: "masked".into(),
                    check: "확인".into(),
                },
                StayPeriod {
                    start_date: "MASKED".into(),
                    end_date: "2025.01.14".into(),
                    check: "masked".into(),
                },
            ]),
        });
        assert_eq!(b.masked_count(), 4);
    }

    #[test]
    fn masked_stay_table_counts_once_and_has_no_rows() {
        let b = ExtractionResult::Back(BackFields {
            serial_no: "1-234-567-8901".into(),
            duration_of_stay: StayTable::Masked(MASKED.into()),
        });
        assert_eq!(b.masked_count(), 1);
        let ExtractionResult::Back(fields) = &b else { unreachable!() };
        assert!(fields.duration_of_stay.is_masked());
        assert!(fields.duration_of_stay.rows().is_empty());
    }

    #[test]
    fn stay_table_serializes_untagged() {
        let rows = serde_json::to_value(StayTable::default()).unwrap();
        assert_eq!(rows, serde_json::json!([]));
        let masked = serde_json::to_value(StayTable::Masked(MASKED.into())).unwrap();
        assert_eq!(masked, "masked");
    }

    #[test]
    fn back_scalar_fields_exclude_rows() {
        let b = ExtractionResult::Back(BackFields {
            serial_no: "1-234-567-8901".into(),
            duration_of_stay: StayTable::default(),
        });
        assert_eq!(b.scalar_fields(), vec![("Serial No.", "1-234-567-8901")]);
        assert_eq!(b.side(), Side::Back);
    }
}
