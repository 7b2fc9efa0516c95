//! Case status.
//!
//! Storage keeps the initial state as `null`; every other state is stored
//! under its display label (`"On Progress"`, `"TPP Scheduled"`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a litmas case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LitmasStatus {
    /// Registered with a caseworker, no task document yet. Stored as `null`.
    #[default]
    #[serde(rename = "New Task")]
    NewTask,
    #[serde(rename = "On Progress")]
    OnProgress,
    #[serde(rename = "Review")]
    Review,
    #[serde(rename = "Revision")]
    Revision,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "TPP Scheduled")]
    TppScheduled,
    /// Terminal.
    #[serde(rename = "Selesai")]
    Selesai,
}

impl LitmasStatus {
    /// All statuses in workflow order.
    pub const ALL: [LitmasStatus; 7] = [
        LitmasStatus::NewTask,
        LitmasStatus::OnProgress,
        LitmasStatus::Review,
        LitmasStatus::Revision,
        LitmasStatus::Approved,
        LitmasStatus::TppScheduled,
        LitmasStatus::Selesai,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LitmasStatus::NewTask => "New Task",
            LitmasStatus::OnProgress => "On Progress",
            LitmasStatus::Review => "Review",
            LitmasStatus::Revision => "Revision",
            LitmasStatus::Approved => "Approved",
            LitmasStatus::TppScheduled => "TPP Scheduled",
            LitmasStatus::Selesai => "Selesai",
        }
    }

    /// Parse a stored or displayed label. Matching ignores ASCII case and
    /// surrounding whitespace; the empty string reads as `New Task`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return Some(LitmasStatus::NewTask);
        }
        LitmasStatus::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }

    pub fn is_terminal(self) -> bool {
        self == LitmasStatus::Selesai
    }

    /// Whether a sitting slot is shown for a case in this status.
    pub fn shows_schedule(self) -> bool {
        matches!(self, LitmasStatus::TppScheduled | LitmasStatus::Selesai)
    }
}

impl fmt::Display for LitmasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Serde adapter storing `NewTask` as `null`.
///
/// Use with `#[serde(default, with = "monalisa_core::status::nullable")]`.
pub mod nullable {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::LitmasStatus;

    pub fn serialize<S: Serializer>(status: &LitmasStatus, s: S) -> Result<S::Ok, S::Error> {
        match status {
            LitmasStatus::NewTask => s.serialize_none(),
            other => other.serialize(s),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LitmasStatus, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(LitmasStatus::NewTask),
            Some(label) => LitmasStatus::from_label(&label).ok_or_else(|| {
                serde::de::Error::custom(format!("unknown litmas status '{}'", label))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for status in LitmasStatus::ALL {
            assert_eq!(LitmasStatus::from_label(status.label()), Some(status));
        }
    }

    #[test]
    fn label_parsing_is_lenient() {
        assert_eq!(
            LitmasStatus::from_label("  tpp scheduled "),
            Some(LitmasStatus::TppScheduled)
        );
        assert_eq!(LitmasStatus::from_label(""), Some(LitmasStatus::NewTask));
        assert_eq!(LitmasStatus::from_label("Archived"), None);
    }

    #[derive(Serialize, Deserialize)]
    struct Row {
        #[serde(default, with = "nullable")]
        status: LitmasStatus,
    }

    #[test]
    fn new_task_is_stored_as_null() {
        let json = serde_json::to_value(Row {
            status: LitmasStatus::NewTask,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "status": null }));

        let json = serde_json::to_value(Row {
            status: LitmasStatus::TppScheduled,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "status": "TPP Scheduled" }));
    }

    #[test]
    fn null_and_missing_read_as_new_task() {
        let row: Row = serde_json::from_str(r#"{"status": null}"#).unwrap();
        assert_eq!(row.status, LitmasStatus::NewTask);
        let row: Row = serde_json::from_str("{}").unwrap();
        assert_eq!(row.status, LitmasStatus::NewTask);
        let row: Row = serde_json::from_str(r#"{"status": "Review"}"#).unwrap();
        assert_eq!(row.status, LitmasStatus::Review);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = serde_json::from_str::<Row>(r#"{"status": "Archived"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn only_late_states_show_schedule() {
        let shown: Vec<_> = LitmasStatus::ALL
            .into_iter()
            .filter(|s| s.shows_schedule())
            .collect();
        assert_eq!(
            shown,
            vec![LitmasStatus::TppScheduled, LitmasStatus::Selesai]
        );
    }
}
