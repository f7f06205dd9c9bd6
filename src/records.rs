//! Record shapes stored in the realtime database.
//!
//! Field names follow the keys the mobile app writes (`classId`, `preScore`,
//! `householdIncome`, ...). Records are decoded at the store boundary, so a
//! malformed record surfaces as [`crate::error::StoreError::InvalidRecord`]
//! instead of leaking missing fields into the dashboard.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::derive::status::{ProficiencyStatus, classify};

/// One stored subscore.
///
/// Anything other than a whole number is kept as `Invalid` rather than
/// failing the student record, so the rest of the record stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscore {
    Points(i64),
    Invalid,
}

impl Subscore {
    fn from_value(value: &Value) -> Self {
        if let Some(points) = value.as_i64() {
            return Self::Points(points);
        }
        match value.as_f64() {
            Some(points) if points.fract() == 0.0 && points.abs() <= MAX_EXACT_FLOAT => {
                Self::Points(points as i64)
            }
            _ => Self::Invalid,
        }
    }
}

/// Largest float that still holds every smaller whole number exactly.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl<'de> Deserialize<'de> for Subscore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

impl Serialize for Subscore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Points(points) => serializer.serialize_i64(*points),
            Self::Invalid => serializer.serialize_none(),
        }
    }
}

/// Subscores of a single test. Both categories are worth ten points.
///
/// A category that was never written (or written as `null`) counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(default)]
    pub pattern: Option<Subscore>,
    #[serde(default)]
    pub numbers: Option<Subscore>,
}

impl ScoreBreakdown {
    pub fn new(pattern: i64, numbers: i64) -> Self {
        Self {
            pattern: Some(Subscore::Points(pattern)),
            numbers: Some(Subscore::Points(numbers)),
        }
    }

    /// `None` when the stored subscore is not a whole number.
    pub fn pattern(&self) -> Option<i64> {
        points(self.pattern)
    }

    pub fn numbers(&self) -> Option<i64> {
        points(self.numbers)
    }

    /// Raw score: the sum of both subscores. `None` when either is invalid
    /// or the sum does not fit.
    pub fn total(&self) -> Option<i64> {
        self.pattern()?.checked_add(self.numbers()?)
    }

    /// Classifies this test against `out_of` points. Unusable subscores are
    /// passed on as NaN, which classifies as not yet taken.
    pub fn status(&self, out_of: i64) -> ProficiencyStatus {
        let as_score = |points: Option<i64>| points.map_or(f64::NAN, |p| p as f64);
        classify(
            as_score(self.total()),
            out_of as f64,
            as_score(self.pattern()),
            as_score(self.numbers()),
        )
    }
}

fn points(subscore: Option<Subscore>) -> Option<i64> {
    match subscore {
        None => Some(0),
        Some(Subscore::Points(points)) => Some(points),
        Some(Subscore::Invalid) => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_scores")]
    pub pre_score: Option<ScoreBreakdown>,
    #[serde(default, deserialize_with = "lenient_scores")]
    pub post_score: Option<ScoreBreakdown>,
}

/// A score entry that is not an object is read as two invalid subscores.
fn lenient_scores<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ScoreBreakdown>, D::Error> {
    let scores = match Value::deserialize(deserializer)? {
        Value::Null => None,
        value => Some(serde_json::from_value(value).unwrap_or(ScoreBreakdown {
            pattern: Some(Subscore::Invalid),
            numbers: Some(Subscore::Invalid),
        })),
    };
    Ok(scores)
}

impl StudentRecord {
    /// The name shown to parents: the nickname when set, the full name otherwise.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(self.nickname.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }

    pub fn pre_score(&self) -> ScoreBreakdown {
        self.pre_score.clone().unwrap_or_default()
    }

    pub fn post_score(&self) -> ScoreBreakdown {
        self.post_score.clone().unwrap_or_default()
    }

    pub fn class_id(&self) -> Option<&str> {
        non_empty(self.class_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    #[serde(default)]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRecord {
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A class announcement. The lowercase `classid`/`teacherid` keys are what
/// the teacher app writes, so they are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementRecord {
    /// Collection key; filled in from the snapshot when the body lacks it.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub classid: Option<String>,
    #[serde(default)]
    pub teacherid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// ISO-8601 timestamp, also the feed's sort key.
    #[serde(default)]
    pub date: Option<String>,
}

/// A parent profile.
///
/// Keys this crate does not know about are carried in `extra` so that the
/// whole-record overwrite of a profile update does not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household_income: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParentRecord {
    /// A profile without a name or a contact number still needs first-time setup.
    pub fn is_incomplete(&self) -> bool {
        non_empty(self.name.as_deref()).is_none() || non_empty(self.contact.as_deref()).is_none()
    }

    pub fn student_id(&self) -> Option<&str> {
        non_empty(self.student_id.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_student_decodes_camel_case_keys() {
        let student: StudentRecord = serde_json::from_value(json!({
            "name": "Maria Santos",
            "classId": "class-1",
            "preScore": { "pattern": 4, "numbers": 6 },
        }))
        .unwrap();

        assert_eq!(student.class_id(), Some("class-1"));
        assert_eq!(student.pre_score().total(), Some(10));
        assert_eq!(student.post_score(), ScoreBreakdown::default());
    }

    #[test]
    fn test_null_subscore_counts_as_zero() {
        let score: ScoreBreakdown =
            serde_json::from_value(json!({ "pattern": null, "numbers": 7 })).unwrap();
        assert_eq!(score.pattern(), Some(0));
        assert_eq!(score.total(), Some(7));
    }

    #[test]
    fn test_non_integer_subscore_keeps_student_readable() {
        let student: StudentRecord = serde_json::from_value(json!({
            "nickname": "Mia",
            "classId": "class-1",
            "preScore": { "pattern": 4.5, "numbers": 2 },
            "postScore": { "pattern": "4", "numbers": 6 },
        }))
        .unwrap();

        assert_eq!(student.class_id(), Some("class-1"));
        assert_eq!(student.pre_score().pattern, Some(Subscore::Invalid));
        assert_eq!(student.pre_score().total(), None);
        assert_eq!(student.pre_score().status(20), ProficiencyStatus::NotYetTaken);
        assert_eq!(student.post_score().status(20), ProficiencyStatus::NotYetTaken);
    }

    #[test]
    fn test_scalar_score_entry_is_invalid() {
        let student: StudentRecord =
            serde_json::from_value(json!({ "name": "Mia", "preScore": 17 })).unwrap();
        assert_eq!(student.pre_score().total(), None);
        assert_eq!(student.pre_score().status(20), ProficiencyStatus::NotYetTaken);
        assert_eq!(student.display_name(), Some("Mia"));
    }

    #[test]
    fn test_whole_float_subscore_counts() {
        let score: ScoreBreakdown =
            serde_json::from_value(json!({ "pattern": 4.0, "numbers": 6 })).unwrap();
        assert_eq!(score.total(), Some(10));
        assert_eq!(score.status(20), ProficiencyStatus::ForEnhancement);
    }

    #[test]
    fn test_overflowing_subscores_are_not_yet_taken() {
        let score = ScoreBreakdown::new(i64::MAX, 1);
        assert_eq!(score.total(), None);
        assert_eq!(score.status(20), ProficiencyStatus::NotYetTaken);
    }

    #[test]
    fn test_display_name_prefers_nickname() {
        let student = StudentRecord {
            name: Some("Maria Santos".into()),
            nickname: Some("Mia".into()),
            ..Default::default()
        };
        assert_eq!(student.display_name(), Some("Mia"));

        let student = StudentRecord {
            name: Some("Maria Santos".into()),
            nickname: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(student.display_name(), Some("Maria Santos"));
    }

    #[test]
    fn test_parent_incomplete_without_contact() {
        let parent = ParentRecord {
            name: Some("Ana Reyes".into()),
            ..Default::default()
        };
        assert!(parent.is_incomplete());

        let parent = ParentRecord {
            name: Some("Ana Reyes".into()),
            contact: Some("09171234567".into()),
            ..Default::default()
        };
        assert!(!parent.is_incomplete());
    }

    #[test]
    fn test_parent_keeps_unknown_keys() {
        let value = json!({
            "name": "Ana Reyes",
            "studentId": "stu-1",
            "createdAt": "2024-06-01",
        });
        let parent: ParentRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(parent.extra.get("createdAt"), Some(&json!("2024-06-01")));
        assert_eq!(serde_json::to_value(&parent).unwrap(), value);
    }

    #[test]
    fn test_malformed_class_id_is_rejected() {
        let result = serde_json::from_value::<StudentRecord>(json!({ "classId": 12 }));
        assert!(result.is_err());
    }
}
