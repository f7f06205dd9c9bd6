//! The composed state the dashboard screen renders.

use serde::Serialize;

use super::setup::SetupPrompt;
use super::teachers::TeacherIndex;
use crate::derive::datetime::format_date_time;
use crate::derive::names::{DEFAULT_PARENT_LABEL, DEFAULT_TEACHER_LABEL};
use crate::derive::status::{ProficiencyStatus, score_percent};
use crate::records::{AnnouncementRecord, ScoreBreakdown};

/// Points available on each test: two subscores of ten.
pub const TEST_TOTAL: i64 = 20;
pub const WEEK_COUNT: u8 = 8;
pub const QUARTER_LABEL: &str = "Quarter 1";
pub const NO_ANNOUNCEMENTS: &str =
    "No announcements yet. Check back later for updates from your child's teacher.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub parent_id: String,
    /// False until the parent record has been found.
    pub loaded: bool,
    pub parent_label: String,
    pub parent_last_name: String,
    pub teacher_label: String,
    /// Present while the profile-setup form should be shown.
    pub setup: Option<SetupPrompt>,
    pub announcements: Vec<AnnouncementItem>,
    pub pretest: TestProgress,
    pub post_test: TestProgress,
    pub quarter_label: &'static str,
    pub week_progress: Vec<WeekProgress>,
}

impl DashboardView {
    /// View shown while nothing is known about the parent.
    pub fn empty(parent_id: &str) -> Self {
        Self {
            parent_id: parent_id.to_string(),
            loaded: false,
            parent_label: DEFAULT_PARENT_LABEL.to_string(),
            parent_last_name: String::new(),
            teacher_label: DEFAULT_TEACHER_LABEL.to_string(),
            setup: None,
            announcements: Vec::new(),
            pretest: TestProgress::from_scores(&ScoreBreakdown::default()),
            post_test: TestProgress::from_scores(&ScoreBreakdown::default()),
            quarter_label: QUARTER_LABEL,
            week_progress: WeekProgress::placeholder(),
        }
    }

    pub fn setup_required(&self) -> bool {
        self.setup.is_some()
    }

    pub fn latest_announcement(&self) -> Option<&AnnouncementItem> {
        self.announcements.first()
    }

    /// Body of the announcement card. Falls back to [`NO_ANNOUNCEMENTS`]
    /// when the feed is empty or the latest message is blank.
    pub fn announcement_preview(&self) -> &str {
        self.latest_announcement()
            .map(|a| a.message.as_str())
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(NO_ANNOUNCEMENTS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnouncementItem {
    pub id: String,
    pub title: String,
    pub message: String,
    pub teacher_label: String,
    /// Stored ISO-8601 value.
    pub date: String,
    pub display_date: String,
}

impl AnnouncementItem {
    pub fn from_record(record: AnnouncementRecord, teachers: &TeacherIndex) -> Self {
        let date = record.date.unwrap_or_default();
        Self {
            id: record.id,
            title: record
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Announcement".to_string()),
            message: record.message.unwrap_or_default(),
            teacher_label: teachers.display_name(record.teacherid.as_deref()),
            display_date: format_date_time(&date),
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestProgress {
    pub score: i64,
    pub total: i64,
    pub percent: i64,
    pub status: ProficiencyStatus,
    pub color: &'static str,
}

impl TestProgress {
    pub fn from_scores(scores: &ScoreBreakdown) -> Self {
        let score = scores.total().unwrap_or(0);
        let status = scores.status(TEST_TOTAL);
        Self {
            score,
            total: TEST_TOTAL,
            percent: score_percent(score, TEST_TOTAL),
            status,
            color: status.color(),
        }
    }
}

/// Home-exercise progress for one week, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekProgress {
    pub week: u8,
    pub progress: u8,
}

impl WeekProgress {
    /// Home exercises do not report progress yet, so every week is at zero.
    pub fn placeholder() -> Vec<Self> {
        (1..=WEEK_COUNT)
            .map(|week| Self { week, progress: 0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::TeacherRecord;
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_view() {
        let view = DashboardView::empty("p1");
        assert!(!view.loaded);
        assert!(!view.setup_required());
        assert_eq!(view.parent_label, "Parent");
        assert_eq!(view.teacher_label, "Teacher");
        assert_eq!(view.pretest.status, ProficiencyStatus::NotYetTaken);
        assert_eq!(view.announcement_preview(), NO_ANNOUNCEMENTS);
    }

    #[test]
    fn test_blank_latest_message_shows_fallback() {
        let mut view = DashboardView::empty("p1");
        view.announcements.push(AnnouncementItem {
            id: "a1".into(),
            title: "Reminder".into(),
            message: "  ".into(),
            teacher_label: "Teacher".into(),
            date: "2024-03-05".into(),
            display_date: String::new(),
        });

        assert_eq!(view.latest_announcement().map(|a| a.title.as_str()), Some("Reminder"));
        assert_eq!(view.announcement_preview(), NO_ANNOUNCEMENTS);
    }

    #[test]
    fn test_week_placeholder() {
        let weeks = WeekProgress::placeholder();
        assert_eq!(weeks.len(), 8);
        assert_eq!(weeks[0], WeekProgress { week: 1, progress: 0 });
        assert_eq!(weeks[7].week, 8);
        assert!(weeks.iter().all(|w| w.progress == 0));
    }

    #[test]
    fn test_progress_from_scores() {
        let progress = TestProgress::from_scores(&ScoreBreakdown::new(9, 8));
        assert_eq!(progress.score, 17);
        assert_eq!(progress.total, 20);
        assert_eq!(progress.percent, 85);
        assert_eq!(progress.status, ProficiencyStatus::HighlyProficient);
        assert_eq!(progress.color, "#27ae60");
    }

    #[test]
    fn test_progress_from_unusable_scores() {
        let progress = TestProgress::from_scores(&ScoreBreakdown::new(i64::MAX, 1));
        assert_eq!(progress.score, 0);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.status, ProficiencyStatus::NotYetTaken);
    }

    #[test]
    fn test_announcement_item_defaults() {
        let mut teachers = BTreeMap::new();
        teachers.insert(
            "k".to_string(),
            TeacherRecord {
                teacher_id: Some("T1".into()),
                name: Some("Ms. Cruz".into()),
            },
        );
        let index = TeacherIndex::from_collection(teachers);

        let item = AnnouncementItem::from_record(
            AnnouncementRecord {
                id: "a1".into(),
                teacherid: Some("T1".into()),
                message: Some("Bring crayons".into()),
                ..Default::default()
            },
            &index,
        );

        assert_eq!(item.title, "Announcement");
        assert_eq!(item.teacher_label, "Ms. Cruz");
        assert_eq!(item.date, "");
        assert_eq!(item.display_date, "");
    }
}
