use std::collections::BTreeMap;

use crate::records::AnnouncementRecord;

/// Announcements a parent may see: those posted to `class_id`, newest first.
///
/// Dates are compared as strings, which orders same-format ISO-8601
/// timestamps chronologically. Entries without a date sort last. The
/// collection key becomes the id of any entry that does not carry one.
pub fn visible_announcements(
    all: BTreeMap<String, AnnouncementRecord>,
    class_id: &str,
) -> Vec<AnnouncementRecord> {
    let mut visible: Vec<AnnouncementRecord> = all
        .into_iter()
        .filter(|(_, a)| a.classid.as_deref() == Some(class_id))
        .map(|(key, mut a)| {
            if a.id.is_empty() {
                a.id = key;
            }
            a
        })
        .collect();

    visible.sort_by(|a, b| {
        let a = a.date.as_deref().unwrap_or("");
        let b = b.date.as_deref().unwrap_or("");
        b.cmp(a)
    });
    visible
}
