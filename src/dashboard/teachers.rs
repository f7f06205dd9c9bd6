use std::collections::{BTreeMap, HashMap};

use crate::derive::names::format_teacher_name;
use crate::records::TeacherRecord;

/// Teachers keyed by their `teacherId` field.
///
/// Class and announcement records refer to teachers by that field rather
/// than by collection key; a record without the field is indexed under its
/// key instead.
#[derive(Debug, Clone, Default)]
pub struct TeacherIndex {
    by_id: HashMap<String, TeacherRecord>,
}

impl TeacherIndex {
    pub fn from_collection(teachers: BTreeMap<String, TeacherRecord>) -> Self {
        let by_id = teachers
            .into_iter()
            .map(|(key, teacher)| {
                let id = teacher
                    .teacher_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .unwrap_or(key);
                (id, teacher)
            })
            .collect();
        Self { by_id }
    }

    pub fn get(&self, teacher_id: &str) -> Option<&TeacherRecord> {
        self.by_id.get(teacher_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Display name for `teacher_id`, `"Teacher"` when it does not resolve.
    pub fn display_name(&self, teacher_id: Option<&str>) -> String {
        let name = teacher_id
            .and_then(|id| self.get(id))
            .and_then(|teacher| teacher.name.as_deref());
        format_teacher_name(name)
    }
}
