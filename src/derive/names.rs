/// Label shown when a class has no resolvable teacher.
pub const DEFAULT_TEACHER_LABEL: &str = "Teacher";
/// Label shown when the linked student has no usable name.
pub const DEFAULT_PARENT_LABEL: &str = "Parent";

/// Display name of a teacher: the stored name trimmed, or `"Teacher"` when
/// there is none. Case is left alone.
pub fn format_teacher_name(raw: Option<&str>) -> String {
    match raw {
        Some(name) if !name.is_empty() => name.trim().to_string(),
        _ => DEFAULT_TEACHER_LABEL.to_string(),
    }
}

/// Possessive greeting for a parent built from their child's name, e.g.
/// `"Mia's Parent"`.
///
/// Only the first word of the name is used. A word ending in a lowercase
/// `s` takes a bare apostrophe (`"Chris' Parent"`), regardless of whether
/// the name is really a plural.
pub fn format_parent_label(student_name: Option<&str>) -> String {
    let Some(first) = student_name.and_then(|name| name.split_whitespace().next()) else {
        return DEFAULT_PARENT_LABEL.to_string();
    };

    if first.ends_with('s') {
        format!("{first}' Parent")
    } else {
        format!("{first}'s Parent")
    }
}

/// Last word of a parent's full name, or an empty string.
pub fn parent_last_name(full_name: Option<&str>) -> String {
    full_name
        .and_then(|name| name.split_whitespace().last())
        .unwrap_or_default()
        .to_string()
}
