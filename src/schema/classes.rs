pub const PRE_PRIMARY_LEVELS: [&str; 3] = ["Nursery", "LKG", "UKG"];
pub const CLASS_SECTIONS: [&str; 4] = ["A", "B", "C", "D"];
pub const ALL_CLASSES_TAG: &str = "All Classes";

/// Grade levels in display order: the pre-primary levels, then "Grade 1" to "Grade 10".
pub fn grade_levels() -> Vec<String> {
    PRE_PRIMARY_LEVELS
        .iter()
        .map(|s| s.to_string())
        .chain((1..=10).map(|i| format!("Grade {i}")))
        .collect()
}

/// Every class name the school can have. Pre-primary levels have no sections.
pub fn full_class_list() -> Vec<String> {
    let mut out = Vec::new();
    for level in grade_levels() {
        if PRE_PRIMARY_LEVELS.contains(&level.as_str()) {
            out.push(level);
        } else {
            for section in CLASS_SECTIONS {
                out.push(format!("{level}{section}"));
            }
        }
    }
    out
}

pub fn is_known_class(name: &str) -> bool {
    full_class_list().iter().any(|c| c == name)
}

/// Splits a class name into (level index, section index). Pre-primary classes have section 0.
pub fn class_position(name: &str) -> Option<(usize, usize)> {
    let levels = grade_levels();
    if let Some(i) = levels.iter().position(|l| l == name) {
        if PRE_PRIMARY_LEVELS.contains(&name) {
            return Some((i, 0));
        }
    }
    let mut chars = name.chars();
    let section = chars.next_back()?.to_string();
    let level = chars.as_str();
    let li = levels.iter().position(|l| l == level)?;
    if PRE_PRIMARY_LEVELS.contains(&level) {
        return None;
    }
    let si = CLASS_SECTIONS.iter().position(|s| *s == section)?;
    Some((li, si))
}
