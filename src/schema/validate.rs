use super::classes::is_known_class;
use super::collections::{StudentsByClass, TeacherMap};
use crate::error::{DomainError, DomainResult};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Checks every (name, value) pair and reports all blank ones in a single error.
pub fn require_fields(fields: &[(&'static str, &str)]) -> DomainResult<()> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DomainError::MissingFields(missing))
    }
}

pub fn parse_date(field: &str, value: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| DomainError::invalid(format!("{field} must be a YYYY-MM-DD date, got '{value}'")))
}

/// Like `parse_date` but blank values pass.
pub fn parse_optional_date(field: &str, value: Option<&str>) -> DomainResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_date(field, v).map(Some),
        None => Ok(None),
    }
}

pub fn check_class(name: &str) -> DomainResult<()> {
    if is_known_class(name) {
        Ok(())
    } else {
        Err(DomainError::invalid(format!("unknown class '{name}'")))
    }
}

/// Returns the inclusive number of days between the two dates.
pub fn check_date_range(start: &str, end: &str) -> DomainResult<i64> {
    let s = parse_date("start_date", start)?;
    let e = parse_date("end_date", end)?;
    if e < s {
        return Err(DomainError::invalid("end_date is before start_date"));
    }
    Ok((e - s).num_days() + 1)
}

/// Admission numbers are unique across every class partition. `except_id` skips the student being
/// updated.
pub fn check_unique_admission_no(
    students: &StudentsByClass,
    admission_no: &str,
    except_id: Option<&str>,
) -> DomainResult<()> {
    let taken = students
        .values()
        .flatten()
        .any(|s| s.admission_no == admission_no && Some(s.id.as_str()) != except_id);
    if taken {
        return Err(DomainError::Duplicate {
            what: "admission number",
            value: admission_no.to_string(),
        });
    }
    Ok(())
}

pub fn check_unique_username(
    teachers: &TeacherMap,
    username: &str,
    except_id: Option<&str>,
) -> DomainResult<()> {
    let taken = teachers
        .values()
        .any(|t| t.username == username && Some(t.id.as_str()) != except_id);
    if taken {
        return Err(DomainError::Duplicate {
            what: "username",
            value: username.to_string(),
        });
    }
    Ok(())
}
