use super::trimmed;
use crate::error::{DomainError, DomainResult};
use crate::partition::{delete_where, prune_empty, upsert_by};
use crate::schema::academics::WEEKDAYS;
use crate::schema::collections::{Teachers, Timetable};
use crate::schema::validate::{check_class, require_fields};
use crate::schema::TimetableSlot;
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlotInput {
    pub day: String,
    pub period: u32,
    pub subject: String,
    pub class_name: String,
}

/// Sets the teacher's slot for (day, period). The same (day, period, class) may belong to only one
/// teacher.
pub fn set(store: &mut DocumentStore, teacher_id: &str, input: SlotInput) -> DomainResult<TimetableSlot> {
    require_fields(&[
        ("day", &input.day),
        ("subject", &input.subject),
        ("class_name", &input.class_name),
    ])?;
    if !WEEKDAYS.contains(&input.day.as_str()) {
        return Err(DomainError::invalid(format!("unknown day '{}'", input.day)));
    }
    if input.period == 0 {
        return Err(DomainError::invalid("period starts at 1"));
    }
    check_class(&input.class_name)?;

    let slot = TimetableSlot {
        day: input.day,
        period: input.period,
        subject: trimmed(&input.subject),
        class_name: input.class_name,
    };
    let mut all = store.get::<Timetable>()?;
    let clash = all.iter().any(|(owner, slots)| {
        owner != teacher_id
            && slots
                .iter()
                .any(|s| s.day == slot.day && s.period == slot.period && s.class_name == slot.class_name)
    });
    if clash {
        return Err(DomainError::Duplicate {
            what: "timetable slot",
            value: format!("{} period {} for {}", slot.day, slot.period, slot.class_name),
        });
    }
    upsert_by(
        all.entry(teacher_id.to_string()).or_default(),
        |s| (s.day.clone(), s.period),
        slot.clone(),
    );
    store.put::<Timetable>(all)?;
    Ok(slot)
}

pub fn clear(store: &mut DocumentStore, teacher_id: &str, day: &str, period: u32) -> DomainResult<()> {
    let mut all = store.get::<Timetable>()?;
    let removed = all
        .get_mut(teacher_id)
        .map_or(0, |slots| delete_where(slots, |s| s.day == day && s.period == period));
    if removed == 0 {
        return Err(DomainError::not_found("timetable slot", format!("{day} period {period}")));
    }
    prune_empty(&mut all);
    store.put::<Timetable>(all)?;
    Ok(())
}

pub fn for_teacher(store: &mut DocumentStore, teacher_id: &str) -> DomainResult<Vec<TimetableSlot>> {
    let mut slots = store.get::<Timetable>()?.remove(teacher_id).unwrap_or_default();
    slots.sort_by_key(TimetableSlot::order_key);
    Ok(slots)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSlot {
    #[serde(flatten)]
    pub slot: TimetableSlot,
    pub teacher_id: String,
    pub teacher_name: String,
}

/// The week for one class, assembled from every teacher's timetable.
pub fn for_class(store: &mut DocumentStore, class_name: &str) -> DomainResult<Vec<ClassSlot>> {
    check_class(class_name)?;
    let teachers = store.get::<Teachers>()?;
    let mut out: Vec<ClassSlot> = store
        .get::<Timetable>()?
        .into_iter()
        .flat_map(|(teacher_id, slots)| {
            let teacher_name = teachers.get(&teacher_id).map(|t| t.name.clone()).unwrap_or_default();
            slots
                .into_iter()
                .filter(|s| s.class_name == class_name)
                .map(move |slot| ClassSlot {
                    slot,
                    teacher_id: teacher_id.clone(),
                    teacher_name: teacher_name.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect();
    out.sort_by_key(|c| c.slot.order_key());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::testing::workspace;

    fn slot(day: &str, period: u32, class_name: &str) -> SlotInput {
        SlotInput {
            day: day.into(),
            period,
            subject: "English".into(),
            class_name: class_name.into(),
        }
    }

    #[test]
    fn slots_sort_monday_first_then_period() {
        let (ws, mut store) = workspace("academicd-timetable-sort");
        set(&mut store, "t1", slot("Wednesday", 1, "Grade 6A")).unwrap();
        set(&mut store, "t1", slot("Monday", 3, "Grade 6A")).unwrap();
        set(&mut store, "t1", slot("Monday", 2, "Grade 6B")).unwrap();
        // Same (day, period) replaces the teacher's earlier slot.
        set(&mut store, "t1", slot("Monday", 2, "Grade 6A")).unwrap();
        let week = for_teacher(&mut store, "t1").unwrap();
        let keys: Vec<_> = week.iter().map(|s| (s.day.as_str(), s.period)).collect();
        assert_eq!(keys, vec![("Monday", 2), ("Monday", 3), ("Wednesday", 1)]);
        assert!(for_class(&mut store, "Grade 6B").unwrap().is_empty());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn a_class_period_belongs_to_one_teacher() {
        let (ws, mut store) = workspace("academicd-timetable-clash");
        set(&mut store, "t1", slot("Friday", 4, "Grade 9C")).unwrap();
        let err = set(&mut store, "t2", slot("Friday", 4, "Grade 9C")).unwrap_err();
        assert_eq!(err.code(), "duplicate_key");
        set(&mut store, "t2", slot("Friday", 4, "Grade 9D")).unwrap();

        clear(&mut store, "t1", "Friday", 4).unwrap();
        assert!(!store.get::<Timetable>().unwrap().contains_key("t1"));
        assert_eq!(clear(&mut store, "t1", "Friday", 4).unwrap_err().code(), "not_found");
        assert!(set(&mut store, "t1", slot("Funday", 1, "Grade 9C")).is_err());
        let _ = std::fs::remove_dir_all(ws);
    }
}
