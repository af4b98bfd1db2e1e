use crate::error::DomainResult;
use crate::schema::collections::{Classes, Fees, LeaveApplications, Orders, Students, Teachers};
use crate::store::DocumentStore;
use crate::workflow::ApprovalStatus;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub teachers: usize,
    pub admins: usize,
    pub students: usize,
    pub classes_with_students: usize,
    pub classes_with_records: usize,
    pub pending_leaves: usize,
    pub pending_orders: usize,
    pub total_fees_due: f64,
    pub total_fees_paid: f64,
}

pub fn overview(store: &mut DocumentStore) -> DomainResult<Overview> {
    let teachers = store.get::<Teachers>()?;
    let students = store.get::<Students>()?;
    let classes = store.get::<Classes>()?;
    let leave = store.get::<LeaveApplications>()?;
    let orders = store.get::<Orders>()?;
    let fees = store.get::<Fees>()?;

    Ok(Overview {
        teachers: teachers.len(),
        admins: teachers.values().filter(|t| t.is_admin).count(),
        students: students.values().map(Vec::len).sum(),
        classes_with_students: students.values().filter(|l| !l.is_empty()).count(),
        classes_with_records: classes.len(),
        pending_leaves: leave
            .values()
            .flatten()
            .filter(|l| l.status == ApprovalStatus::Pending)
            .count(),
        pending_orders: orders
            .values()
            .flatten()
            .filter(|o| o.status == ApprovalStatus::Pending)
            .count(),
        total_fees_due: fees.values().map(|f| f.amount_due).sum(),
        total_fees_paid: fees.values().map(|f| f.amount_paid).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::students::{self, tests::input};
    use crate::records::testing::workspace;
    use crate::records::{fees, orders, teachers};
    use std::collections::BTreeMap;

    #[test]
    fn overview_counts_pending_work_and_fees() {
        let (ws, mut store) = workspace("academicd-reports");
        let s = students::create(&mut store, input("R1", "Grade 9A")).unwrap();
        fees::set_due(&mut store, &s.id, 500.0).unwrap();
        let t = teachers::list(&mut store).unwrap().remove(0);
        orders::place(&mut store, &t.id, BTreeMap::from([("Pencil Box".to_string(), 1)])).unwrap();

        let o = overview(&mut store).unwrap();
        assert_eq!(o.teachers, 1);
        assert_eq!(o.admins, 1);
        assert_eq!(o.students, 1);
        assert_eq!(o.classes_with_students, 1);
        assert_eq!(o.pending_orders, 1);
        assert_eq!(o.pending_leaves, 0);
        assert_eq!(o.total_fees_due, 500.0);
        let _ = std::fs::remove_dir_all(ws);
    }
}
