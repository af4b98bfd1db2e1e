use super::{new_id, non_blank, today};
use crate::error::{DomainError, DomainResult};
use crate::schema::collections::{Fees, Students};
use crate::schema::validate::parse_optional_date;
use crate::schema::{FeeRecord, Payment, Student};
use crate::store::DocumentStore;
use serde::Deserialize;
use tracing::info;

fn find_student(store: &mut DocumentStore, student_id: &str) -> DomainResult<Student> {
    store
        .get::<Students>()?
        .into_values()
        .flatten()
        .find(|s| s.id == student_id)
        .ok_or_else(|| DomainError::not_found("student", student_id))
}

fn blank_record(student: &Student) -> FeeRecord {
    FeeRecord::for_student(&student.id, &student.admission_no, &student.name, &student.class_name)
}

/// The student's fee record; a zeroed record when none has been saved yet.
pub fn get(store: &mut DocumentStore, student_id: &str) -> DomainResult<FeeRecord> {
    let student = find_student(store, student_id)?;
    Ok(store
        .get::<Fees>()?
        .remove(student_id)
        .unwrap_or_else(|| blank_record(&student)))
}

/// One record per enrolled student, ordered by class then name.
pub fn list(store: &mut DocumentStore) -> DomainResult<Vec<FeeRecord>> {
    let mut fees = store.get::<Fees>()?;
    let mut out: Vec<FeeRecord> = store
        .get::<Students>()?
        .into_values()
        .flatten()
        .map(|s| fees.remove(&s.id).unwrap_or_else(|| blank_record(&s)))
        .collect();
    out.sort_by(|a, b| {
        a.class_name
            .cmp(&b.class_name)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });
    Ok(out)
}

pub fn set_due(store: &mut DocumentStore, student_id: &str, amount_due: f64) -> DomainResult<FeeRecord> {
    if !amount_due.is_finite() || amount_due < 0.0 {
        return Err(DomainError::invalid("amount_due must be zero or more"));
    }
    let student = find_student(store, student_id)?;
    let mut fees = store.get::<Fees>()?;
    let record = fees
        .entry(student_id.to_string())
        .or_insert_with(|| blank_record(&student));
    record.amount_due = amount_due;
    // Keep the denormalized student fields current.
    record.student_admission_no = student.admission_no.clone();
    record.student_name = student.name.clone();
    record.class_name = student.class_name.clone();
    let updated = record.clone();
    store.put::<Fees>(fees)?;
    Ok(updated)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentInput {
    pub amount: f64,
    pub method: String,
    pub receipt: Option<String>,
    pub date: Option<String>,
}

fn receipt_number() -> String {
    let suffix: String = new_id().chars().filter(|c| *c != '-').take(8).collect();
    format!("RCPT-{}-{}", today().replace('-', ""), suffix.to_uppercase())
}

/// Appends a payment. With `cap_to_outstanding` the payment may not exceed the balance.
pub fn record_payment(
    store: &mut DocumentStore,
    student_id: &str,
    input: PaymentInput,
    cap_to_outstanding: bool,
) -> DomainResult<FeeRecord> {
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(DomainError::invalid("payment amount must be positive"));
    }
    parse_optional_date("date", input.date.as_deref())?;
    let student = find_student(store, student_id)?;
    let mut fees = store.get::<Fees>()?;
    let record = fees
        .entry(student_id.to_string())
        .or_insert_with(|| blank_record(&student));
    if cap_to_outstanding && input.amount > record.outstanding() {
        return Err(DomainError::invalid(format!(
            "payment of {:.2} exceeds the outstanding balance of {:.2}",
            input.amount,
            record.outstanding()
        )));
    }

    let date = non_blank(input.date.as_deref()).unwrap_or_else(today);
    let payment = Payment {
        date: date.clone(),
        amount: input.amount,
        method: non_blank(Some(input.method.as_str())).unwrap_or_else(|| "Cash".to_string()),
        receipt: non_blank(input.receipt.as_deref()).unwrap_or_else(receipt_number),
    };
    record.amount_paid += payment.amount;
    record.last_payment_date = Some(date);
    record.payment_history.push(payment);
    let updated = record.clone();
    store.put::<Fees>(fees)?;
    info!(student = %updated.student_admission_no, paid = updated.amount_paid, "fee payment recorded");
    Ok(updated)
}
