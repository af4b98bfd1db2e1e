use super::{new_id, non_blank, now_time, today, trimmed};
use crate::error::{DomainError, DomainResult};
use crate::partition::{delete_where, find_in_partitions, prune_empty, upsert_by, Upsert};
use crate::schema::collections::{Assignments, Students};
use crate::schema::validate::{check_class, parse_date, require_fields};
use crate::schema::{Assignment, Student, Submission, SubmissionStatus};
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignmentInput {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub assigned_class: String,
    pub max_score: u32,
    #[serde(alias = "type")]
    pub kind: String,
}

pub fn create(store: &mut DocumentStore, teacher_id: &str, input: AssignmentInput) -> DomainResult<Assignment> {
    require_fields(&[
        ("title", &input.title),
        ("due_date", &input.due_date),
        ("assigned_class", &input.assigned_class),
    ])?;
    parse_date("due_date", &input.due_date)?;
    check_class(input.assigned_class.trim())?;
    if input.max_score == 0 {
        return Err(DomainError::invalid("max_score must be greater than zero"));
    }

    let assignment = Assignment {
        id: new_id(),
        title: trimmed(&input.title),
        description: trimmed(&input.description),
        due_date: trimmed(&input.due_date),
        assigned_class: trimmed(&input.assigned_class),
        max_score: input.max_score,
        kind: non_blank(Some(input.kind.as_str())).unwrap_or_else(|| "Homework".to_string()),
        created_date: today(),
        submissions: Vec::new(),
    };
    let mut all = store.get::<Assignments>()?;
    all.entry(teacher_id.to_string())
        .or_default()
        .push(assignment.clone());
    store.put::<Assignments>(all)?;
    info!(title = %assignment.title, class = %assignment.assigned_class, "assignment created");
    Ok(assignment)
}

/// A teacher's assignments, soonest due first.
pub fn list(store: &mut DocumentStore, teacher_id: &str) -> DomainResult<Vec<Assignment>> {
    let mut out = store.get::<Assignments>()?.remove(teacher_id).unwrap_or_default();
    out.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    Ok(out)
}

pub fn delete(store: &mut DocumentStore, teacher_id: &str, assignment_id: &str) -> DomainResult<()> {
    let mut all = store.get::<Assignments>()?;
    let removed = all
        .get_mut(teacher_id)
        .map_or(0, |list| delete_where(list, |a| a.id == assignment_id));
    if removed == 0 {
        return Err(DomainError::not_found("assignment", assignment_id));
    }
    prune_empty(&mut all);
    store.put::<Assignments>(all)?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignment {
    pub teacher_id: String,
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub max_score: u32,
    pub kind: String,
    pub submission: Option<Submission>,
}

fn find_student(store: &mut DocumentStore, student_id: &str) -> DomainResult<Student> {
    store
        .get::<Students>()?
        .into_values()
        .flatten()
        .find(|s| s.id == student_id)
        .ok_or_else(|| DomainError::not_found("student", student_id))
}

/// Assignments for the student's class across all teachers, each with the student's own submission.
pub fn for_student(store: &mut DocumentStore, student_id: &str) -> DomainResult<Vec<StudentAssignment>> {
    let student = find_student(store, student_id)?;
    let all = store.get::<Assignments>()?;
    let mut out: Vec<StudentAssignment> = all
        .into_iter()
        .flat_map(|(teacher_id, list)| {
            list.into_iter()
                .map(move |a| (teacher_id.clone(), a))
        })
        .filter(|(_, a)| a.assigned_class == student.class_name)
        .map(|(teacher_id, a)| StudentAssignment {
            submission: a.submissions.iter().find(|s| s.student_id == student.id).cloned(),
            teacher_id,
            id: a.id,
            title: a.title,
            description: a.description,
            due_date: a.due_date,
            max_score: a.max_score,
            kind: a.kind,
        })
        .collect();
    out.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    Ok(out)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionInput {
    pub text: String,
    pub file_path: Option<String>,
}

/// Stores or replaces the student's submission. Graded work is final.
pub fn submit(
    store: &mut DocumentStore,
    student_id: &str,
    assignment_id: &str,
    input: SubmissionInput,
) -> DomainResult<(Submission, Upsert)> {
    let text = trimmed(&input.text);
    let file_path = non_blank(input.file_path.as_deref());
    if text.is_empty() && file_path.is_none() {
        return Err(DomainError::invalid("submission needs text or a file"));
    }
    let student = find_student(store, student_id)?;

    let mut all = store.get::<Assignments>()?;
    let (owner, idx) = find_in_partitions(&all, |a| a.id == assignment_id)
        .ok_or_else(|| DomainError::not_found("assignment", assignment_id))?;
    let Some(assignment) = all.get_mut(&owner).and_then(|l| l.get_mut(idx)) else {
        return Err(DomainError::not_found("assignment", assignment_id));
    };
    if assignment.assigned_class != student.class_name {
        return Err(DomainError::invalid(format!(
            "assignment is for {}, student is in {}",
            assignment.assigned_class, student.class_name
        )));
    }
    let previous = assignment
        .submissions
        .iter()
        .find(|s| s.student_id == student_id);
    if previous.is_some_and(|s| s.status == SubmissionStatus::Graded) {
        return Err(DomainError::InvalidTransition {
            from: "Graded".to_string(),
            to: "Submitted".to_string(),
        });
    }

    let submission = Submission {
        id: previous.map(|s| s.id.clone()).unwrap_or_else(new_id),
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        submission_date: today(),
        submission_time: now_time(),
        submission_text: text,
        submission_file_path: file_path,
        status: SubmissionStatus::Submitted,
        grade: None,
        feedback: String::new(),
    };
    let outcome = upsert_by(
        &mut assignment.submissions,
        |s| s.student_id.clone(),
        submission.clone(),
    );
    store.put::<Assignments>(all)?;
    Ok((submission, outcome))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradeInput {
    pub grade: Option<f64>,
    pub feedback: String,
    /// Outcome to record; `Graded` when absent.
    pub status: Option<SubmissionStatus>,
}

/// Grades exactly one submission in place.
pub fn grade(
    store: &mut DocumentStore,
    teacher_id: &str,
    assignment_id: &str,
    student_id: &str,
    input: GradeInput,
) -> DomainResult<Submission> {
    let mut all = store.get::<Assignments>()?;
    let assignment = all
        .get_mut(teacher_id)
        .and_then(|l| l.iter_mut().find(|a| a.id == assignment_id))
        .ok_or_else(|| DomainError::not_found("assignment", assignment_id))?;
    let Some(score) = input.grade else {
        return Err(DomainError::MissingFields(vec!["grade"]));
    };
    if !(0.0..=f64::from(assignment.max_score)).contains(&score) {
        return Err(DomainError::invalid(format!(
            "grade must be between 0 and {}",
            assignment.max_score
        )));
    }
    let submission = assignment
        .submissions
        .iter_mut()
        .find(|s| s.student_id == student_id)
        .ok_or_else(|| DomainError::not_found("submission", student_id))?;
    submission.grade = Some(score);
    submission.feedback = trimmed(&input.feedback);
    submission.status = input.status.unwrap_or(SubmissionStatus::Graded);
    let graded = submission.clone();
    store.put::<Assignments>(all)?;
    Ok(graded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::students::{self, tests::input};
    use crate::records::testing::workspace;

    fn homework(class_name: &str) -> AssignmentInput {
        AssignmentInput {
            title: "Fractions".into(),
            description: "Worksheet 3".into(),
            due_date: "2026-10-30".into(),
            assigned_class: class_name.into(),
            max_score: 10,
            kind: "Homework".into(),
        }
    }

    fn answer(text: &str) -> SubmissionInput {
        SubmissionInput {
            text: text.into(),
            file_path: None,
        }
    }

    #[test]
    fn grading_updates_exactly_one_submission() {
        let (ws, mut store) = workspace("academicd-assignments-grade");
        let s7 = students::create(&mut store, input("S7", "Grade 5B")).unwrap();
        let s8 = students::create(&mut store, input("S8", "Grade 5B")).unwrap();
        let a1 = create(&mut store, "t1", homework("Grade 5B")).unwrap();
        submit(&mut store, &s7.id, &a1.id, answer("mine")).unwrap();
        submit(&mut store, &s8.id, &a1.id, answer("theirs")).unwrap();

        let graded = grade(
            &mut store,
            "t1",
            &a1.id,
            &s7.id,
            GradeInput {
                grade: Some(8.5),
                feedback: "Good".into(),
                status: None,
            },
        )
        .unwrap();
        assert_eq!(graded.status, SubmissionStatus::Graded);

        let stored = list(&mut store, "t1").unwrap().remove(0);
        assert_eq!(stored.submissions.len(), 2);
        let other = stored.submissions.iter().find(|s| s.student_id == s8.id).unwrap();
        assert_eq!(other.status, SubmissionStatus::Submitted);
        assert_eq!(other.grade, None);
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn one_submission_per_student_and_graded_is_final() {
        let (ws, mut store) = workspace("academicd-assignments-submit");
        let s = students::create(&mut store, input("S1", "Grade 5B")).unwrap();
        let a = create(&mut store, "t1", homework("Grade 5B")).unwrap();
        assert_eq!(submit(&mut store, &s.id, &a.id, answer("v1")).unwrap().1, Upsert::Inserted);
        assert_eq!(submit(&mut store, &s.id, &a.id, answer("v2")).unwrap().1, Upsert::Replaced);
        assert_eq!(list(&mut store, "t1").unwrap()[0].submissions.len(), 1);

        grade(&mut store, "t1", &a.id, &s.id, GradeInput { grade: Some(5.0), ..Default::default() }).unwrap();
        let err = submit(&mut store, &s.id, &a.id, answer("v3")).unwrap_err();
        assert_eq!(err.code(), "invalid_transition");
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn submission_class_must_match_and_grade_is_bounded() {
        let (ws, mut store) = workspace("academicd-assignments-checks");
        let s = students::create(&mut store, input("S2", "Grade 4A")).unwrap();
        let a = create(&mut store, "t1", homework("Grade 5B")).unwrap();
        assert_eq!(submit(&mut store, &s.id, &a.id, answer("x")).unwrap_err().code(), "validation_failed");
        assert!(submit(&mut store, &s.id, &a.id, answer("  ")).is_err());

        let s2 = students::create(&mut store, input("S3", "Grade 5B")).unwrap();
        submit(&mut store, &s2.id, &a.id, answer("x")).unwrap();
        let too_high = GradeInput { grade: Some(11.0), ..Default::default() };
        assert!(grade(&mut store, "t1", &a.id, &s2.id, too_high).is_err());
        assert_eq!(for_student(&mut store, &s2.id).unwrap().len(), 1);
        assert!(for_student(&mut store, &s.id).unwrap().is_empty());

        let zero = AssignmentInput { max_score: 0, ..homework("Grade 5B") };
        assert!(create(&mut store, "t1", zero).is_err());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn grading_needs_a_score_and_honours_the_chosen_status() {
        let (ws, mut store) = workspace("academicd-assignments-status");
        let s = students::create(&mut store, input("S9", "Grade 5B")).unwrap();
        let a = create(&mut store, "t1", homework("Grade 5B")).unwrap();
        submit(&mut store, &s.id, &a.id, answer("draft")).unwrap();

        let no_score: GradeInput = serde_json::from_value(serde_json::json!({ "feedback": "Good" })).unwrap();
        match grade(&mut store, "t1", &a.id, &s.id, no_score).unwrap_err() {
            DomainError::MissingFields(f) => assert_eq!(f, vec!["grade"]),
            other => panic!("unexpected error: {other:?}"),
        }
        let untouched = &list(&mut store, "t1").unwrap()[0].submissions[0];
        assert_eq!(untouched.status, SubmissionStatus::Submitted);
        assert_eq!(untouched.grade, None);

        let revise: GradeInput =
            serde_json::from_value(serde_json::json!({ "grade": 4, "status": "Needs Revision" })).unwrap();
        let sent_back = grade(&mut store, "t1", &a.id, &s.id, revise).unwrap();
        assert_eq!(sent_back.status, SubmissionStatus::NeedsRevision);
        assert_eq!(sent_back.grade, Some(4.0));

        let unknown = serde_json::from_value::<GradeInput>(serde_json::json!({ "grade": 4, "status": "Done" }));
        assert!(unknown.is_err());
        let _ = std::fs::remove_dir_all(ws);
    }
}
