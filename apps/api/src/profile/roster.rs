//! Reconciles extracted names and grades with a class roster.
//!
//! Matching is by name, ignoring case and runs of whitespace. A record whose
//! name matches no student, or more than one, is reported back rather than
//! guessed at.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extraction::parser::ExtractedGradeRecord;
use crate::models::class::ClassGroup;
use crate::models::student::Student;
use crate::profile::reconciler::{save, ReconcileError};
use crate::store::StudentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReconciliation {
    /// Roster students with their notes replaced; every other field unchanged.
    pub matched: Vec<Student>,
    pub unmatched: Vec<ExtractedGradeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameReconciliation {
    pub known: Vec<Student>,
    pub new: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveFailure {
    pub student_id: Uuid,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeApplyReport {
    pub saved: Vec<Student>,
    pub unmatched: Vec<ExtractedGradeRecord>,
    pub failures: Vec<SaveFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollReport {
    pub created: Vec<Student>,
    pub existing: Vec<Student>,
    pub failures: Vec<SaveFailure>,
}

pub fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Index of roster positions by name key; ambiguous keys map to several.
fn index_roster(roster: &[Student]) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, student) in roster.iter().enumerate() {
        index.entry(name_key(&student.name)).or_default().push(i);
    }
    index
}

/// Pairs grade records with roster students. The first record for a student
/// wins; later ones for the same student are returned as unmatched.
pub fn reconcile_grades(
    roster: &[Student],
    records: &[ExtractedGradeRecord],
) -> GradeReconciliation {
    let index = index_roster(roster);
    let mut taken: HashSet<usize> = HashSet::new();
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for record in records {
        match index.get(&name_key(&record.name)).map(Vec::as_slice) {
            Some([i]) if taken.insert(*i) => {
                let mut student = roster[*i].clone();
                student.note1 = record.note1;
                student.note2 = record.note2;
                student.note3 = record.note3;
                matched.push(student);
            }
            Some([_]) => {
                warn!("Duplicate grade record for '{}' ignored", record.name);
                unmatched.push(record.clone());
            }
            Some(_) => {
                warn!("Grade record for '{}' matches several students", record.name);
                unmatched.push(record.clone());
            }
            None => unmatched.push(record.clone()),
        }
    }

    GradeReconciliation { matched, unmatched }
}

/// Splits extracted names into roster students already present and names not
/// yet on the roster.
pub fn reconcile_names(roster: &[Student], names: &[String]) -> NameReconciliation {
    let index = index_roster(roster);
    let mut seen: HashSet<String> = HashSet::new();
    let mut known = Vec::new();
    let mut new = Vec::new();

    for name in names {
        let key = name_key(name);
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        match index.get(&key) {
            Some(positions) => known.extend(positions.iter().map(|i| roster[*i].clone())),
            None => new.push(name.trim().to_string()),
        }
    }

    NameReconciliation { known, new }
}

/// Loads a class, or `NotFound` when it does not exist.
pub async fn require_class(
    store: &dyn StudentStore,
    class_id: Uuid,
) -> Result<ClassGroup, ReconcileError> {
    store
        .get_class(class_id)
        .await?
        .ok_or_else(|| ReconcileError::NotFound(format!("Class {class_id} not found")))
}

/// Writes extracted grades onto the class roster. Each matched student is
/// saved on its own; failures are collected, never dropped.
pub async fn apply_grades(
    store: &dyn StudentStore,
    class: &ClassGroup,
    records: &[ExtractedGradeRecord],
) -> Result<GradeApplyReport, ReconcileError> {
    let roster = store.list_students(class.id).await?;
    let GradeReconciliation { matched, unmatched } = reconcile_grades(&roster, records);

    let mut saved = Vec::with_capacity(matched.len());
    let mut failures = Vec::new();
    for student in &matched {
        match save(store, student).await {
            Ok(s) => saved.push(s),
            Err(e) => failures.push(SaveFailure {
                student_id: student.id,
                name: student.name.clone(),
                reason: e.to_string(),
            }),
        }
    }

    info!(
        "Applied grades to class {}: saved={}, unmatched={}, failed={}",
        class.name,
        saved.len(),
        unmatched.len(),
        failures.len()
    );

    Ok(GradeApplyReport {
        saved,
        unmatched,
        failures,
    })
}

/// Adds every extracted name not already on the roster as a new student of
/// the class, with all notes at zero.
pub async fn enroll_names(
    store: &dyn StudentStore,
    class: &ClassGroup,
    names: &[String],
) -> Result<EnrollReport, ReconcileError> {
    let roster = store.list_students(class.id).await?;
    let NameReconciliation { known, new } = reconcile_names(&roster, names);

    let mut created = Vec::with_capacity(new.len());
    let mut failures = Vec::new();
    for name in new {
        let student = Student::new(name, Some(class.id));
        match save(store, &student).await {
            Ok(s) => created.push(s),
            Err(e) => failures.push(SaveFailure {
                student_id: student.id,
                name: student.name,
                reason: e.to_string(),
            }),
        }
    }

    info!(
        "Enrolled names into class {}: created={}, existing={}, failed={}",
        class.name,
        created.len(),
        known.len(),
        failures.len()
    );

    Ok(EnrollReport {
        created,
        existing: known,
        failures,
    })
}
