//! Profile Reconciler — merges edits into student records, derives the
//! average, and persists through the store.
//!
//! Every operation takes the caller's `Student` by reference and works on a
//! copy, so a failed save leaves the caller's record exactly as it was.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::class::ClassGroup;
use crate::models::score::deserialize_optional_score;
use crate::models::student::Student;
use crate::store::StudentStore;

/// Display label for a student whose class is unset or unknown.
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    SaveFailed(String),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// A partial edit. Absent fields are left alone; `class_id: null` unassigns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StudentEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub class_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_optional_score")]
    pub note1: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_score")]
    pub note2: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_score")]
    pub note3: Option<f64>,
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

/// What the profile view shows: the record plus derived, display-ready fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    pub student: Student,
    pub class_name: String,
    pub class_assigned: bool,
    pub average: f64,
    pub average_display: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Pure helpers
// ────────────────────────────────────────────────────────────────────────────

/// Mean of the three notes, rounded to two decimals.
pub fn compute_average(student: &Student) -> f64 {
    let sum: f64 = student.notes().iter().map(|n| finite_or_zero(*n)).sum();
    round2(sum / 3.0)
}

pub fn format_average(average: f64) -> String {
    format!("{average:.2}")
}

pub fn class_label(class: Option<&ClassGroup>) -> &str {
    class.map(|c| c.name.as_str()).unwrap_or(UNASSIGNED)
}

pub fn build_profile(student: Student, class: Option<&ClassGroup>) -> StudentProfile {
    let average = compute_average(&student);
    StudentProfile {
        class_name: class_label(class).to_string(),
        class_assigned: class.is_some(),
        average,
        average_display: format_average(average),
        student,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn clean_name(name: &str) -> Result<String, ReconcileError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ReconcileError::Validation(
            "student name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Applies an edit to a copy of `student`. Fields the edit does not name are
/// carried over unchanged.
pub fn apply_edits(student: &Student, edit: &StudentEdit) -> Result<Student, ReconcileError> {
    let mut updated = student.clone();
    if let Some(name) = &edit.name {
        updated.name = clean_name(name)?;
    }
    if let Some(class_id) = edit.class_id {
        updated.class_id = class_id;
    }
    if let Some(n) = edit.note1 {
        updated.note1 = n;
    }
    if let Some(n) = edit.note2 {
        updated.note2 = n;
    }
    if let Some(n) = edit.note3 {
        updated.note3 = n;
    }
    Ok(updated)
}

/// Builds a new, unsaved student from a creation payload. A name is required.
pub fn new_student(edit: &StudentEdit) -> Result<Student, ReconcileError> {
    let name = edit.name.as_deref().ok_or_else(|| {
        ReconcileError::Validation("student name is required".to_string())
    })?;
    let blank = Student::new(clean_name(name)?, None);
    apply_edits(&blank, edit)
}

/// The form a record must have before it reaches the store: trimmed,
/// non-empty name and finite notes.
fn normalize(student: &Student) -> Result<Student, ReconcileError> {
    let mut normalized = student.clone();
    normalized.name = clean_name(&student.name)?;
    normalized.note1 = finite_or_zero(student.note1);
    normalized.note2 = finite_or_zero(student.note2);
    normalized.note3 = finite_or_zero(student.note3);
    Ok(normalized)
}

// ────────────────────────────────────────────────────────────────────────────
// Store-backed operations
// ────────────────────────────────────────────────────────────────────────────

/// Persists a student and returns the store's canonical record.
pub async fn save(store: &dyn StudentStore, student: &Student) -> Result<Student, ReconcileError> {
    let candidate = normalize(student)?;

    match store.save_student(&candidate).await {
        Ok(Some(saved)) => {
            info!("Saved student {} ({})", saved.id, saved.name);
            Ok(saved)
        }
        Ok(None) => {
            warn!("Store declined to save student {}", candidate.id);
            Err(ReconcileError::SaveFailed(format!(
                "the store did not accept student {}",
                candidate.id
            )))
        }
        Err(e) => {
            warn!("Saving student {} failed: {e:#}", candidate.id);
            Err(ReconcileError::SaveFailed(format!("{e:#}")))
        }
    }
}

/// Loads a student together with its class label and average.
pub async fn load_profile(
    store: &dyn StudentStore,
    id: Uuid,
) -> Result<StudentProfile, ReconcileError> {
    let student = store
        .get_student(id)
        .await?
        .ok_or_else(|| ReconcileError::NotFound(format!("Student {id} not found")))?;
    profile_for(store, student).await
}

/// Resolves the class of an already-loaded student into a profile.
pub async fn profile_for(
    store: &dyn StudentStore,
    student: Student,
) -> Result<StudentProfile, ReconcileError> {
    let class = match student.class_id {
        Some(class_id) => store.get_class(class_id).await?,
        None => None,
    };
    Ok(build_profile(student, class.as_ref()))
}

/// Loads, edits and saves in one step, returning the saved profile.
pub async fn update_student(
    store: &dyn StudentStore,
    id: Uuid,
    edit: &StudentEdit,
) -> Result<StudentProfile, ReconcileError> {
    let current = store
        .get_student(id)
        .await?
        .ok_or_else(|| ReconcileError::NotFound(format!("Student {id} not found")))?;
    let edited = apply_edits(&current, edit)?;
    let saved = save(store, &edited).await?;
    profile_for(store, saved).await
}
