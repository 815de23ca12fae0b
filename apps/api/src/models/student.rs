use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::score::deserialize_score;

/// A student record as held by the store.
///
/// The average is never stored; see `profile::reconciler::compute_average`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub note1: f64,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub note2: f64,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub note3: f64,
    /// Set by the store on every save.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Student {
    /// A fresh, unsaved student with all notes at zero.
    pub fn new(name: impl Into<String>, class_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            class_id,
            note1: 0.0,
            note2: 0.0,
            note3: 0.0,
            updated_at: None,
        }
    }

    pub fn notes(&self) -> [f64; 3] {
        [self.note1, self.note2, self.note3]
    }
}
