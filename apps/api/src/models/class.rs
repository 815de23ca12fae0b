use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A class a student may belong to. Students reference it weakly by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClassGroup {
    pub id: Uuid,
    pub name: String,
}
