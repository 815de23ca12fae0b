//! Data store collaborator.
//!
//! Lookups return `Ok(None)` for "not found"; `Err` is reserved for backend
//! failures. `save_student` returns the canonical post-save record, or `None`
//! when the store declined the write.
//!
//! `AppState` holds an `Arc<dyn StudentStore>`, chosen at startup from config.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::class::ClassGroup;
use crate::models::student::Student;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStudentStore;

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn get_student(&self, id: Uuid) -> Result<Option<Student>>;

    async fn get_class(&self, id: Uuid) -> Result<Option<ClassGroup>>;

    /// Inserts or replaces the student. The store stamps `updated_at`.
    async fn save_student(&self, student: &Student) -> Result<Option<Student>>;

    /// Students whose `class_id` equals `class_id`, ordered by name.
    async fn list_students(&self, class_id: Uuid) -> Result<Vec<Student>>;

    async fn list_classes(&self) -> Result<Vec<ClassGroup>>;

    async fn save_class(&self, class: &ClassGroup) -> Result<ClassGroup>;
}
