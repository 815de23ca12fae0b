use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::class::ClassGroup;
use crate::models::student::Student;
use crate::store::StudentStore;

/// Process-local store used when no `DATABASE_URL` is configured, and by tests.
/// Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    students: RwLock<HashMap<Uuid, Student>>,
    classes: RwLock<HashMap<Uuid, ClassGroup>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self.students.read().await.get(&id).cloned())
    }

    async fn get_class(&self, id: Uuid) -> Result<Option<ClassGroup>> {
        Ok(self.classes.read().await.get(&id).cloned())
    }

    async fn save_student(&self, student: &Student) -> Result<Option<Student>> {
        let mut saved = student.clone();
        saved.updated_at = Some(Utc::now());
        self.students.write().await.insert(saved.id, saved.clone());
        Ok(Some(saved))
    }

    async fn list_students(&self, class_id: Uuid) -> Result<Vec<Student>> {
        let mut students: Vec<Student> = self
            .students
            .read()
            .await
            .values()
            .filter(|s| s.class_id == Some(class_id))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(students)
    }

    async fn list_classes(&self) -> Result<Vec<ClassGroup>> {
        let mut classes: Vec<ClassGroup> = self.classes.read().await.values().cloned().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(classes)
    }

    async fn save_class(&self, class: &ClassGroup) -> Result<ClassGroup> {
        self.classes.write().await.insert(class.id, class.clone());
        Ok(class.clone())
    }
}
