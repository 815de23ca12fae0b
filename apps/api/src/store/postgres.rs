use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::class::ClassGroup;
use crate::models::student::Student;
use crate::store::StudentStore;

const STUDENT_COLUMNS: &str = "id, name, class_id, note1, note2, note3, updated_at";

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStudentStore {
    pool: PgPool,
}

impl PgStudentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn get_class(&self, id: Uuid) -> Result<Option<ClassGroup>> {
        let class = sqlx::query_as::<_, ClassGroup>("SELECT id, name FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(class)
    }

    async fn save_student(&self, student: &Student) -> Result<Option<Student>> {
        // Single-statement upsert: the row is either fully written or untouched.
        let saved = sqlx::query_as::<_, Student>(&format!(
            r#"
            INSERT INTO students (id, name, class_id, note1, note2, note3, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                class_id = EXCLUDED.class_id,
                note1 = EXCLUDED.note1,
                note2 = EXCLUDED.note2,
                note3 = EXCLUDED.note3,
                updated_at = EXCLUDED.updated_at
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student.id)
        .bind(&student.name)
        .bind(student.class_id)
        .bind(student.note1)
        .bind(student.note2)
        .bind(student.note3)
        .fetch_optional(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn list_students(&self, class_id: Uuid) -> Result<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE class_id = $1 ORDER BY name, id"
        ))
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    async fn list_classes(&self) -> Result<Vec<ClassGroup>> {
        let classes =
            sqlx::query_as::<_, ClassGroup>("SELECT id, name FROM classes ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(classes)
    }

    async fn save_class(&self, class: &ClassGroup) -> Result<ClassGroup> {
        let saved = sqlx::query_as::<_, ClassGroup>(
            r#"
            INSERT INTO classes (id, name) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(class.id)
        .bind(&class.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}
