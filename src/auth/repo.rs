use anyhow::Context;
use sqlx::{Executor, Sqlite};
use time::OffsetDateTime;

use crate::auth::repo_types::{Student, Teacher, User};

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email<'e, E>(db: E, email: &str) -> anyhow::Result<Option<User>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, student_id, teacher_id, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    /// Create a credential record linked to exactly one profile.
    pub async fn create<'e, E>(
        db: E,
        email: &str,
        password_hash: &str,
        student_id: Option<i64>,
        teacher_id: Option<i64>,
    ) -> anyhow::Result<User>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, student_id, teacher_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, email, password_hash, student_id, teacher_id, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(student_id)
        .bind(teacher_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    pub async fn list<'e, E>(db: E) -> anyhow::Result<Vec<User>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, student_id, teacher_id, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await
        .context("list users")?;
        Ok(users)
    }
}

impl Student {
    pub async fn find_by_email<'e, E>(db: E, email: &str) -> anyhow::Result<Option<Student>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let student = sqlx::query_as::<_, Student>(
            r#"SELECT id, name, email, created_at FROM students WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find student by email")?;
        Ok(student)
    }

    pub async fn create<'e, E>(db: E, name: &str, email: &str) -> anyhow::Result<Student>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (name, email, created_at)
            VALUES (?, ?, ?)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
        .context("insert student")?;
        Ok(student)
    }
}

impl Teacher {
    pub async fn create<'e, E>(db: E, name: &str, department: &str) -> anyhow::Result<Teacher>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let teacher = sqlx::query_as::<_, Teacher>(
            r#"
            INSERT INTO teachers (name, department, created_at)
            VALUES (?, ?, ?)
            RETURNING id, name, department, created_at
            "#,
        )
        .bind(name)
        .bind(department)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
        .context("insert teacher")?;
        Ok(teacher)
    }
}
