use serde::{Serialize, Serializer};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Credential record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never sent to clients
    pub student_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Role is derived from whichever profile key is set.
    pub fn role(&self) -> Option<Role> {
        match (self.student_id, self.teacher_id) {
            (Some(profile_id), _) => Some(Role::Student { profile_id }),
            (None, Some(profile_id)) => Some(Role::Teacher { profile_id }),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student { profile_id: i64 },
    Teacher { profile_id: i64 },
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student { .. } => "student",
            Role::Teacher { .. } => "teacher",
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub created_at: OffsetDateTime,
}
