use serde::{Deserialize, Serialize};

use super::repo_types::Role;

/// Request body for registration. Fields are optional on the wire so that
/// missing values are reported as validation errors.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<i64>,
    pub user_id: i64,
}

/// Response returned after login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: i64,
    pub email: String,
    pub role: Option<String>,
    pub access_token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
}

/// Outcome of a committed registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registered {
    pub role: Role,
    pub user_id: i64,
}

impl From<Registered> for RegisterResponse {
    fn from(r: Registered) -> Self {
        match r.role {
            Role::Student { profile_id } => Self {
                message: "Student user registered successfully!".into(),
                student_id: Some(profile_id),
                teacher_id: None,
                user_id: r.user_id,
            },
            Role::Teacher { profile_id } => Self {
                message: "Teacher user registered successfully!".into(),
                student_id: None,
                teacher_id: Some(profile_id),
                user_id: r.user_id,
            },
        }
    }
}
