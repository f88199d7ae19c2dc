use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, Registered},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{Role, Student, Teacher, User},
    },
    db::WriteTx,
    error::AppError,
};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Passwords are taken verbatim, so only an empty one counts as missing.
fn present_password(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NewProfile {
    Student,
    Teacher { department: String },
}

#[derive(Debug, Clone)]
pub(crate) struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub profile: NewProfile,
}

pub(crate) fn validate_registration(req: RegisterRequest) -> Result<NewAccount, AppError> {
    let (Some(name), Some(email), Some(password), Some(role)) = (
        present(req.name),
        present(req.email),
        present_password(req.password),
        present(req.role),
    ) else {
        return Err(AppError::Validation(
            "Please provide name, email, password, and role.".into(),
        ));
    };

    let profile = match role.as_str() {
        "student" => NewProfile::Student,
        "teacher" => match present(req.department) {
            Some(department) => NewProfile::Teacher {
                department: department.trim().to_string(),
            },
            None => {
                return Err(AppError::Validation(
                    "Please provide a department for the teacher role.".into(),
                ))
            }
        },
        _ => {
            return Err(AppError::Validation(
                "Role must be either 'student' or 'teacher'.".into(),
            ))
        }
    };

    Ok(NewAccount {
        name: name.trim().to_string(),
        email: normalize_email(&email),
        password,
        profile,
    })
}

/// Creates the role profile and its credential record in one transaction.
/// Nothing is persisted unless both rows are written.
#[instrument(skip(db, req))]
pub async fn register(db: &SqlitePool, req: RegisterRequest) -> Result<Registered, AppError> {
    let account = match validate_registration(req) {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "registration rejected");
            return Err(e);
        }
    };
    let hash = hash_password(&account.password)?;

    let mut tx = WriteTx::begin(db).await?;
    match create_account(tx.conn(), &account, &hash).await {
        Ok(registered) => {
            tx.commit().await?;
            info!(
                user_id = registered.user_id,
                email = %account.email,
                role = registered.role.as_str(),
                "user registered"
            );
            Ok(registered)
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                error!(error = %rb, "registration rollback failed");
            }
            if matches!(e, AppError::Conflict(_)) {
                warn!(email = %account.email, error = %e, "registration conflict");
            } else {
                error!(email = %account.email, error = %e, "registration failed");
            }
            Err(e)
        }
    }
}

async fn create_account(
    tx: &mut SqliteConnection,
    account: &NewAccount,
    password_hash: &str,
) -> Result<Registered, AppError> {
    if User::find_by_email(&mut *tx, &account.email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists.".into(),
        ));
    }

    let role = match &account.profile {
        NewProfile::Student => {
            if Student::find_by_email(&mut *tx, &account.email)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(
                    "Student with this email already exists.".into(),
                ));
            }
            let student = Student::create(&mut *tx, &account.name, &account.email).await?;
            Role::Student {
                profile_id: student.id,
            }
        }
        // teachers have no email column, so only the users table guards uniqueness
        NewProfile::Teacher { department } => {
            let teacher = Teacher::create(&mut *tx, &account.name, department).await?;
            Role::Teacher {
                profile_id: teacher.id,
            }
        }
    };

    let (student_id, teacher_id) = match role {
        Role::Student { profile_id } => (Some(profile_id), None),
        Role::Teacher { profile_id } => (None, Some(profile_id)),
    };
    let user = User::create(
        &mut *tx,
        &account.email,
        password_hash,
        student_id,
        teacher_id,
    )
    .await?;

    Ok(Registered {
        role,
        user_id: user.id,
    })
}

#[instrument(skip(db, keys, req))]
pub async fn login(
    db: &SqlitePool,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<LoginResponse, AppError> {
    let (Some(email), Some(password)) = (present(req.email), present_password(req.password))
    else {
        warn!("login missing credentials");
        return Err(AppError::Validation(
            "Please provide email and password.".into(),
        ));
    };
    let email = normalize_email(&email);

    let Some(user) = User::find_by_email(db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::NotFound("User not found.".into()));
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(AppError::InvalidPassword);
    }

    let access_token = keys.sign(user.id)?;
    let role = user.role().map(|r| r.as_str().to_string());

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(LoginResponse {
        id: user.id,
        email: user.email,
        role,
        access_token,
    })
}

pub async fn list_users(db: &SqlitePool) -> Result<Vec<PublicUser>, AppError> {
    let users = User::list(db).await?;
    Ok(users
        .into_iter()
        .map(|u| PublicUser {
            id: u.id,
            email: u.email,
        })
        .collect())
}
