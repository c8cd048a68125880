//! User manager: creation, lookup and authentication of users

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    email::normalize_email,
    models::{ExtraFields, UpdateUser, User},
    password,
};
use common::error::DatabaseError;

const USER_COLUMNS: &str = "id, email, name, password_hash, is_staff, is_active, is_superuser, \
                            created_at, updated_at";

/// Errors raised by the user manager
#[derive(Error, Debug)]
pub enum UserError {
    /// Users must have an email address
    #[error("Users must have an email address")]
    MissingEmail,

    /// Another account already uses this email
    #[error("A user with email {0} already exists")]
    EmailTaken(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        UserError::Database(DatabaseError::from(err))
    }
}

/// A user ready to be inserted: email normalized, password hashed
#[derive(Debug)]
pub(crate) struct PreparedUser {
    pub email: String,
    pub password_hash: String,
    pub extra: ExtraFields,
}

/// Validate and normalize the inputs of [`UserManager::create_user`]
pub(crate) fn prepare_user(
    email: &str,
    raw_password: Option<&str>,
    extra: ExtraFields,
) -> Result<PreparedUser, UserError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(UserError::MissingEmail);
    }

    let password_hash = match raw_password {
        Some(raw) => {
            password::hash_password(raw).map_err(|e| UserError::Hashing(e.to_string()))?
        }
        None => password::unusable_password(),
    };

    Ok(PreparedUser {
        email,
        password_hash,
        extra,
    })
}

fn map_insert_error(err: sqlx::Error, email: &str) -> UserError {
    let err = DatabaseError::from(err);
    if err.is_unique_violation() {
        UserError::EmailTaken(email.to_string())
    } else {
        UserError::Database(err)
    }
}

/// Creates, loads and authenticates users
#[derive(Clone)]
pub struct UserManager {
    pool: PgPool,
}

impl UserManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create and save a new user.
    ///
    /// Fails with [`UserError::MissingEmail`] when `email` is blank. A `None`
    /// password stores an unusable hash, so the account cannot log in until
    /// a password is set.
    pub async fn create_user(
        &self,
        email: &str,
        raw_password: Option<&str>,
        extra: ExtraFields,
    ) -> Result<User, UserError> {
        let prepared = prepare_user(email, raw_password, extra)?;
        info!("Creating new user: {}", prepared.email);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, is_staff, is_active, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&prepared.email)
        .bind(&prepared.extra.name)
        .bind(&prepared.password_hash)
        .bind(prepared.extra.is_staff)
        .bind(prepared.extra.is_active)
        .bind(prepared.extra.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &prepared.email))?;

        Ok(user)
    }

    /// Create a user, then grant staff and superuser flags
    pub async fn create_superuser(
        &self,
        email: &str,
        raw_password: &str,
        extra: ExtraFields,
    ) -> Result<User, UserError> {
        let user = self.create_user(email, Some(raw_password), extra).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET is_staff = TRUE, is_superuser = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        info!("Granted superuser to {}", user.email);
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Return the user only if it is active and the password matches
    pub async fn authenticate(
        &self,
        email: &str,
        raw_password: &str,
    ) -> Result<Option<User>, UserError> {
        let user = self.find_by_email(email).await?;

        Ok(user.filter(|u| {
            u.is_active && password::verify_password(&u.password_hash, raw_password)
        }))
    }

    /// Apply a partial update; the email is re-normalized and the password re-hashed
    pub async fn update(&self, id: Uuid, changes: &UpdateUser) -> Result<Option<User>, UserError> {
        let email = match changes.email.as_deref() {
            Some(raw) => {
                let email = normalize_email(raw);
                if email.is_empty() {
                    return Err(UserError::MissingEmail);
                }
                Some(email)
            }
            None => None,
        };

        let password_hash = changes
            .password
            .as_deref()
            .map(password::hash_password)
            .transpose()
            .map_err(|e| UserError::Hashing(e.to_string()))?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                name = COALESCE($3, name),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email.as_deref())
        .bind(changes.name.as_deref())
        .bind(password_hash.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, email.as_deref().unwrap_or_default()))?;

        Ok(user)
    }
}
