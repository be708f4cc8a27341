use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, AppError, AppResult};

use super::model::{Role, RoleDetails, User, UserBrief, UserRow};

const USER_COLUMNS: &str = "id,name,email,password_hash,role,usn,batch,passing_year,branch,program,bio,created_at";

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub details: RoleDetails,
}

pub async fn create(pool: &SqlitePool, new: NewUser) -> AppResult<User> {
    let id = Uuid::now_v7();
    let created_at = db::now_ms();

    let (usn, batch, passing_year, branch, program) = match &new.details {
        RoleDetails::Student { usn } => {
            (Some(usn.clone()), None, None, None, None)
        }
        RoleDetails::Alumni {
            batch,
            passing_year,
            branch,
            program,
        } => (
            None,
            Some(batch.clone()),
            Some(passing_year.clone()),
            Some(branch.clone()),
            Some(program.clone()),
        ),
    };

    let result = sqlx::query(
        "INSERT INTO users (id,name,email,password_hash,role,usn,batch,passing_year,branch,program,bio,created_at) \
         VALUES (?,?,?,?,?,?,?,?,?,?,'',?)",
    )
    .bind(id.to_string())
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(new.details.role().as_str())
    .bind(usn)
    .bind(batch)
    .bind(passing_year)
    .bind(branch)
    .bind(program)
    .bind(created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(User {
            id,
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            details: new.details,
            bio: String::new(),
            created_at,
        }),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AppError::conflict("User already exists"))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> AppResult<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id=?"))
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;

    row.map(User::try_from).transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email=?"))
            .bind(email)
            .fetch_optional(pool)
            .await?;

    row.map(User::try_from).transpose()
}

pub async fn exists(pool: &SqlitePool, id: Uuid) -> AppResult<bool> {
    Ok(sqlx::query_as::<_, (i64,)>("SELECT 1 FROM users WHERE id=?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .is_some())
}

/// Directory listing, newest accounts first.
pub async fn list_by_role(pool: &SqlitePool, role: Role) -> AppResult<Vec<User>> {
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role=? ORDER BY created_at DESC"
    ))
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(User::try_from).collect()
}

/// Fields touched by profile update; anything absent is left unchanged.
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}

pub async fn update_profile(pool: &SqlitePool, id: Uuid, patch: ProfilePatch) -> AppResult<User> {
    let result = sqlx::query(
        "UPDATE users SET name=COALESCE(?,name), email=COALESCE(?,email), bio=COALESCE(?,bio) WHERE id=?",
    )
    .bind(patch.name)
    .bind(patch.email)
    .bind(patch.bio)
    .bind(id.to_string())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(AppError::conflict("Email already in use"));
        }
        Err(err) => return Err(err.into()),
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Join projection for populate-on-read at the handler layer.
pub async fn brief(pool: &SqlitePool, id: Uuid) -> AppResult<UserBrief> {
    let row: Option<(String, String, Option<String>, Option<String>, Option<String>)> =
        sqlx::query_as("SELECT name,role,usn,batch,branch FROM users WHERE id=?")
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;

    let (name, role, usn, batch, branch) =
        row.ok_or_else(|| anyhow::anyhow!("referenced user {id} does not exist"))?;

    let role = match role.as_str() {
        "student" => Role::Student,
        "alumni" => Role::Alumni,
        other => return Err(anyhow::anyhow!("user {id} has unknown role {other}").into()),
    };

    Ok(UserBrief {
        id,
        name,
        role,
        usn,
        batch,
        branch,
    })
}
