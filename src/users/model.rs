use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Alumni,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Alumni => "alumni",
        }
    }
}

/// Role-conditional profile fields. The required set is carried by the
/// variant itself: a student row cannot exist without a usn, an alumni row
/// cannot exist without batch/passing year/branch/program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleDetails {
    Student {
        usn: String,
    },
    Alumni {
        batch: String,
        #[serde(rename = "passingYear")]
        passing_year: String,
        branch: String,
        program: String,
    },
}

impl RoleDetails {
    pub fn role(&self) -> Role {
        match self {
            RoleDetails::Student { .. } => Role::Student,
            RoleDetails::Alumni { .. } => Role::Alumni,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub details: RoleDetails,
    pub bio: String,
    pub created_at: i64,
}

impl User {
    pub fn role(&self) -> Role {
        self.details.role()
    }
}

/// Full API projection of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub details: RoleDetails,
    pub bio: String,
    pub created_at: i64,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            details: user.details,
            bio: user.bio,
            created_at: user.created_at,
        }
    }
}

/// Display fields attached to conversations, messages, events and posts at
/// the handler layer. Stores themselves only deal in user ids.
#[derive(Debug, Clone, Serialize)]
pub struct UserBrief {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub usn: Option<String>,
    pub batch: Option<String>,
    pub passing_year: Option<String>,
    pub branch: Option<String>,
    pub program: Option<String>,
    pub bio: String,
    pub created_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, AppError> {
        let details = match row.role.as_str() {
            "student" => RoleDetails::Student {
                usn: field(row.usn, &row.id, "usn")?,
            },
            "alumni" => RoleDetails::Alumni {
                batch: field(row.batch, &row.id, "batch")?,
                passing_year: field(row.passing_year, &row.id, "passing_year")?,
                branch: field(row.branch, &row.id, "branch")?,
                program: field(row.program, &row.id, "program")?,
            },
            other => {
                return Err(anyhow::anyhow!("user {} has unknown role {other}", row.id).into())
            }
        };

        Ok(User {
            id: Uuid::parse_str(&row.id).map_err(anyhow::Error::from)?,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            details,
            bio: row.bio,
            created_at: row.created_at,
        })
    }
}

fn field(value: Option<String>, id: &str, name: &str) -> Result<String, AppError> {
    value.ok_or_else(|| anyhow::anyhow!("user {id} is missing required field {name}").into())
}
