use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL CHECK (role IN ('student', 'alumni')),
    usn           TEXT,
    batch         TEXT,
    passing_year  TEXT,
    branch        TEXT,
    program       TEXT,
    bio           TEXT NOT NULL DEFAULT '',
    created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS conversations (
    id              TEXT PRIMARY KEY,
    participant_lo  TEXT NOT NULL REFERENCES users(id),
    participant_hi  TEXT NOT NULL REFERENCES users(id),
    last_message    TEXT NOT NULL DEFAULT '',
    last_message_at INTEGER NOT NULL,
    UNIQUE (participant_lo, participant_hi)
);

CREATE TABLE IF NOT EXISTS messages (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    id              TEXT NOT NULL UNIQUE,
    conversation_id TEXT NOT NULL REFERENCES conversations(id),
    sender_id       TEXT NOT NULL REFERENCES users(id),
    content         TEXT NOT NULL,
    created_at      INTEGER NOT NULL,
    read            INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation
    ON messages (conversation_id, created_at);

CREATE TABLE IF NOT EXISTS events (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    date          TEXT NOT NULL,
    time          TEXT NOT NULL,
    location      TEXT NOT NULL,
    event_type    TEXT NOT NULL,
    organizer_id  TEXT NOT NULL REFERENCES users(id),
    max_attendees INTEGER,
    created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS event_attendees (
    event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    user_id  TEXT NOT NULL REFERENCES users(id),
    PRIMARY KEY (event_id, user_id)
);

CREATE TABLE IF NOT EXISTS jobs (
    id               TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    company          TEXT NOT NULL,
    location         TEXT NOT NULL,
    job_type         TEXT NOT NULL,
    salary           TEXT NOT NULL DEFAULT '',
    description      TEXT NOT NULL,
    requirements     TEXT NOT NULL DEFAULT '[]',
    responsibilities TEXT NOT NULL DEFAULT '[]',
    application_link TEXT NOT NULL DEFAULT '',
    posted_by        TEXT NOT NULL REFERENCES users(id),
    created_at       INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS blogs (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    summary    TEXT NOT NULL,
    author_id  TEXT NOT NULL REFERENCES users(id),
    created_at INTEGER NOT NULL
);
"#;

pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(url)
        .await?;
    init(&pool).await?;
    Ok(pool)
}

pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Server clock, unix epoch milliseconds. All persisted timestamps use this.
pub fn now_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
