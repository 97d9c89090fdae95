//! SQL schema for the Homeroom SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `homework.subject_id` deliberately has no foreign key: the in-use guard
/// lives in the tracker, as it would against any document store.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS subjects (
    id     TEXT PRIMARY KEY,
    name   TEXT NOT NULL,
    color  TEXT NOT NULL     -- '#rgb' | '#rrggbb', lowercase
);

CREATE TABLE IF NOT EXISTS homework (
    id            TEXT PRIMARY KEY,
    subject_id    TEXT NOT NULL,
    due_date      TEXT NOT NULL,              -- YYYY-MM-DD
    description   TEXT NOT NULL DEFAULT '',
    completed     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,              -- RFC 3339 UTC
    completed_at  TEXT                        -- RFC 3339 UTC, microseconds
);

CREATE INDEX IF NOT EXISTS subjects_name_idx      ON subjects(name);
CREATE INDEX IF NOT EXISTS homework_subject_idx   ON homework(subject_id);
CREATE INDEX IF NOT EXISTS homework_active_idx    ON homework(completed, due_date);
CREATE INDEX IF NOT EXISTS homework_archived_idx  ON homework(completed, completed_at);

PRAGMA user_version = 1;
";
