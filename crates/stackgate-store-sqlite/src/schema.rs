//! SQL schema for the Stackgate SQLite store.
//!
//! Executed once at connection startup; idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`. Future migrations will be gated on
//! `PRAGMA user_version`.

pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Reference data, owned by the membership-management collaborator.
-- All match keys are stored in canonical case (ids/department/year/
-- division/batch upper, email lower).
CREATE TABLE IF NOT EXISTS teachers (
    teacher_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    department  TEXT NOT NULL,
    email       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    student_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    department  TEXT NOT NULL,
    year        TEXT NOT NULL,
    division    TEXT NOT NULL,
    batch       TEXT NOT NULL,
    email       TEXT NOT NULL
);

-- Committed, clash-free slots only; overlap checks run before INSERT.
CREATE TABLE IF NOT EXISTS timetable (
    slot_id       INTEGER PRIMARY KEY,
    department    TEXT NOT NULL,
    year          TEXT NOT NULL,
    division      TEXT NOT NULL,
    batch         TEXT,               -- NULL for lectures
    subject       TEXT NOT NULL,
    instructor_id TEXT NOT NULL,
    day_of_week   TEXT NOT NULL,      -- 'Monday'..'Saturday'
    start_time    TEXT NOT NULL,      -- 'HH:MM:SS', zero-padded
    end_time      TEXT NOT NULL,
    session_type  TEXT NOT NULL       -- 'lecture' | 'practical'
);

-- Events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS events (
    event_id              INTEGER PRIMARY KEY,  -- monotonic
    user_id               TEXT NOT NULL,
    action                TEXT NOT NULL,        -- 'ENTRY' | 'EXIT'
    status                TEXT NOT NULL,        -- 'NORMAL' | 'SKIP'
    matched_subject       TEXT,
    matched_instructor_id TEXT,
    scanned_at            TEXT NOT NULL         -- 'YYYY-MM-DD HH:MM:SS'
);

CREATE INDEX IF NOT EXISTS events_user_idx
    ON events(user_id, scanned_at);
CREATE INDEX IF NOT EXISTS timetable_cohort_idx
    ON timetable(department, year, division, day_of_week);
CREATE INDEX IF NOT EXISTS timetable_instructor_idx
    ON timetable(instructor_id, day_of_week);

PRAGMA user_version = 1;
";
