//! SQL schema for the vigil SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS checkins (
    user_id          TEXT PRIMARY KEY,
    last_checkin_at  TEXT,             -- NULL until the first confirm
    interval_days    INTEGER NOT NULL DEFAULT 7
                     CHECK (interval_days BETWEEN 1 AND 730),
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recipients (
    recipient_id             TEXT PRIMARY KEY,
    user_id                  TEXT NOT NULL,
    name                     TEXT NOT NULL,
    email                    TEXT NOT NULL,
    relationship_description TEXT,
    created_at               TEXT NOT NULL,
    updated_at               TEXT NOT NULL,
    UNIQUE (recipient_id, user_id)
);

CREATE TABLE IF NOT EXISTS legacy_items (
    item_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    title       TEXT NOT NULL,
    ciphertext  TEXT NOT NULL,         -- base64(nonce || sealed); never plaintext
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (item_id, user_id)
);

-- Both foreign keys carry user_id, so a link can only join rows of one owner.
CREATE TABLE IF NOT EXISTS item_recipients (
    item_id       TEXT NOT NULL,
    recipient_id  TEXT NOT NULL,
    user_id       TEXT NOT NULL,
    PRIMARY KEY (item_id, recipient_id),
    FOREIGN KEY (item_id, user_id)
        REFERENCES legacy_items(item_id, user_id) ON DELETE CASCADE,
    FOREIGN KEY (recipient_id, user_id)
        REFERENCES recipients(recipient_id, user_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS release_events (
    release_event_id    TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL,
    triggered_at        TEXT NOT NULL,
    days_overdue        INTEGER NOT NULL,
    recipients_notified INTEGER NOT NULL DEFAULT 0,
    is_demo             INTEGER NOT NULL,
    status              TEXT NOT NULL DEFAULT 'in_progress'
                        CHECK (status IN ('in_progress', 'success', 'partial', 'failed'))
);

-- The rollup is written once; identity columns never change.
CREATE TRIGGER IF NOT EXISTS release_events_rollup_once
BEFORE UPDATE ON release_events
WHEN OLD.status <> 'in_progress'
  OR NEW.user_id      IS NOT OLD.user_id
  OR NEW.triggered_at IS NOT OLD.triggered_at
  OR NEW.days_overdue IS NOT OLD.days_overdue
  OR NEW.is_demo      IS NOT OLD.is_demo
BEGIN
    SELECT RAISE(ABORT, 'release event is closed');
END;

CREATE TRIGGER IF NOT EXISTS release_events_no_delete
BEFORE DELETE ON release_events
BEGIN
    SELECT RAISE(ABORT, 'release events are append-only');
END;

-- No foreign key to recipients: the ledger outlives recipient deletion.
CREATE TABLE IF NOT EXISTS notification_logs (
    seq               INTEGER PRIMARY KEY AUTOINCREMENT,
    notification_id   TEXT NOT NULL UNIQUE,
    release_event_id  TEXT REFERENCES release_events(release_event_id),
    user_id           TEXT NOT NULL,
    recipient_id      TEXT NOT NULL,
    email_type        TEXT NOT NULL,
    status            TEXT NOT NULL CHECK (status IN ('sent', 'failed')),
    recipient_email   TEXT NOT NULL,
    subject           TEXT NOT NULL,
    error_message     TEXT,
    is_demo           INTEGER NOT NULL,
    sent_at           TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS notification_logs_no_update
BEFORE UPDATE ON notification_logs
BEGIN
    SELECT RAISE(ABORT, 'notification logs are append-only');
END;

CREATE TRIGGER IF NOT EXISTS notification_logs_no_delete
BEFORE DELETE ON notification_logs
BEGIN
    SELECT RAISE(ABORT, 'notification logs are append-only');
END;

CREATE TABLE IF NOT EXISTS obligations (
    obligation_id  TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL,
    creditor_name  TEXT NOT NULL,
    amount_cents   INTEGER NOT NULL CHECK (amount_cents > 0),
    currency       TEXT NOT NULL,
    description    TEXT,
    due_date       TEXT,               -- YYYY-MM-DD
    status         TEXT NOT NULL DEFAULT 'outstanding'
                   CHECK (status IN ('outstanding', 'settled')),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS recipients_user_idx    ON recipients(user_id, created_at, recipient_id);
CREATE INDEX IF NOT EXISTS legacy_items_user_idx  ON legacy_items(user_id, created_at, item_id);
CREATE INDEX IF NOT EXISTS item_recipients_r_idx  ON item_recipients(recipient_id);
CREATE INDEX IF NOT EXISTS release_events_user_idx ON release_events(user_id, triggered_at);
CREATE INDEX IF NOT EXISTS notification_logs_user_idx  ON notification_logs(user_id);
CREATE INDEX IF NOT EXISTS notification_logs_event_idx ON notification_logs(release_event_id);
CREATE INDEX IF NOT EXISTS obligations_user_idx   ON obligations(user_id, status);

PRAGMA user_version = 1;
";
