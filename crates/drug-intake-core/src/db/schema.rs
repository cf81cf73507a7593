//! SQLite schema definition.

/// Written to `PRAGMA user_version` once the schema is applied.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete database schema for drug-intake.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Drug Reference
-- ============================================================================

CREATE TABLE IF NOT EXISTS drug_reference (
    name TEXT PRIMARY KEY,
    drug_type TEXT NOT NULL,
    max_daily_dose REAL NOT NULL CHECK (max_daily_dose > 0),
    unit TEXT NOT NULL DEFAULT 'mg',
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Intake Events (Append-Only - Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS intake_events (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,       -- insertion order
    event_id TEXT NOT NULL UNIQUE,
    patient_id TEXT NOT NULL CHECK (length(trim(patient_id)) > 0),
    drug_name TEXT NOT NULL,
    dose REAL NOT NULL CHECK (dose >= 0),
    timestamp TEXT NOT NULL,                     -- RFC 3339 with original offset
    drug_type TEXT NOT NULL,                     -- resolved at append time
    unit TEXT NOT NULL,                          -- resolved at append time
    recorded_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TRIGGER IF NOT EXISTS intake_events_no_update BEFORE UPDATE ON intake_events
BEGIN
    SELECT RAISE(ABORT, 'Intake events are append-only');
END;

CREATE TRIGGER IF NOT EXISTS intake_events_no_delete BEFORE DELETE ON intake_events
BEGIN
    SELECT RAISE(ABORT, 'Intake events are append-only');
END;

CREATE INDEX IF NOT EXISTS idx_intake_patient ON intake_events(patient_id);
CREATE INDEX IF NOT EXISTS idx_intake_drug ON intake_events(drug_name);
"#;
