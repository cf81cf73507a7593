//! Intake event database operations.

use chrono::DateTime;
use rusqlite::params;

use super::{Database, DbResult};
use crate::models::IntakeEvent;
use crate::store::IntakeStore;

impl Database {
    /// Append an intake event.
    pub fn insert_intake_event(&self, event: &IntakeEvent) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO intake_events (
                event_id, patient_id, drug_name, dose, timestamp, drug_type, unit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                event.event_id,
                event.patient_id,
                event.drug_name,
                event.dose,
                event.timestamp.to_rfc3339(),
                event.drug_type,
                event.unit,
            ],
        )?;
        Ok(())
    }

    /// Append several events in one transaction. Nothing is written if any insert fails.
    pub fn insert_intake_events(&mut self, events: &[IntakeEvent]) -> DbResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO intake_events (
                    event_id, patient_id, drug_name, dose, timestamp, drug_type, unit
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for event in events {
                stmt.execute(params![
                    event.event_id,
                    event.patient_id,
                    event.drug_name,
                    event.dose,
                    event.timestamp.to_rfc3339(),
                    event.drug_type,
                    event.unit,
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!(count = events.len(), "intake events persisted");
        Ok(events.len())
    }

    /// All events in insertion order.
    pub fn list_intake_events(&self) -> DbResult<Vec<IntakeEvent>> {
        self.query_events(
            r#"
            SELECT event_id, patient_id, drug_name, dose, timestamp, drug_type, unit
            FROM intake_events
            ORDER BY seq
            "#,
            [],
        )
    }

    /// Events for one patient in insertion order.
    pub fn list_intake_events_for_patient(&self, patient_id: &str) -> DbResult<Vec<IntakeEvent>> {
        self.query_events(
            r#"
            SELECT event_id, patient_id, drug_name, dose, timestamp, drug_type, unit
            FROM intake_events
            WHERE patient_id = ?
            ORDER BY seq
            "#,
            [patient_id],
        )
    }

    /// Number of stored events.
    pub fn count_intake_events(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM intake_events", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Restore every stored event into a store, keeping IDs, types and units.
    pub fn load_into(&self, store: &IntakeStore) -> DbResult<usize> {
        let events = self.list_intake_events()?;
        let count = events.len();
        for event in events {
            store.restore(event)?;
        }
        tracing::info!(count, "intake events loaded");
        Ok(count)
    }

    fn query_events<P: rusqlite::Params>(&self, sql: &str, params: P) -> DbResult<Vec<IntakeEvent>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(IntakeEventRow {
                event_id: row.get(0)?,
                patient_id: row.get(1)?,
                drug_name: row.get(2)?,
                dose: row.get(3)?,
                timestamp: row.get(4)?,
                drug_type: row.get(5)?,
                unit: row.get(6)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?.try_into()?);
        }
        Ok(events)
    }
}

/// Intermediate row struct for database mapping.
struct IntakeEventRow {
    event_id: String,
    patient_id: String,
    drug_name: String,
    dose: f64,
    timestamp: String,
    drug_type: String,
    unit: String,
}

impl TryFrom<IntakeEventRow> for IntakeEvent {
    type Error = super::DbError;

    fn try_from(row: IntakeEventRow) -> Result<Self, Self::Error> {
        Ok(IntakeEvent {
            event_id: row.event_id,
            patient_id: row.patient_id,
            drug_name: row.drug_name,
            dose: row.dose,
            timestamp: DateTime::parse_from_rfc3339(&row.timestamp)?,
            drug_type: row.drug_type,
            unit: row.unit,
        })
    }
}
