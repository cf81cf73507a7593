//! Drug reference database operations.

use rusqlite::params;

use super::{Database, DbResult};
use crate::models::DrugReferenceEntry;
use crate::reference::DrugReferenceTable;

impl Database {
    /// Insert or update a reference entry.
    pub fn upsert_reference_entry(&self, name: &str, entry: &DrugReferenceEntry) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO drug_reference (name, drug_type, max_daily_dose, unit, updated_at)
            VALUES (?1, ?2, ?3, ?4, datetime('now'))
            ON CONFLICT(name) DO UPDATE SET
                drug_type = excluded.drug_type,
                max_daily_dose = excluded.max_daily_dose,
                unit = excluded.unit,
                updated_at = datetime('now')
            "#,
            params![name, entry.drug_type, entry.max_daily_dose, entry.unit],
        )?;
        Ok(())
    }

    /// Save every entry of a reference table.
    pub fn save_reference_table(&self, table: &DrugReferenceTable) -> DbResult<()> {
        for (name, entry) in table.iter() {
            self.upsert_reference_entry(name, entry)?;
        }
        Ok(())
    }

    /// Load the stored reference table.
    pub fn load_reference_table(&self) -> DbResult<DrugReferenceTable> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, drug_type, max_daily_dose, unit
            FROM drug_reference
            ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                DrugReferenceEntry {
                    drug_type: row.get(1)?,
                    max_daily_dose: row.get(2)?,
                    unit: row.get(3)?,
                },
            ))
        })?;

        let mut table = DrugReferenceTable::new();
        for row in rows {
            let (name, entry) = row?;
            table.insert(name, entry)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let table = DrugReferenceTable::with_defaults();

        db.save_reference_table(&table).unwrap();
        let loaded = db.load_reference_table().unwrap();

        assert_eq!(loaded, table);
    }

    #[test]
    fn test_upsert_replaces() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_reference_entry("Aspirin", &DrugReferenceEntry::new("Painkiller", 4000.0, "mg"))
            .unwrap();
        db.upsert_reference_entry("Aspirin", &DrugReferenceEntry::new("Painkiller", 3000.0, "mg"))
            .unwrap();

        let loaded = db.load_reference_table().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.max_daily_dose("Aspirin"), 3000.0);
    }

    #[test]
    fn test_non_positive_max_rejected_by_schema() {
        let db = Database::open_in_memory().unwrap();

        assert!(db
            .upsert_reference_entry("Bad", &DrugReferenceEntry::new("X", 0.0, "mg"))
            .is_err());
    }
}
