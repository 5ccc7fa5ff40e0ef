//! Database schema and operations

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::models::{SpecTable, Tier, TierCraftSpec};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Per-tier crafting data
        CREATE TABLE IF NOT EXISTS tier_specs (
            tier TEXT PRIMARY KEY,
            rank INTEGER NOT NULL,
            primary_cost INTEGER NOT NULL DEFAULT 0,
            secondary_cost INTEGER NOT NULL DEFAULT 0,
            craft_duration_hours REAL NOT NULL DEFAULT 0
        );

        -- Badges consumed to craft one badge of a tier, one row per item
        CREATE TABLE IF NOT EXISTS tier_components (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tier TEXT NOT NULL,
            component_tier TEXT NOT NULL,
            position INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tier_components_tier ON tier_components(tier);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a tier together with its component list
pub fn upsert_tier_spec(conn: &Connection, tier: Tier, spec: &TierCraftSpec) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT OR REPLACE INTO tier_specs (tier, rank, primary_cost, secondary_cost, craft_duration_hours)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            tier.name(),
            tier.rank() as i64,
            i64::try_from(spec.primary_cost).context("primary cost out of range")?,
            i64::try_from(spec.secondary_cost).context("secondary cost out of range")?,
            spec.craft_duration_hours,
        ),
    )?;

    tx.execute("DELETE FROM tier_components WHERE tier = ?1", [tier.name()])?;
    for (position, component) in spec.component_tiers.iter().enumerate() {
        tx.execute(
            "INSERT INTO tier_components (tier, component_tier, position)
             VALUES (?1, ?2, ?3)",
            (tier.name(), component.name(), position as i64),
        )?;
    }

    tx.commit()?;
    tracing::debug!(tier = %tier, components = spec.component_tiers.len(), "stored tier spec");
    Ok(())
}

/// Clear all tier data (for re-import)
pub fn clear_specs(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM tier_components;
        DELETE FROM tier_specs;
        "#,
    )?;
    Ok(())
}

/// Get the components of a tier in stored order
pub fn get_components(conn: &Connection, tier: Tier) -> Result<Vec<Tier>> {
    let mut stmt = conn.prepare(
        "SELECT component_tier FROM tier_components WHERE tier = ?1 ORDER BY position",
    )?;

    let rows = stmt.query_map([tier.name()], |row| row.get::<_, String>(0))?;

    let mut results = Vec::new();
    for row in rows {
        let name = row?;
        let component: Tier = name
            .parse()
            .with_context(|| format!("bad component of {}", tier))?;
        results.push(component);
    }
    Ok(results)
}

/// Load all stored tiers, ordered by rank
pub fn load_spec_entries(conn: &Connection) -> Result<Vec<(Tier, TierCraftSpec)>> {
    let mut stmt = conn.prepare(
        "SELECT tier, primary_cost, secondary_cost, craft_duration_hours
         FROM tier_specs ORDER BY rank",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, f64>(3)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (name, primary, secondary, hours) = row?;
        let tier: Tier = name.parse()?;
        let spec = TierCraftSpec {
            primary_cost: u64::try_from(primary)
                .with_context(|| format!("negative primary cost for {}", tier))?,
            secondary_cost: u64::try_from(secondary)
                .with_context(|| format!("negative secondary cost for {}", tier))?,
            component_tiers: get_components(conn, tier)?,
            craft_duration_hours: hours,
        };
        results.push((tier, spec));
    }
    Ok(results)
}

/// Load the full spec table, or None if nothing has been stored yet
///
/// Tiers that were never stored are filled in as "no data yet".
pub fn load_table(conn: &Connection) -> Result<Option<SpecTable>> {
    let mut entries = load_spec_entries(conn)?;
    if entries.is_empty() {
        return Ok(None);
    }

    for tier in Tier::ALL {
        if !entries.iter().any(|(t, _)| *t == tier) {
            tracing::warn!("No data stored for {}, treating it as unavailable", tier);
            entries.push((tier, TierCraftSpec::default()));
        }
    }

    let table = SpecTable::from_entries(entries).context("stored tier data is invalid")?;
    Ok(Some(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_specs;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn empty_store_has_no_table() {
        let conn = memory_db();
        assert!(load_table(&conn).unwrap().is_none());
    }

    #[test]
    fn sample_table_survives_storage() {
        let conn = memory_db();
        for (tier, spec) in sample_specs() {
            upsert_tier_spec(&conn, tier, &spec).unwrap();
        }

        let stored = load_table(&conn).unwrap().unwrap();
        let expected = SpecTable::from_entries(sample_specs()).unwrap();
        assert_eq!(stored, expected);
    }

    #[test]
    fn upsert_replaces_components() {
        let conn = memory_db();
        let mut spec = TierCraftSpec {
            primary_cost: 475,
            secondary_cost: 113,
            component_tiers: vec![Tier::Common, Tier::Common],
            craft_duration_hours: 24.0,
        };
        upsert_tier_spec(&conn, Tier::Uncommon, &spec).unwrap();

        spec.component_tiers = vec![Tier::Common, Tier::Common, Tier::Common];
        upsert_tier_spec(&conn, Tier::Uncommon, &spec).unwrap();

        assert_eq!(get_components(&conn, Tier::Uncommon).unwrap().len(), 3);
        assert_eq!(load_spec_entries(&conn).unwrap().len(), 1);
    }

    #[test]
    fn partial_store_fills_missing_tiers() {
        let conn = memory_db();
        let common = TierCraftSpec {
            primary_cost: 1347,
            secondary_cost: 0,
            component_tiers: Vec::new(),
            craft_duration_hours: 12.0,
        };
        upsert_tier_spec(&conn, Tier::Common, &common).unwrap();

        let table = load_table(&conn).unwrap().unwrap();
        assert_eq!(table.get(Tier::Common), &common);
        assert!(table.get(Tier::Rare).is_incomplete());
        assert!(table.get(Tier::Celestial).component_tiers.is_empty());
    }

    #[test]
    fn invalid_store_is_rejected() {
        let conn = memory_db();
        let bad = TierCraftSpec {
            primary_cost: 10,
            component_tiers: vec![Tier::Rare],
            ..TierCraftSpec::default()
        };
        upsert_tier_spec(&conn, Tier::Common, &bad).unwrap();
        let err = load_table(&conn).unwrap_err();
        assert!(err.to_string().contains("stored tier data is invalid"));
    }

    #[test]
    fn clear_removes_everything() {
        let conn = memory_db();
        for (tier, spec) in sample_specs() {
            upsert_tier_spec(&conn, tier, &spec).unwrap();
        }
        clear_specs(&conn).unwrap();
        assert!(load_spec_entries(&conn).unwrap().is_empty());
        assert!(get_components(&conn, Tier::Rare).unwrap().is_empty());
    }
}
