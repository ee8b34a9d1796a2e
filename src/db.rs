use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

const DB_PATH: &str = "data/guestlist.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS categories (
            id         INTEGER PRIMARY KEY,
            name       TEXT NOT NULL UNIQUE COLLATE NOCASE,
            side       TEXT NOT NULL DEFAULT 'unspecified'
                       CHECK(side IN ('bride','groom','both','unspecified')),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS tiers (
            id         INTEGER PRIMARY KEY,
            name       TEXT NOT NULL UNIQUE,
            position   INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS households (
            id               INTEGER PRIMARY KEY,
            name             TEXT NOT NULL,
            guest_count      INTEGER NOT NULL CHECK(guest_count >= 1),
            category_id      INTEGER NOT NULL REFERENCES categories(id),
            tier_id          INTEGER NOT NULL REFERENCES tiers(id),
            rsvp_probability INTEGER CHECK(rsvp_probability BETWEEN 0 AND 100),
            created_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_households_category ON households(category_id);
        CREATE INDEX IF NOT EXISTS idx_households_tier ON households(tier_id);

        CREATE TABLE IF NOT EXISTS events (
            id         INTEGER PRIMARY KEY,
            name       TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS event_selections (
            event_id    INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES categories(id),
            tier_id     INTEGER NOT NULL REFERENCES tiers(id),
            UNIQUE(event_id, category_id, tier_id)
        );
        CREATE INDEX IF NOT EXISTS idx_selections_event ON event_selections(event_id);
        ",
    )?;
    Ok(())
}

/// Seed the default tiers and categories on an empty database, mirroring a
/// fresh planning setup. Returns whether anything was inserted.
pub fn seed_defaults(conn: &Connection) -> Result<bool> {
    let mut seeded = false;

    let tier_count: usize = conn.query_row("SELECT COUNT(*) FROM tiers", [], |r| r.get(0))?;
    if tier_count == 0 {
        for (i, name) in ["T1", "T2", "T3"].iter().enumerate() {
            conn.execute(
                "INSERT INTO tiers (name, position) VALUES (?1, ?2)",
                rusqlite::params![name, i as i64],
            )?;
        }
        seeded = true;
    }

    let category_count: usize =
        conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    if category_count == 0 {
        let defaults = [
            ("Bride's family", "bride"),
            ("Bride's friends", "bride"),
            ("Groom's family", "groom"),
            ("Groom's friends", "groom"),
        ];
        for (name, side) in defaults {
            conn.execute(
                "INSERT INTO categories (name, side) VALUES (?1, ?2)",
                rusqlite::params![name, side],
            )?;
        }
        seeded = true;
    }

    Ok(seeded)
}

// ── Categories ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub side: String,
}

pub fn fetch_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, side FROM categories ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                side: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Case-insensitive lookup (the name column is COLLATE NOCASE).
pub fn find_category(conn: &Connection, name: &str) -> Result<Option<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, side FROM categories WHERE name = ?1")?;
    let mut rows = stmt.query_map([name.trim()], |row| {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            side: row.get(2)?,
        })
    })?;
    Ok(rows.next().transpose()?)
}

pub fn insert_category(conn: &Connection, name: &str, side: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO categories (name, side) VALUES (?1, ?2)",
        rusqlite::params![name.trim(), side],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Create several categories in one transaction, returning the new rows in
/// input order.
pub fn insert_categories(conn: &Connection, names: &[String]) -> Result<Vec<Category>> {
    let tx = conn.unchecked_transaction()?;
    let mut created = Vec::with_capacity(names.len());
    {
        let mut stmt =
            tx.prepare("INSERT INTO categories (name, side) VALUES (?1, 'unspecified')")?;
        for name in names {
            stmt.execute([name.trim()])?;
            created.push(Category {
                id: tx.last_insert_rowid(),
                name: name.trim().to_string(),
                side: "unspecified".to_string(),
            });
        }
    }
    tx.commit()?;
    Ok(created)
}

pub fn delete_category(conn: &Connection, id: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM categories WHERE id = ?1", [id])?)
}

// ── Tiers ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier {
    pub id: i64,
    pub name: String,
    pub position: i64,
}

pub fn fetch_tiers(conn: &Connection) -> Result<Vec<Tier>> {
    let mut stmt = conn.prepare("SELECT id, name, position FROM tiers ORDER BY position, id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Tier {
                id: row.get(0)?,
                name: row.get(1)?,
                position: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_tier(conn: &Connection, name: &str) -> Result<Option<Tier>> {
    let mut stmt = conn.prepare("SELECT id, name, position FROM tiers WHERE name = ?1")?;
    let mut rows = stmt.query_map([name.trim()], |row| {
        Ok(Tier {
            id: row.get(0)?,
            name: row.get(1)?,
            position: row.get(2)?,
        })
    })?;
    Ok(rows.next().transpose()?)
}

pub fn insert_tier(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO tiers (name, position)
         VALUES (?1, (SELECT COALESCE(MAX(position) + 1, 0) FROM tiers))",
        [name.trim()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Move a tier to a new slot (0-based) and renumber the rest.
pub fn move_tier(conn: &Connection, tier_id: i64, new_position: usize) -> Result<()> {
    let tiers = fetch_tiers(conn)?;
    let mut ids: Vec<i64> = tiers.iter().map(|t| t.id).collect();
    let from = ids
        .iter()
        .position(|&id| id == tier_id)
        .ok_or_else(|| anyhow::anyhow!("tier id {} not found", tier_id))?;
    let id = ids.remove(from);
    let to = new_position.min(ids.len());
    ids.insert(to, id);

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("UPDATE tiers SET position = ?1 WHERE id = ?2")?;
        for (pos, id) in ids.iter().enumerate() {
            stmt.execute(rusqlite::params![pos as i64, id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Households ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: i64,
    pub name: String,
    pub guest_count: u32,
    pub category_id: i64,
    pub tier_id: i64,
    pub rsvp_probability: Option<u32>,
}

pub struct NewHousehold {
    pub name: String,
    pub guest_count: u32,
    pub category_id: i64,
    pub tier_id: i64,
    pub rsvp_probability: Option<u32>,
}

/// Household joined with its category and tier names, for listing/export.
pub struct HouseholdDetail {
    pub id: i64,
    pub name: String,
    pub guest_count: u32,
    pub category: String,
    pub tier: String,
    pub rsvp_probability: Option<u32>,
}

pub fn fetch_households(conn: &Connection) -> Result<Vec<Household>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, guest_count, category_id, tier_id, rsvp_probability
         FROM households ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Household {
                id: row.get(0)?,
                name: row.get(1)?,
                guest_count: row.get(2)?,
                category_id: row.get(3)?,
                tier_id: row.get(4)?,
                rsvp_probability: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_household_details(
    conn: &Connection,
    category: Option<&str>,
) -> Result<Vec<HouseholdDetail>> {
    let base = "SELECT h.id, h.name, h.guest_count, c.name, t.name, h.rsvp_probability
         FROM households h
         JOIN categories c ON c.id = h.category_id
         JOIN tiers t ON t.id = h.tier_id";
    let map = |row: &rusqlite::Row<'_>| {
        Ok(HouseholdDetail {
            id: row.get(0)?,
            name: row.get(1)?,
            guest_count: row.get(2)?,
            category: row.get(3)?,
            tier: row.get(4)?,
            rsvp_probability: row.get(5)?,
        })
    };
    let rows = match category {
        Some(name) => {
            let sql = format!("{} WHERE c.name = ?1 ORDER BY h.id", base);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([name.trim()], map)?.collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let sql = format!("{} ORDER BY h.id", base);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], map)?.collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

pub fn insert_household(conn: &Connection, h: &NewHousehold) -> Result<i64> {
    conn.execute(
        "INSERT INTO households (name, guest_count, category_id, tier_id, rsvp_probability)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![h.name, h.guest_count, h.category_id, h.tier_id, h.rsvp_probability],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a whole import batch in one transaction. Any failure rolls the
/// entire batch back, so a partially imported list can never persist.
pub fn insert_households(conn: &Connection, rows: &[NewHousehold]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO households (name, guest_count, category_id, tier_id, rsvp_probability)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for h in rows {
            stmt.execute(rusqlite::params![
                h.name,
                h.guest_count,
                h.category_id,
                h.tier_id,
                h.rsvp_probability
            ])?;
        }
    }
    tx.commit()?;
    Ok(rows.len())
}

pub fn delete_household(conn: &Connection, id: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM households WHERE id = ?1", [id])?)
}

// ── Events ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
}

/// One selected category×tier cell of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub event_id: i64,
    pub category_id: i64,
    pub tier_id: i64,
}

pub fn fetch_events(conn: &Connection) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare("SELECT id, name FROM events ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Event {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_event(conn: &Connection, name: &str) -> Result<Option<Event>> {
    let mut stmt = conn.prepare("SELECT id, name FROM events WHERE name = ?1")?;
    let mut rows = stmt.query_map([name.trim()], |row| {
        Ok(Event {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    Ok(rows.next().transpose()?)
}

pub fn insert_event(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO events (name) VALUES (?1)", [name.trim()])?;
    Ok(conn.last_insert_rowid())
}

pub fn add_selection(conn: &Connection, event_id: i64, category_id: i64, tier_id: i64) -> Result<usize> {
    Ok(conn.execute(
        "INSERT OR IGNORE INTO event_selections (event_id, category_id, tier_id)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![event_id, category_id, tier_id],
    )?)
}

pub fn fetch_selections(conn: &Connection, event_id: i64) -> Result<Vec<Selection>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, category_id, tier_id FROM event_selections WHERE event_id = ?1",
    )?;
    let rows = stmt
        .query_map([event_id], |row| {
            Ok(Selection {
                event_id: row.get(0)?,
                category_id: row.get(1)?,
                tier_id: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_all_selections(conn: &Connection) -> Result<Vec<Selection>> {
    let mut stmt = conn.prepare("SELECT event_id, category_id, tier_id FROM event_selections")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Selection {
                event_id: row.get(0)?,
                category_id: row.get(1)?,
                tier_id: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Snapshot (backup/restore) ──

/// Full database contents, used by JSON backup export and restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub categories: Vec<Category>,
    pub tiers: Vec<Tier>,
    pub households: Vec<Household>,
    pub events: Vec<Event>,
    pub selections: Vec<Selection>,
}

pub fn export_snapshot(conn: &Connection) -> Result<Snapshot> {
    Ok(Snapshot {
        categories: fetch_categories(conn)?,
        tiers: fetch_tiers(conn)?,
        households: fetch_households(conn)?,
        events: fetch_events(conn)?,
        selections: fetch_all_selections(conn)?,
    })
}

/// Replace all data with the snapshot's contents in one transaction.
/// Foreign keys stay enforced, so a snapshot with dangling references
/// aborts without touching existing data.
pub fn import_snapshot(conn: &Connection, snap: &Snapshot) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM event_selections;
         DELETE FROM events;
         DELETE FROM households;
         DELETE FROM tiers;
         DELETE FROM categories;",
    )?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO categories (id, name, side) VALUES (?1, ?2, ?3)")?;
        for c in &snap.categories {
            stmt.execute(rusqlite::params![c.id, c.name, c.side])?;
        }
        let mut stmt = tx.prepare("INSERT INTO tiers (id, name, position) VALUES (?1, ?2, ?3)")?;
        for t in &snap.tiers {
            stmt.execute(rusqlite::params![t.id, t.name, t.position])?;
        }
        let mut stmt = tx.prepare(
            "INSERT INTO households (id, name, guest_count, category_id, tier_id, rsvp_probability)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for h in &snap.households {
            stmt.execute(rusqlite::params![
                h.id,
                h.name,
                h.guest_count,
                h.category_id,
                h.tier_id,
                h.rsvp_probability
            ])?;
        }
        let mut stmt = tx.prepare("INSERT INTO events (id, name) VALUES (?1, ?2)")?;
        for e in &snap.events {
            stmt.execute(rusqlite::params![e.id, e.name])?;
        }
        let mut stmt = tx.prepare(
            "INSERT INTO event_selections (event_id, category_id, tier_id) VALUES (?1, ?2, ?3)",
        )?;
        for s in &snap.selections {
            stmt.execute(rusqlite::params![s.event_id, s.category_id, s.tier_id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Stats ──

pub struct Stats {
    pub categories: usize,
    pub tiers: usize,
    pub households: usize,
    pub guests: u32,
    pub events: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let categories: usize = conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    let tiers: usize = conn.query_row("SELECT COUNT(*) FROM tiers", [], |r| r.get(0))?;
    let households: usize = conn.query_row("SELECT COUNT(*) FROM households", [], |r| r.get(0))?;
    let guests: u32 = conn.query_row(
        "SELECT COALESCE(SUM(guest_count), 0) FROM households",
        [],
        |r| r.get(0),
    )?;
    let events: usize = conn.query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))?;
    Ok(Stats {
        categories,
        tiers,
        households,
        guests,
        events,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn seed_defaults_once() {
        let conn = test_conn();
        assert!(seed_defaults(&conn).unwrap());
        assert!(!seed_defaults(&conn).unwrap());
        assert_eq!(fetch_tiers(&conn).unwrap().len(), 3);
        assert_eq!(fetch_categories(&conn).unwrap().len(), 4);
    }

    #[test]
    fn category_lookup_is_case_insensitive() {
        let conn = test_conn();
        insert_category(&conn, "Friends", "both").unwrap();
        let found = find_category(&conn, "FRIENDS").unwrap().unwrap();
        assert_eq!(found.name, "Friends");
    }

    #[test]
    fn duplicate_category_rejected_case_insensitively() {
        let conn = test_conn();
        insert_category(&conn, "Friends", "both").unwrap();
        assert!(insert_category(&conn, "friends", "both").is_err());
    }

    #[test]
    fn household_batch_is_all_or_nothing() {
        let conn = test_conn();
        let cat = insert_category(&conn, "Friends", "both").unwrap();
        let tier = insert_tier(&conn, "T1").unwrap();
        let rows = vec![
            NewHousehold {
                name: "Bob".into(),
                guest_count: 1,
                category_id: cat,
                tier_id: tier,
                rsvp_probability: None,
            },
            NewHousehold {
                name: "Dangling".into(),
                guest_count: 2,
                category_id: 9999, // no such category
                tier_id: tier,
                rsvp_probability: None,
            },
        ];
        assert!(insert_households(&conn, &rows).is_err());
        assert_eq!(fetch_households(&conn).unwrap().len(), 0);
    }

    #[test]
    fn tier_positions_renumber_on_move() {
        let conn = test_conn();
        let t1 = insert_tier(&conn, "Must").unwrap();
        insert_tier(&conn, "Should").unwrap();
        insert_tier(&conn, "Maybe").unwrap();
        move_tier(&conn, t1, 2).unwrap();
        let names: Vec<String> = fetch_tiers(&conn).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Should", "Maybe", "Must"]);
    }

    #[test]
    fn snapshot_roundtrip() {
        let conn = test_conn();
        seed_defaults(&conn).unwrap();
        let cat = fetch_categories(&conn).unwrap()[0].id;
        let tier = fetch_tiers(&conn).unwrap()[0].id;
        insert_household(
            &conn,
            &NewHousehold {
                name: "Harry, Ginny".into(),
                guest_count: 2,
                category_id: cat,
                tier_id: tier,
                rsvp_probability: Some(90),
            },
        )
        .unwrap();
        let ev = insert_event(&conn, "Ceremony").unwrap();
        add_selection(&conn, ev, cat, tier).unwrap();

        let snap = export_snapshot(&conn).unwrap();

        let other = test_conn();
        import_snapshot(&other, &snap).unwrap();
        let restored = export_snapshot(&other).unwrap();
        assert_eq!(restored.categories.len(), snap.categories.len());
        assert_eq!(restored.households.len(), 1);
        assert_eq!(restored.households[0].guest_count, 2);
        assert_eq!(restored.selections.len(), 1);
    }
}
