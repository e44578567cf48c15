use super::{LineupStore, LineupTransaction, PersistenceError, PersistenceResult};
use crate::config::StoreConfig;
use crate::event::{Event, EventId};
use crate::performance::{Performance, PerformanceId};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub struct SqliteLineupStore {
    connection: Mutex<Connection>,
}

struct SqliteTransaction<'conn> {
    tx: Transaction<'conn>,
    event: Event,
}

impl LineupTransaction for SqliteTransaction<'_> {
    fn event(&self) -> &Event {
        &self.event
    }

    fn update_rank(
        &mut self,
        performance_id: PerformanceId,
        rank: Option<u32>,
    ) -> PersistenceResult<()> {
        let updated = self.tx.execute(
            "UPDATE performances SET lineup_rank = ?1 WHERE id = ?2 AND event_id = ?3",
            params![rank, to_sql_id(performance_id.0)?, to_sql_id(self.event.id.0)?],
        )?;
        if updated != 1 {
            return Err(PersistenceError::PerformanceNotFound(performance_id));
        }
        if let Some(performance) = self.event.performance_mut(performance_id) {
            performance.rank = rank;
        }
        Ok(())
    }
}

impl SqliteLineupStore {
    pub fn new<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn with_config(config: &StoreConfig) -> PersistenceResult<Self> {
        let store = Self::new(&config.sqlite_path)?;
        store.connection.lock().busy_timeout(config.busy_timeout())?;
        tracing::info!(path = %config.sqlite_path.display(), "opened sqlite lineup store");
        Ok(store)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                label TEXT NOT NULL,
                scheduling_enabled INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS performances (
                id INTEGER PRIMARY KEY,
                event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                artist_name TEXT NOT NULL,
                description TEXT,
                lineup_rank INTEGER,
                duration_seconds INTEGER,
                explicit_start TEXT
            );
            CREATE INDEX IF NOT EXISTS performances_event_rank
                ON performances (event_id, lineup_rank);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn read_event(conn: &Connection, event_id: EventId) -> PersistenceResult<Option<Event>> {
        let header = conn
            .query_row(
                "SELECT label, scheduling_enabled FROM events WHERE id = ?1",
                params![to_sql_id(event_id.0)?],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
            )
            .optional()?;
        let Some((label, scheduling_enabled)) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT id, title, artist_name, description, lineup_rank, duration_seconds, explicit_start
             FROM performances WHERE event_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![to_sql_id(event_id.0)?], |row| {
            Ok(PerformanceRow {
                id: row.get(0)?,
                title: row.get(1)?,
                artist_name: row.get(2)?,
                description: row.get(3)?,
                rank: row.get(4)?,
                duration_seconds: row.get(5)?,
                explicit_start: row.get(6)?,
            })
        })?;

        let mut performances = Vec::new();
        for row in rows {
            performances.push(row?.into_performance(event_id)?);
        }

        Ok(Some(Event {
            id: event_id,
            label,
            scheduling_enabled,
            performances,
        }))
    }

    /// Performance ids are global; one owned by another event is never moved.
    fn ensure_unclaimed(
        conn: &Connection,
        event_id: EventId,
        performance_id: PerformanceId,
    ) -> PersistenceResult<()> {
        let current = to_sql_id(event_id.0)?;
        let owner = conn
            .query_row(
                "SELECT event_id FROM performances WHERE id = ?1",
                params![to_sql_id(performance_id.0)?],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        match owner {
            Some(owner) if owner != current => {
                let owner = u64::try_from(owner).map_err(|_| {
                    PersistenceError::InvalidData(format!("negative event id {owner}"))
                })?;
                Err(PersistenceError::PerformanceOwnedElsewhere {
                    performance_id,
                    owner: EventId(owner),
                })
            }
            _ => Ok(()),
        }
    }

    fn write_performance(conn: &Connection, performance: &Performance) -> PersistenceResult<()> {
        conn.execute(
            "INSERT INTO performances
                (id, event_id, title, artist_name, description, lineup_rank, duration_seconds, explicit_start)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                event_id = excluded.event_id,
                title = excluded.title,
                artist_name = excluded.artist_name,
                description = excluded.description,
                lineup_rank = excluded.lineup_rank,
                duration_seconds = excluded.duration_seconds,
                explicit_start = excluded.explicit_start",
            params![
                to_sql_id(performance.id.0)?,
                to_sql_id(performance.event_id.0)?,
                performance.title,
                performance.artist_name,
                performance.description,
                performance.rank,
                performance.duration_seconds,
                performance
                    .explicit_start
                    .map(|start| start.format(TIMESTAMP_FORMAT).to_string()),
            ],
        )?;
        Ok(())
    }
}

struct PerformanceRow {
    id: i64,
    title: String,
    artist_name: String,
    description: Option<String>,
    rank: Option<u32>,
    duration_seconds: Option<u32>,
    explicit_start: Option<String>,
}

impl PerformanceRow {
    fn into_performance(self, event_id: EventId) -> PersistenceResult<Performance> {
        let id = u64::try_from(self.id).map_err(|_| {
            PersistenceError::InvalidData(format!("negative performance id {}", self.id))
        })?;
        let explicit_start = self
            .explicit_start
            .map(|raw| {
                NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|err| {
                    PersistenceError::InvalidData(format!(
                        "performance {id} has unreadable start time '{raw}': {err}"
                    ))
                })
            })
            .transpose()?;
        Ok(Performance {
            id: PerformanceId(id),
            event_id,
            title: self.title,
            artist_name: self.artist_name,
            description: self.description,
            rank: self.rank,
            duration_seconds: self.duration_seconds,
            explicit_start,
        })
    }
}

fn to_sql_id(id: u64) -> PersistenceResult<i64> {
    i64::try_from(id)
        .map_err(|_| PersistenceError::InvalidData(format!("id {id} exceeds sqlite range")))
}

impl LineupStore for SqliteLineupStore {
    fn load_event(&self, event_id: EventId) -> PersistenceResult<Option<Event>> {
        let conn = self.connection.lock();
        Self::read_event(&conn, event_id)
    }

    fn transaction<T, E, F>(&self, event_id: EventId, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LineupTransaction) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let mut conn = self.connection.lock();
        // Write lock is held before the lineup is read.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(PersistenceError::from)?;
        let event =
            Self::read_event(&tx, event_id)?.ok_or(PersistenceError::EventNotFound(event_id))?;

        let mut staged = SqliteTransaction { tx, event };
        let output = work(&mut staged)?;
        staged.tx.commit().map_err(PersistenceError::from)?;
        Ok(output)
    }

    fn save_event(&self, event: &Event) -> PersistenceResult<()> {
        super::validate_event(event)?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        let event_id = to_sql_id(event.id.0)?;
        tx.execute(
            "INSERT INTO events (id, label, scheduling_enabled) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                scheduling_enabled = excluded.scheduling_enabled",
            params![event_id, event.label, event.scheduling_enabled],
        )?;
        tx.execute("DELETE FROM performances WHERE event_id = ?1", params![event_id])?;
        for performance in &event.performances {
            Self::ensure_unclaimed(&tx, event.id, performance.id)?;
            Self::write_performance(&tx, performance)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_performance(&self, performance: &Performance) -> PersistenceResult<()> {
        super::validate_performance(performance)?;
        let conn = self.connection.lock();
        let exists = conn
            .query_row(
                "SELECT 1 FROM events WHERE id = ?1",
                params![to_sql_id(performance.event_id.0)?],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(PersistenceError::EventNotFound(performance.event_id));
        }
        Self::ensure_unclaimed(&conn, performance.event_id, performance.id)?;
        Self::write_performance(&conn, performance)
    }

    fn remove_performance(&self, performance_id: PerformanceId) -> PersistenceResult<bool> {
        let conn = self.connection.lock();
        let removed = conn.execute(
            "DELETE FROM performances WHERE id = ?1",
            params![to_sql_id(performance_id.0)?],
        )?;
        Ok(removed > 0)
    }
}
