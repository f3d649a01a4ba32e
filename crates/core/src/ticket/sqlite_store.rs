//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Station, Ticket, TicketError, TicketFilter, TicketStatus, TicketStore};

const SELECT_COLUMNS: &str = "id, order_id, station, status, created_at, updated_at";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                order_id TEXT NOT NULL,
                station TEXT NOT NULL CHECK (station IN ('KITCHEN', 'BAR')),
                status TEXT NOT NULL
                    CHECK (status IN ('NEW', 'IN_PROGRESS', 'COMPLETED', 'RECALLED', 'CANCELLED')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (order_id, station)
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_station_created ON tickets(station, created_at);
            CREATE INDEX IF NOT EXISTS idx_tickets_order_id ON tickets(order_id);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("ticket store lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(station) = filter.station {
            conditions.push("station = ?");
            params.push(Box::new(station.as_str()));
        }

        if let Some(ref order_id) = filter.order_id {
            conditions.push("order_id = ?");
            params.push(Box::new(order_id.clone()));
        }

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        if filter.terminal_only {
            conditions.push("status IN ('COMPLETED', 'CANCELLED')");
        } else if !filter.include_terminal {
            conditions.push("status NOT IN ('COMPLETED', 'CANCELLED')");
        }

        if let Some(since) = filter.updated_since {
            conditions.push("updated_at >= ?");
            params.push(Box::new(timestamp(since)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: String = row.get(0)?;
        let order_id: String = row.get(1)?;
        let station_str: String = row.get(2)?;
        let status_str: String = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;

        let station = station_str.parse::<Station>().map_err(|e| conversion_error(2, e))?;
        let status = status_str
            .parse::<TicketStatus>()
            .map_err(|e| conversion_error(3, e))?;

        Ok(Ticket {
            id,
            order_id,
            station,
            status,
            created_at: parse_timestamp(4, &created_at_str)?,
            updated_at: parse_timestamp(5, &updated_at_str)?,
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Ticket>, TicketError> {
        conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    // Fixed-width so lexical order in SQL matches chronological order
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, order_id: &str, station: Station) -> Result<Ticket, TicketError> {
        let conn = self.lock()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = TicketStatus::New;

        conn.execute(
            "INSERT INTO tickets (id, order_id, station, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                id,
                order_id,
                station.as_str(),
                status.as_str(),
                timestamp(now),
                timestamp(now),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                TicketError::DuplicateFanout {
                    order_id: order_id.to_string(),
                    station,
                }
            } else {
                TicketError::Database(e.to_string())
            }
        })?;

        // Round-trip through the stored text so returned timestamps match later reads
        Self::fetch(&conn, &id)?.ok_or(TicketError::NotFound(id))
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.lock()?;
        Self::fetch(&conn, id)
    }

    fn find(&self, order_id: &str, station: Station) -> Result<Option<Ticket>, TicketError> {
        let conn = self.lock()?;

        conn.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE order_id = ? AND station = ?",
                SELECT_COLUMNS
            ),
            params![order_id, station.as_str()],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let order = if filter.newest_first {
            "created_at DESC, seq DESC"
        } else {
            "created_at ASC, seq ASC"
        };
        let sql = format!(
            "SELECT {} FROM tickets {} ORDER BY {} LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause, order
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn transition(
        &self,
        id: &str,
        expected: TicketStatus,
        next: TicketStatus,
    ) -> Result<Ticket, TicketError> {
        if !expected.can_transition_to(next) {
            return Err(TicketError::InvalidTransition {
                from: expected,
                to: next,
            });
        }

        let conn = self.lock()?;

        let updated = conn
            .execute(
                "UPDATE tickets SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![next.as_str(), timestamp(Utc::now()), id, expected.as_str()],
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if updated == 0 {
            return match Self::fetch(&conn, id)? {
                None => Err(TicketError::NotFound(id.to_string())),
                Some(current) => Err(TicketError::ConflictingTransition {
                    ticket_id: id.to_string(),
                    expected,
                    actual: current.status,
                }),
            };
        }

        Self::fetch(&conn, id)?.ok_or_else(|| TicketError::NotFound(id.to_string()))
    }

    fn delete_order(&self, order_id: &str) -> Result<usize, TicketError> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM tickets WHERE order_id = ?", params![order_id])
            .map_err(|e| TicketError::Database(e.to_string()))
    }
}
