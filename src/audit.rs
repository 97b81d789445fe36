//! Audit Log
//! Mission: Append-only record of security-relevant actions

use crate::auth::user_store::StoreError;
use axum::http::HeaderMap;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Kind of audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditAction {
    #[serde(rename = "CREATE")]
    Create,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "LOGIN")]
    Login,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Login => "LOGIN",
        }
    }
}

/// Where a request came from, as recorded in the audit trail.
#[derive(Debug, Clone, Default)]
pub struct RequestOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestOrigin {
    /// Extract the origin from request headers.
    ///
    /// The service runs behind a reverse proxy, so the client address comes
    /// from `X-Forwarded-For` (first hop) when present.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string());

        let user_agent = headers
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        Self {
            ip_address,
            user_agent,
        }
    }
}

/// A new entry to append.
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: String,
    pub user_id: Uuid,
    pub changes: Option<String>, // serialized change payload
    pub origin: RequestOrigin,
}

/// A stored entry.
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub user_id: String,
    pub changes: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

/// Append-only audit storage with SQLite backend.
///
/// Entries are written synchronously inside the request that performed the
/// audited action; a failed write fails that request. Nothing in the
/// application ever updates or deletes a row.
pub struct AuditStore {
    db_path: String,
}

impl AuditStore {
    /// Create the audit store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self, StoreError> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<(), StoreError> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL,
                entity TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                changes TEXT,
                ip_address TEXT,
                user_agent TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Append one entry. Single synchronous insert, no retries.
    pub fn append(&self, entry: NewAuditEntry) -> Result<(), StoreError> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "INSERT INTO audit_log (action, entity, entity_id, user_id, changes,
                                    ip_address, user_agent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.action.as_str(),
                entry.entity,
                entry.entity_id,
                entry.user_id.to_string(),
                entry.changes,
                entry.origin.ip_address,
                entry.origin.user_agent,
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!(
            action = entry.action.as_str(),
            entity = %entry.entity,
            entity_id = %entry.entity_id,
            "Audit entry recorded"
        );

        Ok(())
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<AuditEntry>, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, action, entity, entity_id, user_id, changes,
                    ip_address, user_agent, created_at
             FROM audit_log ORDER BY id DESC LIMIT ?1",
        )?;

        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    action: row.get(1)?,
                    entity: row.get(2)?,
                    entity_id: row.get(3)?,
                    user_id: row.get(4)?,
                    changes: row.get(5)?,
                    ip_address: row.get(6)?,
                    user_agent: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
