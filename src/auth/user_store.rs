//! User Storage
//! Mission: Persist user accounts and the approval lifecycle with SQLite

use crate::auth::models::{Role, User};
use crate::auth::password::hash_password;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use tracing::{info, warn};
use uuid::Uuid;

/// Typed storage failure.
///
/// Unique-constraint violations and missing rows surface as their own
/// variants so handlers can map them to 409/404 without sniffing driver
/// error codes.
#[derive(Debug)]
pub enum StoreError {
    Conflict,
    NotFound,
    Other(anyhow::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Conflict => write!(f, "Record already exists"),
            StoreError::NotFound => write!(f, "Record not found"),
            StoreError::Other(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                StoreError::Conflict
            }
            _ => StoreError::Other(err.into()),
        }
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Other(err)
    }
}

/// New account data for creation.
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize the schema.
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
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                is_approved INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_login TEXT
            )",
            [],
        )?;

        self.create_default_admin(&conn)?;

        Ok(())
    }

    /// Create the default administrator for initial setup.
    fn create_default_admin(&self, conn: &Connection) -> Result<(), StoreError> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'ADMIN_OEI'",
            [],
            |row| row.get(0),
        )?;

        if count == 0 {
            let password_hash = hash_password("admin123")?;

            conn.execute(
                "INSERT INTO users (id, email, username, password_hash, full_name, role,
                                    is_active, is_approved, created_at, last_login)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 1, ?7, NULL)",
                params![
                    Uuid::new_v4().to_string(),
                    "admin@oei.sv",
                    "admin",
                    password_hash,
                    "Administrador OEI",
                    Role::AdminOei.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            )?;

            info!("🔐 Default admin created (email: admin@oei.sv, password: admin123)");
            warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }

        Ok(())
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let id_str: String = row.get(0)?;
        let id = Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let role_str: String = row.get(5)?;

        Ok(User {
            id,
            email: row.get(1)?,
            username: row.get(2)?,
            password_hash: row.get(3)?,
            full_name: row.get(4)?,
            // Unknown role values fall back to read-only access
            role: Role::from_str(&role_str).unwrap_or(Role::Consulta),
            is_active: row.get(6)?,
            is_approved: row.get(7)?,
            created_at: row.get(8)?,
            last_login: row.get(9)?,
        })
    }

    const USER_COLUMNS: &'static str = "id, email, username, password_hash, full_name, role,
                                        is_active, is_approved, created_at, last_login";

    /// Look up a user by id. Returns `None` when the account does not exist.
    pub fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            Self::USER_COLUMNS
        ))?;

        match stmt.query_row(params![id.to_string()], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user by email.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE email = ?1",
            Self::USER_COLUMNS
        ))?;

        match stmt.query_row(params![email], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user by username.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE username = ?1",
            Self::USER_COLUMNS
        ))?;

        match stmt.query_row(params![username], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a new account in the pending-approval state.
    ///
    /// The password is hashed here; the plaintext is never stored. A
    /// duplicate email or username surfaces as `StoreError::Conflict`.
    pub fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let password_hash = hash_password(&new_user.password)?;

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            password_hash,
            full_name: new_user.full_name,
            role: new_user.role,
            is_active: false,
            is_approved: false,
            created_at: Utc::now().to_rfc3339(),
            last_login: None,
        };

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO users (id, email, username, password_hash, full_name, role,
                                is_active, is_approved, created_at, last_login)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.id.to_string(),
                user.email,
                user.username,
                user.password_hash,
                user.full_name,
                user.role.as_str(),
                user.is_active,
                user.is_approved,
                user.created_at,
                user.last_login,
            ],
        )?;

        info!(
            "✅ Registered user: {} ({}) - pending approval",
            user.email,
            user.role.as_str()
        );

        Ok(user)
    }

    /// List all users, newest first.
    pub fn list(&self) -> Result<Vec<User>, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            Self::USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Approve a pending account, activating it.
    pub fn approve(&self, id: &Uuid) -> Result<User, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        let rows = conn.execute(
            "UPDATE users SET is_approved = 1, is_active = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound);
        }

        info!("✅ Approved user: {}", id);
        self.find_by_id(id)?.ok_or(StoreError::NotFound)
    }

    /// Deactivate an account. All outstanding tokens stop working at the
    /// next request because the authentication gate re-checks this flag.
    pub fn deactivate(&self, id: &Uuid) -> Result<User, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        let rows = conn.execute(
            "UPDATE users SET is_active = 0 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound);
        }

        info!("🚫 Deactivated user: {}", id);
        self.find_by_id(id)?.ok_or(StoreError::NotFound)
    }

    /// Record a successful login.
    pub fn update_last_login(&self, id: &Uuid) -> Result<(), StoreError> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id.to_string()],
        )?;
        Ok(())
    }

    /// Replace a user's password hash.
    pub fn update_password(&self, id: &Uuid, password_hash: &str) -> Result<(), StoreError> {
        let conn = Connection::open(&self.db_path)?;
        let rows = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id.to_string()],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
