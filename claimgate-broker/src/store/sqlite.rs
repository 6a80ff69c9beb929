//! SQLite-based registry and session storage

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use claimgate_core::store::StoreResult as RegistryResult;
use claimgate_core::{AccountId, AuthError, Login, LoginId, OpenIdCase, RegistryStore};

use super::{SessionId, SessionStore, StoreResult};
use crate::error::BrokerError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

fn db_err(e: rusqlite::Error) -> AuthError {
    AuthError::Store(e.to_string())
}

/// SQLite-backed store implementing both the core `RegistryStore` and the
/// broker's `SessionStore`.
///
/// The connection mutex serializes all statements, which also gives the
/// compare-and-set address updates and at-most-once code consumption their
/// required atomicity within one process.
pub struct SqliteRegistry {
    conn: Mutex<Connection>,
}

impl SqliteRegistry {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, BrokerError> {
        let conn =
            Connection::open(path).map_err(|e| BrokerError::Internal(e.to_string()))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), BrokerError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, BrokerError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(|e| BrokerError::Internal(e.to_string()))
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), BrokerError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Account id allocator; rows are never reused or deleted
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL
            );

            -- Login identities, one current claim each
            CREATE TABLE IF NOT EXISTS logins (
                claimed_id TEXT PRIMARY KEY,
                display_id TEXT NOT NULL,
                account INTEGER,
                address TEXT,
                confirmed INTEGER NOT NULL DEFAULT 0,
                credible INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_logins_account ON logins(account);

            -- Email addresses and their account assignment
            CREATE TABLE IF NOT EXISTS addresses (
                address TEXT PRIMARY KEY,
                account INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_addresses_account ON addresses(account);

            -- Live confirmation codes
            CREATE TABLE IF NOT EXISTS confirmation_codes (
                code TEXT PRIMARY KEY,
                address TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            -- Server-side sessions
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                loginid TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(())
    }
}

impl RegistryStore for SqliteRegistry {
    fn note_openid(&self, case: &OpenIdCase) -> RegistryResult<LoginId> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO logins (claimed_id, display_id) VALUES (?1, ?2)
             ON CONFLICT(claimed_id) DO NOTHING",
            params![case.claimed_id, case.display_id],
        )
        .map_err(db_err)?;

        Ok(LoginId(case.claimed_id.clone()))
    }

    fn get_login(&self, loginid: &LoginId) -> RegistryResult<Login> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT display_id, account, address, confirmed, credible
             FROM logins WHERE claimed_id = ?1",
            params![loginid.0],
            |row| {
                let display_id: String = row.get(0)?;
                let account: Option<i64> = row.get(1)?;
                let address: Option<String> = row.get(2)?;
                let confirmed: i32 = row.get(3)?;
                let credible: i32 = row.get(4)?;
                Ok(Login {
                    id: loginid.clone(),
                    display_id,
                    account: account.map(|a| AccountId(a as u64)),
                    address,
                    confirmed: confirmed != 0,
                    credible: credible != 0,
                })
            },
        )
        .optional()
        .map_err(db_err)?
        .ok_or_else(|| AuthError::Store(format!("unknown login {loginid}")))
    }

    fn loginids(&self, account: AccountId) -> RegistryResult<Vec<LoginId>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT claimed_id FROM logins WHERE account = ?1")
            .map_err(db_err)?;

        let ids = stmt
            .query_map(params![account.0 as i64], |row| {
                row.get::<_, String>(0).map(LoginId)
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        Ok(ids)
    }

    fn account(&self, loginid: &LoginId) -> RegistryResult<Option<AccountId>> {
        let conn = self.conn.lock().unwrap();

        let account: Option<Option<i64>> = conn
            .query_row(
                "SELECT account FROM logins WHERE claimed_id = ?1",
                params![loginid.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        Ok(account.flatten().map(|a| AccountId(a as u64)))
    }

    fn set_account(&self, loginid: &LoginId, account: AccountId) -> RegistryResult<()> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE logins SET account = ?2 WHERE claimed_id = ?1",
                params![loginid.0, account.0 as i64],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(AuthError::Store(format!("unknown login {loginid}")));
        }
        Ok(())
    }

    fn create_account(&self, loginid: &LoginId) -> RegistryResult<AccountId> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO accounts (created_at) VALUES (?1)",
            params![Utc::now().to_rfc3339()],
        )
        .map_err(db_err)?;
        let account = AccountId(conn.last_insert_rowid() as u64);

        let changed = conn
            .execute(
                "UPDATE logins SET account = ?2 WHERE claimed_id = ?1",
                params![loginid.0, account.0 as i64],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(AuthError::Store(format!("unknown login {loginid}")));
        }
        Ok(account)
    }

    fn set_address(&self, loginid: &LoginId, address: &str, credible: bool) -> RegistryResult<()> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE logins
                    SET confirmed = CASE WHEN address IS ?2 THEN confirmed ELSE 0 END,
                        credible  = CASE WHEN address IS ?2 THEN (credible OR ?3) ELSE ?3 END,
                        address   = ?2
                  WHERE claimed_id = ?1",
                params![loginid.0, address, credible as i32],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(AuthError::Store(format!("unknown login {loginid}")));
        }
        Ok(())
    }

    fn is_free_address(&self, address: &str) -> RegistryResult<bool> {
        let conn = self.conn.lock().unwrap();

        let assigned: Option<Option<i64>> = conn
            .query_row(
                "SELECT account FROM addresses WHERE address = ?1",
                params![address],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        Ok(assigned.flatten().is_none())
    }

    fn assign(&self, address: &str, account: AccountId) -> RegistryResult<bool> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR IGNORE INTO addresses (address, account) VALUES (?1, NULL)",
            params![address],
        )
        .map_err(db_err)?;

        // Compare-and-set: only a free address takes the assignment
        let changed = conn
            .execute(
                "UPDATE addresses SET account = ?2 WHERE address = ?1 AND account IS NULL",
                params![address, account.0 as i64],
            )
            .map_err(db_err)?;

        Ok(changed == 1)
    }

    fn assigned_account(&self, address: &str) -> RegistryResult<Option<AccountId>> {
        let conn = self.conn.lock().unwrap();

        let assigned: Option<Option<i64>> = conn
            .query_row(
                "SELECT account FROM addresses WHERE address = ?1",
                params![address],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        Ok(assigned.flatten().map(|a| AccountId(a as u64)))
    }

    fn add_address(&self, account: AccountId, address: &str) -> RegistryResult<bool> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR IGNORE INTO addresses (address, account) VALUES (?1, NULL)",
            params![address],
        )
        .map_err(db_err)?;

        let changed = conn
            .execute(
                "UPDATE addresses SET account = ?2 WHERE address = ?1 AND account IS NULL",
                params![address, account.0 as i64],
            )
            .map_err(db_err)?;
        if changed == 1 {
            return Ok(true);
        }

        let owner: Option<i64> = conn
            .query_row(
                "SELECT account FROM addresses WHERE address = ?1",
                params![address],
                |row| row.get(0),
            )
            .map_err(db_err)?;

        Ok(owner == Some(account.0 as i64))
    }

    fn save_confirmation_code(
        &self,
        code: &str,
        address: &str,
        ttl: Duration,
    ) -> RegistryResult<()> {
        let conn = self.conn.lock().unwrap();

        // Expired codes behave as absent; drop them before inserting so
        // the uniqueness constraint only applies to live codes
        conn.execute(
            "DELETE FROM confirmation_codes WHERE expires_at < ?1",
            params![Utc::now().to_rfc3339()],
        )
        .map_err(db_err)?;

        conn.execute(
            "INSERT INTO confirmation_codes (code, address, expires_at) VALUES (?1, ?2, ?3)",
            params![code, address, (Utc::now() + ttl).to_rfc3339()],
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn confirm_email(&self, loginid: &LoginId, code: &str) -> RegistryResult<Option<String>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(db_err)?;

        let pending: Option<(String, String)> = tx
            .query_row(
                "SELECT address, expires_at FROM confirmation_codes WHERE code = ?1",
                params![code],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(db_err)?;

        let Some((address, expires_at)) = pending else {
            return Ok(None);
        };

        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|dt| dt.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            tx.execute(
                "DELETE FROM confirmation_codes WHERE code = ?1",
                params![code],
            )
            .map_err(db_err)?;
            tx.commit().map_err(db_err)?;
            return Ok(None);
        }

        // The code only proves ownership of the identity's current claim
        let changed = tx
            .execute(
                "UPDATE logins SET confirmed = 1, credible = 1
                  WHERE claimed_id = ?1 AND address = ?2",
                params![loginid.0, address],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Ok(None);
        }

        tx.execute(
            "DELETE FROM confirmation_codes WHERE code = ?1",
            params![code],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(Some(address))
    }
}

impl SessionStore for SqliteRegistry {
    fn create(&self) -> StoreResult<SessionId> {
        let conn = self.conn.lock().unwrap();
        let id = SessionId(Uuid::new_v4().to_string());

        conn.execute(
            "INSERT INTO sessions (id, loginid, created_at) VALUES (?1, NULL, ?2)",
            params![id.0, Utc::now().to_rfc3339()],
        )
        .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(id)
    }

    fn loginid(&self, id: &SessionId) -> StoreResult<Option<LoginId>> {
        let conn = self.conn.lock().unwrap();

        let loginid: Option<Option<String>> = conn
            .query_row(
                "SELECT loginid FROM sessions WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(loginid.flatten().map(LoginId))
    }

    fn set_loginid(&self, id: &SessionId, loginid: Option<&LoginId>) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE sessions SET loginid = ?2 WHERE id = ?1",
            params![id.0, loginid.map(|l| l.0.clone())],
        )
        .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(())
    }

    fn exists(&self, id: &SessionId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        let found: Option<i32> = conn
            .query_row(
                "SELECT 1 FROM sessions WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(found.is_some())
    }

    fn delete(&self, id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute("DELETE FROM sessions WHERE id = ?1", params![id.0])
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(())
    }
}
