use crate::error::Result;
use crate::model::{AnalysisMode, Currency, Subscriber, SubscriberId, SubscriberPrefs};
use crate::store::{SubscriptionStore, DEFAULT_THRESHOLD};
use async_trait::async_trait;
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::path::Path;
use std::sync::Arc;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY,
        currency TEXT DEFAULT 'USD',
        analysis_mode TEXT DEFAULT 'AI',
        alert_percent REAL DEFAULT 3.0
    );
    CREATE TABLE IF NOT EXISTS subs (
        user_id INTEGER,
        coin TEXT,
        PRIMARY KEY (user_id, coin)
    );
";

/// Subscriber store on a single SQLite connection.
///
/// Queries run on tokio's blocking pool, one at a time behind the connection
/// lock.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened subscriber database {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || query(&mut conn.lock())).await?
    }

    fn ensure_user(conn: &Connection, id: SubscriberId) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO users (user_id) VALUES (?1)",
            params![id],
        )?;
        Ok(())
    }

    fn update_user(conn: &Connection, sql: &str, value: &dyn ToSql, id: SubscriberId) -> Result<()> {
        Self::ensure_user(conn, id)?;
        conn.execute(sql, params![value, id])?;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for SqliteStore {
    async fn list_subscribers(&self, pair: &str) -> Result<Vec<Subscriber>> {
        let pair = pair.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT u.user_id, u.currency, u.alert_percent
                 FROM subs s
                 JOIN users u ON u.user_id = s.user_id
                 WHERE s.coin = ?1
                 ORDER BY u.user_id",
            )?;
            let rows = stmt
                .query_map(params![pair], |row| {
                    let currency: Option<String> = row.get(1)?;
                    Ok(Subscriber {
                        id: row.get(0)?,
                        currency: Currency::from_code(&currency.unwrap_or_default()),
                        threshold_pct: row.get::<_, Option<f64>>(2)?.unwrap_or(DEFAULT_THRESHOLD),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn get_prefs(&self, id: SubscriberId) -> Result<SubscriberPrefs> {
        self.run(move |conn| {
            let row = conn
                .query_row(
                    "SELECT currency, analysis_mode, alert_percent FROM users WHERE user_id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, Option<String>>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, Option<f64>>(2)?,
                        ))
                    },
                )
                .optional()?;

            let defaults = SubscriberPrefs::default();
            match row {
                Some((currency, mode, threshold)) => Ok(SubscriberPrefs {
                    currency: currency.map_or(defaults.currency, |c| Currency::from_code(&c)),
                    analysis_mode: mode.map_or(defaults.analysis_mode, |m| AnalysisMode::from_code(&m)),
                    threshold_pct: threshold.unwrap_or(defaults.threshold_pct),
                }),
                None => {
                    Self::ensure_user(conn, id)?;
                    Ok(defaults)
                }
            }
        })
        .await
    }

    async fn toggle_subscription(&self, id: SubscriberId, pair: &str) -> Result<bool> {
        let pair = pair.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            Self::ensure_user(&tx, id)?;
            let removed = tx.execute(
                "DELETE FROM subs WHERE user_id = ?1 AND coin = ?2",
                params![id, pair],
            )?;
            if removed == 0 {
                tx.execute(
                    "INSERT INTO subs (user_id, coin) VALUES (?1, ?2)",
                    params![id, pair],
                )?;
            }
            tx.commit()?;
            Ok(removed == 0)
        })
        .await
    }

    async fn subscriptions(&self, id: SubscriberId) -> Result<Vec<String>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare("SELECT coin FROM subs WHERE user_id = ?1 ORDER BY coin")?;
            let coins = stmt
                .query_map(params![id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(coins)
        })
        .await
    }

    async fn set_currency(&self, id: SubscriberId, currency: Currency) -> Result<()> {
        self.run(move |conn| {
            Self::update_user(
                conn,
                "UPDATE users SET currency = ?1 WHERE user_id = ?2",
                &currency.code(),
                id,
            )
        })
        .await
    }

    async fn set_analysis_mode(&self, id: SubscriberId, mode: AnalysisMode) -> Result<()> {
        self.run(move |conn| {
            Self::update_user(
                conn,
                "UPDATE users SET analysis_mode = ?1 WHERE user_id = ?2",
                &mode.code(),
                id,
            )
        })
        .await
    }

    async fn set_threshold(&self, id: SubscriberId, threshold_pct: f64) -> Result<()> {
        self.run(move |conn| {
            Self::update_user(
                conn,
                "UPDATE users SET alert_percent = ?1 WHERE user_id = ?2",
                &threshold_pct,
                id,
            )
        })
        .await
    }
}
