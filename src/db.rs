use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    migrate::Migrator,
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Sqlite, SqliteConnection, SqlitePool,
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let db = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(db)
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    MIGRATOR.run(db).await.context("run migrations")?;
    Ok(())
}

/// Single-connection in-memory database with the schema applied.
/// The connection is never recycled, since closing it drops the data.
pub async fn connect_memory() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("open in-memory database")?;
    migrate(&db).await?;
    Ok(db)
}

/// Transaction opened with `BEGIN IMMEDIATE`. SQLite hands out the write lock
/// before the first read, so concurrent writers queue on the busy timeout
/// instead of failing when a read lock cannot be upgraded.
///
/// Dropping it unfinished closes the connection, which rolls the transaction
/// back, rather than returning it to the pool mid-transaction.
pub struct WriteTx {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTx {
    pub async fn begin(db: &SqlitePool) -> anyhow::Result<Self> {
        let mut conn = db.acquire().await.context("acquire connection")?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .context("begin write transaction")?;
        Ok(Self { conn: Some(conn) })
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        // only emptied by commit, rollback and drop, which all consume the transaction
        self.conn
            .as_deref_mut()
            .expect("write transaction holds its connection until finished")
    }

    pub async fn commit(mut self) -> anyhow::Result<()> {
        self.finish("COMMIT").await.context("commit write transaction")
    }

    pub async fn rollback(mut self) -> anyhow::Result<()> {
        self.finish("ROLLBACK")
            .await
            .context("roll back write transaction")
    }

    async fn finish(&mut self, statement: &str) -> anyhow::Result<()> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        if let Err(e) = sqlx::query(statement).execute(&mut *conn).await {
            drop(conn.detach());
            return Err(e.into());
        }
        Ok(())
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            drop(conn.detach());
        }
    }
}
