//! Cluster/server persistence.
//!
//! Schema (both tables dropped and recreated on every run):
//!
//! ```text
//! cluster: id | name        | subdomain
//!          1  | Los Angeles | la
//!
//! server:  id | friendly_name | cluster_id | ip_string
//!          1  | something-1   | 1          | 123.123.123.123
//! ```
//!
//! `server.cluster_id` is a plain integer column. Referential consistency is
//! kept by the seeder (a cluster is always inserted before its servers), not
//! by a foreign key constraint.

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, Postgres};
use sqlx::{Connection, Transaction};
use std::net::Ipv4Addr;
use tracing::debug;

use crate::error::{Result, SeedError};

/// Statements run by [`ClusterStore::reset_schema`], in order.
pub const SCHEMA: [&str; 4] = [
    "DROP TABLE IF EXISTS cluster",
    r#"
    CREATE TABLE IF NOT EXISTS cluster (
        id SERIAL PRIMARY KEY,
        name VARCHAR(20) NOT NULL,
        subdomain VARCHAR(5) NOT NULL
    )
    "#,
    "DROP TABLE IF EXISTS server",
    r#"
    CREATE TABLE IF NOT EXISTS server (
        id SERIAL PRIMARY KEY,
        friendly_name VARCHAR(30) NOT NULL,
        cluster_id INTEGER NOT NULL,
        ip_string VARCHAR(16) NOT NULL
    )
    "#,
];

const INSERT_CLUSTER: &str = "INSERT INTO cluster (name, subdomain) VALUES ($1, $2) RETURNING id";

const INSERT_SERVER: &str =
    "INSERT INTO server (friendly_name, cluster_id, ip_string) VALUES ($1, $2, $3) RETURNING id";

/// Write side of the seeding run.
#[async_trait]
pub trait ClusterStore: Send {
    /// Drop and recreate the `cluster` and `server` tables.
    async fn reset_schema(&mut self) -> Result<()>;

    /// Insert a cluster, returning its generated id.
    async fn insert_cluster(&mut self, name: &str, subdomain: &str) -> Result<i32>;

    /// Insert a server under `cluster_id`, returning its generated id.
    async fn insert_server(
        &mut self,
        friendly_name: &str,
        cluster_id: i32,
        ip: Ipv4Addr,
    ) -> Result<i32>;

    /// Make everything written so far durable.
    async fn commit(&mut self) -> Result<()>;

    /// Discard everything written since the store was opened.
    async fn rollback(&mut self) -> Result<()>;
}

/// [`ClusterStore`] over a single Postgres transaction.
///
/// Schema changes run inside the same transaction as the inserts. Postgres
/// DDL is transactional, so a run that fails before
/// [`ClusterStore::commit`] leaves the previous tables untouched. Once
/// committed or rolled back, every further call fails with
/// [`SeedError::TransactionClosed`].
pub struct PgStore<'c> {
    tx: Option<Transaction<'c, Postgres>>,
}

impl<'c> PgStore<'c> {
    /// Open a transaction on `conn`.
    pub async fn begin(conn: &'c mut PgConnection) -> Result<Self> {
        let tx = conn.begin().await?;
        Ok(Self { tx: Some(tx) })
    }

    fn tx(&mut self) -> Result<&mut Transaction<'c, Postgres>> {
        self.tx.as_mut().ok_or(SeedError::TransactionClosed)
    }
}

#[async_trait]
impl<'c> ClusterStore for PgStore<'c> {
    async fn reset_schema(&mut self) -> Result<()> {
        let tx = self.tx()?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut **tx).await?;
        }
        debug!("recreated cluster and server tables");
        Ok(())
    }

    async fn insert_cluster(&mut self, name: &str, subdomain: &str) -> Result<i32> {
        let id = sqlx::query_scalar::<_, i32>(INSERT_CLUSTER)
            .bind(name)
            .bind(subdomain)
            .fetch_one(&mut **self.tx()?)
            .await?;
        Ok(id)
    }

    async fn insert_server(
        &mut self,
        friendly_name: &str,
        cluster_id: i32,
        ip: Ipv4Addr,
    ) -> Result<i32> {
        let id = sqlx::query_scalar::<_, i32>(INSERT_SERVER)
            .bind(friendly_name)
            .bind(cluster_id)
            .bind(ip.to_string())
            .fetch_one(&mut **self.tx()?)
            .await?;
        Ok(id)
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(SeedError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(SeedError::TransactionClosed)?;
        tx.rollback().await?;
        Ok(())
    }
}

/// Server version string, as reported by `SELECT version()`.
pub async fn server_version(conn: &mut PgConnection) -> Result<String> {
    let version = sqlx::query_scalar::<_, String>("SELECT version()")
        .fetch_one(conn)
        .await?;
    Ok(version)
}

/// Row counts after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SeedSummary {
    /// Rows in `cluster`.
    pub clusters: i64,
    /// Rows in `server`.
    pub servers: i64,
    /// Servers whose `cluster_id` matches no cluster.
    pub orphaned_servers: i64,
}

/// Count rows and referentially orphaned servers.
pub async fn summarize(conn: &mut PgConnection) -> Result<SeedSummary> {
    let summary = sqlx::query_as::<_, SeedSummary>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM cluster) AS clusters,
            (SELECT COUNT(*) FROM server) AS servers,
            (SELECT COUNT(*)
               FROM server A
               LEFT JOIN cluster B ON A.cluster_id = B.id
              WHERE B.id IS NULL) AS orphaned_servers
        "#,
    )
    .fetch_one(conn)
    .await?;
    Ok(summary)
}

/// A server joined with its cluster.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ServerRow {
    /// Server id.
    pub server_id: i32,
    /// Server IPv4 address as stored.
    pub server_ip: String,
    /// Server friendly name.
    pub server_name: String,
    /// Owning cluster id.
    pub cluster_id: i32,
    /// Owning cluster name.
    pub cluster_name: String,
    /// Owning cluster subdomain.
    pub cluster_subdomain: String,
}

/// All servers with their cluster, ordered by server id. Logged per cluster
/// at debug after a successful commit.
pub async fn list_servers(conn: &mut PgConnection) -> Result<Vec<ServerRow>> {
    let rows = sqlx::query_as::<_, ServerRow>(
        r#"
        SELECT A.id AS server_id,
               A.ip_string AS server_ip,
               A.friendly_name AS server_name,
               A.cluster_id AS cluster_id,
               B.name AS cluster_name,
               B.subdomain AS cluster_subdomain
          FROM server A
          JOIN cluster B ON A.cluster_id = B.id
         ORDER BY A.id
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_drops_before_creates() {
        assert!(SCHEMA[0].starts_with("DROP TABLE IF EXISTS cluster"));
        assert!(SCHEMA[1].contains("CREATE TABLE IF NOT EXISTS cluster"));
        assert!(SCHEMA[2].starts_with("DROP TABLE IF EXISTS server"));
        assert!(SCHEMA[3].contains("CREATE TABLE IF NOT EXISTS server"));
    }

    #[test]
    fn test_schema_column_widths() {
        assert!(SCHEMA[1].contains("name VARCHAR(20) NOT NULL"));
        assert!(SCHEMA[1].contains("subdomain VARCHAR(5) NOT NULL"));
        assert!(SCHEMA[3].contains("friendly_name VARCHAR(30) NOT NULL"));
        assert!(SCHEMA[3].contains("ip_string VARCHAR(16) NOT NULL"));
    }

    #[test]
    fn test_server_table_has_no_foreign_key() {
        assert!(!SCHEMA[3].contains("REFERENCES"));
    }
}
