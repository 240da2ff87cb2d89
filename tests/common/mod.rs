//! Shared test infrastructure for seeding integration tests.

#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use cluster_testdata::config::{AwsConfig, Config, DatabaseConfig};
use cluster_testdata::dns::RecordPublisher;
use cluster_testdata::error::{Result, SeedError};
use cluster_testdata::fixtures::NameList;
use cluster_testdata::store::ClusterStore;
use cluster_testdata::Options;

// --- Constants ---

pub const NAMES: &str = "Apollo\nBorealis\nCentaur\nDaedalus\nEris\n";

pub fn names() -> NameList {
    NameList::from_lines(NAMES).unwrap()
}

// --- MemoryStore ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRow {
    pub id: i32,
    pub name: String,
    pub subdomain: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRow {
    pub id: i32,
    pub friendly_name: String,
    pub cluster_id: i32,
    pub ip_string: String,
}

/// Both tables plus their SERIAL counters.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub clusters: Vec<ClusterRow>,
    pub servers: Vec<ServerRow>,
    next_cluster_id: i32,
    next_server_id: i32,
}

/// In-memory `ClusterStore` with transaction semantics: writes go to a
/// pending copy that only replaces `committed` on `commit()`. Rolling back
/// leaves `committed` as it was.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub committed: Tables,
    pending: Option<Tables>,
    /// Fail the Nth server insert (0-based) with a database error.
    pub fail_server_insert_at: Option<usize>,
    server_inserts: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_server_insert_at(attempt: usize) -> Self {
        Self {
            fail_server_insert_at: Some(attempt),
            ..Self::default()
        }
    }

    fn tables(&mut self) -> &mut Tables {
        let committed = &self.committed;
        self.pending.get_or_insert_with(|| committed.clone())
    }
}

#[async_trait]
impl ClusterStore for MemoryStore {
    async fn reset_schema(&mut self) -> Result<()> {
        *self.tables() = Tables::default();
        Ok(())
    }

    async fn insert_cluster(&mut self, name: &str, subdomain: &str) -> Result<i32> {
        let tables = self.tables();
        tables.next_cluster_id += 1;
        let id = tables.next_cluster_id;
        tables.clusters.push(ClusterRow {
            id,
            name: name.to_string(),
            subdomain: subdomain.to_string(),
        });
        Ok(id)
    }

    async fn insert_server(
        &mut self,
        friendly_name: &str,
        cluster_id: i32,
        ip: Ipv4Addr,
    ) -> Result<i32> {
        let attempt = self.server_inserts;
        self.server_inserts += 1;
        if self.fail_server_insert_at == Some(attempt) {
            return Err(SeedError::Database(sqlx::Error::RowNotFound));
        }

        let tables = self.tables();
        tables.next_server_id += 1;
        let id = tables.next_server_id;
        tables.servers.push(ServerRow {
            id,
            friendly_name: friendly_name.to_string(),
            cluster_id,
            ip_string: ip.to_string(),
        });
        Ok(id)
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            self.committed = pending;
        }
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.pending = None;
        self.rollbacks += 1;
        Ok(())
    }
}

// --- RecordingPublisher ---

/// Records every publish call; optionally fails the Nth one.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    calls: Mutex<Vec<(String, Vec<Ipv4Addr>)>>,
    pub fail_at: Option<usize>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<Ipv4Addr>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordPublisher for RecordingPublisher {
    async fn publish(&self, subdomain: &str, ips: &[Ipv4Addr]) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        if self.fail_at == Some(calls.len()) {
            return Err(SeedError::ZoneNotFound("example.com".to_string()));
        }
        calls.push((subdomain.to_string(), ips.to_vec()));
        Ok(())
    }
}

// --- Config builders ---

pub fn test_config(port: u16) -> Config {
    Config {
        name: "testdata".to_string(),
        loglevel: None,
        database: DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port,
            database: "dnskeeper".to_string(),
            user: "keeper".to_string(),
            password: "keeper".to_string(),
        },
        aws: AwsConfig {
            aws_access_key_id: "AKIDEXAMPLE".to_string(),
            aws_secret_access_key: "secret".to_string(),
            hosted_zone: "example.com".to_string(),
            region: "us-east-1".to_string(),
            ttl: 60,
        },
    }
}

pub fn test_options(names: PathBuf) -> Options {
    Options {
        debug: false,
        silent: true,
        config: PathBuf::from("heroku.yml"),
        aws: false,
        names,
    }
}

pub fn aws_options() -> Options {
    Options {
        aws: true,
        ..test_options(PathBuf::from("names.txt"))
    }
}
