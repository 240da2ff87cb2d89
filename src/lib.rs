//! Cluster test data - seeds a Postgres database with synthetic cluster/server
//! topology and optionally publishes matching A records to Route53.
//!
//! This is a one-shot batch utility. Every run:
//!
//! 1. loads the YAML configuration,
//! 2. opens one database connection and one transaction,
//! 3. drops and recreates the `cluster` and `server` tables,
//! 4. inserts nine randomized clusters with one to four servers each,
//! 5. inserts two predictable clusters for downstream tests,
//! 6. commits once, then closes the connection.
//!
//! With `--aws`, each cluster's servers are published as a single A record
//! set `<subdomain>.<hosted zone>` right after they are inserted.
//!
//! ## Predictable fixtures
//!
//! ```text
//! Test Cluster 1 (test1): srv1 192.168.42.1, srv2 192.168.42.2, srv3 192.168.42.3
//! Test Cluster 2 (test2): tsrv1 192.16.42.1, tsrv2 192.16.42.2
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use cluster_testdata::{config, seeder, Options};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let options = Options::parse_from_args(["cluster-testdata", "-c", "heroku.yml"]).unwrap();
//!     let config = config::load(&options.config).unwrap();
//!     let report = seeder::run(&config, &options).await.unwrap();
//!     println!("{} clusters", report.clusters.len());
//! }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod fixtures;
pub mod seeder;
pub mod store;
pub mod telemetry;

// Re-export main types
pub use cli::Options;
pub use config::{AwsConfig, Config, DatabaseConfig};
pub use dns::{RecordPublisher, Route53Publisher};
pub use error::SeedError;
pub use seeder::SeedReport;
pub use store::{ClusterStore, PgStore};
