//! Seeding run: schema reset, randomized clusters, predictable clusters,
//! optional DNS publishing, single commit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use std::net::Ipv4Addr;
use tracing::{debug, error, info, warn};

use crate::cli::Options;
use crate::config::Config;
use crate::dns::{RecordPublisher, Route53Publisher};
use crate::error::{Result, SeedError};
use crate::fixtures::{
    predictable_clusters, random_cluster, ClusterSpec, NameList, RANDOM_CLUSTER_COUNT,
};
use crate::store::{self, ClusterStore, PgStore};

/// A cluster as inserted, with generated ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededCluster {
    /// Generated cluster id.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// DNS label.
    pub subdomain: String,
    /// Servers in insertion order.
    pub servers: Vec<SeededServer>,
}

/// A server as inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededServer {
    /// Generated server id.
    pub id: i32,
    /// Friendly name.
    pub friendly_name: String,
    /// IPv4 address.
    pub ip: Ipv4Addr,
}

/// Everything inserted by one run, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Randomized clusters first, then the predictable ones.
    pub clusters: Vec<SeededCluster>,
}

impl SeedReport {
    /// Per cluster, the ordered server addresses (the batch published to DNS).
    pub fn ip_batches(&self) -> Vec<(&str, Vec<Ipv4Addr>)> {
        self.clusters
            .iter()
            .map(|c| (c.subdomain.as_str(), c.servers.iter().map(|s| s.ip).collect()))
            .collect()
    }

    /// Total servers across all clusters.
    pub fn server_count(&self) -> usize {
        self.clusters.iter().map(|c| c.servers.len()).sum()
    }
}

/// Reset the schema and insert all fixture data through `store`.
///
/// When a publisher is given, each cluster's record set is published right
/// after that cluster's servers are inserted. Nothing is committed here.
pub async fn populate<S, R>(
    store: &mut S,
    publisher: Option<&dyn RecordPublisher>,
    names: &NameList,
    rng: &mut R,
) -> Result<SeedReport>
where
    S: ClusterStore + ?Sized,
    R: Rng + ?Sized,
{
    store.reset_schema().await?;

    let mut report = SeedReport::default();

    info!("Creating random cluster data");
    for _ in 0..RANDOM_CLUSTER_COUNT {
        let spec = random_cluster(rng, names);
        report
            .clusters
            .push(insert_cluster(store, publisher, &spec).await?);
    }

    info!("Creating predictable cluster data for unit tests");
    for spec in predictable_clusters() {
        debug!(name = %spec.name, subdomain = %spec.subdomain, "adding cluster");
        report
            .clusters
            .push(insert_cluster(store, publisher, &spec).await?);
    }

    Ok(report)
}

async fn insert_cluster<S>(
    store: &mut S,
    publisher: Option<&dyn RecordPublisher>,
    spec: &ClusterSpec,
) -> Result<SeededCluster>
where
    S: ClusterStore + ?Sized,
{
    let cluster_id = store.insert_cluster(&spec.name, &spec.subdomain).await?;
    debug!(cluster_id, name = %spec.name, "created cluster");

    let mut servers = Vec::with_capacity(spec.servers.len());
    for server in &spec.servers {
        let server_id = store
            .insert_server(&server.friendly_name, cluster_id, server.ip)
            .await?;
        debug!(
            server_id,
            name = %server.friendly_name,
            ip = %server.ip,
            "added server"
        );
        servers.push(SeededServer {
            id: server_id,
            friendly_name: server.friendly_name.clone(),
            ip: server.ip,
        });
    }

    if let Some(publisher) = publisher {
        let ips: Vec<Ipv4Addr> = servers.iter().map(|s| s.ip).collect();
        publisher.publish(&spec.subdomain, &ips).await?;
    }

    Ok(SeededCluster {
        id: cluster_id,
        name: spec.name.clone(),
        subdomain: spec.subdomain.clone(),
        servers,
    })
}

/// Run the whole seeding pipeline against the configured database.
///
/// Failures are logged here. The database connection, once opened, is closed
/// on every path, and nothing is committed unless every step succeeded.
pub async fn run(config: &Config, options: &Options) -> Result<SeedReport> {
    info!("Starting {} ...", config.name);

    let result = connect_and_seed(config, options).await;
    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

async fn connect_and_seed(config: &Config, options: &Options) -> Result<SeedReport> {
    let names = NameList::load(&options.names).await?;
    debug!(path = %options.names.display(), count = names.len(), "loaded name list");

    info!("Connecting to PostgreSQL...");
    let mut conn = PgConnection::connect_with(&config.database.connect_options())
        .await
        .map_err(SeedError::Connection)?;

    let result = seed(&mut conn, config, options, &names).await;

    match conn.close().await {
        Ok(()) => debug!("Database connection closed"),
        Err(e) => warn!("Error closing database connection: {}", e),
    }

    result
}

async fn seed(
    conn: &mut PgConnection,
    config: &Config,
    options: &Options,
    names: &NameList,
) -> Result<SeedReport> {
    let version = store::server_version(conn).await?;
    debug!("PostgreSQL database version: {}", version);

    let route53 = if options.aws {
        Some(Route53Publisher::connect(&config.aws).await?)
    } else {
        None
    };

    let seed: u64 = rand::random();
    debug!(seed, "seeding fixture generator");
    let mut rng = StdRng::seed_from_u64(seed);

    let report = {
        let mut tx = PgStore::begin(conn).await?;
        seed_into(
            &mut tx,
            route53.as_ref().map(|p| p as &dyn RecordPublisher),
            options,
            names,
            &mut rng,
        )
        .await?
    };

    let summary = store::summarize(conn).await?;
    info!(
        clusters = summary.clusters,
        servers = summary.servers,
        orphaned_servers = summary.orphaned_servers,
        "committed test data"
    );
    for row in store::list_servers(conn).await? {
        debug!(
            cluster = %row.cluster_name,
            subdomain = %row.cluster_subdomain,
            server = %row.server_name,
            ip = %row.server_ip,
            "seeded server"
        );
    }

    Ok(report)
}

/// Populate `store` and finish its transaction: commit when every step
/// succeeded, roll back otherwise.
///
/// `publisher` is only used when `options.aws` is set.
pub async fn seed_into<S, R>(
    store: &mut S,
    publisher: Option<&dyn RecordPublisher>,
    options: &Options,
    names: &NameList,
    rng: &mut R,
) -> Result<SeedReport>
where
    S: ClusterStore + ?Sized,
    R: Rng + ?Sized,
{
    let publisher = if options.aws { publisher } else { None };
    if publisher.is_none() {
        debug!("DNS publishing disabled");
    }

    match populate(store, publisher, names, rng).await {
        Ok(report) => {
            store.commit().await?;
            Ok(report)
        }
        Err(e) => {
            if let Err(rollback) = store.rollback().await {
                warn!("Error rolling back transaction: {}", rollback);
            }
            Err(e)
        }
    }
}
