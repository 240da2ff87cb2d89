//! Fixture data: the server-name word list, randomized clusters, and the
//! fixed clusters downstream tests assert against.

use fake::faker::address::en::{CityName, CountryCode};
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::error::{Result, SeedError};

/// Number of randomized clusters generated per run.
pub const RANDOM_CLUSTER_COUNT: usize = 9;

/// Inclusive bounds on servers per randomized cluster.
pub const MIN_SERVERS: usize = 1;
/// See [`MIN_SERVERS`].
pub const MAX_SERVERS: usize = 4;

/// Column widths of the schema.
pub const CLUSTER_NAME_MAX: usize = 20;
/// Subdomain column width.
pub const SUBDOMAIN_MAX: usize = 5;
/// Server name column width.
pub const SERVER_NAME_MAX: usize = 30;

/// A cluster to insert, with its servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    /// Display name.
    pub name: String,
    /// DNS label under the hosted zone.
    pub subdomain: String,
    /// Servers, in insertion order.
    pub servers: Vec<ServerSpec>,
}

/// A server to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    /// Friendly name.
    pub friendly_name: String,
    /// IPv4 address.
    pub ip: Ipv4Addr,
}

impl ServerSpec {
    fn new(friendly_name: &str, ip: [u8; 4]) -> Self {
        Self {
            friendly_name: friendly_name.to_string(),
            ip: Ipv4Addr::from(ip),
        }
    }
}

/// Server-name word list, one name per line.
#[derive(Debug, Clone)]
pub struct NameList {
    names: Vec<String>,
}

impl NameList {
    /// Read the whole word list into memory. Blank lines are skipped.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_lines(&contents).ok_or_else(|| SeedError::NameList(path.display().to_string()))
    }

    /// Build from in-memory text. `None` if there are no usable lines.
    pub fn from_lines(contents: &str) -> Option<Self> {
        let names: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false; an empty list cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Pick a random name.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        // from_lines guarantees at least one name
        self.names.choose(rng).map(String::as_str).unwrap_or_default()
    }
}

/// Generate one randomized cluster: a city name, a lowercase country code
/// as subdomain, and between [`MIN_SERVERS`] and [`MAX_SERVERS`] servers.
pub fn random_cluster<R: Rng + ?Sized>(rng: &mut R, names: &NameList) -> ClusterSpec {
    let city: String = CityName().fake_with_rng(rng);
    let country: String = CountryCode().fake_with_rng(rng);

    let count = rng.gen_range(MIN_SERVERS..=MAX_SERVERS);
    let servers = (1..=count)
        .map(|seq| {
            let base = names.pick(rng).to_lowercase();
            ServerSpec {
                friendly_name: server_name(&base, seq),
                ip: Ipv4Addr::from(rng.gen::<u32>()),
            }
        })
        .collect();

    ClusterSpec {
        name: truncate(&city, CLUSTER_NAME_MAX),
        subdomain: truncate(&country.to_lowercase(), SUBDOMAIN_MAX),
        servers,
    }
}

/// `<base>-<seq>`, keeping the suffix when the base has to be shortened.
fn server_name(base: &str, seq: usize) -> String {
    let suffix = format!("-{}", seq);
    let room = SERVER_NAME_MAX.saturating_sub(suffix.len());
    format!("{}{}", truncate(base, room), suffix)
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// The two fixed clusters inserted after the randomized ones.
pub fn predictable_clusters() -> Vec<ClusterSpec> {
    vec![
        ClusterSpec {
            name: "Test Cluster 1".to_string(),
            subdomain: "test1".to_string(),
            servers: vec![
                ServerSpec::new("srv1", [192, 168, 42, 1]),
                ServerSpec::new("srv2", [192, 168, 42, 2]),
                ServerSpec::new("srv3", [192, 168, 42, 3]),
            ],
        },
        ClusterSpec {
            name: "Test Cluster 2".to_string(),
            subdomain: "test2".to_string(),
            servers: vec![
                ServerSpec::new("tsrv1", [192, 16, 42, 1]),
                ServerSpec::new("tsrv2", [192, 16, 42, 2]),
            ],
        },
    ]
}
