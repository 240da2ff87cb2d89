//! Route53 publishing of per-cluster A records.

use async_trait::async_trait;
use aws_sdk_route53::config::Credentials;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client;
use hickory_proto::rr::Name;
use std::net::Ipv4Addr;
use tracing::{debug, info};

use crate::config::AwsConfig;
use crate::error::{Result, SeedError};

/// Comment attached to every change batch.
pub const CHANGE_COMMENT: &str = "Automated";

/// Publishes one A record set per cluster.
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    /// Create `<subdomain>.<zone domain>` pointing at `ips`.
    async fn publish(&self, subdomain: &str, ips: &[Ipv4Addr]) -> Result<()>;
}

/// Build a Route53 client with the static credentials from configuration.
pub async fn client(aws: &AwsConfig) -> Client {
    let credentials = Credentials::new(
        aws.aws_access_key_id.clone(),
        aws.aws_secret_access_key.clone(),
        None,
        None,
        "cluster-testdata-config",
    );

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(aws.region.clone()))
        .credentials_provider(credentials)
        .load()
        .await;

    Client::new(&sdk_config)
}

/// Resolve the hosted zone id for `domain`.
pub async fn get_zone(client: &Client, domain: &str) -> Result<String> {
    debug!(domain, "listing hosted zones");
    let output = client
        .list_hosted_zones_by_name()
        .dns_name(domain)
        .send()
        .await
        .map_err(|e| SeedError::Dns(DisplayErrorContext(&e).to_string()))?;

    // Results are ordered by name starting at `domain`; the first one is not
    // necessarily a match.
    output
        .hosted_zones()
        .iter()
        .find(|zone| same_domain(zone.name(), domain))
        .map(|zone| zone.id().to_string())
        .ok_or_else(|| SeedError::ZoneNotFound(domain.to_string()))
}

/// Create one A record set named `<subdomain>.<domain>` holding all `ips`.
pub async fn add_record(
    client: &Client,
    zone_id: &str,
    ips: &[Ipv4Addr],
    domain: &str,
    subdomain: &str,
    ttl: i64,
) -> Result<()> {
    let name = record_name(subdomain, domain)?;
    debug!(zone_id, name = %name, count = ips.len(), "adding A records");

    let batch = change_batch(record_set(&name, ips, ttl)?)?;
    client
        .change_resource_record_sets()
        .hosted_zone_id(zone_id)
        .change_batch(batch)
        .send()
        .await
        .map_err(|e| SeedError::Dns(DisplayErrorContext(&e).to_string()))?;

    Ok(())
}

/// `<subdomain>.<domain>`, validated as a DNS name.
pub fn record_name(subdomain: &str, domain: &str) -> Result<String> {
    let name = format!("{}.{}", subdomain, domain.trim_end_matches('.'));
    Name::from_ascii(&name).map_err(|source| SeedError::InvalidName {
        name: name.clone(),
        source,
    })?;
    Ok(name)
}

/// A record set for `name` with one resource record per address.
pub fn record_set(name: &str, ips: &[Ipv4Addr], ttl: i64) -> Result<ResourceRecordSet> {
    if ips.is_empty() {
        return Err(SeedError::Dns(format!("no addresses to publish for {}", name)));
    }

    let records = ips
        .iter()
        .map(|ip| ResourceRecord::builder().value(ip.to_string()).build())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(build_error)?;

    ResourceRecordSet::builder()
        .name(name)
        .r#type(RrType::A)
        .ttl(ttl)
        .set_resource_records(Some(records))
        .build()
        .map_err(build_error)
}

/// Single CREATE change for `set`, tagged with [`CHANGE_COMMENT`].
pub fn change_batch(set: ResourceRecordSet) -> Result<ChangeBatch> {
    let change = Change::builder()
        .action(ChangeAction::Create)
        .resource_record_set(set)
        .build()
        .map_err(build_error)?;

    ChangeBatch::builder()
        .comment(CHANGE_COMMENT)
        .changes(change)
        .build()
        .map_err(build_error)
}

fn build_error(e: aws_sdk_route53::error::BuildError) -> SeedError {
    SeedError::Dns(e.to_string())
}

fn same_domain(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// [`RecordPublisher`] bound to one Route53 hosted zone.
#[derive(Debug, Clone)]
pub struct Route53Publisher {
    client: Client,
    zone_id: String,
    domain: String,
    ttl: i64,
}

impl Route53Publisher {
    /// Build a client and resolve the configured hosted zone.
    pub async fn connect(aws: &AwsConfig) -> Result<Self> {
        info!("Connecting to Route53...");
        let client = client(aws).await;
        let zone_id = get_zone(&client, &aws.hosted_zone).await?;
        info!(zone_id = %zone_id, domain = %aws.hosted_zone, "resolved hosted zone");

        Ok(Self {
            client,
            zone_id,
            domain: aws.hosted_zone.clone(),
            ttl: aws.ttl,
        })
    }
}

#[async_trait]
impl RecordPublisher for Route53Publisher {
    async fn publish(&self, subdomain: &str, ips: &[Ipv4Addr]) -> Result<()> {
        add_record(
            &self.client,
            &self.zone_id,
            ips,
            &self.domain,
            subdomain,
            self.ttl,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_name() {
        assert_eq!(record_name("test1", "example.com").unwrap(), "test1.example.com");
        assert_eq!(record_name("us", "example.com.").unwrap(), "us.example.com");
    }

    #[test]
    fn test_record_name_rejects_oversized_label() {
        let err = record_name(&"a".repeat(64), "example.com").unwrap_err();
        assert!(matches!(err, SeedError::InvalidName { .. }));
    }

    #[test]
    fn test_record_set_holds_all_ips() {
        let ips = [Ipv4Addr::new(192, 168, 42, 1), Ipv4Addr::new(192, 168, 42, 2)];
        let set = record_set("test1.example.com", &ips, 60).unwrap();

        assert_eq!(set.name(), "test1.example.com");
        assert_eq!(set.r#type(), &RrType::A);
        assert_eq!(set.ttl(), Some(60));
        let values: Vec<&str> = set.resource_records().iter().map(|r| r.value()).collect();
        assert_eq!(values, ["192.168.42.1", "192.168.42.2"]);
    }

    #[test]
    fn test_record_set_requires_ips() {
        let err = record_set("test1.example.com", &[], 60).unwrap_err();
        assert!(matches!(err, SeedError::Dns(_)));
    }

    #[test]
    fn test_change_batch_is_single_create() {
        let set = record_set("test2.example.com", &[Ipv4Addr::new(192, 16, 42, 1)], 60).unwrap();
        let batch = change_batch(set).unwrap();

        assert_eq!(batch.comment(), Some(CHANGE_COMMENT));
        assert_eq!(batch.changes().len(), 1);
        assert_eq!(batch.changes()[0].action(), &ChangeAction::Create);
    }

    #[test]
    fn test_same_domain_ignores_trailing_dot_and_case() {
        assert!(same_domain("Example.com.", "example.com"));
        assert!(!same_domain("sub.example.com.", "example.com"));
    }
}
