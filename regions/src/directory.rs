use crate::errors::{RegionError, Result};
use crate::source::RegionSource;
use crate::types::Region;
use std::cmp::Reverse;
use std::sync::Arc;

/// The ordered, validated clusters of one region group.
///
/// The first entry is always the default cluster. Built once at startup and
/// never mutated afterwards.
#[derive(Debug)]
pub struct RegionDirectory {
    name: String,
    regions: Vec<Arc<Region>>,
}

impl RegionDirectory {
    /// Fetches the records for `name` from `source` and validates them.
    pub async fn load(name: &str, source: &dyn RegionSource) -> Result<Self> {
        let records = source.fetch(name).await?;
        tracing::debug!(
            name,
            source = source.kind(),
            records = records.len(),
            "fetched region records"
        );
        Self::from_records(name, records)
    }

    /// Orders records default-first and checks the directory invariants.
    ///
    /// The sort is stable, so standby clusters keep the order the source
    /// returned them in.
    pub fn from_records(name: &str, mut records: Vec<Region>) -> Result<Self> {
        records.sort_by_key(|r| Reverse(r.is_default));

        for record in &records {
            record.validate()?;
        }

        let first = records
            .first()
            .ok_or_else(|| RegionError::Empty(name.to_string()))?;
        if !first.is_default {
            return Err(RegionError::NoDefault(name.to_string()));
        }

        let defaults = records.iter().filter(|r| r.is_default).count();
        if defaults > 1 {
            return Err(RegionError::MultipleDefaults {
                name: name.to_string(),
                count: defaults,
            });
        }

        Ok(RegionDirectory {
            name: name.to_string(),
            regions: records.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All clusters, default first.
    pub fn all_regions(&self) -> &[Arc<Region>] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Finds the cluster whose gateway endpoint renders to `prefix`.
    pub fn find_by_gateway(&self, prefix: &str) -> Option<&Arc<Region>> {
        self.regions.iter().find(|r| r.gateway.prefix() == prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_region;

    #[test]
    fn test_default_sorted_first() {
        let records = vec![
            test_region("aws-us-west-2", "standby-1.example.com", false),
            test_region("aws-us-west-2", "default.example.com", true),
            test_region("aws-us-west-2", "standby-2.example.com", false),
        ];

        let directory = RegionDirectory::from_records("aws-us-west-2", records).unwrap();
        let hosts: Vec<_> = directory
            .all_regions()
            .iter()
            .map(|r| r.gateway.host.as_str())
            .collect();

        assert_eq!(
            hosts,
            vec![
                "default.example.com",
                "standby-1.example.com",
                "standby-2.example.com"
            ]
        );
        assert_eq!(directory.len(), 3);
        assert_eq!(directory.name(), "aws-us-west-2");
    }

    #[test]
    fn test_invariant_errors() {
        assert!(matches!(
            RegionDirectory::from_records("ali-cn-beijing", vec![]),
            Err(RegionError::Empty(_))
        ));

        let no_default = vec![test_region("ali-cn-beijing", "a.example.com", false)];
        assert!(matches!(
            RegionDirectory::from_records("ali-cn-beijing", no_default),
            Err(RegionError::NoDefault(_))
        ));

        let two_defaults = vec![
            test_region("ali-cn-beijing", "a.example.com", true),
            test_region("ali-cn-beijing", "b.example.com", true),
        ];
        assert!(matches!(
            RegionDirectory::from_records("ali-cn-beijing", two_defaults),
            Err(RegionError::MultipleDefaults { count: 2, .. })
        ));

        let mut invalid = test_region("ali-cn-beijing", "b.example.com", false);
        invalid.gateway.port.http = 0;
        let records = vec![test_region("ali-cn-beijing", "a.example.com", true), invalid];
        assert!(matches!(
            RegionDirectory::from_records("ali-cn-beijing", records),
            Err(RegionError::ZeroHttpPort("gateway"))
        ));
    }

    #[test]
    fn test_find_by_gateway() {
        let records = vec![
            test_region("aws-us-west-2", "default.example.com", true),
            test_region("aws-us-west-2", "standby.example.com", false),
        ];
        let directory = RegionDirectory::from_records("aws-us-west-2", records).unwrap();

        let region = directory
            .find_by_gateway("http://standby.example.com:8080")
            .unwrap();
        assert_eq!(region.label(), "standby");
        assert!(directory.find_by_gateway("http://other:8080").is_none());
    }
}
