//! Import configuration: the `resources` document and its validated model.

mod schema;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::resource::{Category, ResourceKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find configuration file '{}', ensure it is present", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read configuration file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("no resources were defined in the configuration, did you mean to add \"all\"?")]
    NoResources,

    #[error("resources[{index}]: {message}")]
    Entry { index: usize, message: String },

    #[error("invalid configuration for '{resource}':\n{message}")]
    Schema { resource: String, message: String },
}

/// The document exactly as written: a single `resources` key holding
/// single-key mappings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    resources: Option<Vec<serde_yaml::Value>>,
}

/// Validated import configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportConfig {
    /// Supported entries in configuration order, one per kind.
    pub entries: Vec<ResourceEntry>,
    /// Names that are not supported and will not be imported.
    pub unsupported: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub kind: ResourceKind,
    pub conf: ResourceConf,
}

/// What was configured for one resource kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceConf {
    /// No value (or an empty list): import every resource of the kind.
    ImportAll,
    List(Vec<String>),
    Nested(Vec<NestedFilter>),
    Aws(Vec<AwsFilter>),
    Slack(Vec<SlackFilter>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NestedFilter {
    Ids(Vec<String>),
    Tags(Vec<String>),
    TagSets(Vec<TagSet>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagSet {
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AwsFilter {
    AccountIds(Vec<String>),
    Roles(Vec<String>),
    AccountRoles(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlackFilter {
    AccountNames(Vec<String>),
    AccountChannels(Vec<SlackChannels>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlackChannels {
    pub account: String,
    pub channels: Vec<String>,
}

impl NestedFilter {
    /// Configuration key, which is also the output sub-directory.
    pub fn key(&self) -> &'static str {
        match self {
            NestedFilter::Ids(_) => "ids",
            NestedFilter::Tags(_) => "tags",
            NestedFilter::TagSets(_) => "tagsets",
        }
    }
}

impl AwsFilter {
    pub fn key(&self) -> &'static str {
        match self {
            AwsFilter::AccountIds(_) => "aws_account_ids",
            AwsFilter::Roles(_) => "roles",
            AwsFilter::AccountRoles(_) => "account_role",
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            AwsFilter::AccountIds(v) | AwsFilter::Roles(v) | AwsFilter::AccountRoles(v) => v,
        }
    }
}

impl SlackFilter {
    pub fn key(&self) -> &'static str {
        match self {
            SlackFilter::AccountNames(_) => "slack_account_names",
            SlackFilter::AccountChannels(_) => "slack_account_channels",
        }
    }
}

impl ResourceConf {
    /// Sub-directory keys the import writes for this conf, in order.
    pub fn filter_keys(&self) -> Vec<&'static str> {
        let keys: Vec<&'static str> = match self {
            ResourceConf::ImportAll | ResourceConf::List(_) => Vec::new(),
            ResourceConf::Nested(filters) => filters.iter().map(NestedFilter::key).collect(),
            ResourceConf::Aws(filters) => filters.iter().map(AwsFilter::key).collect(),
            ResourceConf::Slack(filters) => filters.iter().map(SlackFilter::key).collect(),
        };
        let mut unique = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        unique
    }
}

impl ResourceEntry {
    /// Category the dispatcher files this entry under. A kind configured
    /// without filters is always imported unfiltered.
    pub fn category(&self) -> Category {
        match (self.kind.category(), &self.conf) {
            (Category::Global, _) => Category::Global,
            (_, ResourceConf::ImportAll) => Category::NoIdentifier,
            (category, _) => category,
        }
    }

    /// Whether the import of this entry is split into per-filter
    /// directories that `migrate` merges back together.
    pub fn writes_split_state(&self) -> bool {
        self.kind.is_migratable() && !matches!(self.conf, ResourceConf::ImportAll)
    }
}

impl ImportConfig {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Err(ConfigError::NoResources);
        }
        let raw: RawConfig = serde_yaml::from_str(content)?;
        let resources = match raw.resources {
            Some(resources) if !resources.is_empty() => resources,
            _ => return Err(ConfigError::NoResources),
        };

        let mut config = ImportConfig::default();
        for (index, item) in resources.iter().enumerate() {
            let mapping = item.as_mapping().ok_or_else(|| ConfigError::Entry {
                index,
                message: "expected a mapping of resource name to its configuration".to_string(),
            })?;
            for (key, value) in mapping {
                let name = key.as_str().ok_or_else(|| ConfigError::Entry {
                    index,
                    message: "resource names must be strings".to_string(),
                })?;
                match name.parse::<ResourceKind>() {
                    Ok(kind) => {
                        let conf = schema::validate(kind, value)?;
                        config.insert(ResourceEntry { kind, conf });
                    }
                    Err(_) => {
                        if !config.unsupported.iter().any(|n| n == name) {
                            config.unsupported.push(name.to_string());
                        }
                    }
                }
            }
        }
        Ok(config)
    }

    /// A repeated kind keeps its first position and takes the later value.
    fn insert(&mut self, entry: ResourceEntry) {
        match self.entries.iter_mut().find(|e| e.kind == entry.kind) {
            Some(existing) => existing.conf = entry.conf,
            None => self.entries.push(entry),
        }
    }

    pub fn imports_everything(&self) -> bool {
        self.entries.iter().any(|e| e.kind == ResourceKind::All)
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceConf> {
        self.entries.iter().find(|e| e.kind == kind).map(|e| &e.conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_no_resources() {
        assert!(matches!(ImportConfig::from_yaml(""), Err(ConfigError::NoResources)));
        assert!(matches!(
            ImportConfig::from_yaml("resources:\n"),
            Err(ConfigError::NoResources)
        ));
        assert!(matches!(
            ImportConfig::from_yaml("resources: []\n"),
            Err(ConfigError::NoResources)
        ));
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let result = ImportConfig::from_yaml("resource:\n  - dashboard:\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_entries_keep_configuration_order() {
        let config = ImportConfig::from_yaml(
            "resources:\n  - monitor:\n  - dashboard:\n      - abc-123\n  - logs_index_order:\n",
        )
        .unwrap();
        let kinds: Vec<_> = config.entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Monitor,
                ResourceKind::Dashboard,
                ResourceKind::LogsIndexOrder
            ]
        );
    }

    #[test]
    fn test_unsupported_names_are_collected_not_fatal() {
        let config = ImportConfig::from_yaml(
            "resources:\n  - dashboard:\n  - widget:\n      - 1\n  - widget:\n",
        )
        .unwrap();
        assert_eq!(config.entries.len(), 1);
        assert_eq!(config.unsupported, vec!["widget".to_string()]);
    }

    #[test]
    fn test_repeated_kind_takes_last_value_first_position() {
        let config = ImportConfig::from_yaml(
            "resources:\n  - dashboard:\n      - a\n  - user:\n      - u\n  - dashboard:\n      - b\n",
        )
        .unwrap();
        assert_eq!(config.entries[0].kind, ResourceKind::Dashboard);
        assert_eq!(config.entries[0].conf, ResourceConf::List(vec!["b".to_string()]));
        assert_eq!(config.entries.len(), 2);
    }

    #[test]
    fn test_non_mapping_entry_is_rejected() {
        let result = ImportConfig::from_yaml("resources:\n  - dashboard\n");
        match result {
            Err(ConfigError::Entry { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected Entry error, got {:?}", other),
        }
    }

    #[test]
    fn test_all_keyword_detected() {
        let config =
            ImportConfig::from_yaml("resources:\n  - dashboard:\n      - a\n  - all:\n").unwrap();
        assert!(config.imports_everything());
    }

    #[test]
    fn test_entry_category_for_unfiltered_nested_kind() {
        let config = ImportConfig::from_yaml("resources:\n  - monitor:\n").unwrap();
        assert_eq!(config.entries[0].category(), Category::NoIdentifier);
    }

    #[test]
    fn test_writes_split_state() {
        let config = ImportConfig::from_yaml(
            "resources:\n  - monitor:\n      - ids: [1]\n  - synthetics_test:\n  - dashboard:\n      - a\n",
        )
        .unwrap();
        let split: Vec<_> = config
            .entries
            .iter()
            .map(ResourceEntry::writes_split_state)
            .collect();
        assert_eq!(split, vec![true, false, false]);
    }

    #[test]
    fn test_filter_keys_are_unique_and_ordered() {
        let conf = ResourceConf::Nested(vec![
            NestedFilter::TagSets(vec![]),
            NestedFilter::Ids(vec!["1".to_string()]),
            NestedFilter::TagSets(vec![]),
        ]);
        assert_eq!(conf.filter_keys(), vec!["tagsets", "ids"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.yaml");
        let err = ImportConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("conf.yaml"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.yaml");
        std::fs::write(&path, "resources:\n  - dashboard_list:\n      - 111\n").unwrap();
        let config = ImportConfig::load(&path).unwrap();
        assert_eq!(
            config.get(ResourceKind::DashboardList),
            Some(&ResourceConf::List(vec!["111".to_string()]))
        );
    }
}
