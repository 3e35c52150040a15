//! Builds `terraformer import` invocations from validated configuration.
//!
//! Everything here is pure string construction: an [`ImportCommand`] is
//! built once, rendered with `Display`, handed to the executor and dropped.

use std::borrow::Cow;
use std::fmt;

use crate::config::{AwsFilter, NestedFilter, ResourceConf, ResourceEntry, SlackFilter};
use crate::resource::{ResourceKind, id_field};

pub const TERRAFORMER_BIN: &str = "/usr/local/bin/terraformer";
pub const PROVIDER: &str = "datadog";
pub const PARALLELISM: u32 = 5;
pub const BATCH_SIZE: u32 = 1000;

/// terraformer expands the placeholders itself.
pub const BASE_PATH: &str = "{provider}/{service}";

/// Quotes a filter value that contains a colon, which the filter DSL
/// would otherwise read as a value separator.
pub fn quote_value(value: &str) -> Cow<'_, str> {
    if value.contains(':') {
        Cow::Owned(format!("'{value}'"))
    } else {
        Cow::Borrowed(value)
    }
}

/// A single `--filter="Name=<field>;Value=<v1>:<v2>"` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub values: Vec<String>,
}

impl FilterClause {
    pub fn new<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .values
            .iter()
            .map(|v| quote_value(v))
            .collect::<Vec<_>>()
            .join(":");
        write!(f, "--filter=\"Name={};Value={}\"", self.field, joined)
    }
}

/// One fully formed import invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCommand {
    binary: String,
    path: String,
    resources: Vec<String>,
    filters: Vec<FilterClause>,
}

impl ImportCommand {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn filters(&self) -> &[FilterClause] {
        &self.filters
    }

    /// Short human-readable name: the resources plus the output sub-path.
    pub fn label(&self) -> String {
        let resources = self.resources.join(",");
        match self.path.strip_prefix(BASE_PATH).and_then(|s| s.strip_prefix('/')) {
            Some(suffix) => format!("{resources} ({suffix})"),
            None => resources,
        }
    }
}

impl fmt::Display for ImportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} import {} -n {} -m {} -p {} --resources={}",
            self.binary,
            PROVIDER,
            PARALLELISM,
            BATCH_SIZE,
            self.path,
            self.resources.join(",")
        )?;
        for filter in &self.filters {
            write!(f, " {filter}")?;
        }
        Ok(())
    }
}

/// Turns resource entries into import commands for one terraformer binary.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    binary: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new(TERRAFORMER_BIN)
    }
}

impl CommandBuilder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(
        &self,
        path: String,
        resources: Vec<String>,
        filters: Vec<FilterClause>,
    ) -> ImportCommand {
        ImportCommand {
            binary: self.binary.clone(),
            path,
            resources,
            filters,
        }
    }

    fn sub_path(suffix: &str) -> String {
        format!("{BASE_PATH}/{suffix}")
    }

    /// The single command that imports every supported resource.
    pub fn global(&self) -> ImportCommand {
        self.command(BASE_PATH.to_string(), vec!["*".to_string()], Vec::new())
    }

    /// One batched command for kinds imported without filters. Repeated
    /// kinds are collapsed, keeping first-seen order.
    pub fn unfiltered(&self, kinds: &[ResourceKind]) -> Option<ImportCommand> {
        let mut names: Vec<String> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let name = kind.as_str();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        if names.is_empty() {
            return None;
        }
        Some(self.command(BASE_PATH.to_string(), names, Vec::new()))
    }

    pub fn list(&self, kind: ResourceKind, values: &[String]) -> ImportCommand {
        self.command(
            BASE_PATH.to_string(),
            vec![kind.to_string()],
            vec![FilterClause::new(kind.id_field(), values.iter().cloned())],
        )
    }

    /// One command per `ids` / `tags` entry and one per named tag-set.
    pub fn nested(&self, kind: ResourceKind, filters: &[NestedFilter]) -> Vec<ImportCommand> {
        let mut commands = Vec::new();
        for filter in filters {
            match filter {
                NestedFilter::Ids(ids) => commands.push(self.command(
                    Self::sub_path("ids"),
                    vec![kind.to_string()],
                    vec![FilterClause::new(kind.id_field(), ids.iter().cloned())],
                )),
                NestedFilter::Tags(tags) => commands.push(self.command(
                    Self::sub_path("tags"),
                    vec![kind.to_string()],
                    vec![FilterClause::new("tags", tags.iter().cloned())],
                )),
                NestedFilter::TagSets(sets) => {
                    for set in sets {
                        commands.push(self.command(
                            Self::sub_path(&format!("tagsets/{}", set.name)),
                            vec![kind.to_string()],
                            vec![FilterClause::new("tags", set.tags.iter().cloned())],
                        ));
                    }
                }
            }
        }
        commands
    }

    /// One command per AWS integration filter key.
    pub fn aws(&self, kind: ResourceKind, filters: &[AwsFilter]) -> Vec<ImportCommand> {
        filters
            .iter()
            .map(|filter| {
                self.command(
                    Self::sub_path(filter.key()),
                    vec![kind.to_string()],
                    vec![FilterClause::new(
                        id_field(filter.key()),
                        filter.values().iter().cloned(),
                    )],
                )
            })
            .collect()
    }

    /// Account-name lists are batched into one command; channel lists fan
    /// out to one command per account.
    pub fn slack(&self, kind: ResourceKind, filters: &[SlackFilter]) -> Vec<ImportCommand> {
        let mut commands = Vec::new();
        for filter in filters {
            match filter {
                SlackFilter::AccountNames(names) => commands.push(self.command(
                    Self::sub_path(filter.key()),
                    vec![kind.to_string()],
                    vec![FilterClause::new(
                        id_field("slack_account_names"),
                        names.iter().cloned(),
                    )],
                )),
                SlackFilter::AccountChannels(accounts) => {
                    for account in accounts {
                        commands.push(self.command(
                            Self::sub_path(&format!("{}/{}", filter.key(), account.account)),
                            vec![kind.to_string()],
                            vec![
                                FilterClause::new(
                                    id_field("slack_account_names"),
                                    [account.account.clone()],
                                ),
                                FilterClause::new(
                                    id_field("slack_account_channels"),
                                    account.channels.iter().map(|c| format!("#{c}")),
                                ),
                            ],
                        ));
                    }
                }
            }
        }
        commands
    }

    /// Commands for one configured entry.
    pub fn build(&self, entry: &ResourceEntry) -> Vec<ImportCommand> {
        match &entry.conf {
            _ if entry.kind == ResourceKind::All => vec![self.global()],
            ResourceConf::ImportAll => self.unfiltered(&[entry.kind]).into_iter().collect(),
            ResourceConf::List(values) => vec![self.list(entry.kind, values)],
            ResourceConf::Nested(filters) => self.nested(entry.kind, filters),
            ResourceConf::Aws(filters) => self.aws(entry.kind, filters),
            ResourceConf::Slack(filters) => self.slack(entry.kind, filters),
        }
    }
}
