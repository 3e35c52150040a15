//! Per-kind shape checks for the `resources` document.
//!
//! Each resource kind accepts a fixed value shape. Violations produce a
//! `ConfigError::Schema` carrying an example of the expected layout.

use serde_yaml::Value;

use super::{
    AwsFilter, ConfigError, NestedFilter, ResourceConf, SlackChannels, SlackFilter, TagSet,
};
use crate::resource::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalars {
    Strings,
    Integers,
    StringsOrIntegers,
}

impl Scalars {
    fn describe(self) -> &'static str {
        match self {
            Scalars::Strings => "strings",
            Scalars::Integers => "integers",
            Scalars::StringsOrIntegers => "strings or integers",
        }
    }

    fn sample(self) -> [&'static str; 2] {
        match self {
            Scalars::Strings => ["abc123", "xyz789"],
            Scalars::Integers => ["12345", "67890"],
            Scalars::StringsOrIntegers => ["123456", "foobarbiz"],
        }
    }
}

/// Characters `sh` still interprets inside the double-quoted `--filter`.
const SHELL_SPECIAL: [char; 4] = ['"', '$', '`', '\\'];

pub(super) fn validate(kind: ResourceKind, value: &Value) -> Result<ResourceConf, ConfigError> {
    let conf = shape(kind, value)?;
    if let Some(unsafe_value) = conf_strings(&conf)
        .into_iter()
        .find(|v| v.contains(&SHELL_SPECIAL[..]))
    {
        return Err(schema_error(kind, shell_example(unsafe_value)));
    }
    Ok(conf)
}

fn shape(kind: ResourceKind, value: &Value) -> Result<ResourceConf, ConfigError> {
    use ResourceKind::*;
    match kind {
        All | LogsArchiveOrder | LogsPipelineOrder | LogsIndexOrder => {
            if value.is_null() {
                Ok(ResourceConf::ImportAll)
            } else {
                Err(schema_error(kind, no_value_example(kind.as_str())))
            }
        }
        Dashboard | IntegrationAwsLogCollection => {
            optional_list(kind, value, Scalars::StringsOrIntegers)
        }
        DashboardList => optional_list(kind, value, Scalars::Integers),
        LogsArchive
        | LogsCustomPipeline
        | LogsIntegrationPipeline
        | LogsIndex
        | IntegrationAwsLambdaArn
        | IntegrationAzure
        | IntegrationPagerdutyServiceObject => optional_list(kind, value, Scalars::Strings),
        MetricMetadata
        | Role
        | SecurityMonitoringDefaultRule
        | SecurityMonitoringRule
        | SyntheticsGlobalVariable
        | User => required_list(kind, value),
        SyntheticsPrivateLocation => private_locations(kind, value),
        Monitor => nested(kind, value, Scalars::Integers),
        ServiceLevelObjective | SyntheticsTest => nested(kind, value, Scalars::Strings),
        IntegrationAws => aws(kind, value),
        IntegrationSlackChannel => slack(kind, value),
    }
}

/// Every configured name and value that ends up on the command line.
fn conf_strings(conf: &ResourceConf) -> Vec<&str> {
    let mut strings: Vec<&str> = Vec::new();
    match conf {
        ResourceConf::ImportAll => {}
        ResourceConf::List(values) => strings.extend(values.iter().map(String::as_str)),
        ResourceConf::Nested(filters) => {
            for filter in filters {
                match filter {
                    NestedFilter::Ids(values) | NestedFilter::Tags(values) => {
                        strings.extend(values.iter().map(String::as_str));
                    }
                    NestedFilter::TagSets(sets) => {
                        for set in sets {
                            strings.push(&set.name);
                            strings.extend(set.tags.iter().map(String::as_str));
                        }
                    }
                }
            }
        }
        ResourceConf::Aws(filters) => {
            for filter in filters {
                strings.extend(filter.values().iter().map(String::as_str));
            }
        }
        ResourceConf::Slack(filters) => {
            for filter in filters {
                match filter {
                    SlackFilter::AccountNames(names) => {
                        strings.extend(names.iter().map(String::as_str));
                    }
                    SlackFilter::AccountChannels(accounts) => {
                        for account in accounts {
                            strings.push(&account.account);
                            strings.extend(account.channels.iter().map(String::as_str));
                        }
                    }
                }
            }
        }
    }
    strings
}

fn schema_error(kind: ResourceKind, message: String) -> ConfigError {
    ConfigError::Schema {
        resource: kind.to_string(),
        message,
    }
}

fn scalar(value: &Value, scalars: Scalars) -> Option<String> {
    match (value, scalars) {
        (Value::String(s), Scalars::Strings | Scalars::StringsOrIntegers) => Some(s.clone()),
        (Value::Number(n), Scalars::Integers | Scalars::StringsOrIntegers)
            if n.is_i64() || n.is_u64() =>
        {
            Some(n.to_string())
        }
        _ => None,
    }
}

fn scalar_list(value: &Value, scalars: Scalars) -> Option<Vec<String>> {
    value
        .as_sequence()?
        .iter()
        .map(|v| scalar(v, scalars))
        .collect()
}

fn non_empty_list(value: &Value, scalars: Scalars) -> Option<Vec<String>> {
    scalar_list(value, scalars).filter(|values| !values.is_empty())
}

fn list_conf(values: Vec<String>) -> ResourceConf {
    if values.is_empty() {
        ResourceConf::ImportAll
    } else {
        ResourceConf::List(values)
    }
}

fn optional_list(
    kind: ResourceKind,
    value: &Value,
    scalars: Scalars,
) -> Result<ResourceConf, ConfigError> {
    if value.is_null() {
        return Ok(ResourceConf::ImportAll);
    }
    scalar_list(value, scalars)
        .map(list_conf)
        .ok_or_else(|| schema_error(kind, list_example(kind.as_str(), scalars, false)))
}

fn required_list(kind: ResourceKind, value: &Value) -> Result<ResourceConf, ConfigError> {
    scalar_list(value, Scalars::Strings)
        .map(list_conf)
        .ok_or_else(|| schema_error(kind, list_example(kind.as_str(), Scalars::Strings, true)))
}

fn private_locations(kind: ResourceKind, value: &Value) -> Result<ResourceConf, ConfigError> {
    scalar_list(value, Scalars::Strings)
        .filter(|values| values.iter().all(|v| v.contains("pl:")))
        .map(list_conf)
        .ok_or_else(|| {
            schema_error(
                kind,
                "expects a list of private location identifiers, including the leading pl:"
                    .to_string(),
            )
        })
}

/// Iterates `(key, value)` pairs of a list of single-key mappings.
fn sub_filters(value: &Value) -> Option<Vec<(&str, &Value)>> {
    let mut pairs = Vec::new();
    for item in value.as_sequence()? {
        for (key, v) in item.as_mapping()? {
            pairs.push((key.as_str()?, v));
        }
    }
    Some(pairs)
}

fn nested(
    kind: ResourceKind,
    value: &Value,
    ids: Scalars,
) -> Result<ResourceConf, ConfigError> {
    if value.is_null() {
        return Ok(ResourceConf::ImportAll);
    }
    let pairs =
        sub_filters(value).ok_or_else(|| schema_error(kind, nested_example(kind.as_str())))?;

    let mut filters = Vec::with_capacity(pairs.len());
    for (key, v) in pairs {
        let filter = match key {
            "ids" => non_empty_list(v, ids)
                .map(NestedFilter::Ids)
                .ok_or_else(|| schema_error(kind, list_example("ids", ids, true)))?,
            "tags" => non_empty_list(v, Scalars::Strings)
                .map(NestedFilter::Tags)
                .ok_or_else(|| schema_error(kind, list_example("tags", Scalars::Strings, true)))?,
            "tagsets" => tag_sets(v)
                .map(NestedFilter::TagSets)
                .ok_or_else(|| schema_error(kind, tagset_example()))?,
            _ => return Err(schema_error(kind, nested_example(kind.as_str()))),
        };
        filters.push(filter);
    }

    if filters.is_empty() {
        Ok(ResourceConf::ImportAll)
    } else {
        Ok(ResourceConf::Nested(filters))
    }
}

fn tag_sets(value: &Value) -> Option<Vec<TagSet>> {
    let sets: Vec<TagSet> = sub_filters(value)?
        .into_iter()
        .map(|(name, tags)| {
            Some(TagSet {
                name: name.to_string(),
                tags: non_empty_list(tags, Scalars::Strings)?,
            })
        })
        .collect::<Option<_>>()?;
    (!sets.is_empty()).then_some(sets)
}

fn aws(kind: ResourceKind, value: &Value) -> Result<ResourceConf, ConfigError> {
    if value.is_null() {
        return Ok(ResourceConf::ImportAll);
    }
    let pairs = sub_filters(value).ok_or_else(|| schema_error(kind, aws_example()))?;

    let mut filters = Vec::with_capacity(pairs.len());
    for (key, v) in pairs {
        let filter = match key {
            "aws_account_ids" => non_empty_list(v, Scalars::StringsOrIntegers)
                .map(AwsFilter::AccountIds)
                .ok_or_else(|| {
                    schema_error(
                        kind,
                        list_example("aws_account_ids", Scalars::StringsOrIntegers, true),
                    )
                })?,
            "roles" => non_empty_list(v, Scalars::Strings)
                .map(AwsFilter::Roles)
                .ok_or_else(|| schema_error(kind, list_example("roles", Scalars::Strings, true)))?,
            "account_role" => non_empty_list(v, Scalars::Strings)
                .map(AwsFilter::AccountRoles)
                .ok_or_else(|| {
                    schema_error(kind, list_example("account_role", Scalars::Strings, true))
                })?,
            _ => return Err(schema_error(kind, aws_example())),
        };
        filters.push(filter);
    }

    if filters.is_empty() {
        Ok(ResourceConf::ImportAll)
    } else {
        Ok(ResourceConf::Aws(filters))
    }
}

fn slack(kind: ResourceKind, value: &Value) -> Result<ResourceConf, ConfigError> {
    if value.is_null() {
        return Ok(ResourceConf::ImportAll);
    }
    let pairs = sub_filters(value).ok_or_else(|| schema_error(kind, slack_example()))?;

    let mut filters = Vec::with_capacity(pairs.len());
    for (key, v) in pairs {
        let filter = match key {
            "slack_account_names" => non_empty_list(v, Scalars::Strings)
                .map(SlackFilter::AccountNames)
                .ok_or_else(|| {
                    schema_error(kind, list_example("slack_account_names", Scalars::Strings, true))
                })?,
            "slack_account_channels" => slack_channels(v)
                .map(SlackFilter::AccountChannels)
                .ok_or_else(|| {
                    schema_error(
                        kind,
                        "'slack_account_channels' expects a list of mappings, with the key being \
                         the account name and the value being a list of channels without the \
                         leading #."
                            .to_string(),
                    )
                })?,
            _ => return Err(schema_error(kind, slack_example())),
        };
        filters.push(filter);
    }

    if filters.is_empty() {
        Ok(ResourceConf::ImportAll)
    } else {
        Ok(ResourceConf::Slack(filters))
    }
}

fn slack_channels(value: &Value) -> Option<Vec<SlackChannels>> {
    let accounts: Vec<SlackChannels> = sub_filters(value)?
        .into_iter()
        .map(|(account, channels)| {
            let channels = non_empty_list(channels, Scalars::Strings)?;
            if channels.iter().any(|c| c.contains('#')) {
                return None;
            }
            Some(SlackChannels {
                account: account.to_string(),
                channels,
            })
        })
        .collect::<Option<_>>()?;
    (!accounts.is_empty()).then_some(accounts)
}

fn list_example(name: &str, scalars: Scalars, required: bool) -> String {
    let [a, b] = scalars.sample();
    let mut message = format!(
        "'{name}' expects a list of {kinds} such as:\n    {name}:\n        - {a}\n        - {b}\n\
         Found a non-list value or a value of the wrong type in the list.",
        kinds = scalars.describe(),
    );
    if !required {
        message.push_str(&format!(
            "\n'{name}' can also be left without a value to import all, such as:\n    {name}:"
        ));
    }
    message
}

fn shell_example(value: &str) -> String {
    format!(
        "'{value}' contains one of \", $, ` or \\ which the shell would interpret. \
         Use plain identifiers and tags such as:\n        - abc123\n        - 'env:prod'"
    )
}

fn no_value_example(name: &str) -> String {
    format!("'{name}' should not have a value if enabled, keep it as:\n    {name}:")
}

fn nested_example(name: &str) -> String {
    format!(
        "'{name}' expects the following configuration:
    {name}:
        - ids:
            - abc-123-xyz
        - tags:
            - env:prod
            - app:foo
        - tagsets:
            - team_a:
                - app:foo
                - env:prod
None of ids, tags, or tagsets is required and more than one can be provided.
'{name}' can also be left without a value to import all."
    )
}

fn tagset_example() -> String {
    "'tagsets' expects a list of mappings, where the key names the set and the value is \
     a list of tags such as:
    - tagsets:
        - team_a:
            - app:foo
            - env:prod
        - team_b:
            - team:b"
        .to_string()
}

fn aws_example() -> String {
    "'integration_aws' expects the following configuration:
    integration_aws:
        - aws_account_ids:
            - 123456789123
        - roles:
            - DatadogIntegrationRole
        - account_role:
            - 123456789123:DatadogIntegrationRole
None of aws_account_ids, roles, or account_role is required and more than one can be provided.
If none is provided all integration_aws resources are imported."
        .to_string()
}

fn slack_example() -> String {
    "'integration_slack_channel' expects the following configuration:
    integration_slack_channel:
        - slack_account_channels:
            - account_name:
                - channel_name
                - other_channel
        - slack_account_names:
            - account_name
            - other_account_name
One of slack_account_channels or slack_account_names is required and more than one can be provided."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn schema_message(result: Result<ResourceConf, ConfigError>) -> String {
        match result {
            Err(ConfigError::Schema { message, .. }) => message,
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_shell_special_characters_rejected() {
        for value in ["'a\"b'", "'$(whoami)'", "'`id`'", "'a\\\\b'"] {
            let message = schema_message(validate(ResourceKind::User, &yaml(&format!("[{value}]"))));
            assert!(message.contains("the shell would interpret"), "{value}: {message}");
        }
        let message = schema_message(validate(
            ResourceKind::Monitor,
            &yaml("- tagsets:\n    - $HOME: ['env:prod']\n"),
        ));
        assert!(message.contains("'$HOME'"));
        assert!(validate(
            ResourceKind::IntegrationSlackChannel,
            &yaml("- slack_account_names: ['team`x`']\n"),
        )
        .is_err());
    }

    #[test]
    fn test_plain_values_pass_shell_check() {
        assert!(validate(ResourceKind::User, &yaml("['user@example.com', 'a-b_c.d']")).is_ok());
        assert!(validate(ResourceKind::Monitor, &yaml("- tags: ['env:prod', 'team:a b']\n")).is_ok());
    }

    #[test]
    fn test_order_kinds_reject_values() {
        assert_eq!(
            validate(ResourceKind::LogsIndexOrder, &Value::Null).unwrap(),
            ResourceConf::ImportAll
        );
        let message = schema_message(validate(ResourceKind::LogsIndexOrder, &yaml("[a]")));
        assert!(message.contains("should not have a value"));
    }

    #[test]
    fn test_all_rejects_values() {
        assert!(validate(ResourceKind::All, &yaml("[dashboard]")).is_err());
    }

    #[test]
    fn test_dashboard_accepts_integers_and_strings() {
        let conf = validate(ResourceKind::Dashboard, &yaml("[111, abc-222]")).unwrap();
        assert_eq!(
            conf,
            ResourceConf::List(vec!["111".to_string(), "abc-222".to_string()])
        );
    }

    #[test]
    fn test_dashboard_list_rejects_strings() {
        let message = schema_message(validate(ResourceKind::DashboardList, &yaml("[abc]")));
        assert!(message.contains("list of integers"));
        assert!(message.contains("without a value to import all"));
    }

    #[test]
    fn test_string_list_rejects_scalar() {
        assert!(validate(ResourceKind::LogsArchive, &yaml("abc")).is_err());
        assert!(validate(ResourceKind::LogsArchive, &yaml("[1.5]")).is_err());
    }

    #[test]
    fn test_empty_list_means_import_all() {
        assert_eq!(
            validate(ResourceKind::Dashboard, &yaml("[]")).unwrap(),
            ResourceConf::ImportAll
        );
    }

    #[test]
    fn test_required_list_kinds_need_a_value() {
        let message = schema_message(validate(ResourceKind::MetricMetadata, &Value::Null));
        assert!(message.contains("'metric_metadata' expects a list of strings"));
        assert!(!message.contains("import all"));
    }

    #[test]
    fn test_private_location_requires_prefix() {
        assert!(validate(ResourceKind::SyntheticsPrivateLocation, &yaml("['pl:abc-123']")).is_ok());
        let message =
            schema_message(validate(ResourceKind::SyntheticsPrivateLocation, &yaml("[abc]")));
        assert!(message.contains("leading pl:"));
    }

    #[test]
    fn test_monitor_nested_shapes() {
        let conf = validate(
            ResourceKind::Monitor,
            &yaml(
                "- ids: [1, 2]\n- tags: ['env:prod']\n- tagsets:\n    - team_a: ['app:foo', 'env:prod']\n",
            ),
        )
        .unwrap();
        assert_eq!(
            conf,
            ResourceConf::Nested(vec![
                NestedFilter::Ids(vec!["1".to_string(), "2".to_string()]),
                NestedFilter::Tags(vec!["env:prod".to_string()]),
                NestedFilter::TagSets(vec![TagSet {
                    name: "team_a".to_string(),
                    tags: vec!["app:foo".to_string(), "env:prod".to_string()],
                }]),
            ])
        );
    }

    #[test]
    fn test_monitor_ids_must_be_integers() {
        assert!(validate(ResourceKind::Monitor, &yaml("- ids: [abc]\n")).is_err());
        assert!(validate(ResourceKind::ServiceLevelObjective, &yaml("- ids: [abc]\n")).is_ok());
    }

    #[test]
    fn test_nested_unknown_key() {
        let message = schema_message(validate(ResourceKind::SyntheticsTest, &yaml("- names: [a]\n")));
        assert!(message.contains("'synthetics_test' expects the following configuration"));
    }

    #[test]
    fn test_nested_empty_sub_filter_rejected() {
        assert!(validate(ResourceKind::Monitor, &yaml("- tags: []\n")).is_err());
        assert!(validate(ResourceKind::Monitor, &yaml("- tags:\n")).is_err());
    }

    #[test]
    fn test_aws_filters() {
        let conf = validate(
            ResourceKind::IntegrationAws,
            &yaml("- aws_account_ids: [123456789123]\n- account_role: ['1234:role']\n"),
        )
        .unwrap();
        assert_eq!(
            conf,
            ResourceConf::Aws(vec![
                AwsFilter::AccountIds(vec!["123456789123".to_string()]),
                AwsFilter::AccountRoles(vec!["1234:role".to_string()]),
            ])
        );
        let message = schema_message(validate(ResourceKind::IntegrationAws, &yaml("- regions: [a]\n")));
        assert!(message.contains("integration_aws"));
    }

    #[test]
    fn test_slack_filters() {
        let conf = validate(
            ResourceKind::IntegrationSlackChannel,
            &yaml(
                "- slack_account_channels:\n    - main: [alerts, ops]\n- slack_account_names: [main, other]\n",
            ),
        )
        .unwrap();
        assert_eq!(
            conf,
            ResourceConf::Slack(vec![
                SlackFilter::AccountChannels(vec![SlackChannels {
                    account: "main".to_string(),
                    channels: vec!["alerts".to_string(), "ops".to_string()],
                }]),
                SlackFilter::AccountNames(vec!["main".to_string(), "other".to_string()]),
            ])
        );
    }

    #[test]
    fn test_slack_channels_reject_hash_prefix() {
        let message = schema_message(validate(
            ResourceKind::IntegrationSlackChannel,
            &yaml("- slack_account_channels:\n    - main: ['#alerts']\n"),
        ));
        assert!(message.contains("without the leading #"));
    }
}
