use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every resource kind the importer understands.
///
/// Names serialize to the snake_case identifiers used both in the
/// configuration file and on the `terraformer --resources` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Dashboard,
    DashboardList,
    LogsArchive,
    LogsCustomPipeline,
    LogsIntegrationPipeline,
    LogsIndex,
    IntegrationAwsLambdaArn,
    IntegrationAwsLogCollection,
    IntegrationAzure,
    IntegrationPagerdutyServiceObject,
    MetricMetadata,
    Role,
    SecurityMonitoringDefaultRule,
    SecurityMonitoringRule,
    SyntheticsGlobalVariable,
    SyntheticsPrivateLocation,
    User,
    LogsArchiveOrder,
    LogsPipelineOrder,
    LogsIndexOrder,
    Monitor,
    ServiceLevelObjective,
    SyntheticsTest,
    IntegrationAws,
    IntegrationSlackChannel,
    /// Keyword that replaces every other entry with one global import.
    All,
}

/// How a resource kind is turned into import commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Category {
    /// The `all` keyword.
    Global,
    /// Imported without any filter, batched into one command.
    NoIdentifier,
    /// A flat list of identifiers in one `--filter` clause.
    FlatList,
    /// `ids` / `tags` / `tagsets` sub-filters, one command each.
    Nested,
    /// Integration kinds with their own fan-out rules.
    Bespoke,
}

impl Category {
    /// Order in which categories are dispatched.
    pub const DISPATCH_ORDER: [Category; 4] = [
        Category::NoIdentifier,
        Category::FlatList,
        Category::Nested,
        Category::Bespoke,
    ];
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn category(self) -> Category {
        use ResourceKind::*;
        match self {
            All => Category::Global,
            LogsArchiveOrder | LogsPipelineOrder | LogsIndexOrder => Category::NoIdentifier,
            Monitor | ServiceLevelObjective | SyntheticsTest => Category::Nested,
            IntegrationAws | IntegrationSlackChannel => Category::Bespoke,
            Dashboard
            | DashboardList
            | LogsArchive
            | LogsCustomPipeline
            | LogsIntegrationPipeline
            | LogsIndex
            | IntegrationAwsLambdaArn
            | IntegrationAwsLogCollection
            | IntegrationAzure
            | IntegrationPagerdutyServiceObject
            | MetricMetadata
            | Role
            | SecurityMonitoringDefaultRule
            | SecurityMonitoringRule
            | SyntheticsGlobalVariable
            | SyntheticsPrivateLocation
            | User => Category::FlatList,
        }
    }

    /// Filter field used when importing this kind by identifier.
    pub fn id_field(self) -> &'static str {
        id_field(self.as_str())
    }

    /// Kinds whose split import directories are merged back by `migrate`.
    pub fn is_migratable(self) -> bool {
        matches!(self.category(), Category::Nested | Category::Bespoke)
    }
}

/// Looks up the terraformer filter field for a resource kind or an
/// integration sub-filter key. Anything not in the table filters on `id`.
pub fn id_field(name: &str) -> &'static str {
    match name {
        "integration_aws_lambda_arn" => "lambda_arn",
        "integration_azure" => "client_id",
        "aws_account_ids" => "account_id",
        "roles" => "role_name",
        "slack_account_names" => "account_name",
        "slack_account_channels" => "channel_name",
        _ => "id",
    }
}
