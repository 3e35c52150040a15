use tabled::settings::Style;
use tabled::{Table, Tabled};
use termtree::Tree;

use crate::dispatch::{Plan, RunReport};
use crate::executor::Outcome;

/// Renders a plan as a tree of category -> commands.
pub fn plan_tree(plan: &Plan) -> Tree<String> {
    let root = Tree::new("import plan".to_string());
    match plan {
        Plan::Everything(command) => {
            root.with_leaves([Tree::new("all".to_string()).with_leaves([command.to_string()])])
        }
        Plan::Categorized(groups) => root.with_leaves(groups.iter().map(|group| {
            Tree::new(group.category.to_string())
                .with_leaves(group.commands.iter().map(ToString::to_string))
        })),
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Resources")]
    resources: String,
    #[tabled(rename = "Attempts")]
    attempts: u32,
    #[tabled(rename = "Result")]
    result: String,
}

/// Renders the end-of-run summary table.
pub fn summary_table(report: &RunReport) -> String {
    let rows = report.commands.iter().map(|r| SummaryRow {
        resources: r.label.clone(),
        attempts: r.attempts,
        result: match &r.outcome {
            Outcome::Success => "imported".to_string(),
            Outcome::Failure(reason) => format!("failed: {reason}"),
        },
    });
    Table::new(rows).with(Style::rounded()).to_string()
}
