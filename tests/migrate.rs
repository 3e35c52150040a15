use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ddtf::terraform::{MoveOutcome, StateBackend};
use ddtf::{DdtfError, MigrateError, ResourceKind, commands};

/// Every state holds one resource named after its leaf directory.
struct LeafBackend {
    moves: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl StateBackend for LeafBackend {
    async fn list(&self, state: &Path) -> Result<Vec<String>, MigrateError> {
        let leaf = state.parent().unwrap().file_name().unwrap().to_string_lossy();
        Ok(vec![format!("datadog_synthetics_test.tfer--{leaf}")])
    }

    async fn mv(&self, _from: &Path, _to: &Path, address: &str) -> Result<MoveOutcome, MigrateError> {
        self.moves.lock().unwrap().push(address.to_string());
        Ok(MoveOutcome::Moved)
    }
}

fn leaf(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("synthetics_test.tf"),
        format!("resource \"datadog_synthetics_test\" \"tfer--{name}\" {{\n  name = \"{name}\"\n}}\n"),
    )
    .unwrap();
    fs::write(dir.join("terraform.tfstate"), r#"{"version": 4, "outputs": {"a": {}}}"#).unwrap();
    fs::write(dir.join("outputs.tf"), "").unwrap();
    fs::write(dir.join("provider.tf"), "provider \"datadog\" {}").unwrap();
}

fn setup() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("conf.yaml");
    fs::write(
        &config,
        "resources:
  - synthetics_test:
      - tagsets:
          - web: ['team:web']
          - api: ['team:api']
      - ids: [abc-123]
",
    )
    .unwrap();
    (dir, config)
}

#[tokio::test]
async fn test_migrate_folds_leaves_into_one_root() {
    let (dir, config) = setup();
    let kind = dir.path().join("datadog").join("synthetics_test");
    leaf(&kind.join("ids"), "ids");
    leaf(&kind.join("tagsets").join("web"), "web");
    leaf(&kind.join("tagsets").join("api"), "api");
    let moves = Arc::new(Mutex::new(Vec::new()));

    let report = commands::migrate(
        &config,
        dir.path(),
        Box::new(LeafBackend {
            moves: moves.clone(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(report.merged, vec![ResourceKind::SyntheticsTest]);
    assert_eq!(
        moves.lock().unwrap().as_slice(),
        [
            "datadog_synthetics_test.tfer--api",
            "datadog_synthetics_test.tfer--web"
        ]
    );

    let tf = fs::read_to_string(kind.join("synthetics_test.tf")).unwrap();
    let order: Vec<usize> = ["tfer--ids", "tfer--api", "tfer--web"]
        .iter()
        .map(|name| tf.find(name).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));

    let mut remaining: Vec<String> = fs::read_dir(&kind)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    remaining.sort();
    assert_eq!(
        remaining,
        vec!["provider.tf", "synthetics_test.tf", "terraform.tfstate"]
    );
}

#[tokio::test]
async fn test_migrate_requires_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let moves = Arc::new(Mutex::new(Vec::new()));

    let result = commands::migrate(
        &dir.path().join("conf.yaml"),
        dir.path(),
        Box::new(LeafBackend { moves }),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_migrate_without_import_output_fails() {
    let (dir, config) = setup();
    let moves = Arc::new(Mutex::new(Vec::new()));

    let err = commands::migrate(&config, dir.path(), Box::new(LeafBackend { moves }))
        .await
        .unwrap_err();

    assert!(matches!(err, DdtfError::Migrate(MigrateError::NoOutput { .. })));
    assert!(err.to_string().contains("run an import first"));
}
