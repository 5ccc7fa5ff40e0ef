use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_badge-calculator")
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Workspace {
            dir: tempfile::tempdir().expect("tempdir should be created"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn database(&self) -> PathBuf {
        self.path().join("badges.db")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(bin())
            .arg("--database")
            .arg(self.database())
            .arg("--config")
            .arg(self.path().join("config.toml"))
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("badge-calculator should run")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn calc_on_empty_database_explains_next_step() {
    let ws = Workspace::new();
    let output = ws.run(&["calc", "rare"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Run 'import' or 'load-sample' first"));
}

#[test]
fn calc_emits_json_after_loading_sample() {
    let ws = Workspace::new();
    assert!(ws.run(&["load-sample"]).status.success());

    let output = ws.run(&["calc", "rare", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let payload: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("calc should emit json");
    assert_eq!(payload["target"], "Rare");
    assert!(payload["start"].is_null());
    assert_eq!(payload["total_primary_cost"], 7741);
    assert_eq!(payload["total_secondary_cost"], 452);
    assert_eq!(payload["required_item_counts"]["Common"], 4);
    assert_eq!(payload["duration"]["days"], 6);
    assert_eq!(payload["has_incomplete_data"], false);
}

#[test]
fn calc_prints_summary_with_parallelism() {
    let ws = Workspace::new();
    assert!(ws.run(&["load-sample"]).status.success());

    let output = ws.run(&["calc", "Rare", "--from", "common", "--parallel", "2", "--verbose"]);
    assert_eq!(output.status.code(), Some(0));

    let text = stdout(&output);
    assert!(text.contains("Crafting tree:"));
    assert!(text.contains("1x Common (owned)"));
    assert!(text.contains("Target: Rare (starting from Common)"));
    assert!(text.contains("Gold: 2,353"));
    assert!(text.contains("Parallel: 2 days, 0 hours"));
}

#[test]
fn calc_reports_request_errors_inline() {
    let ws = Workspace::new();
    assert!(ws.run(&["load-sample"]).status.success());

    let output = ws.run(&["calc", "mythic"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not available yet"));

    let output = ws.run(&["calc", "rare", "--from", "epic"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("start must be strictly below target")
    );

    let output = ws.run(&["calc", "rare", "--parallel", "-1"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("parallelism factor must be positive"));
}

#[test]
fn config_labels_are_used() {
    let ws = Workspace::new();
    std::fs::write(
        ws.path().join("config.toml"),
        "primary_label = \"Cogs\"\nsecondary_label = \"Sparks\"\nparallelism = 4.0\n",
    )
    .unwrap();
    assert!(ws.run(&["load-sample"]).status.success());

    let text = stdout(&ws.run(&["calc", "uncommon"]));
    assert!(text.contains("Cogs: 3,169"));
    assert!(text.contains("Sparks: 113"));
    assert!(text.contains("(x4)"));
}

#[test]
fn import_then_list_tiers() {
    let ws = Workspace::new();
    let sheets = ws.path().join("sheets");
    std::fs::create_dir(&sheets).unwrap();
    std::fs::write(
        sheets.join("common.tier"),
        "tier = Common\nprimary_cost = 1347\ncraft_hours = 12\ncomponents = none\n",
    )
    .unwrap();
    std::fs::write(
        sheets.join("uncommon.tier"),
        "tier = Uncommon\nprimary_cost = 475\nsecondary_cost = 113\ncraft_hours = 24\ncomponents = Common x2\n",
    )
    .unwrap();

    let output = ws.run(&["import", sheets.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Imported 2 tiers (2 components)"));

    let listing = stdout(&ws.run(&["list-tiers"]));
    assert!(listing.contains("Common"));
    assert!(listing.contains("Common, Common"));

    // Tiers without a sheet count as "no data yet"
    let output = ws.run(&["calc", "uncommon"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Gold: 3,169"));

    let output = ws.run(&["calc", "rare"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("crafting data for Rare is not available yet"));
}

#[test]
fn unknown_start_tier_is_a_usage_error() {
    let ws = Workspace::new();
    assert!(ws.run(&["load-sample"]).status.success());

    let output = ws.run(&["calc", "rare", "--from", "gold"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown tier 'gold'"));

    let output = ws.run(&["calc", "rare", "--from", "NONE", "--json"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn tier_details_show_components_and_users() {
    let ws = Workspace::new();
    assert!(ws.run(&["load-sample"]).status.success());

    let text = stdout(&ws.run(&["tier", "rare"]));
    assert!(text.contains("Tier: Rare"));
    assert!(text.contains("    1x Uncommon"));
    assert!(text.contains("Used by:\n    Epic"));

    let text = stdout(&ws.run(&["tier", "mythic"]));
    assert!(text.contains("Cost: no data yet"));
}
