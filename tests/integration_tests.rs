// tests/integration_tests.rs

use std::fs;
use std::path::Path;

#[test]
fn test_config_file_parsing() {
    let config_content = r#"
base_url = "https://board.example.com"
refresh_secs = 60
timeout_secs = 10
insecure = false
allow_http = true
mode = "arrivals"
search = "CX"
mobile_breakpoint = 100
theme = "amber"
log_enabled = true
log_level = "debug"
log_file = "logs/flight-board.log"
"#;

    let value: toml::Value = toml::from_str(config_content).expect("config should parse");
    let table = value.as_table().expect("config is a table");
    assert_eq!(
        table.get("base_url").and_then(|v| v.as_str()),
        Some("https://board.example.com")
    );
    assert_eq!(table.get("refresh_secs").and_then(|v| v.as_integer()), Some(60));
    assert_eq!(table.get("mode").and_then(|v| v.as_str()), Some("arrivals"));
    assert_eq!(
        table.get("mobile_breakpoint").and_then(|v| v.as_integer()),
        Some(100)
    );

    let config_path = std::env::temp_dir().join("hkg_flight_board_test_config.toml");
    fs::write(&config_path, config_content).expect("Failed to write test config");
    assert!(config_path.exists());
    fs::remove_file(&config_path).expect("Failed to clean up test config");
}

#[test]
fn test_project_structure() {
    let expected_files = vec![
        "src/main.rs",
        "src/app.rs",
        "src/ui.rs",
        "src/config.rs",
        "src/model.rs",
        "src/net.rs",
        "src/filter.rs",
        "src/sort.rs",
        "src/view.rs",
        "src/error.rs",
        "src/logging.rs",
        "src/runtime.rs",
        "Cargo.toml",
        "README.md",
    ];

    for file in expected_files {
        assert!(Path::new(file).exists(), "Expected file {} not found", file);
    }
}

#[test]
fn test_cargo_toml_metadata() {
    let cargo_content = fs::read_to_string("Cargo.toml").expect("Failed to read Cargo.toml");

    assert!(
        cargo_content.contains("name = \"hkg-flight-board\""),
        "Missing package name"
    );
    assert!(cargo_content.contains("description ="), "Missing description");
    assert!(cargo_content.contains("license ="), "Missing license");
    assert!(cargo_content.contains("readme ="), "Missing readme");
    assert!(cargo_content.contains("homepage ="), "Missing homepage");
    assert!(cargo_content.contains("repository ="), "Missing repository");
}

#[test]
fn test_readme_exists_and_complete() {
    let readme_content = fs::read_to_string("README.md").expect("Failed to read README.md");

    let required_sections = vec![
        "# HKG Flight Board",
        "## Features",
        "## Quick Start",
        "## Configuration",
        "## Controls",
        "## Development",
    ];

    for section in required_sections {
        assert!(
            readme_content.contains(section),
            "README missing section: {}",
            section
        );
    }
}
