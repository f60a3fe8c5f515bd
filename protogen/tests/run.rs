//! End-to-end runs of the command line.

use std::ffi::OsStr;

use clap::Parser;
use protogen::{Cli, run};

const XML: &str = r#"
<ld:data-definition xmlns:ld="ns">
  <ld:global-type ld:meta="struct-type" type-name="entity_position_raw" export="true">
    <ld:field name="squad_size" ld:meta="number" ld:subtype="int16_t"/>
  </ld:global-type>
</ld:data-definition>
"#;

const RULES: &str = r#"
[[rename]]
path = '//ld:field[@name="squad_size"]'
name = "squad_sz"
"#;

#[test]
fn test_render_command_writes_all_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("df.xml");
    let rules = dir.path().join("rules.toml");
    let output = dir.path().join("out");
    std::fs::write(&input, XML).expect("write");
    std::fs::write(&rules, RULES).expect("write");

    let cli = Cli::try_parse_from([
        OsStr::new("protogen"),
        OsStr::new("render"),
        input.as_os_str(),
        OsStr::new("--rules"),
        rules.as_os_str(),
        OsStr::new("-o"),
        output.as_os_str(),
    ])
    .expect("Failed to parse");
    run(cli).expect("Failed to run");

    let proto = std::fs::read_to_string(output.join("entity_position_raw.proto")).expect("read");
    assert!(proto.contains("required int32 squad_sz = 1;"));
    let source = std::fs::read_to_string(output.join("entity_position_raw.cpp")).expect("read");
    assert!(source.contains("proto->set_squad_sz(dfhack->squad_size);"));
    assert!(output.join("entity_position_raw.h").exists());
}

#[test]
fn test_render_command_fails_on_unknown_type() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("df.xml");
    std::fs::write(&input, XML).expect("write");

    let cli = Cli::try_parse_from([
        OsStr::new("protogen"),
        OsStr::new("render"),
        input.as_os_str(),
        OsStr::new("--type"),
        OsStr::new("unit"),
        OsStr::new("-o"),
        dir.path().as_os_str(),
    ])
    .expect("Failed to parse");
    assert!(run(cli).is_err());
}

#[test]
fn test_missing_input_fails() {
    let cli = Cli::try_parse_from(["protogen", "list", "/nonexistent/df.xml"]).expect("parse");
    assert!(run(cli).is_err());
}
