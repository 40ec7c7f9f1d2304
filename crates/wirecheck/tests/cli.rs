use serde_json::Value;
use wirecheck_test_utils::sandbox::Sandbox;

const BROKEN_CONFIG: &str = r#"
[pins]
"A" = 0
"B" = 1

[[layout]]
name = "Bench"

[[layout.net]]
label = "A-X"
pins = ["A", "X"]

[[layout.net]]
label = "B"
pins = ["B"]
"#;

/// Built-in layout #1 wired correctly except pin "9" (channel 8), which is
/// cut off from the rest of its net.
const OPEN_PIN_BENCH: &str = r#"
[[wire]]
channels = [12, 7]

[[wire]]
channels = [4, 0]

[[wire]]
channels = [11, 14, 3]

[[wire]]
channels = [5, 6, 13, 9, 15, 1, 2]
"#;

/// Built-in layout #2 with nets "4-7" and "5-11" shorted together.
const SHORTED_BENCH: &str = r#"
[[wire]]
channels = [12, 7, 6, 9]

[[wire]]
channels = [13, 15]
"#;

#[test]
fn test_layouts_lists_builtin() {
    let sb = Sandbox::new();
    let output = sb.run("wirecheck", ["layouts", "--pins"]);

    assert!(output.success(), "{}", output.stderr);
    assert!(output.stdout.contains("DEM w/ Power Header"));
    assert!(output.stdout.contains("Plain DEM"));
    assert!(output.stdout.contains("DEM w/ Pwr Hdr Tray State"));
    assert!(output.stdout.contains("CN2-CN3 GND"));
    assert!(output.stdout.contains("CN4"));
}

#[test]
fn test_check_builtin_is_clean() {
    let sb = Sandbox::new();
    let output = sb.run("wirecheck", ["check"]);

    assert!(output.success(), "{}", output.stderr);
    assert!(output
        .stdout
        .contains("#1 DEM w/ Power Header (4 nets, 15 channels)"));
    assert!(output.stdout.contains("#2 Plain DEM (3 nets, 6 channels)"));
}

#[test]
fn test_check_reports_unknown_label() {
    let mut sb = Sandbox::new();
    sb.write("tester.toml", BROKEN_CONFIG);

    let output = sb.snapshot_run("wirecheck", ["check", "--config", "tester.toml"]);
    insta::assert_snapshot!(output, @r"
    Command: wirecheck check --config tester.toml
    Exit Code: 1

    --- STDOUT ---
    ✗ #1 Bench
      warning: unknown pin label 'X' in net 0 ('A-X') of layout 'Bench'
    --- STDERR ---
    Error: Configuration check found 1 problem(s)
    ");
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut sb = Sandbox::new();
    sb.write("tester.toml", "[pins]\n\"A\" = 0\n");

    let output = sb.run("wirecheck", ["layouts", "--config", "tester.toml"]);

    assert!(!output.success());
    assert!(output.stderr.contains("Invalid configuration"));
    assert!(output.stderr.contains("Configuration declares no layouts"));
}

#[test]
fn test_golden_bench_passes() {
    let sb = Sandbox::new();
    let output = sb.run("wirecheck", ["test"]);

    assert!(output.success(), "{}", output.stderr);
    assert!(output.stdout.contains("All 4 net checks passed"));
}

#[test]
fn test_open_pin_fails_continuity() {
    let mut sb = Sandbox::new();
    sb.write("bench.toml", OPEN_PIN_BENCH);

    let output = sb.run(
        "wirecheck",
        ["test", "--bench", "bench.toml", "--format", "json"],
    );
    assert_eq!(output.code, 1);
    assert!(output.stderr.contains("Test run failed"));

    let json: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(json["layout"], "DEM w/ Power Header");
    assert_eq!(json["summary"]["total"], 4);
    assert_eq!(json["summary"]["failed"], 1);

    let net1 = &json["results"][1];
    assert_eq!(net1["label"], "1-9-CN1|12V");
    assert_eq!(net1["status"], "fail");
    assert_eq!(net1["continuity"], false);
    assert_eq!(net1["isolation"], true);
    assert_eq!(
        net1["findings"][0],
        "Continuity test failed: pin 9 (channel 8) did not read LOW"
    );
}

#[test]
fn test_short_fails_isolation_in_tap() {
    let mut sb = Sandbox::new();
    sb.write("bench.toml", SHORTED_BENCH);

    let output = sb.run(
        "wirecheck",
        ["test", "--layout", "2", "--bench", "bench.toml", "--format", "tap"],
    );

    assert_eq!(output.code, 1);
    assert!(output.stdout.starts_with("TAP version 13\n1..3\n"));
    assert!(output.stdout.contains("not ok 1 cycle 1 net 0 '4-7'"));
    assert!(output
        .stdout
        .contains("# Short detected: net 1 ('5-11') driver channel 6 read LOW"));
    assert!(output.stdout.contains("not ok 2 cycle 1 net 1 '5-11'"));
    assert!(output.stdout.contains("ok 3 cycle 1 net 2 '6-12'"));
}

#[test]
fn test_repeated_cycles() {
    let sb = Sandbox::new();
    let output = sb.run(
        "wirecheck",
        ["test", "--layout", "3", "--cycles", "3", "--format", "json"],
    );

    assert!(output.success(), "{}", output.stderr);
    let json: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(json["layout"], "DEM w/ Pwr Hdr Tray State");
    assert_eq!(json["summary"]["total"], 6);
    assert_eq!(json["summary"]["passed"], 6);
    assert_eq!(json["results"][5]["cycle"], 3);
}

#[test]
fn test_missing_expander_is_fatal() {
    let mut sb = Sandbox::new();
    sb.write("bench.toml", "present = false\n");

    let output = sb.run("wirecheck", ["test", "--bench", "bench.toml"]);

    assert!(!output.success());
    assert!(output.stderr.contains("I/O expander not detected"));
}

#[test]
fn test_unknown_layout_number() {
    let sb = Sandbox::new();
    let output = sb.run("wirecheck", ["test", "--layout", "4"]);

    assert!(!output.success());
    assert!(output
        .stderr
        .contains("Layout #4 does not exist, the configuration has 3 layouts"));
}

#[test]
fn test_oversized_channel_count_is_rejected() {
    let mut sb = Sandbox::new();
    sb.write(
        "tester.toml",
        r#"
[tester]
channels = 100000000000000

[pins]
"A" = 0

[[layout]]
name = "One"

[[layout.net]]
label = "A"
pins = ["A"]
"#,
    );

    let output = sb.run("wirecheck", ["test", "--config", "tester.toml"]);

    assert_eq!(output.code, 1);
    assert!(output
        .stderr
        .contains("Expander channel count must be between 1 and 256, got 100000000000000"));
}
