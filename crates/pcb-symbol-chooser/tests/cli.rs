use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use serde_json::Value;

const DEVICE: &str = r#"(kicad_symbol_lib (version 20231120) (generator "kicad_symbol_editor")
  (symbol "R"
    (property "Reference" "R" (at 2.032 0 90))
    (property "Description" "Resistor" (at 0 0 0))
    (property "ki_keywords" "R res resistor" (at 0 0 0))
    (symbol "R_1_1"))
  (symbol "R_Small" (extends "R"))
  (symbol "C"
    (property "Description" "Unpolarized capacitor" (at 0 0 0))
    (property "ki_keywords" "cap capacitor" (at 0 0 0)))
)"#;

const POWER: &str = r#"(kicad_symbol_lib (version 20231120) (generator "kicad_symbol_editor")
  (symbol "GND" (power)
    (property "Description" "Power symbol creates a global label with name \"GND\" , ground" (at 0 0 0)))
  (symbol "VCC" (power)
    (property "Description" "Power symbol creates a global label with name \"VCC\"" (at 0 0 0)))
)"#;

const TABLE: &str = r#"(sym_lib_table
  (version 7)
  (lib (name "Device")(type "KiCad")(uri "${KIPRJMOD}/symbols/Device.kicad_sym")(options "")(descr "Generic symbols"))
  (lib (name "power")(type "KiCad")(uri "symbols/power.kicad_sym")(options "")(descr "Power flags"))
  (lib (name "Gone")(type "KiCad")(uri "symbols/Gone.kicad_sym")(options "")(descr ""))
)"#;

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("symbols/Device.kicad_sym").write_str(DEVICE).unwrap();
    temp.child("symbols/power.kicad_sym").write_str(POWER).unwrap();
    temp.child("sym-lib-table").write_str(TABLE).unwrap();
    temp
}

fn pcb_symbols(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pcb-symbols").unwrap();
    cmd.current_dir(temp.path())
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env_remove("RUST_LOG");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_search_json() {
    let temp = workspace();
    let json = json_stdout(pcb_symbols(&temp).args([
        "--lib-table",
        "sym-lib-table",
        "search",
        "resistor",
        "--format",
        "json",
    ]));

    assert_eq!(json["total"], 2);
    assert_eq!(json["hits"][0]["lib_id"], "Device:R");
    assert_eq!(json["hits"][0]["description"], "Resistor");
    assert_eq!(json["hits"][1]["lib_id"], "Device:R_Small");
    assert_eq!(json["reveal"]["node"], "Device:R");
    assert_eq!(json["reveal"]["rule"], "search_result");
}

#[test]
fn test_search_limit() {
    let temp = workspace();
    let json = json_stdout(pcb_symbols(&temp).args([
        "--lib-table",
        "sym-lib-table",
        "search",
        "r",
        "--limit",
        "1",
        "-f",
        "json",
    ]));
    // R, R_Small and both power symbols via the "power" library name
    assert_eq!(json["total"], 4);
    assert_eq!(json["hits"].as_array().unwrap().len(), 1);
    assert_eq!(json["hits"][0]["lib_id"], "Device:R");
}

#[test]
fn test_tree_uses_config_file() {
    let temp = workspace();
    temp.child("pcb-symbols.toml")
        .write_str("library_dir = \"symbols\"\npreselect = \"power:GND\"\n")
        .unwrap();

    let output = pcb_symbols(&temp).arg("tree").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(stdout.contains("5 symbols in 2 libraries"), "{stdout}");
    assert!(stdout.contains("Reveal: power:GND (Preselect)"), "{stdout}");
}

#[test]
fn test_tree_json_power_only() {
    let temp = workspace();
    let json = json_stdout(pcb_symbols(&temp).args([
        "--library-dir",
        "symbols",
        "--power",
        "tree",
        "--format",
        "json",
    ]));
    let libraries = json.as_array().unwrap();
    assert_eq!(libraries.len(), 1);
    assert_eq!(libraries[0]["name"], "power");
    assert_eq!(libraries[0]["kind"], "library");
    assert_eq!(libraries[0]["children"][0]["name"], "GND");
}

#[test]
fn test_libs_reports_failures() {
    let temp = workspace();
    let json = json_stdout(pcb_symbols(&temp).args([
        "--lib-table",
        "sym-lib-table",
        "libs",
        "-f",
        "json",
    ]));
    let libraries = json.as_array().unwrap();
    assert_eq!(libraries.len(), 3);
    assert_eq!(libraries[0]["nickname"], "Device");
    assert_eq!(libraries[0]["symbols"], 3);
    assert_eq!(libraries[0]["status"]["status"], "loaded");
    assert_eq!(libraries[2]["nickname"], "Gone");
    assert_eq!(libraries[2]["status"]["status"], "failed");
}

#[test]
fn test_missing_table_fails() {
    let temp = workspace();
    let output = pcb_symbols(&temp)
        .args(["--lib-table", "nope", "libs"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).to_string();
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("Failed to open library table"), "{stderr}");
}
