use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

const INTERCHANGE: &str = "ISA*00*          *00*          *ZZ*SENDER         \
     *ZZ*RECEIVER       *240101*1200*^*00501*000000001*0*P*:~\
     GS*HC*SENDER*RECEIVER*20240101*1200*1*X*005010X222A1~\
     ST*837*0001*005010X222A1~\
     HL*1**20*1~\
     NM1*41*2*FIRST~\
     HL*2**20*1~\
     NM1*41*2*SECOND~\
     SE*6*0001~\
     GE*1*1~\
     IEA*1*000000001~";

const SCHEMA: &str = r#"
transaction_sets:
  - id: "837"
    convention: 005010X222A1
    loops:
      - id: 2000A
        repetition: -1
        start_segment: HL
        loops:
          - id: 2010AA
            start_segment: NM1
            start_qualifier: "41"
"#;

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_x12") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("x12{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_x12 is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time after epoch")
        .as_nanos();
    let counter = TEMP_FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let filename = format!(
        "x12-cli-{name}-{}-{nanos}-{counter}.{extension}",
        std::process::id()
    );
    env::temp_dir().join(filename)
}

fn write_temp_file(name: &str, extension: &str, content: &str) -> PathBuf {
    let path = unique_temp_path(name, extension);
    fs::write(&path, content).expect("temporary file should be writable");
    path
}

fn run_x12(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .output()
        .expect("run x12")
}

#[test]
fn convert_command_outputs_json_to_stdout() {
    let input = write_temp_file("convert-claim", "x12", INTERCHANGE);
    let schema = write_temp_file("convert-schema", "yaml", SCHEMA);

    let output = run_x12(&[
        "convert",
        input.to_string_lossy().as_ref(),
        "--schema",
        schema.to_string_lossy().as_ref(),
        "--pretty",
    ]);

    assert!(
        output.status.success(),
        "expected convert to succeed; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let doc: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(doc["loop"], "InterchangeControl");

    let transaction = &doc["children"][1]["children"][1];
    assert_eq!(transaction["loop"], "TransactionSet");
    assert_eq!(transaction["children"][1]["loop"], "2000A");
    assert_eq!(transaction["children"][2]["loop"], "2000A");

    fs::remove_file(input).ok();
    fs::remove_file(schema).ok();
}

#[test]
fn convert_command_writes_output_file() {
    let input = write_temp_file("convert-out", "x12", INTERCHANGE);
    let out = unique_temp_path("convert-out", "json");

    let output = run_x12(&[
        "convert",
        input.to_string_lossy().as_ref(),
        "--output",
        out.to_string_lossy().as_ref(),
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = fs::read_to_string(&out).expect("output file should exist");
    let doc: serde_json::Value =
        serde_json::from_str(&written).expect("output should be valid JSON");
    assert_eq!(doc["loop"], "InterchangeControl");

    fs::remove_file(input).ok();
    fs::remove_file(out).ok();
}

#[test]
fn convert_command_fails_on_garbage_input() {
    let input = write_temp_file("convert-garbage", "x12", "this is not an interchange");

    let output = run_x12(&["convert", input.to_string_lossy().as_ref()]);
    assert!(!output.status.success());

    fs::remove_file(input).ok();
}

#[test]
fn header_command_prints_the_decoded_header() {
    let input = write_temp_file("header-claim", "x12", INTERCHANGE);

    let output = run_x12(&["header", input.to_string_lossy().as_ref()]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    assert!(stdout.contains("SENDER"));
    assert!(stdout.contains("RECEIVER"));
    assert!(stdout.contains("2024-01-01 12:00"));
    assert!(stdout.contains("segment='~'"));

    fs::remove_file(input).ok();
}
