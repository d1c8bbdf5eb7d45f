//! Integration tests for ugenic-cli.
//!
//! Tests cover the binary's subcommands end to end on temporary files.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `ugenic` binary built by cargo.
fn ugenic_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ugenic"))
}

const GRAPH: &str = r#"
name = "beep"

[[controls]]
name = "amp"
values = [0.2]

[[nodes]]
id = "osc"
kind = "SinOsc"
rate = "audio"
args = [[440, 660]]

[[nodes]]
id = "out"
kind = "Out"
rate = "audio"
args = [0, { ref = "osc" }]
"#;

fn write_graph(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("graph.toml");
    std::fs::write(&path, text).unwrap();
    path
}

fn wide_graph(channels: usize) -> String {
    let freqs: Vec<String> = (0..channels).map(|i| format!("{}", 100 + i)).collect();
    format!(
        "name = \"wide\"\n\n[[nodes]]\nid = \"osc\"\nkind = \"SinOsc\"\nrate = \"audio\"\nargs = [[{}]]\n",
        freqs.join(", ")
    )
}

// ---------------------------------------------------------------------------
// catalogue
// ---------------------------------------------------------------------------

#[test]
fn cli_catalogue_lists_standard_and_plugin_kinds() {
    let output = ugenic_bin().arg("catalogue").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for key in ["SinOsc", "Out", "BinaryOpUGen", "MoogLadder"] {
        assert!(stdout.contains(key), "catalogue should list {key}");
    }
}

#[test]
fn cli_catalogue_detail_shows_arguments() {
    let output = ugenic_bin().args(["catalogue", "LPF"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("LPF.{ar,kr}(in, freq = 440)"));
    assert!(stdout.contains("MatchNode"));
    assert!(stdout.contains("Outputs: 1"));
}

#[test]
fn cli_catalogue_unknown_key_fails() {
    let output = ugenic_bin().args(["catalogue", "Nope"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nope"));
}

// ---------------------------------------------------------------------------
// encode / decode
// ---------------------------------------------------------------------------

#[test]
fn cli_encode_then_decode() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path(), GRAPH);
    let encoded = dir.path().join("beep.ugg");

    let output = ugenic_bin()
        .arg("encode")
        .arg(&graph)
        .arg("-o")
        .arg(&encoded)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("3 sources"));
    assert!(encoded.exists());

    let output = ugenic_bin()
        .arg("decode")
        .arg(&encoded)
        .arg("--expand")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Sources (3)"));
    assert!(stdout.contains("ControlProxy(\"amp\""));
    assert!(stdout.contains("SinOsc(ar, [440, 660], 0)"));
    assert!(stdout.contains("Nodes (4)"));
    assert!(stdout.contains("amp @0"));
}

#[test]
fn cli_decode_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.ugg");
    std::fs::write(&path, b"not a graph").unwrap();
    let output = ugenic_bin().arg("decode").arg(&path).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_encode_reports_unknown_kind() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(
        dir.path(),
        "name = \"x\"\n[[nodes]]\nid = \"a\"\nkind = \"Nope\"\n",
    );
    let output = ugenic_bin()
        .arg("encode")
        .arg(&graph)
        .arg("-o")
        .arg(dir.path().join("x.ugg"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown kind 'Nope'"));
}

// ---------------------------------------------------------------------------
// lower
// ---------------------------------------------------------------------------

#[test]
fn cli_lower_small_graph_inline() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path(), GRAPH);
    let out = dir.path().join("beep.scsyndef");

    let output = ugenic_bin()
        .arg("lower")
        .arg(&graph)
        .arg("-o")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Lowered 'beep': 4 nodes"));
    assert!(stdout.contains("Load plan: inline"));

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[..4], b"SCgf");
    // the file holds exactly the reported definition
    assert!(stdout.contains(&format!("{} bytes", bytes.len())));
}

#[test]
fn cli_lower_large_graph_local_goes_out_of_band() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path(), &wide_graph(600));
    let out = dir.path().join("wide.scsyndef");

    let output = ugenic_bin()
        .arg("lower")
        .arg(&graph)
        .arg("-o")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("out-of-band"));
}

#[test]
fn cli_lower_large_graph_remote_warns() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path(), &wide_graph(600));
    let out = dir.path().join("wide.scsyndef");

    let output = ugenic_bin()
        .env("RUST_LOG", "warn")
        .arg("lower")
        .arg(&graph)
        .arg("-o")
        .arg(&out)
        .arg("--remote")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("oversized, remote engine"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("inline limit"));
}
