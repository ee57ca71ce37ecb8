use std::fs;
use std::path::PathBuf;
use std::process::Command;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("manpo_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const SAMPLE_PAGE: &str = ".TH HELLO 1\n.SH NAME\nhello \\- greet the world\n";

#[test]
fn extract_writes_po_and_reproduced_page() {
    let dir = TempDir::new("extract");
    let master = dir.join("hello.1");
    fs::write(&master, SAMPLE_PAGE).expect("write master");
    let po = dir.join("hello.po");
    let localized = dir.join("hello.out.1");

    let status = Command::new(env!("CARGO_BIN_EXE_manpo"))
        .args([
            "extract",
            "--master",
            master.to_str().expect("path"),
            "--po",
            po.to_str().expect("path"),
            "--localized",
            localized.to_str().expect("path"),
        ])
        .status()
        .expect("run manpo");
    assert!(status.success());

    let po_text = fs::read_to_string(&po).expect("read po");
    assert!(po_text.contains("msgid \"hello - greet the world\""));
    assert!(po_text.contains("#: "));

    let page = fs::read_to_string(&localized).expect("read page");
    assert!(page.contains(".TH HELLO 1\n"));
    assert!(page.contains("hello \\- greet the world\n"));
}

#[test]
fn translate_applies_po_entries() {
    let dir = TempDir::new("translate");
    let master = dir.join("hello.1");
    fs::write(&master, SAMPLE_PAGE).expect("write master");

    let po = dir.join("fr.po");
    fs::write(
        &po,
        "msgid \"\"\nmsgstr \"\"\n\nmsgid \"hello - greet the world\"\nmsgstr \"bonjour - salue le monde\"\n",
    )
    .expect("write po");
    let localized = dir.join("hello.fr.1");

    let status = Command::new(env!("CARGO_BIN_EXE_manpo"))
        .args([
            "translate",
            "--master",
            master.to_str().expect("path"),
            "--po",
            po.to_str().expect("path"),
            "--localized",
            localized.to_str().expect("path"),
        ])
        .status()
        .expect("run manpo");
    assert!(status.success());

    let page = fs::read_to_string(&localized).expect("read page");
    assert!(page.contains("bonjour \\- salue le monde\n"));
}

#[test]
fn generated_input_exits_with_distinct_code() {
    let dir = TempDir::new("generated");
    let master = dir.join("gen.1");
    fs::write(&master, ".\\\" Automatically generated by Pod::Man\n").expect("write master");

    let output = Command::new(env!("CARGO_BIN_EXE_manpo"))
        .args([
            "extract",
            "--master",
            master.to_str().expect("path"),
            "--po",
            dir.join("gen.po").to_str().expect("path"),
        ])
        .output()
        .expect("run manpo");

    assert_eq!(output.status.code(), Some(254));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Pod::Man"));
}

#[test]
fn invalid_groff_code_policy_is_reported() {
    let dir = TempDir::new("badpolicy");
    let master = dir.join("x.1");
    fs::write(&master, SAMPLE_PAGE).expect("write master");

    let output = Command::new(env!("CARGO_BIN_EXE_manpo"))
        .args([
            "extract",
            "--master",
            master.to_str().expect("path"),
            "--po",
            dir.join("x.po").to_str().expect("path"),
            "--groff-code",
            "sometimes",
        ])
        .output()
        .expect("run manpo");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("groff_code"));
}
