//! Integration tests that drive the `sitegen` binary against a temporary store.

use sitegen_core::files::VirtualFile;
use sitegen_core::storage::ProjectStore;
use sitegen_core::version::{Trigger, VersionStatus};
use std::path::Path;
use std::process::{Command, Output};

/// Run `sitegen --root <root> <args>` with no provider credentials.
fn sitegen(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sitegen"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("SITEGEN_API_KEY")
        .env_remove("SITEGEN_PROVIDER")
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run sitegen")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn seed_complete_version(root: &Path) {
    let store = ProjectStore::new(root);
    let version = store.create_version("acme", Trigger::Create, None).unwrap();
    let files = vec![
        VirtualFile::new(
            "src/app/page.tsx",
            "import Hero from '@/components/Hero';\n\nexport default function Home() {\n  return <Hero />;\n}\n",
        ),
        VirtualFile::new(
            "src/components/Hero.tsx",
            "export default function Hero() {\n  return <h1>Acme Bakery</h1>;\n}\n",
        ),
    ];
    store
        .replace_files("acme", version.version_number, &files)
        .unwrap();
    store
        .update_status("acme", version.version_number, VersionStatus::Complete, None)
        .unwrap();
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_sitegen"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for command in ["generate", "edit", "preview", "status", "versions", "serve"] {
        assert!(text.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_versions_of_empty_project() {
    let tmp = tempfile::tempdir().unwrap();
    let output = sitegen(tmp.path(), &["versions", "acme"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("No versions for 'acme'"));
}

#[test]
fn test_preview_without_versions_writes_diagnostic() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("preview.html");
    let output = sitegen(
        tmp.path(),
        &["preview", "acme", "--output", out.to_str().unwrap()],
    );
    assert!(output.status.success());
    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Preview unavailable"));
}

#[test]
fn test_preview_of_stored_version() {
    let tmp = tempfile::tempdir().unwrap();
    seed_complete_version(tmp.path());

    let output = sitegen(tmp.path(), &["preview", "acme", "--page", "/"]);
    assert!(output.status.success());
    let html = String::from_utf8_lossy(&output.stdout);
    assert!(html.contains("<div id=\"root\"></div>"));
    assert!(html.contains("src/components/Hero.tsx"));

    let status = sitegen(tmp.path(), &["status", "acme"]);
    assert!(status.status.success());
    let text = String::from_utf8_lossy(&status.stdout);
    assert!(text.contains("Version 1 (create)"));
    assert!(text.contains("Status: complete"));
}

#[test]
fn test_generate_rejects_bad_project_id() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("site.json");
    std::fs::write(&input, r#"{"businessName": "Acme"}"#).unwrap();
    let output = sitegen(
        tmp.path(),
        &["generate", "../escape", "--input", input.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid project id"));
}

#[test]
fn test_edit_without_provider_fails_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    seed_complete_version(tmp.path());
    let output = sitegen(tmp.path(), &["edit", "acme", "Make the hero darker"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no usable model provider"));
    // Nothing was started, so no dangling version.
    let store = ProjectStore::new(tmp.path());
    assert_eq!(store.list_version_numbers("acme").unwrap(), vec![1]);
}
