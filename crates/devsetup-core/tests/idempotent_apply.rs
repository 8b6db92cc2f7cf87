//! Integration tests for the idempotent-apply guarantees of devsetup-core.
//!
//! Each test drives the public store API the way a bundle does, then runs the
//! same changes a second time and checks that every store is unchanged
//! byte for byte.

use std::fs;
use std::path::Path;

use devsetup_core::{
    ApplyOutcome, DeepMergeStore, JsonRecordList, JsonSettingsFile, KeyValueStore,
    MemoryEnvironment, PathStore, RecordListStore, RegistryPathStore, ShellRcPathStore,
    TerminalSettingsFile, TextAppendStore, TextFile,
};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

fn snapshot(paths: &[&Path]) -> Vec<Vec<u8>> {
    paths.iter().map(|p| fs::read(p).unwrap_or_default()).collect()
}

/// Applies the terminal bundle's file changes to stores under `home`.
fn apply_terminal_changes(home: &Path) {
    let settings = JsonSettingsFile::new(home.join(".config/Code/User/settings.json"));
    settings
        .apply_all(vec![
            ("terminal.integrated.defaultProfile.linux".into(), json!("zsh")),
            ("terminal.integrated.fontFamily".into(), json!("Cascadia Mono NF")),
        ])
        .unwrap();

    let keybindings = JsonRecordList::new(home.join(".config/Code/User/keybindings.json"));
    keybindings
        .append(
            obj(json!({
                "key": "ctrl+k",
                "command": "-vscode-neovim.send",
                "when": "editorTextFocus && neovim.init"
            })),
            &["key", "command"],
        )
        .unwrap();

    TextFile::new(home.join(".zshrc"))
        .ensure_line(
            "oh-my-posh init zsh",
            "eval \"$(oh-my-posh init zsh --config https://example.test/gruvbox.omp.json)\"",
        )
        .unwrap();

    ShellRcPathStore::for_home(home)
        .ensure_folder_on_path("/opt/nvim/bin")
        .unwrap();

    TerminalSettingsFile::new(home.join("wt/settings.json"))
        .apply(obj(json!({
            "profiles": {"defaults": {"font": {"face": "Cascadia Mono NF"}}},
            "schemes": [{"name": "Gruvbox Dark", "background": "#282828"}]
        })))
        .unwrap();
}

#[test]
fn test_full_rerun_leaves_every_store_byte_identical() {
    // Arrange
    let home = TempDir::new().unwrap();
    fs::write(home.path().join(".bashrc"), "# existing bashrc\n").unwrap();
    fs::write(home.path().join(".zshrc"), "# existing zshrc\n").unwrap();
    fs::create_dir_all(home.path().join("wt")).unwrap();
    fs::write(
        home.path().join("wt/settings.json"),
        r#"{"defaultProfile": "{guid}", "profiles": {"list": []}, "schemes": []}"#,
    )
    .unwrap();
    let settings = home.path().join(".config/Code/User/settings.json");
    let keybindings = home.path().join(".config/Code/User/keybindings.json");
    let bashrc = home.path().join(".bashrc");
    let zshrc = home.path().join(".zshrc");
    let terminal = home.path().join("wt/settings.json");
    let paths = [
        settings.as_path(),
        keybindings.as_path(),
        bashrc.as_path(),
        zshrc.as_path(),
        terminal.as_path(),
    ];
    apply_terminal_changes(home.path());
    let first = snapshot(&paths);

    // Act
    apply_terminal_changes(home.path());

    // Assert
    assert_eq!(snapshot(&paths), first);
}

#[test]
fn test_keybinding_dedup_keeps_insertion_order_across_runs() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let store = JsonRecordList::new(dir.path().join("keybindings.json"));
    let bindings = [("ctrl+a", "one"), ("ctrl+b", "two"), ("ctrl+a", "one"), ("ctrl+c", "three")];

    // Act
    for _ in 0..2 {
        for (key, command) in bindings {
            store
                .append(obj(json!({"key": key, "command": command})), &["key", "command"])
                .unwrap();
        }
    }

    // Assert
    let list: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(
        list,
        json!([
            {"key": "ctrl+a", "command": "one"},
            {"key": "ctrl+b", "command": "two"},
            {"key": "ctrl+c", "command": "three"}
        ])
    );
}

#[test]
fn test_registry_path_store_never_duplicates_folder() {
    let store = RegistryPathStore::new(MemoryEnvironment::with_value("Path", r"C:\Windows"));

    let first = store.ensure_folder_on_path(r"C:\Users\me\nvim\nvim-win64\bin").unwrap();
    let second = store.ensure_folder_on_path(r"C:\Users\me\nvim\nvim-win64\bin").unwrap();

    assert!(first.changed() && first.env_patch.is_some());
    assert!(!second.changed() && second.env_patch.is_none());
    assert_eq!(
        store.environment().get("Path").as_deref(),
        Some(r"C:\Windows;C:\Users\me\nvim\nvim-win64\bin")
    );
}

#[test]
fn test_commented_out_fragment_counts_as_present() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Microsoft.PowerShell_profile.ps1");
    fs::write(&path, "# oh-my-posh init pwsh | Invoke-Expression\n").unwrap();

    // Act
    let outcome = TextFile::new(&path)
        .ensure_line("oh-my-posh init pwsh", "oh-my-posh init pwsh | Invoke-Expression")
        .unwrap();

    // Assert
    assert_eq!(outcome, ApplyOutcome::AlreadyPresent);
}

#[test]
fn test_malformed_stores_are_never_written() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let broken = "{ \"unterminated\": /* oops ";
    let settings_path = dir.path().join("settings.json");
    let keybindings_path = dir.path().join("keybindings.json");
    let terminal_path = dir.path().join("terminal.json");
    for p in [&settings_path, &keybindings_path, &terminal_path] {
        fs::write(p, broken).unwrap();
    }

    // Act
    let settings = JsonSettingsFile::new(&settings_path).apply("a", json!(1));
    let keybindings = JsonRecordList::new(&keybindings_path)
        .append(obj(json!({"key": "k", "command": "c"})), &["key", "command"]);
    let terminal = TerminalSettingsFile::new(&terminal_path).apply(obj(json!({"a": 1})));

    // Assert
    assert!(settings.unwrap_err().is_parse_error());
    assert!(keybindings.unwrap_err().is_parse_error());
    assert!(terminal.unwrap_err().is_parse_error());
    for p in [&settings_path, &keybindings_path, &terminal_path] {
        assert_eq!(fs::read_to_string(p).unwrap(), broken);
    }
}
