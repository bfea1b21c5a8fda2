//! Integration tests for ignore pattern matching

use remotesync_config::{Config, IgnoreMatcher, IgnoreRules};
use remotesync_core::PathMatcher;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_ignore_patterns_from_rc_and_gitignore() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    std::fs::write(
        root.join(".remotesyncrc"),
        r#"
ignore = [
    # Simple patterns
    "*.log",
    "*.tmp",

    # Directory pattern
    "target/",

    # Ignore all of vendor, then re-include one package
    "vendor/*",
    "!vendor/patched/",
]
"#,
    )
    .unwrap();
    std::fs::write(root.join(".gitignore"), "# generated\n/out/\nsecrets.env\n").unwrap();

    let config = Config::load(root.join(".remotesyncrc")).unwrap();
    let rules = IgnoreRules::collect(&config, root, true).unwrap();
    let matcher = IgnoreMatcher::new(root, &rules).unwrap();

    // Test cases: (path, expected_excluded, description)
    let test_cases = vec![
        ("debug.log", true, "Glob pattern *.log"),
        ("logs/today.log", true, "Glob matches at any depth"),
        ("data.tmp", true, "Glob pattern *.tmp"),
        ("src/main.rs", false, "No matching pattern"),
        ("target/debug/app", true, "Inside ignored directory"),
        ("vendor/serde/lib.rs", true, "Matches vendor/*"),
        ("vendor/patched/lib.rs", false, "Re-included by negation"),
        ("out/bundle.js", true, "Anchored .gitignore directory"),
        ("web/out/bundle.js", false, "Anchored pattern only at root"),
        ("config/secrets.env", true, ".gitignore file pattern"),
        (".idea/workspace.xml", true, "Always-ignored editor dir"),
        ("node_modules/x/index.js", true, "Always-ignored node_modules"),
    ];

    for (path, expected, description) in test_cases {
        assert_eq!(
            matcher.is_excluded(Path::new(path)),
            expected,
            "{description}: {path}"
        );
    }
}

#[test]
fn test_default_ignores_cover_dotfiles() {
    let temp = TempDir::new().unwrap();
    let rules = IgnoreRules::collect(&Config::default(), temp.path(), false).unwrap();
    let matcher = IgnoreMatcher::new(temp.path(), &rules).unwrap();

    assert!(matcher.is_excluded(Path::new(".env")));
    assert!(matcher.is_excluded(Path::new(".git/objects/ab/cdef")));
    assert!(matcher.is_excluded(Path::new("dist/app.js")));
    assert!(matcher.is_excluded(Path::new("server.log")));
    assert!(!matcher.is_excluded(Path::new("README.md")));
    assert!(!matcher.is_excluded(Path::new("src/app/index.ts")));
}
