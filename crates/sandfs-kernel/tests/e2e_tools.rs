//! End-to-end tests through the mount registry.
//!
//! Every test builds a config, opens mounts, and drives the tool surface
//! with JSON arguments exactly as the CLI does:
//! `MountRegistry::call(mount, tool, json)` → `Mount` → `ToolRegistry` →
//! engine → `Provider::resolve_path` → backend.

use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;

use sandfs_kernel::{
    CancellationToken, Mount, MountConfig, MountRegistry, SandboxConfig, SymlinkMode, VfsError,
    VfsResult,
};

// ============================================================================
// Shared test setup
// ============================================================================

struct Fixture {
    registry: MountRegistry,
    cancel: CancellationToken,
}

impl Fixture {
    async fn new(configs: Vec<MountConfig>) -> Self {
        let registry = MountRegistry::from_config(&SandboxConfig { mounts: configs })
            .await
            .unwrap();
        Self {
            registry,
            cancel: CancellationToken::new(),
        }
    }

    async fn call(&self, mount: &str, tool: &str, args: Value) -> VfsResult<Value> {
        self.registry.call(mount, tool, &args, &self.cancel).await
    }
}

fn root_of(dir: &TempDir) -> String {
    dir.path().display().to_string()
}

fn files(result: &Value) -> Vec<String> {
    result["matches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["file"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Root mapping
// ============================================================================

#[tokio::test]
async fn nested_roots_route_to_longest_prefix() {
    let t1 = TempDir::new().unwrap();
    let t2 = TempDir::new().unwrap();
    let fx = Fixture::new(vec![
        MountConfig::local("ws")
            .with_root("/data", root_of(&t1))
            .with_root("/data/logs", root_of(&t2)),
    ])
    .await;

    fx.call("ws", "write_file", json!({ "path": "/data/logs/app.log", "content": "logs" }))
        .await
        .unwrap();
    fx.call("ws", "write_file", json!({ "path": "/data/app.log", "content": "data" }))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(t2.path().join("app.log")).unwrap(), "logs");
    assert_eq!(std::fs::read_to_string(t1.path().join("app.log")).unwrap(), "data");
    assert!(!t1.path().join("logs").exists());

    let roots = fx.call("ws", "list_allowed_directories", json!({})).await.unwrap();
    assert_eq!(roots, json!({ "roots": ["/data", "/data/logs"] }));
}

#[tokio::test]
async fn local_mount_without_roots() {
    let fx = Fixture::new(vec![MountConfig::local("bare")]).await;
    let err = fx
        .call("bare", "read_file", json!({ "path": "/anything" }))
        .await
        .unwrap_err();
    assert!(matches!(err, VfsError::NoRootsDefined));
    assert!(err.to_string().contains("no root paths defined"));
}

#[tokio::test]
async fn dotdot_cannot_escape_root() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("inner")).unwrap();
    let fx = Fixture::new(vec![
        MountConfig::local("ws").with_root("/data", dir.path().join("inner").display().to_string()),
    ])
    .await;
    std::fs::write(dir.path().join("outside.txt"), "secret").unwrap();

    for path in ["/data/../outside.txt", "/data/sub/../../outside.txt", "/data/../../x"] {
        let err = fx.call("ws", "read_file", json!({ "path": path })).await.unwrap_err();
        assert!(matches!(err, VfsError::PathTraversal), "{path}: {err}");
        assert!(err.to_string().contains("access denied"));
    }
}

// ============================================================================
// File lifecycle
// ============================================================================

#[tokio::test]
async fn deep_write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let fx = Fixture::new(vec![MountConfig::local("ws").with_root("/data", root_of(&dir))]).await;

    fx.call(
        "ws",
        "write_file",
        json!({ "path": "/data/a/b/c/file.txt", "content": "round trip\n" }),
    )
    .await
    .unwrap();

    let out = fx
        .call("ws", "read_file", json!({ "path": "/data/a/b/c/file.txt" }))
        .await
        .unwrap();
    assert_eq!(out["content"], "round trip\n");

    let listing = fx.call("ws", "list_directory", json!({ "path": "/data/a/b" })).await.unwrap();
    assert_eq!(listing["entries"][0]["name"], "c");
    assert_eq!(listing["entries"][0]["is_dir"], true);

    let info = fx
        .call("ws", "get_file_info", json!({ "path": "/data/a/b/c/file.txt" }))
        .await
        .unwrap();
    assert_eq!(info["name"], "file.txt");
    assert_eq!(info["size"], 11);
}

#[tokio::test]
async fn move_then_delete() {
    let dir = TempDir::new().unwrap();
    let fx = Fixture::new(vec![MountConfig::local("ws").with_root("/data", root_of(&dir))]).await;

    fx.call("ws", "write_file", json!({ "path": "/data/draft.md", "content": "# hi" }))
        .await
        .unwrap();
    fx.call(
        "ws",
        "move_file",
        json!({ "source": "/data/draft.md", "destination": "/data/docs/final.md" }),
    )
    .await
    .unwrap();
    assert!(dir.path().join("docs/final.md").exists());

    let err = fx.call("ws", "delete_file", json!({ "path": "/data/docs" })).await;
    assert!(err.is_err());
    fx.call("ws", "delete_file", json!({ "path": "/data/docs", "recursive": true }))
        .await
        .unwrap();
    assert!(!dir.path().join("docs").exists());
}

#[tokio::test]
async fn read_only_mount_refuses_every_mutation() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("keep.txt"), "keep").unwrap();
    let fx = Fixture::new(vec![
        MountConfig::local("ro")
            .with_root("/data", root_of(&dir))
            .with_read_only(true),
    ])
    .await;

    for (tool, args) in [
        ("write_file", json!({ "path": "/data/new.txt", "content": "x" })),
        ("move_file", json!({ "source": "/data/keep.txt", "destination": "/data/moved.txt" })),
        ("delete_file", json!({ "path": "/data/keep.txt" })),
    ] {
        let err = fx.call("ro", tool, args).await.unwrap_err();
        assert!(matches!(err, VfsError::ReadOnly), "{tool}: {err}");
    }

    assert!(dir.path().join("keep.txt").exists());
    let out = fx.call("ro", "read_file", json!({ "path": "/data/keep.txt" })).await.unwrap();
    assert_eq!(out["content"], "keep");
}

#[tokio::test]
async fn memory_mount_is_isolated_per_mount() {
    let fx = Fixture::new(vec![MountConfig::memory("a"), MountConfig::memory("b")]).await;

    fx.call("a", "write_file", json!({ "path": "/x/y.txt", "content": "in a" }))
        .await
        .unwrap();
    assert!(fx.call("b", "read_file", json!({ "path": "/x/y.txt" })).await.is_err());

    let out = fx.call("a", "read_file", json!({ "path": "/x/../x/y.txt" })).await.unwrap();
    assert_eq!(out["content"], "in a");
}

#[tokio::test]
async fn errors_name_virtual_paths_only() {
    let dir = TempDir::new().unwrap();
    let real = root_of(&dir);
    let canonical = dunce::canonicalize(dir.path()).unwrap().display().to_string();
    std::fs::write(dir.path().join("file.txt"), "x").unwrap();

    let fx = Fixture::new(vec![MountConfig::local("ws").with_root("/data", real.clone())]).await;
    let calls = [
        ("read_file", json!({ "path": "/data/ghost.txt" })),
        ("list_directory", json!({ "path": "/data/ghost" })),
        ("get_file_info", json!({ "path": "/data/ghost" })),
        ("delete_file", json!({ "path": "/data/ghost" })),
        ("move_file", json!({ "source": "/data/ghost", "destination": "/data/b" })),
        ("list_directory", json!({ "path": "/data/file.txt" })),
        ("write_file", json!({ "path": "/data/file.txt/below", "content": "x" })),
        ("search_files", json!({ "path": "/data/ghost", "pattern": "x" })),
    ];
    for (tool, args) in calls {
        let err = fx.call("ws", tool, args).await.unwrap_err();
        let message = err.to_string();
        assert!(!message.contains(&real), "{tool}: {message}");
        assert!(!message.contains(&canonical), "{tool}: {message}");
    }

    let err = fx
        .call("ws", "read_file", json!({ "path": "/data/ghost.txt" }))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "not found: /data/ghost.txt");
}

// ============================================================================
// Access policy
// ============================================================================

#[tokio::test]
async fn deny_beats_allow() {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();
    std::fs::create_dir_all(root.join("project/secrets")).unwrap();
    std::fs::write(root.join("project/secrets/key"), "k").unwrap();
    std::fs::write(root.join("project/readme"), "r").unwrap();

    let fx = Fixture::new(vec![
        MountConfig::local("ws")
            .with_root("/data", root.display().to_string())
            .with_allowed(root.join("project").display().to_string())
            .with_denied(root.join("project/secrets").display().to_string()),
    ])
    .await;

    assert!(fx.call("ws", "read_file", json!({ "path": "/data/project/readme" })).await.is_ok());

    let err = fx
        .call("ws", "read_file", json!({ "path": "/data/project/secrets/key" }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("path is in denied list"));
    assert!(err.to_string().contains("access denied"));

    let err = fx
        .call("ws", "list_directory", json!({ "path": "/data" }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("path not in allowed list"));
}

#[tokio::test]
async fn glob_patterns_in_deny_list() {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();
    std::fs::write(root.join("app.env"), "SECRET=1").unwrap();
    std::fs::write(root.join("app.toml"), "ok = true").unwrap();

    let fx = Fixture::new(vec![
        MountConfig::local("ws")
            .with_root("/data", root.display().to_string())
            .with_denied(format!("{}/*.env", root.display())),
    ])
    .await;

    assert!(fx.call("ws", "read_file", json!({ "path": "/data/app.toml" })).await.is_ok());
    assert!(fx.call("ws", "read_file", json!({ "path": "/data/app.env" })).await.is_err());
}

#[tokio::test]
async fn search_skips_denied_subtree() {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();
    std::fs::create_dir_all(root.join("secrets")).unwrap();
    std::fs::write(root.join("secrets/key"), "API_TOKEN=hunter2\n").unwrap();
    std::fs::write(root.join("app.env"), "DB_TOKEN=swordfish\n").unwrap();
    std::fs::write(root.join("notes.txt"), "TOKEN goes in secrets/key\n").unwrap();

    let fx = Fixture::new(vec![
        MountConfig::local("ws")
            .with_root("/data", root.display().to_string())
            .with_denied(root.join("secrets").display().to_string())
            .with_denied(format!("{}/*.env", root.display())),
    ])
    .await;

    assert!(fx.call("ws", "read_file", json!({ "path": "/data/secrets/key" })).await.is_err());
    let out = fx
        .call("ws", "search_files", json!({ "path": "/data", "pattern": "TOKEN" }))
        .await
        .unwrap();
    assert_eq!(files(&out), vec!["/data/notes.txt"]);
    assert!(!out.to_string().contains("hunter2"));
    assert!(!out.to_string().contains("swordfish"));
}

#[tokio::test]
async fn search_stays_inside_allowed_list() {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();
    std::fs::create_dir_all(root.join("project/src")).unwrap();
    std::fs::write(root.join("project/src/lib.rs"), "needle\n").unwrap();
    std::fs::write(root.join("project/src/notes.txt"), "needle\n").unwrap();
    std::fs::write(root.join("project/private.key"), "needle\n").unwrap();

    let fx = Fixture::new(vec![
        MountConfig::local("ws")
            .with_root("/data", root.display().to_string())
            .with_allowed(format!("{}/project{{,/src,/src/*.rs}}", root.display())),
    ])
    .await;

    assert!(fx.call("ws", "read_file", json!({ "path": "/data/project/private.key" })).await.is_err());
    let out = fx
        .call("ws", "search_files", json!({ "path": "/data/project", "pattern": "needle" }))
        .await
        .unwrap();
    assert_eq!(files(&out), vec!["/data/project/src/lib.rs"]);

    let err = fx
        .call("ws", "search_files", json!({ "path": "/data", "pattern": "needle" }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("path not in allowed list"));
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn search_never_reports_hidden_entries() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
    std::fs::write(dir.path().join(".git/config"), "[core]\n").unwrap();
    std::fs::write(dir.path().join(".git/objects/blob"), "data\n").unwrap();
    std::fs::write(dir.path().join(".hidden"), "secret\n").unwrap();
    std::fs::write(dir.path().join("visible.txt"), "hello\n").unwrap();

    let fx = Fixture::new(vec![MountConfig::local("ws").with_root("/data", root_of(&dir))]).await;
    let out = fx
        .call("ws", "search_files", json!({ "path": "/data", "pattern": ".*" }))
        .await
        .unwrap();
    assert_eq!(files(&out), vec!["/data/visible.txt"]);
}

#[tokio::test]
async fn search_rooted_at_hidden_directory_finds_nothing() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".git/refs")).unwrap();
    std::fs::write(dir.path().join(".git/config"), "[core]\n").unwrap();
    std::fs::write(dir.path().join(".git/refs/main"), "abc123\n").unwrap();

    let fx = Fixture::new(vec![MountConfig::local("ws").with_root("/data", root_of(&dir))]).await;
    let out = fx
        .call("ws", "search_files", json!({ "path": "/data/.git", "pattern": ".*" }))
        .await
        .unwrap();
    assert_eq!(out, json!({ "matches": [] }));
}

#[tokio::test]
async fn search_invalid_regex_fails_before_filesystem_access() {
    let fx = Fixture::new(vec![MountConfig::local("bare")]).await;
    // No roots at all: any resolution would fail with NoRootsDefined.
    let err = fx
        .call("bare", "search_files", json!({ "path": "/data", "pattern": "[" }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid regex pattern"));
}

#[tokio::test]
async fn search_caps_at_one_hundred_matches() {
    let dir = TempDir::new().unwrap();
    for i in 0..30 {
        let body: String = (0..10).map(|j| format!("match {i} {j}\n")).collect();
        std::fs::write(dir.path().join(format!("f{i:02}.txt")), body).unwrap();
    }

    let fx = Fixture::new(vec![MountConfig::local("ws").with_root("/data", root_of(&dir))]).await;
    let out = fx
        .call("ws", "search_files", json!({ "path": "/data", "pattern": "match" }))
        .await
        .unwrap();
    assert_eq!(out["matches"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn search_skips_binary_and_oversized_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("text.txt"), "needle\n").unwrap();
    std::fs::write(dir.path().join("blob.bin"), b"needle\x00\x01\x02\n").unwrap();
    let mut big = b"needle\n".to_vec();
    big.resize(10 * 1024 * 1024 + 1, b'x');
    std::fs::write(dir.path().join("big.txt"), big).unwrap();

    let fx = Fixture::new(vec![MountConfig::local("ws").with_root("/data", root_of(&dir))]).await;
    let out = fx
        .call("ws", "search_files", json!({ "path": "/data", "pattern": "needle" }))
        .await
        .unwrap();
    assert_eq!(files(&out), vec!["/data/text.txt"]);
    assert_eq!(out["matches"][0]["line_number"], 1);
    assert_eq!(out["matches"][0]["line_content"], "needle");
}

#[tokio::test]
async fn search_cancelled_before_start() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
    let fx = Fixture::new(vec![MountConfig::local("ws").with_root("/data", root_of(&dir))]).await;

    fx.cancel.cancel();
    let err = fx
        .call("ws", "search_files", json!({ "path": "/data", "pattern": "a" }))
        .await
        .unwrap_err();
    assert!(err.is_canceled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_cancelled_while_running() {
    let dir = TempDir::new().unwrap();
    for d in 0..40 {
        let sub = dir.path().join(format!("d{d}"));
        std::fs::create_dir(&sub).unwrap();
        for f in 0..50 {
            std::fs::write(sub.join(format!("f{f}.txt")), "no hits on this line\n".repeat(200))
                .unwrap();
        }
    }

    let registry = MountRegistry::new();
    registry
        .register(Mount::open(&MountConfig::local("ws").with_root("/data", root_of(&dir))).unwrap())
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result = registry
        .call(
            "ws",
            "search_files",
            &json!({ "path": "/data", "pattern": "never-present" }),
            &cancel,
        )
        .await;
    // A machine fast enough to finish 2000 files in 5ms gets no error.
    if let Err(err) = result {
        assert!(err.is_canceled(), "{err}");
    }
    assert!(started.elapsed() < Duration::from_secs(30));
}

// ============================================================================
// Symlinks
// ============================================================================

#[cfg(unix)]
mod symlinks {
    use super::*;
    use std::os::unix::fs::symlink;
    use std::path::Path;

    struct Tree {
        root: TempDir,
        outside: TempDir,
    }

    /// root/
    ///   real/file.txt
    ///   internal -> real
    ///   external -> <outside>
    ///   dangling -> <outside>/missing
    fn tree() -> Tree {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("real")).unwrap();
        std::fs::write(root.path().join("real/file.txt"), "inside\n").unwrap();
        std::fs::write(outside.path().join("secret.txt"), "outside\n").unwrap();
        symlink(root.path().join("real"), root.path().join("internal")).unwrap();
        symlink(outside.path(), root.path().join("external")).unwrap();
        symlink(outside.path().join("missing"), root.path().join("dangling")).unwrap();
        Tree { root, outside }
    }

    async fn mount(tree: &Tree, mode: SymlinkMode) -> Fixture {
        Fixture::new(vec![
            MountConfig::local("ws")
                .with_root("/data", root_of(&tree.root))
                .with_symlink_mode(mode),
        ])
        .await
    }

    fn read(path: &str) -> Value {
        json!({ "path": path })
    }

    #[tokio::test]
    async fn internal_link_by_mode() {
        let t = tree();
        for mode in [SymlinkMode::Allow, SymlinkMode::InternalOnly] {
            let fx = mount(&t, mode).await;
            let out = fx.call("ws", "read_file", read("/data/internal/file.txt")).await.unwrap();
            assert_eq!(out["content"], "inside\n", "{mode}");
        }

        let fx = mount(&t, SymlinkMode::Deny).await;
        let err = fx
            .call("ws", "read_file", read("/data/internal/file.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, VfsError::SymlinksDisabled(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[tokio::test]
    async fn external_link_always_fails() {
        let t = tree();
        for mode in [SymlinkMode::Allow, SymlinkMode::InternalOnly, SymlinkMode::Deny] {
            let fx = mount(&t, mode).await;
            let err = fx
                .call("ws", "read_file", read("/data/external/secret.txt"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("access denied"), "{mode}: {err}");
        }
    }

    #[tokio::test]
    async fn write_through_external_ancestor_fails() {
        let t = tree();
        let fx = mount(&t, SymlinkMode::Allow).await;
        let err = fx
            .call(
                "ws",
                "write_file",
                json!({ "path": "/data/external/new/dir/file.txt", "content": "x" }),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("access denied"), "{err}");
        assert!(!t.outside.path().join("new").exists());
    }

    #[tokio::test]
    async fn dangling_link_is_broken() {
        let t = tree();
        let fx = mount(&t, SymlinkMode::Allow).await;
        let err = fx
            .call("ws", "write_file", json!({ "path": "/data/dangling", "content": "x" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("broken symlink") || err.to_string().contains("access denied"));
        assert!(!t.outside.path().join("missing").exists());
    }

    #[tokio::test]
    async fn search_does_not_follow_links() {
        let t = tree();
        let fx = mount(&t, SymlinkMode::Allow).await;
        let out = fx
            .call("ws", "search_files", json!({ "path": "/data", "pattern": "side" }))
            .await
            .unwrap();
        assert_eq!(files(&out), vec!["/data/real/file.txt"]);
    }

    #[tokio::test]
    async fn symlinked_real_root_is_accepted() {
        let t = tree();
        let alias = TempDir::new().unwrap();
        let link = alias.path().join("root-link");
        symlink(t.root.path(), &link).unwrap();

        let fx = Fixture::new(vec![
            MountConfig::local("ws")
                .with_root("/data", link.display().to_string())
                .with_symlink_mode(SymlinkMode::Deny),
        ])
        .await;
        let out = fx.call("ws", "read_file", read("/data/real/file.txt")).await.unwrap();
        assert_eq!(out["content"], "inside\n");
        assert!(Path::new(&link).exists());
    }
}
