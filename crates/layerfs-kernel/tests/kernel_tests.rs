//! End-to-end sessions against a manifest and origin on disk.

use std::path::{Path, PathBuf};

use layerfs_kernel::{
    DisplayHint, IndexError, Kernel, KernelConfig, ManifestSource, StartupError, StoreConfig,
};

struct Site {
    _dir: tempfile::TempDir,
    manifest: PathBuf,
    store: PathBuf,
}

fn site() -> Site {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    std::fs::write(
        root.join("index.json"),
        r#"{
            "/simple.txt": { "kind": "file", "size": 5 },
            "/Desktop": { "kind": "directory" },
            "/Documents": { "kind": "directory" },
            "/notes/todo.md": { "kind": "file", "size": 7 }
        }"#,
    )
    .expect("manifest");
    std::fs::write(root.join("simple.txt"), "hello").expect("simple");
    std::fs::create_dir_all(root.join("notes")).expect("notes");
    std::fs::write(root.join("notes/todo.md"), "- ship\n").expect("todo");

    Site {
        manifest: root.join("index.json"),
        store: root.join("cache").join("cache.db"),
        _dir: dir,
    }
}

async fn kernel(manifest: &Path, store: StoreConfig) -> Kernel {
    let config = KernelConfig::named("e2e", ManifestSource::Path(manifest.to_path_buf()))
        .with_store(store);
    Kernel::init(config).await.expect("kernel")
}

#[tokio::test]
async fn cp_then_cat_and_ls() {
    let site = site();
    let kernel = kernel(&site.manifest, StoreConfig::Memory).await;

    assert!(kernel.execute("cp /simple.txt /Desktop").await.ok());
    assert_eq!(kernel.execute("cat /Desktop/simple.txt").await.out, "hello");

    let ls = kernel.execute("ls /Desktop").await;
    assert!(ls.ok());
    assert!(ls.out.lines().any(|l| l == "simple.txt"));
}

#[tokio::test]
async fn rm_then_cat_is_not_found() {
    let site = site();
    let kernel = kernel(&site.manifest, StoreConfig::Memory).await;

    assert!(kernel.execute("rm /simple.txt").await.ok());
    let cat = kernel.execute("cat /simple.txt").await;
    assert!(!cat.ok());
    assert!(cat.err.contains("not found"));
}

#[tokio::test]
async fn session_survives_failures() {
    let site = site();
    let kernel = kernel(&site.manifest, StoreConfig::Memory).await;

    assert!(!kernel.execute("cat /nope").await.ok());
    assert!(!kernel.execute("cp /simple.txt /nowhere").await.ok());
    assert!(!kernel.execute("bogus").await.ok());
    assert!(kernel.execute("cd notes").await.ok());
    assert_eq!(kernel.execute("cat todo.md").await.out, "- ship\n");
    assert_eq!(kernel.execute("pwd").await.out, "/notes");
}

#[tokio::test]
async fn ls_long_shows_layers() {
    let site = site();
    let kernel = kernel(&site.manifest, StoreConfig::Memory).await;
    kernel.execute("cp /simple.txt /notes").await;

    let ls = kernel.execute("ls -l /notes").await;
    let DisplayHint::Table { rows, headers, .. } = ls.hint else {
        panic!("expected table");
    };
    assert_eq!(headers.map(|h| h.len()), Some(4));
    assert_eq!(rows[0], vec!["-", "5", "local", "simple.txt"]);
    assert_eq!(rows[1], vec!["-", "7", "remote", "todo.md"]);
}

#[tokio::test]
async fn cache_persists_across_sessions() {
    let site = site();
    let store = StoreConfig::Sqlite(site.store.clone());

    let first = kernel(&site.manifest, store.clone()).await;
    assert!(first.execute("default").await.ok());
    assert!(first.execute("rm /notes/todo.md").await.ok());
    first.shutdown().await.expect("shutdown");

    let second = kernel(&site.manifest, store).await;
    assert_eq!(second.cwd().await.as_str(), "/");
    assert_eq!(second.execute("cat /Documents/simple.txt").await.out, "hello");
    assert!(!second.execute("cat /notes/todo.md").await.ok());
    let stat = second.execute("stat /Desktop/simple.txt").await;
    assert!(stat.out.contains("layer: local"));
}

#[tokio::test]
async fn missing_manifest_is_a_startup_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = KernelConfig::named(
        "e2e",
        ManifestSource::Path(dir.path().join("index.json")),
    );
    assert!(matches!(
        Kernel::init(config).await,
        Err(StartupError::Manifest(_))
    ));
}

#[tokio::test]
async fn overflowing_range_is_a_startup_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = dir.path().join("index.json");
    std::fs::write(
        &manifest,
        r#"{ "/x": { "kind": "file", "size": 5,
                     "locator": { "path": "pack.bin", "offset": 18446744073709551614, "length": 5 } } }"#,
    )
    .expect("manifest");
    let config = KernelConfig::named("e2e", ManifestSource::Path(manifest));
    assert!(matches!(
        Kernel::init(config).await,
        Err(StartupError::Manifest(IndexError::RangeOverflow { .. }))
    ));
}

#[tokio::test]
async fn oversized_range_reads_what_the_origin_has() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = dir.path().join("index.json");
    std::fs::write(
        &manifest,
        r#"{ "/big": { "kind": "file", "size": 18446744073709551615,
                       "locator": { "path": "pack.bin", "offset": 0, "length": 18446744073709551615 } } }"#,
    )
    .expect("manifest");
    std::fs::write(dir.path().join("pack.bin"), "packed").expect("pack");
    let kernel = kernel(&manifest, StoreConfig::Memory).await;

    let cat = kernel.execute("cat /big").await;
    assert!(cat.ok(), "{}", cat.err);
    assert_eq!(cat.out, "packed");

    let stat = kernel.execute("stat /big").await;
    assert!(stat.ok(), "{}", stat.err);
    assert!(stat.out.contains("pack.bin[0..18446744073709551615]"));
}
