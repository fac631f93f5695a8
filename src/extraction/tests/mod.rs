use crate::error::{DataError, Error, ExecutionError};
use crate::extraction::*;
use crate::temp_registry::TempRegistry;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Append regular files to a tar builder
fn append_files<W: std::io::Write>(builder: &mut ::tar::Builder<W>, files: &[(&str, &[u8])]) {
    for (name, content) in files {
        let mut header = ::tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
}

/// Create a gzip-compressed tarball containing the given files
fn create_tar_gz(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = ::tar::Builder::new(encoder);
    append_files(&mut builder, files);
    builder.into_inner().unwrap().finish().unwrap();
}

/// Create an xz-compressed tarball containing the given files
fn create_tar_xz(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let encoder = xz2::write::XzEncoder::new(file, 6);
    let mut builder = ::tar::Builder::new(encoder);
    append_files(&mut builder, files);
    builder.into_inner().unwrap().finish().unwrap();
}

/// Create a ZIP archive containing the given files
fn create_zip(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect()
}

/// Registry rooted in a scratch dir so tests can check for leftovers
fn scratch_registry() -> (TempDir, TempRegistry) {
    let base = tempfile::tempdir().unwrap();
    let registry = TempRegistry::in_dir(base.path());
    (base, registry)
}

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

#[test]
fn test_detect_archive_format() {
    let cases = [
        ("bat-v0.24.0-x86_64-unknown-linux-musl.tar.gz", Some(ArchiveFormat::TarGz)),
        ("tool.tgz", Some(ArchiveFormat::TarGz)),
        ("watchexec-2.3.0-x86_64-unknown-linux-musl.tar.xz", Some(ArchiveFormat::TarXz)),
        ("tool.TXZ", Some(ArchiveFormat::TarXz)),
        ("plain.tar", Some(ArchiveFormat::Tar)),
        ("windows.zip", Some(ArchiveFormat::Zip)),
        ("tool.deb", None),
        ("_just", None),
    ];

    for (name, expected) in cases {
        assert_eq!(detect_archive_format(Path::new(name)), expected, "{name}");
    }
}

// ---------------------------------------------------------------------------
// Classification through real archives
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_tar_gz_keeps_underscore_files_and_drops_ps1() {
    let src = tempfile::tempdir().unwrap();
    let archive = src.path().join("fd-v10.2.0-x86_64-unknown-linux-musl.tar.gz");
    create_tar_gz(
        &archive,
        &[
            ("fd-v10.2.0/fd", b"\x7fELF"),
            ("fd-v10.2.0/autocomplete/_fd", b"#compdef fd"),
            ("fd-v10.2.0/autocomplete/_fd.ps1", b"Register-ArgumentCompleter"),
            ("fd-v10.2.0/autocomplete/fd.bash", b"complete -F _fd fd"),
        ],
    );
    let (_base, registry) = scratch_registry();

    let files = extract_completions(&archive, &registry).await.unwrap();

    assert_eq!(file_names(&files), vec!["_fd"]);
    assert!(files[0].ends_with("fd-v10.2.0/autocomplete/_fd"));
    assert_eq!(std::fs::read(&files[0]).unwrap(), b"#compdef fd");
}

#[tokio::test]
async fn test_bare_zsh_entry_becomes_watchexec() {
    let src = tempfile::tempdir().unwrap();
    let archive = src
        .path()
        .join("watchexec-2.3.0-x86_64-unknown-linux-musl.tar.xz");
    create_tar_xz(
        &archive,
        &[
            ("watchexec-2.3.0/watchexec", b"\x7fELF"),
            ("watchexec-2.3.0/completions/zsh", b"#compdef watchexec"),
            ("watchexec-2.3.0/completions/bash", b"complete"),
        ],
    );
    let (_base, registry) = scratch_registry();

    let files = extract_completions(&archive, &registry).await.unwrap();

    assert_eq!(file_names(&files), vec!["_watchexec"]);
    assert!(!file_names(&files).contains(&"zsh".to_string()));
    assert_eq!(std::fs::read(&files[0]).unwrap(), b"#compdef watchexec");

    let extract_root = files[0].parent().unwrap();
    assert!(!extract_root.join("watchexec-2.3.0/completions/zsh").exists());
}

#[tokio::test]
async fn test_zsh_suffix_renamed() {
    let src = tempfile::tempdir().unwrap();
    let archive = src.path().join("foo.tar.gz");
    create_tar_gz(&archive, &[("foo-1.0/completions/foo.zsh", b"#compdef foo")]);
    let (_base, registry) = scratch_registry();

    let files = extract_completions(&archive, &registry).await.unwrap();

    assert_eq!(file_names(&files), vec!["_foo"]);
    let root = files[0].parent().unwrap();
    assert!(!root.join("foo-1.0/completions/foo.zsh").exists());
}

#[tokio::test]
async fn test_ps1_only_archive_has_no_completions() {
    let src = tempfile::tempdir().unwrap();
    let archive = src.path().join("bar.tar.gz");
    create_tar_gz(&archive, &[("bar/bar.ps1", b"Register-ArgumentCompleter")]);
    let (base, registry) = scratch_registry();

    let err = extract_completions(&archive, &registry).await.unwrap_err();

    assert!(
        matches!(err, Error::Data(DataError::NoCompletions { .. })),
        "{err:?}"
    );
    // The scratch dir was still registered and cleanup removes it
    assert_eq!(registry.len(), 1);
    registry.cleanup();
    assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_zip_underscore_path_unchanged() {
    let src = tempfile::tempdir().unwrap();
    let archive = src.path().join("tool.zip");
    create_zip(
        &archive,
        &[
            ("tool/share/zsh/site-functions/_foo_bar", b"#compdef foo_bar"),
            ("tool/README.md", b"docs"),
        ],
    );
    let (_base, registry) = scratch_registry();

    let files = extract_completions(&archive, &registry).await.unwrap();

    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("tool/share/zsh/site-functions/_foo_bar"));
}

#[tokio::test]
async fn test_results_stay_inside_registered_dir() {
    let src = tempfile::tempdir().unwrap();
    let archive = src.path().join("lsd.tar.gz");
    create_tar_gz(
        &archive,
        &[
            ("lsd/autocomplete/_lsd", b"#compdef lsd"),
            ("lsd/autocomplete/lsd.zsh", b"#compdef lsd"),
        ],
    );
    let (_base, registry) = scratch_registry();

    let files = extract_completions(&archive, &registry).await.unwrap();

    assert_eq!(files.len(), 2);
    for file in &files {
        assert!(registry.contains(file), "{file:?} escaped the temp dir");
    }
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_corrupt_archive_is_data_error() {
    let src = tempfile::tempdir().unwrap();
    let archive = src.path().join("broken.tar.gz");
    std::fs::write(&archive, b"this is not gzip").unwrap();
    let (_base, registry) = scratch_registry();

    let err = extract_completions(&archive, &registry).await.unwrap_err();
    assert!(
        matches!(err, Error::Data(DataError::CorruptArchive { .. })),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_unsupported_archive_is_data_error() {
    let src = tempfile::tempdir().unwrap();
    let archive = src.path().join("tool.deb");
    std::fs::write(&archive, b"!<arch>").unwrap();
    let (_base, registry) = scratch_registry();

    let err = extract_completions(&archive, &registry).await.unwrap_err();
    assert!(
        matches!(err, Error::Data(DataError::UnsupportedArchive { .. })),
        "{err:?}"
    );
}

#[test]
fn test_missing_archive_is_filesystem_error() {
    let dest = tempfile::tempdir().unwrap();
    let err = unpack(
        Path::new("/nonexistent/tool.tar.gz"),
        dest.path(),
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), "filesystem");
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn test_cancelled_unpack_writes_nothing() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let tarball = src.path().join("fd.tar.gz");
    create_tar_gz(&tarball, &[("fd/autocomplete/_fd", b"#compdef fd")]);
    let err = unpack(&tarball, dest.path(), &cancel).unwrap_err();
    assert!(
        matches!(err, Error::Execution(ExecutionError::Cancelled { .. })),
        "{err:?}"
    );

    let zip = src.path().join("fd.zip");
    create_zip(&zip, &[("fd/_fd", b"#compdef fd")]);
    let err = unpack(&zip, dest.path(), &cancel).unwrap_err();
    assert!(
        matches!(err, Error::Execution(ExecutionError::Cancelled { .. })),
        "{err:?}"
    );

    assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[test]
fn test_cancelled_extraction_removes_recreated_dir() {
    let src = tempfile::tempdir().unwrap();
    let (base, registry) = scratch_registry();
    let tarball = src.path().join("bat.tar.gz");
    create_tar_gz(&tarball, &[("bat/autocomplete/bat.zsh", b"#compdef bat")]);

    // The supervisor already removed the registered dir; a late writer put
    // it back before noticing the shutdown
    let dest = registry.create_dir("bat").unwrap();
    registry.cleanup();
    std::fs::create_dir_all(dest.join("bat/autocomplete")).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = unpack_and_collect(&tarball, &dest, &cancel).unwrap_err();

    assert!(
        matches!(err, Error::Execution(ExecutionError::Cancelled { .. })),
        "{err:?}"
    );
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
}
