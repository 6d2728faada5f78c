// tests/integration_test.rs
use chrono::{DateTime, FixedOffset};
use release_forge::cli::{ReleaseRun, RunState};
use release_forge::config::RawConfig;
use release_forge::git::{Credentials, Git2Repository, Identity, Repository};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_release-forge");

#[test]
fn test_release_forge_help() {
    let output = Command::new(BIN)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("release-forge"));
    assert!(stdout.contains("--print-config"));
}

#[test]
fn test_release_forge_version() {
    let output = Command::new(BIN)
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_config_exits_with_error() {
    let output = Command::new(BIN)
        .args(["--config", "/definitely/not/here.toml"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error loading config"));
}

#[test]
fn test_print_config_redacts_token() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("release-forge.toml");
    fs::write(
        &config_path,
        r#"
source_dir = "/bitrise/src"
clone_url = "https://github.com/acme/app.git"
username = "ci-bot"
access_token = "s3cret-token"
version_code_file = "app/build.gradle"
version_code_regex = 'versionCode \d+'
version_code_template = "{{add . 1}}"
tag_file = "tags.txt"
tag_file_template = "{{.Major}}.{{.Minor}}.{{inc .Patch}}"
tag_name_suffix = "-rc1"
release_branch_template = "release/w{{Week .}}"
trunk_branch = "master"
"#,
    )
    .unwrap();

    let output = Command::new(BIN)
        .args(["--print-config", "--config", config_path.to_str().unwrap()])
        .env_remove("git_access_token")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("release/w{{Week .}}"));
    assert!(stdout.contains("ci-bot"));
    assert!(!stdout.contains("s3cret-token"));
}

fn commit_file(repo: &git2::Repository, root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
}

/// A bare remote whose master holds a gradle file and a tag file.
fn seeded_remote() -> TempDir {
    let remote_dir = TempDir::new().unwrap();
    let seed_dir = TempDir::new().unwrap();
    git2::Repository::init_bare(remote_dir.path()).unwrap();

    let seed = git2::Repository::init(seed_dir.path()).unwrap();
    commit_file(
        &seed,
        seed_dir.path(),
        "app/build.gradle",
        "android {\n    versionCode 41\n}\n",
    );
    commit_file(
        &seed,
        seed_dir.path(),
        "tags.txt",
        "# header\n1.2.3\nbeta-candidate\n",
    );
    let mut index = seed.index().unwrap();
    let tree = seed.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Identity::new("Seed", "seed@example.com").signature().unwrap();
    let commit = seed.commit(None, &sig, &sig, "initial", &tree, &[]).unwrap();
    seed.reference("refs/heads/master", commit, true, "seed")
        .unwrap();

    let mut origin = seed
        .remote("origin", remote_dir.path().to_str().unwrap())
        .unwrap();
    origin
        .push(&["refs/heads/master:refs/heads/master"], None)
        .unwrap();
    remote_dir
}

#[test]
fn test_full_release_against_local_remote() {
    let remote_dir = seeded_remote();
    let work_dir = TempDir::new().unwrap();
    let source_dir = work_dir.path().join("src");
    let remote_url = remote_dir.path().to_str().unwrap().to_string();
    let key_file = work_dir.path().join("id_rsa");
    fs::write(&key_file, "unused for local remotes").unwrap();

    let mut raw = RawConfig::from_toml(
        r#"
version_code_file = "/app/build.gradle"
version_code_regex = 'versionCode \d+'
version_code_template = "{{add . 1}}"
tag_file = "tags.txt"
tag_file_template = "{{.Major}}.{{.Minor}}.{{inc .Patch}}"
tag_name_suffix = "-rc1"
release_branch_template = "release/{{.Year}}-w{{Week . | pad 2}}"
trunk_branch = "master"
"#,
    )
    .unwrap();
    raw.source_dir = Some(source_dir.to_str().unwrap().to_string());
    raw.clone_url = Some(remote_url.clone());
    raw.ssh_key_path = Some(key_file.to_str().unwrap().to_string());
    let config = raw.validate().unwrap();
    assert!(matches!(config.credentials, Credentials::Ssh { .. }));

    let repo = Git2Repository::open_or_clone(
        &config.clone_url,
        &config.source_dir,
        &config.trunk_branch,
        &config.remote_name,
        config.credentials.clone(),
    )
    .unwrap();
    let now: DateTime<FixedOffset> =
        DateTime::parse_from_rfc3339("2024-03-12T10:00:00+01:00").unwrap();
    let mut run = ReleaseRun::new(repo, &config, now);

    let summary = run.run().unwrap();
    assert_eq!(run.state(), RunState::TagsProcessed);
    assert_eq!(summary.release_branch.as_str(), "release/2024-w11");
    assert_eq!(summary.tags.pushed, vec!["beta-candidate-rc1"]);

    let remote = git2::Repository::open_bare(remote_dir.path()).unwrap();
    let trunk = remote
        .find_reference("refs/heads/master")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(trunk.message(), Some("[skip ci] Update Version Code"));
    assert_eq!(trunk.author().name(), Some("Bitrise"));
    let blob = trunk
        .tree()
        .unwrap()
        .get_path(Path::new("app/build.gradle"))
        .unwrap()
        .to_object(&remote)
        .unwrap()
        .peel_to_blob()
        .unwrap();
    assert_eq!(
        std::str::from_utf8(blob.content()).unwrap(),
        "android {\n    versionCode 42\n}\n"
    );

    let branch = remote
        .find_reference("refs/heads/release/2024-w11")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(branch.message(), Some("diverge from master"));
    assert_eq!(branch.parent_id(0).unwrap(), trunk.id());
    assert_eq!(branch.tree_id(), trunk.tree_id());

    let tag = remote
        .find_reference("refs/tags/beta-candidate-rc1")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(tag.id(), branch.id());
}

fn http_credentials() -> Credentials {
    Credentials::Http {
        username: "ci".to_string(),
        token: "token".to_string(),
    }
}

fn reuse_config(remote_dir: &TempDir, work_dir: &TempDir) -> release_forge::config::Config {
    let key_file = work_dir.path().join("id_rsa");
    fs::write(&key_file, "unused for local remotes").unwrap();
    let mut raw = RawConfig::from_toml(
        r#"
version_code_file = "app/build.gradle"
version_code_regex = 'versionCode \d+'
version_code_template = "{{add . 1}}"
tag_file = "tags.txt"
tag_file_template = "{{.Major}}.{{.Minor}}.{{inc .Patch}}"
tag_name_suffix = "-rc1"
release_branch_template = "release/w{{Week .}}"
trunk_branch = "master"
"#,
    )
    .unwrap();
    raw.source_dir = Some(work_dir.path().join("src").to_str().unwrap().to_string());
    raw.clone_url = Some(remote_dir.path().to_str().unwrap().to_string());
    raw.ssh_key_path = Some(key_file.to_str().unwrap().to_string());
    raw.validate().unwrap()
}

#[test]
fn test_dirty_clone_is_refused() {
    let remote_dir = seeded_remote();
    let work_dir = TempDir::new().unwrap();
    let target = work_dir.path().join("src");
    let url = remote_dir.path().to_str().unwrap();

    Git2Repository::open_or_clone(url, &target, "master", "origin", http_credentials()).unwrap();
    // Leftovers of a run that stopped after mutating files but before committing.
    fs::write(
        target.join("app/build.gradle"),
        "android {\n    versionCode 42\n}\n",
    )
    .unwrap();
    fs::write(target.join("tags.txt"), "# header\n1.2.4\nbeta-candidate\n").unwrap();

    let err = match Git2Repository::open_or_clone(
        url,
        &target,
        "master",
        "origin",
        http_credentials(),
    ) {
        Ok(_) => panic!("a dirty clone must not be reused"),
        Err(e) => e,
    };
    assert!(matches!(err, release_forge::ForgeError::Config(_)));
    assert!(err.to_string().contains("app/build.gradle"));

    let remote = git2::Repository::open_bare(remote_dir.path()).unwrap();
    let trunk = remote
        .find_reference("refs/heads/master")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(trunk.message(), Some("initial"));
}

#[test]
fn test_reused_clone_restarts_from_remote() {
    let remote_dir = seeded_remote();
    let work_dir = TempDir::new().unwrap();
    let config = reuse_config(&remote_dir, &work_dir);
    let target = config.source_dir.clone();

    let mut stale = Git2Repository::open_or_clone(
        &config.clone_url,
        &target,
        "master",
        "origin",
        config.credentials.clone(),
    )
    .unwrap();
    let remote_head = stale.head_oid().unwrap();
    fs::write(
        target.join("app/build.gradle"),
        "android {\n    versionCode 42\n}\n",
    )
    .unwrap();
    stale.commit_all("local only", &config.identity).unwrap();
    drop(stale);

    let repo = Git2Repository::open_or_clone(
        &config.clone_url,
        &target,
        "master",
        "origin",
        config.credentials.clone(),
    )
    .unwrap();
    assert_eq!(repo.head_oid().unwrap(), remote_head);
    assert_eq!(
        fs::read_to_string(target.join("app/build.gradle")).unwrap(),
        "android {\n    versionCode 41\n}\n"
    );

    let now = DateTime::parse_from_rfc3339("2024-03-12T10:00:00+00:00").unwrap();
    let mut run = ReleaseRun::new(repo, &config, now);
    let summary = run.run().unwrap();
    assert_eq!(summary.version_code.previous, 41);
    assert_eq!(summary.version_code.current, 42);
    assert_eq!(summary.semver.rendered, "1.2.4");
}

#[test]
fn test_failed_run_reports_error_once() {
    let remote_dir = seeded_remote();
    let work_dir = TempDir::new().unwrap();
    let key_file = work_dir.path().join("id_rsa");
    fs::write(&key_file, "unused for local remotes").unwrap();
    let config_path = work_dir.path().join("release-forge.toml");
    fs::write(
        &config_path,
        format!(
            r#"
source_dir = "{}"
clone_url = "{}"
ssh_key_path = "{}"
version_code_file = "app/build.gradle"
version_code_regex = 'buildNumber \d+'
version_code_template = "{{{{add . 1}}}}"
tag_file = "tags.txt"
tag_file_template = "{{{{.Version}}}}"
tag_name_suffix = "-rc1"
release_branch_template = "release/w{{{{Week .}}}}"
trunk_branch = "master"
"#,
            work_dir.path().join("src").display(),
            remote_dir.path().display(),
            key_file.display()
        ),
    )
    .unwrap();

    let output = Command::new(BIN)
        .args(["--config", config_path.to_str().unwrap()])
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.matches("No line in").count(), 1, "stderr was: {}", stderr);
    assert!(stderr.contains("update version code"));
}
