use std::process::Command;

/// Trimmed stdout of a git command, or `None` if git is missing or fails.
fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    for watched in [".git/HEAD", ".git/index", ".git/refs/heads", ".git/refs/tags"] {
        println!("cargo:rerun-if-changed={watched}");
    }

    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_default();
    let release = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();
    // Tracked files only; build outputs and scratch tapes are usually untracked
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.is_empty());

    println!("cargo:rustc-env=METABLOCK_GIT_HASH={hash}");
    println!("cargo:rustc-env=METABLOCK_RELEASE={release}");
    println!("cargo:rustc-env=METABLOCK_DIRTY={dirty}");
}
