use std::process::Command;

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let repo_root = format!("{}/..", manifest_dir);

    let sha = git(&repo_root, &["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    let dirty = git(&repo_root, &["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|out| !out.is_empty());

    let version = if dirty { format!("{sha}-dirty") } else { sha };
    println!("cargo:rustc-env=FLEET_BUILD_SHA={}", version);
    println!("cargo:rerun-if-changed={}/.git/HEAD", repo_root);
}

fn git(repo_root: &str, args: &[&str]) -> Option<String> {
    Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}
