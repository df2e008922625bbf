//! Embeds the build version into the binary.
use std::process::Command;

fn main() {
    // CONFIGURABILITY_VERSION from the release pipeline wins over git describe.
    if let Ok(version) = std::env::var("CONFIGURABILITY_VERSION") {
        println!("cargo:rustc-env=CONFIGURABILITY_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=CONFIGURABILITY_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=CONFIGURABILITY_VERSION");
}
