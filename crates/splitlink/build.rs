use std::env;
use std::process::Command;

/// Build variables forwarded to `splitlink version --extended`.
const FORWARDED: [(&str, &str); 2] = [
    ("TARGET", "SPLITLINK_BUILD_TARGET"),
    ("PROFILE", "SPLITLINK_BUILD_PROFILE"),
];

fn main() {
    for (source, exported) in FORWARDED {
        if let Ok(value) = env::var(source) {
            println!("cargo:rustc-env={exported}={value}");
        }
        println!("cargo:rerun-if-env-changed={source}");
    }

    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok());
    if let Some(version) = version {
        println!("cargo:rustc-env=SPLITLINK_RUSTC_VERSION={}", version.trim());
    }
    println!("cargo:rerun-if-changed=build.rs");
}
