use std::process::Command;

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn env_or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    let revision = command_output("git", &["rev-parse", "--short", "HEAD"]);
    let branch = command_output("git", &["rev-parse", "--abbrev-ref", "HEAD"]);
    let build_user = std::env::var("USER").ok().filter(|u| !u.is_empty());
    let build_date = std::env::var("BUILD_DATE").ok().filter(|d| !d.is_empty());
    let rustc_version = command_output(&rustc, &["--version"]);

    println!("cargo:rustc-env=USER_API_REVISION={}", env_or_unknown(revision));
    println!("cargo:rustc-env=USER_API_BRANCH={}", env_or_unknown(branch));
    println!("cargo:rustc-env=USER_API_BUILD_USER={}", env_or_unknown(build_user));
    println!("cargo:rustc-env=USER_API_BUILD_DATE={}", env_or_unknown(build_date));
    println!("cargo:rustc-env=USER_API_RUSTC_VERSION={}", env_or_unknown(rustc_version));

    println!("cargo:rerun-if-env-changed=BUILD_DATE");
    println!("cargo:rerun-if-env-changed=USER");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
