use std::process::Command;

#[test]
fn typing_defense_binary_type_checks() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "typing-defense"])
        .status()
        .expect("cargo should be runnable from the cli crate");

    assert!(
        status.success(),
        "the typing-defense simulator binary no longer type-checks"
    );
}
