#[cfg(test)]
mod tests {
    use assert_cmd::Command;

    fn custom_args() -> Command {
        // Note this target is defined in the bin section of Cargo.toml
        // and the entry point is in bin/runner_test_custom_args
        Command::cargo_bin("runner_test_custom_args").unwrap()
    }

    #[test]
    fn test_cli_invocation_with_custom_args() {
        custom_args()
            .args(["--population", "250", "-t", "30"])
            .assert()
            .success()
            .stdout("250\n");
    }

    #[test]
    fn test_custom_args_default_to_preset() {
        custom_args()
            .args(["-t", "5"])
            .assert()
            .success()
            .stdout("4500\n");
    }

    #[test]
    fn test_custom_args_still_validate_parameters() {
        let output = custom_args()
            .args(["--population", "0", "-t", "5"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(String::from_utf8(output.stderr)
            .unwrap()
            .contains("population_size"));
    }
}
