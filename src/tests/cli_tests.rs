//! Command line parsing for the binary.

use std::path::PathBuf;

use crate::{parse_args, Options};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn no_arguments_means_production_with_default_config() {
    assert_eq!(
        parse_args(args(&[])),
        Options {
            development_mode: false,
            config_path: PathBuf::from("sandbar-config.toml"),
        }
    );
}

#[test]
fn stdout_switch_enables_development_mode() {
    assert!(parse_args(args(&["--stdout"])).development_mode);
}

#[test]
fn config_path_in_both_spellings() {
    let spaced = parse_args(args(&["--config", "/etc/sandbar.toml", "--stdout"]));
    assert_eq!(spaced.config_path, PathBuf::from("/etc/sandbar.toml"));
    assert!(spaced.development_mode);

    let joined = parse_args(args(&["--config=/tmp/x.toml"]));
    assert_eq!(joined.config_path, PathBuf::from("/tmp/x.toml"));
}

#[test]
fn dangling_config_flag_keeps_default() {
    let options = parse_args(args(&["--config"]));
    assert_eq!(options.config_path, PathBuf::from("sandbar-config.toml"));
}

#[test]
fn unknown_arguments_are_ignored() {
    let options = parse_args(args(&["--verbose", "extra"]));
    assert!(!options.development_mode);
}
