//! Tests for CLI argument and REPL command parsing.

use clap::Parser;
use haka_tutor::{
    Cli, Command, Phase,
    cmd::ConfigCommand,
    repl::ReplCommand,
};
use std::path::Path;

#[test]
fn cli_parse_chat() {
    let cli = Cli::parse_from(["haka", "chat"]);
    assert!(matches!(cli.command, Command::Chat));
    assert!(cli.config.is_none());
    assert!(cli.phase.is_none());
}

#[test]
fn cli_parse_send() {
    let cli = Cli::parse_from(["haka", "send", "what is a fraction?"]);
    match cli.command {
        Command::Send { content } => assert_eq!(content, "what is a fraction?"),
        _ => panic!("expected Send command"),
    }
}

#[test]
fn cli_parse_probe() {
    let cli = Cli::parse_from(["haka", "probe"]);
    assert!(matches!(cli.command, Command::Probe));
}

#[test]
fn cli_parse_config_show() {
    let cli = Cli::parse_from(["haka", "config", "show"]);
    assert!(matches!(
        cli.command,
        Command::Config {
            action: ConfigCommand::Show
        }
    ));
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from([
        "haka",
        "chat",
        "--config",
        "/tmp/haka.toml",
        "--phase",
        "assessment",
    ]);
    assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/haka.toml")));
    assert_eq!(cli.phase, Some(Phase::Assessment));
}

#[test]
fn cli_rejects_unknown_phase() {
    assert!(Cli::try_parse_from(["haka", "--phase", "recess", "chat"]).is_err());
}

#[test]
fn repl_messages_are_not_commands() {
    assert!(ReplCommand::parse("what is 2/3 of 9?").is_none());
    assert!(ReplCommand::parse("tutor me").is_none());
}

#[test]
fn repl_phase_commands() {
    for (line, phase) in [
        ("/feedback", Phase::Feedback),
        ("/assess", Phase::Assessment),
        ("/tutor", Phase::Tutoring),
        (" /triage ", Phase::Triage),
    ] {
        assert_eq!(
            ReplCommand::parse(line).unwrap().unwrap(),
            ReplCommand::Switch(phase)
        );
    }
}

#[test]
fn repl_control_commands() {
    assert_eq!(ReplCommand::parse("exit").unwrap().unwrap(), ReplCommand::Quit);
    assert_eq!(ReplCommand::parse("/quit").unwrap().unwrap(), ReplCommand::Quit);
    assert_eq!(ReplCommand::parse("/help").unwrap().unwrap(), ReplCommand::Help);
    assert_eq!(ReplCommand::parse("/status").unwrap().unwrap(), ReplCommand::Status);
    assert!(ReplCommand::parse("/dance").unwrap().is_err());
}

#[test]
fn phase_names_round_trip_through_display() {
    for phase in Phase::ALL {
        assert_eq!(phase.to_string().parse::<Phase>().unwrap(), phase);
    }
    assert_eq!("Tutor".parse::<Phase>().unwrap(), Phase::Tutoring);
}
