use super::*;

#[test]
fn test_parse_run_flags() {
    let cli = Cli::try_parse_from([
        "chorus",
        "-p",
        "project",
        "-t",
        "prod",
        "run",
        "--full-reload",
        "--batch-size",
        "50",
    ])
    .unwrap();

    assert_eq!(cli.global.project_dir, "project");
    assert_eq!(cli.global.target.as_deref(), Some("prod"));
    match cli.command {
        Commands::Run(args) => {
            assert!(args.full_reload);
            assert_eq!(args.batch_size, Some(50));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["chorus", "check", "--fail-fast", "-v"]).unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.project_dir, ".");
    assert!(matches!(cli.command, Commands::Check(CheckArgs { fail_fast: true })));
}

#[test]
fn test_unit_subcommands() {
    for (arg, expected) in [("init", "Init"), ("reset", "Reset"), ("stage", "Stage")] {
        let cli = Cli::try_parse_from(["chorus", arg]).unwrap();
        assert_eq!(format!("{:?}", cli.command), expected);
    }
}

#[test]
fn test_batch_size_must_be_number() {
    assert!(Cli::try_parse_from(["chorus", "run", "--batch-size", "many"]).is_err());
}
