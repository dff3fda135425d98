use super::*;

fn ask_args(extra: &[&str]) -> AskArgs {
    let mut argv = vec![
        "qc-insight",
        "ask",
        "--store",
        "/tmp/qc-store",
        "--run",
        "run-1",
        "--question",
        "which samples failed?",
    ];
    argv.extend_from_slice(extra);
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Ask(args) => args,
        other => panic!("expected ask, got {other:?}"),
    }
}

#[test]
fn test_ask_defaults() {
    let args = ask_args(&[]);
    assert_eq!(args.target.run, "run-1");
    assert_eq!(args.format, OutputFormat::Text);
    assert_eq!(args.max_retries, 2);
    assert!(!args.stream);
    assert!(args.selector.is_none());
}

#[test]
fn test_ask_options() {
    let args = ask_args(&[
        "--stream",
        "--format",
        "json",
        "--selector",
        "keyword",
        "--metric",
        "fastqc.percent_gc",
    ]);
    assert!(args.stream);
    assert_eq!(args.format, OutputFormat::Json);
    assert_eq!(args.selector, Some(SelectorMode::Keyword));
    assert_eq!(args.metric.as_deref(), Some("fastqc.percent_gc"));
}

#[test]
fn test_build_request_with_history() {
    let args = ask_args(&[
        "--history",
        r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#,
    ]);
    let request = build_request(&args).unwrap();
    assert_eq!(request.run_id, "run-1");
    assert_eq!(request.question, "which samples failed?");
    assert_eq!(
        request.history,
        vec![
            HistoryEntry::new("user", "hi"),
            HistoryEntry::new("assistant", "hello")
        ]
    );
}

#[test]
fn test_build_request_rejects_bad_history() {
    let args = ask_args(&["--history", "not json"]);
    let err = build_request(&args).unwrap_err();
    assert!(err.starts_with("invalid --history"));
}

#[test]
fn test_ask_requires_question() {
    let parsed = Cli::try_parse_from(["qc-insight", "ask", "--store", "/tmp/s", "--run", "r"]);
    assert!(parsed.is_err());
}

#[test]
fn test_inspect_with_verbosity() {
    let cli = Cli::try_parse_from([
        "qc-insight",
        "-vv",
        "inspect",
        "--store",
        "/tmp/s",
        "--run",
        "r",
        "--format",
        "json",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Command::Inspect(args) => {
            assert_eq!(args.target.store, PathBuf::from("/tmp/s"));
            assert_eq!(args.format, OutputFormat::Json);
        }
        other => panic!("expected inspect, got {other:?}"),
    }
}
