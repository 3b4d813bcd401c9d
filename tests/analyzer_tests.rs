//! 分析流水线端到端测试

mod common;

use common::{MIXED_LOG, SIMPLE_LOG, analyze, coarse};
use genlog_analysis::{
    AnalysisConfig, Analyzer, DiagnosticKind, Flow, ReportMode,
};
use std::io::Cursor;

#[test]
fn test_end_to_end_coarse_report() {
    let (report, diagnostics) = analyze(SIMPLE_LOG, &coarse());
    assert_eq!(report.mode, ReportMode::Coarse);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let user = report.user("user1@host").expect("user1 present");
    assert_eq!(user.queries, 1);
    assert_eq!(user.connections, 1);
    assert_eq!(user.verbs.select, 1);

    let text = report.to_string();
    let line = text.lines().next().unwrap();
    assert!(line.starts_with("user1@host: 1 queries, 1 connections, 1 selects"));
}

#[test]
fn test_connect_then_quit_removes_connection() {
    let mut analyzer = Analyzer::collecting(&coarse()).unwrap();
    analyzer.run(Cursor::new(SIMPLE_LOG)).unwrap();
    assert!(!analyzer.registry().contains(5));
    assert_eq!(analyzer.aggregator().get("user1@host").unwrap().connections, 1);
}

#[test]
fn test_uninteresting_statements_are_not_counted() {
    let log = "\
171215 10:00:00\t    5 Connect\tuser1@host on db1
\t\t    5 Query\tSHOW TABLES
\t\t    5 Query\tset autocommit=0
\t\t    5 Query\tSELECT @@version_comment LIMIT 1
\t\t    5 Query\tcommit
\t\t    5 Quit\t
";
    let (report, _) = analyze(log, &coarse());
    assert_eq!(report.user("user1@host").unwrap().queries, 0);
}

#[test]
fn test_mixed_log_fine_report() {
    let (report, diagnostics) = analyze(MIXED_LOG, &AnalysisConfig::default());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let users: Vec<_> = report.users.iter().map(|u| u.user.as_str()).collect();
    assert_eq!(users, vec!["app@web", "batch@cron"]);

    let app = report.user("app@web").unwrap();
    assert_eq!(app.queries, 3);
    assert_eq!(app.verbs.select, 3);
    assert_eq!(app.templates.len(), 1);
    let template = app.templates.iter().next().unwrap();
    assert_eq!(template.count, 3);
    assert_eq!(template.text, "SELECT ID, NAME FROM USERS WHERE ID = ?");

    let batch = report.user("batch@cron").unwrap();
    assert_eq!(batch.verbs.update, 1);
    assert_eq!(batch.verbs.insert, 1);
    assert_eq!(batch.templates.len(), 2);

    let text = report.to_string();
    assert!(text.contains("app@web: 3 queries, 1 connections, 1 templates"));
    assert!(text.contains("       3  SELECT ID, NAME FROM USERS WHERE ID = ?"));
}

#[test]
fn test_coarse_mode_builds_no_templates() {
    let (report, _) = analyze(MIXED_LOG, &coarse());
    assert!(report.users.iter().all(|u| u.templates.is_empty()));
}

#[test]
fn test_server_restart_replaces_connection() {
    let log = "\
171215 10:00:00\t    5 Connect\tuserA@host on db1
171215 10:05:00\t    5 Connect\tuserB@host on db1
\t\t    5 Query\tDELETE FROM t WHERE id = 1
";
    let mut analyzer = Analyzer::collecting(&coarse()).unwrap();
    analyzer.run(Cursor::new(log)).unwrap();
    assert_eq!(analyzer.registry().lookup(5).unwrap().user, "userB@host");
    assert_eq!(analyzer.diagnostic_counts().server_restart, 1);

    let (report, diagnostics) = analyzer.finish().unwrap();
    assert!(matches!(
        &diagnostics[0].kind,
        DiagnosticKind::ServerRestart { conn_id: 5, previous_user, user }
            if previous_user == "userA@host" && user == "userB@host"
    ));
    assert_eq!(report.user("userB@host").unwrap().verbs.delete, 1);
    assert_eq!(report.user("userA@host").unwrap().queries, 0);
}

#[test]
fn test_breakoff_stops_before_cutoff_date() {
    let log = "\
171231 23:59:00\t    5 Connect\tuser1@host on db1
171231 23:59:30\t    5 Query\tSELECT 1
\t\t    5 Query\tUPDATE t SET a = 2
180101 00:00:00\t    5 Query\tINSERT INTO t VALUES (3)
180101 00:00:05\t    6 Connect\tlate@host on db1
";
    let config = AnalysisConfig {
        coarse: true,
        breakoff: Some("2018-01-01".to_string()),
        ..AnalysisConfig::default()
    };
    let mut analyzer = Analyzer::collecting(&config).unwrap();
    let summary = analyzer.run(Cursor::new(log)).unwrap();
    assert!(summary.halted);
    assert_eq!(summary.lines, 4);

    let (report, _) = analyzer.finish().unwrap();
    let user = report.user("user1@host").unwrap();
    // 捕获中的 UPDATE 在停止时被丢弃
    assert_eq!(user.queries, 1);
    assert_eq!(user.verbs.select, 1);
    assert_eq!(user.verbs.update, 0);
    assert_eq!(user.verbs.insert, 0);
    assert!(report.user("late@host").is_none());
}

#[test]
fn test_halted_analyzer_ignores_further_lines() {
    let config = AnalysisConfig {
        breakoff: Some("2018-01-01".to_string()),
        ..coarse()
    };
    let mut analyzer = Analyzer::collecting(&config).unwrap();
    let flow = analyzer
        .process_line("180102 09:00:00\t    5 Connect\tuser1@host on db1")
        .unwrap();
    assert_eq!(flow, Flow::Halt);
    assert_eq!(
        analyzer.process_line("\t\t    1 Query\tSELECT 1").unwrap(),
        Flow::Halt
    );
    assert!(analyzer.is_halted());
    assert_eq!(analyzer.line_num(), 1);
}

#[test]
fn test_unknown_connection_is_reported_and_dropped() {
    let log = "\
171215 10:00:00\t   12 Query\tSELECT * FROM orphans
\tWHERE id = 3
\t\t   12 Quit\t
";
    let (report, diagnostics) = analyze(log, &coarse());
    assert_eq!(report.users.iter().map(|u| u.queries).sum::<u64>(), 0);

    let kinds: Vec<_> = diagnostics.iter().map(|d| &d.kind).collect();
    assert!(matches!(
        kinds[0],
        DiagnosticKind::UnknownConnection { conn_id: 12, action: "Query" }
    ));
    assert!(matches!(kinds[1], DiagnosticKind::Malformed { .. }));
    assert!(matches!(kinds[2], DiagnosticKind::DisconnectUnknown { conn_id: 12 }));
    assert_eq!(diagnostics[0].line, 1);
}

#[test]
fn test_statement_attributed_to_user_at_open_time() {
    let log = "\
\t\t    5 Connect\tfirst@host on db
\t\t    5 Query\tSELECT a
\tFROM b
\t\t    5 Connect\tsecond@host on db
";
    let (report, _) = analyze(log, &coarse());
    assert_eq!(report.user("first@host").unwrap().verbs.select, 1);
    assert_eq!(report.user("second@host").unwrap().queries, 0);
}

#[test]
fn test_other_verbs_and_prepare_diagnostics() {
    let log = "\
\t\t    5 Connect\tapp@web on shop
\t\t    5 Prepare\tSELECT * FROM t WHERE id = ?
\t\t    5 Execute\tSELECT * FROM t WHERE id = 5
\t\t    5 Query\tTRUNCATE TABLE t
\t\t    5 Init DB\tarchive
";
    let (report, diagnostics) = analyze(log, &coarse());
    let app = report.user("app@web").unwrap();
    assert_eq!(app.queries, 2);
    assert_eq!(app.verbs.select, 1);
    assert_eq!(app.verbs.other, 1);

    assert!(diagnostics.iter().any(|d| matches!(d.kind, DiagnosticKind::Prepare { .. })));
    assert!(diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::UnknownVerb { statement, .. } if statement == "TRUNCATE TABLE T"
    )));
    assert!(diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::DatabaseChange { conn_id: 5, database } if database == "archive"
    )));
}

#[test]
fn test_failed_connect_is_not_registered() {
    let log = "\
\t\t    9 Connect\tAccess denied for user 'bob'@'localhost' (using password: YES)
\t\t    9 Query\tSELECT 1
";
    let (report, diagnostics) = analyze(log, &coarse());
    assert!(report.user("bob").is_none());
    assert!(matches!(diagnostics[0].kind, DiagnosticKind::UnparsedConnect { conn_id: 9, .. }));
    assert!(matches!(diagnostics[1].kind, DiagnosticKind::UnknownConnection { conn_id: 9, .. }));
}

#[test]
fn test_bootstrap_root_session() {
    let log = "\t\t    1 Query\tSELECT 1\n";
    let (report, diagnostics) = analyze(log, &coarse());
    let root = report.user("root").unwrap();
    assert_eq!(root.queries, 1);
    assert_eq!(root.connections, 0);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_replacing_bootstrap_session_is_not_a_restart() {
    let log = "\t\t    1 Connect\tadmin@localhost on mysql\n";
    let (report, diagnostics) = analyze(log, &coarse());
    assert!(diagnostics.is_empty());
    assert!(report.user("root").is_none());
}

#[test]
fn test_unused_bootstrap_session_not_in_report() {
    let (report, _) = analyze(SIMPLE_LOG, &coarse());
    assert!(report.user("root").is_none());
    assert_eq!(report.to_string().lines().count(), 1);

    // 只有无关语句经过预置会话时同样不出现
    let (report, _) = analyze("\t\t    1 Query\tSHOW TABLES\n", &coarse());
    assert!(report.users.is_empty());
}

#[test]
fn test_custom_exclusion_rule() {
    let mut analyzer = Analyzer::collecting(&coarse()).unwrap();
    analyzer.add_exclusion(|s: &str| s.contains("HEARTBEAT"));
    analyzer.run(Cursor::new(
        "\t\t    1 Query\tSELECT * FROM heartbeat\n\t\t    1 Query\tSELECT 2\n",
    ))
    .unwrap();
    let (report, _) = analyzer.finish().unwrap();
    assert_eq!(report.user("root").unwrap().queries, 1);
}

#[test]
fn test_bad_timestamp_still_processes_line() {
    let log = "171399 10:00:00\t    1 Query\tSELECT 1\n";
    let (report, diagnostics) = analyze(log, &coarse());
    assert_eq!(report.user("root").unwrap().queries, 1);
    assert!(matches!(diagnostics[0].kind, DiagnosticKind::BadTimestamp { .. }));
}

#[test]
fn test_verb_counts_sum_to_queries() {
    let (report, _) = analyze(MIXED_LOG, &AnalysisConfig::default());
    for user in &report.users {
        assert_eq!(user.verbs.total(), user.queries, "{}", user.user);
    }
}
