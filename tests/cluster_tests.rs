//! 聚类阈值与遮蔽的集成测试

use genlog_analysis::cluster::{
    Assignment, ClusterEngine, Mangler, TemplateSet, normalized_distance,
};

const BASE: &str = "ABCDEFGHIJKLMNOPQRST";
/// 与 BASE 相差 3 个字符：3 / 20 = 0.15
const DIFF3: &str = "XYZDEFGHIJKLMNOPQRST";
/// 与 BASE 相差 2 个字符：2 / 20 = 0.10
const DIFF2: &str = "XYCDEFGHIJKLMNOPQRST";

#[test]
fn test_distance_exactly_at_threshold_is_not_merged() {
    assert_eq!(normalized_distance(BASE, DIFF3), 0.15);
    let mut set = TemplateSet::new();
    set.assign(BASE, 0.15);
    assert_eq!(set.assign(DIFF3, 0.15), Assignment::Created);
    assert_eq!(set.len(), 2);
}

#[test]
fn test_distance_below_threshold_is_merged() {
    let mut set = TemplateSet::new();
    set.assign(BASE, 0.15);
    assert_eq!(set.assign(DIFF2, 0.15), Assignment::Matched(2));
    assert_eq!(set.len(), 1);
    // 模板保留首次出现的文本
    assert_eq!(set.iter().next().unwrap().text, BASE);
}

#[test]
fn test_threshold_epsilon_above_distance_merges() {
    let mut set = TemplateSet::new();
    set.assign(BASE, 0.15000001);
    assert_eq!(set.assign(DIFF3, 0.15000001), Assignment::Matched(2));
}

#[test]
fn test_length_difference_alone_exceeds_threshold() {
    let mut set = TemplateSet::new();
    set.assign("SELECT ?", 0.15);
    assert_eq!(
        set.assign("SELECT ? FROM SOME_VERY_LONG_TABLE_NAME", 0.15),
        Assignment::Created
    );
}

#[test]
fn test_repeated_statement_forms_single_template() {
    let engine = ClusterEngine::default();
    let mut set = TemplateSet::new();
    for _ in 0..25 {
        engine.observe(&mut set, "SELECT * FROM ORDERS WHERE ID = 5");
    }
    assert_eq!(set.len(), 1);
    assert_eq!(set.iter().next().unwrap().count, 25);
}

#[test]
fn test_templates_stay_in_descending_count_order() {
    let engine = ClusterEngine::default();
    let mut set = TemplateSet::new();
    engine.observe(&mut set, "DELETE FROM SESSIONS WHERE EXPIRED = 1");
    for id in 0..3 {
        engine.observe(
            &mut set,
            &format!("UPDATE ACCOUNTS SET BALANCE = {id} WHERE OWNER = 'U{id}'"),
        );
    }
    let counts: Vec<u64> = set.iter().map(|t| t.count).collect();
    assert_eq!(counts, vec![3, 1]);
    assert!(set.iter().next().unwrap().text.starts_with("UPDATE ACCOUNTS"));
}

#[test]
fn test_first_match_wins_over_best_match() {
    let mut set = TemplateSet::new();
    // 两个模板都在阈值内，第一个（次数更高）胜出
    set.assign("ABCDEFGHIJKLMNOPQRSA", 0.15);
    set.assign("ABCDEFGHIJKLMNOPQRSA", 0.15);
    set.assign("ABCDEFGHIJKLMNOPQRZZ", 0.5);
    assert_eq!(set.len(), 1);

    let mut set = TemplateSet::new();
    set.assign("AAAAAAAAAAAAAAAAAAXX", 0.15);
    set.assign("AAAAAAAAAAAAAAAAAAAA", 0.05);
    assert_eq!(set.len(), 2);
    // 与第一个模板差 2，与第二个差 0，仍归入第一个
    assert_eq!(
        set.assign("AAAAAAAAAAAAAAAAAAAA", 0.15),
        Assignment::Matched(2)
    );
    assert_eq!(set.iter().next().unwrap().text, "AAAAAAAAAAAAAAAAAAXX");
}

#[test]
fn test_mangle_idempotent_on_realistic_statements() {
    let mangler = Mangler::new();
    let statements = [
        "INSERT INTO T (A, B) VALUES (1, 'X'), (2, 'Y'), (3, 'Z')",
        "SELECT * FROM USERS WHERE ID IN (1, 2, 3, 4) AND NAME = 'BOB'",
        "UPDATE USERS SET PASSWORD = PASSWORD('SECRET'), LAST_IP = '10.0.0.1'",
        "SELECT * FROM LOGS WHERE TS > '2017-12-15 10:00:00' AND HASH = 0XDEADBEEF",
    ];
    for stmt in statements {
        let once = mangler.mangle(stmt);
        assert_eq!(mangler.mangle(&once), once, "{stmt}");
    }
}

#[test]
fn test_column_rule_masks_configured_column() {
    let mangler = Mangler::with_columns(&["SESSION_KEY"]).unwrap();
    let out = mangler.mangle(r#"SELECT * FROM S WHERE SESSION_KEY = "ABC123XYZ""#);
    assert_eq!(out, "SELECT * FROM S WHERE SESSION_KEY = ?");
    // 内置规则不处理双引号字符串
    let plain = Mangler::new().mangle(r#"SELECT * FROM S WHERE SESSION_KEY = "ABC123XYZ""#);
    assert!(plain.contains("ABC123XYZ"));
}
