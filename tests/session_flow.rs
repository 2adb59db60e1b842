use sqlvis::source::QueryError;
use sqlvis::view::{BarColor, Span, SpanStyle};
use util::{Harness, ScriptedExecutor, TestTracing, int_column, orders, rules, table_lines};

mod util;

const ORDERS: &str = "select * from orders";

fn orders_harness() -> Harness {
    Harness::new(
        ScriptedExecutor::default()
            .with(ORDERS, orders())
            .with("select qty from orders", int_column("qty", &[10, 25, 40, 5]))
            .with("select name from orders", {
                use sqlvis::source::{ColumnMeta, MemoryCursor, SqlType, SqlValue};
                MemoryCursor::new(
                    vec![ColumnMeta::new("name", SqlType::VarChar)],
                    vec![vec![SqlValue::Text("apple".into())]],
                )
            })
            .with("select v", int_column("v", &[10, 20, 30]))
            .with("select nothing", int_column("v", &[]))
            .with("select five", int_column("n", &[1, 2, 3, 4, 5]))
            .failing("select broken", QueryError::Prepare("no such column: zzz".into())),
        &["id"],
    )
}

#[test]
fn single_column_render_is_exact() {
    let mut h = orders_harness();
    let out = h.run("select v");
    assert_eq!(
        out,
        "\n------\n|v   |\n------\n|10  |\n|20  |\n|30  |\n------\n|1.0 | Scale\n------\n(3 rows) | Stats Off\n\n"
    );
}

#[test]
fn bars_are_floated_above_the_minimum() {
    let mut h = orders_harness();
    h.run("select v");
    let spans = h.screen.spans();
    let bars: Vec<&Span> = spans
        .iter()
        .filter(|s| matches!(s.style, Some(SpanStyle::Bar(_))))
        .collect();
    // raw lengths 2, 3, 5 less the correction of 1
    assert_eq!(bars.len(), 3);
    assert_eq!(bars[0].text, "1");
    assert_eq!(bars[1].text, "20");
    assert_eq!(bars[2].text, "30  ");
    assert!(bars.iter().all(|s| s.style == Some(SpanStyle::Bar(BarColor::Red))));
}

#[test]
fn rules_match_table_width() {
    let mut h = orders_harness();
    let out = h.run("stats on");
    assert_eq!(out, "", "no result yet, nothing to draw");
    let out = h.run(ORDERS);

    let rules = rules(&out);
    assert_eq!(rules.len(), 5, "top, header, data, scale, stats");
    let width = rules[0].len();
    assert!(rules.iter().all(|r| r.len() == width));
    for line in table_lines(&out) {
        let body = &line[..=line.rfind('|').unwrap()];
        assert_eq!(body.chars().count(), width, "line: {line:?}");
    }
}

#[test]
fn key_and_text_columns_render_plain() {
    let mut h = orders_harness();
    h.run(ORDERS);
    let spans = h.screen.spans();
    let bar_texts: Vec<String> = spans
        .iter()
        .filter(|s| matches!(s.style, Some(SpanStyle::Bar(_))))
        .map(|s| s.text.clone())
        .collect();
    assert!(!bar_texts.iter().any(|t| t.contains("apple")));
    // qty is the first bar in each row, price the second
    let colors: Vec<SpanStyle> = spans
        .iter()
        .filter_map(|s| s.style)
        .filter(|s| matches!(s, SpanStyle::Bar(_)))
        .collect();
    assert!(colors.contains(&SpanStyle::Bar(BarColor::Red)));
    assert!(colors.contains(&SpanStyle::Bar(BarColor::Green)));
    assert!(!colors.contains(&SpanStyle::Bar(BarColor::Yellow)));

    let session = &h.session;
    assert!(session.exclusions().contains("name"));
    assert!(session.exclusions().contains("id"));
    assert!(!session.state().is_scale_tracked("id"));
}

#[test]
fn identical_query_uses_cached_result() {
    let mut h = orders_harness();
    let first = h.run(ORDERS);
    let second = h.run(ORDERS);
    assert_eq!(first, second);
    assert_eq!(h.call_count(), 1);

    h.run("select v");
    h.run(ORDERS);
    assert_eq!(h.call_count(), 3);
}

#[test]
fn zero_rows_is_only_a_notice() {
    let mut h = orders_harness();
    assert_eq!(h.run("select nothing"), "\n(0 rows)\n\n");
    assert_eq!(h.run("stats"), "\n(0 rows)\n\n");
}

#[test]
fn bad_scale_factor_changes_nothing() {
    let mut h = orders_harness();
    h.run(ORDERS);
    h.run("scale qty 2");
    let before = h.session.state().clone();

    let unchanged = h.run(ORDERS);

    let out = h.run("scale abc");
    let error = "Invalid scale factor \"abc\": expected a positive number\n";
    assert_eq!(out, format!("{error}{unchanged}"));
    assert_eq!(out.lines().filter(|l| l.contains("Invalid")).count(), 1);
    assert_eq!(h.session.state(), &before);

    let out = h.run("scale qty 1e");
    assert!(out.starts_with("Invalid scale factor \"1e\""));
    assert_eq!(h.session.state(), &before);
}

#[test]
fn oversized_scale_is_refused() {
    let mut h = orders_harness();
    let unchanged = h.run("select v");
    let before = h.session.state().clone();

    let out = h.run("scale 1e20");
    let (notice, rest) = out.split_once('\n').expect("notice line");
    assert!(notice.starts_with("Scale factor "), "{notice}");
    assert!(notice.ends_with("bars would exceed 1000 characters"));
    assert_eq!(rest, unchanged);
    assert_eq!(h.session.state(), &before);

    assert!(h.run("scale v 1e9").starts_with("Scale factor "));
    assert_eq!(h.session.state().scale_of("v"), 1.0);

    h.run("scale v 100");
    assert_eq!(h.session.state().scale_of("v"), 100.0);
}

#[test]
fn malformed_command_rerenders_last_result() {
    let mut h = orders_harness();
    let unchanged = h.run("select v");
    let out = h.run("stats sometimes");
    let (error, rest) = out.split_once('\n').expect("error line");
    assert!(!error.is_empty());
    assert_eq!(rest, unchanged);
}

#[test]
fn session_names_its_source() {
    let h = orders_harness();
    assert_eq!(h.session.source(), "scripted");
}

#[test]
fn scale_widens_bars_and_shows_in_scale_row() {
    let mut h = orders_harness();
    let plain = h.run("select v");
    let scaled = h.run("scale 3");
    assert_ne!(plain, scaled);
    assert!(scaled.contains("|3.0   "));
    assert_eq!(h.session.state().scale_of("v"), 3.0);

    h.run("scale v 0.5");
    assert_eq!(h.session.state().scale_of("v"), 0.5);
}

#[test]
fn hide_then_unhide_restores_render() {
    let mut h = orders_harness();
    let original = h.run(ORDERS);

    let hidden = h.run("hide price");
    assert!(table_lines(&hidden).iter().all(|l| !l.contains("price")));
    assert!(hidden.contains("Hidden Column(s): [price]"));
    assert!(!hidden.contains("12.000000000000000"));

    let restored = h.run("unhide price");
    assert_eq!(restored, original);
    assert_eq!(h.call_count(), 1);
}

#[test]
fn hide_removes_column_from_stats_block() {
    let mut h = orders_harness();
    h.run(ORDERS);
    let with_stats = h.run("stats");
    assert!(with_stats.contains(" P.Var.\n"));
    assert!(with_stats.contains("40 "), "max qty in stats block");

    h.run("hide qty price");
    let out = h.run("stats");
    for line in table_lines(&out) {
        assert!(!line.contains("40"), "qty leaked into {line:?}");
    }
    assert!(out.contains("Hidden Column(s): [price, qty]"));
}

#[test]
fn hide_unknown_column_is_reported() {
    let mut h = orders_harness();
    h.run(ORDERS);
    let out = h.run("hide bogus");
    assert!(out.starts_with("No such column: bogus\n"));
    assert_eq!(h.session.state().hidden_count(), 0);
}

#[test]
fn stats_once_versus_on() {
    let mut h = orders_harness();
    h.run("select five");

    let once = h.run("stats");
    assert!(once.contains(" Mean\n"));
    assert!(once.contains("3.000000000000000"));
    assert!(once.contains("2.500000000000000"));
    assert!(once.contains("2.000000000000000"));
    assert!(once.contains("1.58113883"));
    assert!(once.contains("Stats Off"));

    let next = h.run("select five");
    assert!(!next.contains(" Mean\n"));

    let on = h.run("stats on");
    assert!(on.contains(" Mean\n") && on.contains("Stats On"));
    assert!(h.run("select five").contains(" Mean\n"));

    let off = h.run("stats off");
    assert!(!off.contains(" Mean\n") && off.contains("Stats Off"));
}

#[test]
fn stats_widen_columns_for_that_render_only() {
    let mut h = orders_harness();
    let narrow = h.run("select five");
    let wide = h.run("stats");
    assert!(rules(&wide)[0].len() > rules(&narrow)[0].len());
    let again = h.run("select five");
    assert_eq!(again, narrow);
}

#[test]
fn locked_state_follows_column_changes() {
    let mut h = orders_harness();
    h.run(ORDERS);
    h.run("scale qty 2");
    h.run("scale price 4");
    h.run("lock scale");
    h.run("hide qty");
    h.run("lock hidden");

    let out = h.run("select qty from orders");
    assert!(out.contains("Scale Locked"));
    assert!(out.contains("Hidden Locked"));
    let state = h.session.state();
    assert_eq!(state.scale_of("qty"), 2.0);
    assert!(!state.is_scale_tracked("price"));
    assert!(state.is_hidden("qty"));

    // nothing numeric survives: both locks drop
    h.run("select name from orders");
    let state = h.session.state();
    assert!(!state.scale_locked());
    assert!(!state.hidden_locked());
    assert_eq!(state.hidden_count(), 0);
}

#[test]
fn unlocked_state_resets_on_new_query() {
    let mut h = orders_harness();
    h.run(ORDERS);
    h.run("scale qty 2");
    h.run("hide price");
    h.run("select qty from orders");
    assert_eq!(h.session.state().scale_of("qty"), 1.0);
    assert_eq!(h.session.state().hidden_count(), 0);
}

#[test]
fn unhide_all_clears_lock() {
    let mut h = orders_harness();
    h.run(ORDERS);
    h.run("hide qty price");
    h.run("lock hidden");
    assert!(h.session.state().hidden_locked());
    let out = h.run("unhide all");
    assert!(!h.session.state().hidden_locked());
    assert!(out.contains("(4 rows) | Stats Off\n"));
}

#[test]
fn lock_messages_and_unknown_targets() {
    let mut h = orders_harness();
    h.run(ORDERS);
    let out = h.run("lock scale");
    assert!(out.starts_with("Scale is locked."));
    assert!(out.contains("Scale Locked"));
    let out = h.run("unlock scale");
    assert!(out.starts_with("Scale is unlocked\n"));
    assert_eq!(h.run("lock everything"), "");
}

#[test]
fn failed_query_keeps_previous_result() {
    let mut h = orders_harness();
    h.run(ORDERS);
    h.run("hide price");

    let out = h.run("select broken");
    assert_eq!(out, "no such column: zzz\n");
    assert_eq!(h.session.last_sql(), Some(ORDERS));
    assert!(h.session.state().is_hidden("price"));

    let again = h.run(ORDERS);
    assert!(again.contains("Hidden Column(s): [price]"));
    assert_eq!(h.call_count(), 2);
}

#[test]
fn log_mirrors_screen_and_echoes_queries() {
    let mut h = orders_harness();
    let screen = h.run("select v");
    let log = h.log.text();
    assert!(log.starts_with("select v\n"));
    assert!(log.ends_with(&screen));
}

#[test]
fn comments_only_reach_the_log() {
    let mut h = orders_harness();
    let out = h.run("// quarterly numbers");
    assert_eq!(out, "");
    assert_eq!(h.call_count(), 0);
    assert_eq!(
        h.log.text(),
        "// quarterly numbers\n--------------------\n\n"
    );
}

#[test]
fn session_emits_diagnostics() {
    let tracing = TestTracing::new();
    let _guard = tracing.install();
    let mut h = orders_harness();
    h.run(ORDERS);
    h.run("select broken");
    tracing.assert_contains("executing query");
    tracing.assert_contains("query failed");
}

#[test]
fn repl_stops_at_quit() {
    let mut h = orders_harness();
    let input = std::io::Cursor::new("select v\n\nscale 2\nQUIT\nselect five\n");
    sqlvis::repl::run(&mut h.session, input, None).expect("repl");
    assert_eq!(h.session.last_sql(), Some("select v"));
    assert_eq!(h.session.state().scale_of("v"), 2.0);
    assert_eq!(h.call_count(), 1);
}

#[test]
fn execute_list_reports_quit() {
    let mut h = orders_harness();
    let flow = sqlvis::repl::run_commands(&mut h.session, &["select v", "exit", "select five"])
        .expect("commands");
    assert_eq!(flow, sqlvis::session::Flow::Quit);
    assert_eq!(h.call_count(), 1);
}
