use cubedb::config::Config;
use cubedb::mem_store::cubedb::Cubedb;
use cubedb::protocol::{Reply, ReplyCode};
use cubedb::server::commands::process_query;

fn config() -> Config {
    Config {
        port: "1985".to_string(),
        log_level: 2,
        log_path: None,
        connections: 64,
        dump_path: None,
    }
}

#[test]
fn grouped_count_buckets_by_the_requested_column() {
    let mut db = Cubedb::new();
    let cfg = config();
    process_query("INSERT c1 p1 col=a&g=x 3", &mut db, &cfg);
    process_query("INSERT c1 p1 col=b&g=x 5", &mut db, &cfg);
    process_query("INSERT c1 p1 col=c&g=y 2", &mut db, &cfg);

    let outcome = process_query("COUNT c1 p1 p1 null g", &mut db, &cfg);
    assert_eq!(
        outcome.reply,
        Reply::StrCountMap(vec![("x".to_string(), 8), ("y".to_string(), 2)])
    );
}

#[test]
fn rows_missing_the_group_column_are_excluded_from_every_bucket() {
    let mut db = Cubedb::new();
    let cfg = config();
    process_query("INSERT c1 p1 col=a&g=x 3", &mut db, &cfg);
    process_query("INSERT c1 p1 col=b 5", &mut db, &cfg);

    let outcome = process_query("COUNT c1 p1 p1 null g", &mut db, &cfg);
    assert_eq!(outcome.reply, Reply::StrCountMap(vec![("x".to_string(), 3)]));
}

#[test]
fn part_reports_per_column_value_sets_observed_in_range() {
    let mut db = Cubedb::new();
    let cfg = config();
    process_query("INSERT c1 p1 col=a 1", &mut db, &cfg);
    process_query("INSERT c1 p1 col=b 1", &mut db, &cfg);

    let outcome = process_query("PART c1 p1", &mut db, &cfg);
    assert_eq!(
        outcome.reply,
        Reply::StrStrSetMap(vec![("col".to_string(), vec!["a".to_string(), "b".to_string()])])
    );
}

#[test]
fn delpart_drops_only_partitions_in_the_requested_range() {
    let mut db = Cubedb::new();
    let cfg = config();
    process_query("INSERT c1 p1 col=a 1", &mut db, &cfg);
    process_query("INSERT c1 p2 col=a 1", &mut db, &cfg);
    process_query("INSERT c1 p3 col=a 1", &mut db, &cfg);

    assert_eq!(
        process_query("DELPART c1 p1 p2", &mut db, &cfg).reply,
        Reply::Code(ReplyCode::Ok)
    );
    let remaining = process_query("CUBE c1", &mut db, &cfg).reply;
    assert_eq!(remaining, Reply::StrList(vec!["p3".to_string()]));
}

#[test]
fn a_line_over_the_length_limit_is_rejected_before_tokenizing() {
    let mut db = Cubedb::new();
    let cfg = config();
    let line = "PING ".to_string() + &"x".repeat(cubedb::protocol::MAX_QUERY_LEN);
    let outcome = process_query(&line, &mut db, &cfg);
    assert_eq!(outcome.reply, Reply::Code(ReplyCode::ErrQueryTooLong));
}

#[test]
fn an_unterminated_quote_is_a_wrong_arg_error() {
    let mut db = Cubedb::new();
    let outcome = process_query("INSERT c1 p1 \"unterminated 1", &mut db, &config());
    assert_eq!(outcome.reply, Reply::Code(ReplyCode::ErrWrongArg));
}

#[test]
fn a_non_printable_argument_is_a_malformed_arg_error() {
    let mut db = Cubedb::new();
    let outcome = process_query("CUBE c1\tbad", &mut db, &config());
    assert_eq!(outcome.reply, Reply::Code(ReplyCode::ErrMalformedArg));
}

#[test]
fn help_lists_every_command_in_the_table() {
    let mut db = Cubedb::new();
    let outcome = process_query("HELP", &mut db, &config());
    match outcome.reply {
        Reply::StrList(lines) => assert_eq!(lines.len(), 13),
        _ => panic!("expected a string list"),
    }
}
