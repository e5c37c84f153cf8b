use cubedb::ingest::row::InsertRow;
use cubedb::mem_store::cube::CountResult;
use cubedb::mem_store::cubedb::Cubedb;

fn row(cube: &str, partition: &str, columns: &[(&str, &str)], count: u64) -> InsertRow {
    InsertRow {
        cube: cube.to_string(),
        partition: partition.to_string(),
        columns: columns.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        count,
    }
}

#[test]
fn inserting_zero_count_is_a_no_op_for_totals() {
    let mut db = Cubedb::new();
    db.insert(&row("c1", "p1", &[("col", "a")], 0));
    let cube = db.find_cube("c1").unwrap();
    match cube.count_from_to(None, None, None, None) {
        CountResult::Scalar(total) => assert_eq!(total, 0),
        _ => panic!("expected scalar"),
    }
}

#[test]
fn splitting_a_count_across_two_inserts_equals_one_insert_of_the_sum() {
    let mut split = Cubedb::new();
    split.insert(&row("c1", "p1", &[("col", "a")], 4));
    split.insert(&row("c1", "p1", &[("col", "a")], 6));

    let mut combined = Cubedb::new();
    combined.insert(&row("c1", "p1", &[("col", "a")], 10));

    let totals = |db: &Cubedb| match db.find_cube("c1").unwrap().count_from_to(None, None, None, None) {
        CountResult::Scalar(total) => total,
        _ => panic!("expected scalar"),
    };
    assert_eq!(totals(&split), totals(&combined));
}

#[test]
fn count_and_pcount_agree_on_the_ungrouped_total() {
    let mut db = Cubedb::new();
    db.insert(&row("c1", "p1", &[("col", "a")], 3));
    db.insert(&row("c1", "p2", &[("col", "b")], 7));
    db.insert(&row("c1", "p3", &[("col", "c")], 11));

    let cube = db.find_cube("c1").unwrap();
    let count_total = match cube.count_from_to(Some("p1"), Some("p3"), None, None) {
        CountResult::Scalar(total) => total,
        _ => panic!("expected scalar"),
    };
    let pcount_total: u64 = cube
        .pcount_from_to(Some("p1"), Some("p3"), None, None)
        .into_values()
        .map(|result| match result {
            CountResult::Scalar(n) => n,
            _ => panic!("expected scalar"),
        })
        .sum();
    assert_eq!(count_total, pcount_total);
}

#[test]
fn empty_cube_counts_to_zero_over_any_range() {
    let mut db = Cubedb::new();
    db.add_cube("c1");
    let cube = db.find_cube("c1").unwrap();
    match cube.count_from_to(Some("a"), Some("z"), None, None) {
        CountResult::Scalar(total) => assert_eq!(total, 0),
        _ => panic!("expected scalar"),
    }
}

#[test]
fn insert_auto_creates_cube_and_partition() {
    let mut db = Cubedb::new();
    assert!(db.find_cube("c1").is_none());
    db.insert(&row("c1", "p1", &[("col", "a")], 1));
    let cube = db.find_cube("c1").expect("cube should be auto-created");
    assert!(cube.has_partition("p1"));
}
