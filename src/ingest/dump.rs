use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use itertools::Itertools;
use walkdir::WalkDir;

use crate::ingest::row::{parse_insert_columns, InsertRow};
use crate::mem_store::cubedb::Cubedb;
use crate::protocol::split_args;

/// Walks `dir` recursively for `*.cdb` files and replays every `INSERT`
/// line found into `cubedb`. Lines that don't parse as a well-formed
/// `INSERT` are logged and skipped, matching the original dump loader;
/// failing to read the directory or a file at all is fatal and propagated
/// to the caller.
pub fn load(dir: &Path, cubedb: &mut Cubedb) -> io::Result<usize> {
    let mut loaded = 0usize;
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("cdb") {
            continue;
        }
        let file = File::open(entry.path())?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_insert_line(&line) {
                Some(row) => {
                    if !cubedb.insert(&row) {
                        log::warn!(
                            "dump line rejected by partition (dictionary overflow) in {}: {line}",
                            entry.path().display()
                        );
                        continue;
                    }
                    loaded += 1;
                }
                None => {
                    log::warn!("skipping malformed dump line in {}: {line}", entry.path().display());
                }
            }
        }
    }
    Ok(loaded)
}

fn parse_insert_line(line: &str) -> Option<InsertRow> {
    let argv = split_args(line)?;
    if argv.is_empty() || !argv[0].eq_ignore_ascii_case("INSERT") || argv.len() != 5 {
        return None;
    }
    let columns = parse_insert_columns(&argv[3]).ok()?;
    let count: u64 = argv[4].parse().ok()?;
    Some(InsertRow {
        cube: argv[1].clone(),
        partition: argv[2].clone(),
        columns,
        count,
    })
}

/// Writes one `<cube>.cdb` file per cube into `dir`, each a sequence of
/// `INSERT` lines that reconstruct the cube's current state when replayed.
pub fn write(dir: &Path, cubedb: &Cubedb) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut io_result = Ok(());
    cubedb.for_each_cube(|cube_name, cube| {
        if io_result.is_err() {
            return;
        }
        io_result = (|| -> io::Result<()> {
            let path = dir.join(format!("{cube_name}.cdb"));
            let mut file = File::create(path)?;
            cube.for_each_partition(|partition_name, partition| {
                partition.for_each_row(|columns, count| {
                    let line = format_insert_line(cube_name, partition_name, columns, count);
                    let _ = writeln!(file, "{line}");
                });
            });
            Ok(())
        })();
    });
    io_result
}

fn format_insert_line(
    cube: &str,
    partition: &str,
    columns: &std::collections::HashMap<String, String>,
    count: u64,
) -> String {
    let cv_list = if columns.is_empty() {
        "null".to_string()
    } else {
        columns.iter().map(|(k, v)| format!("{k}={v}")).join("&")
    };
    format!(
        "INSERT {} {} {} {count}",
        format_arg(cube),
        format_arg(partition),
        cv_list
    )
}

fn format_arg(arg: &str) -> String {
    if !arg.is_empty() && arg.chars().all(|c| c.is_ascii_graphic()) {
        return arg.to_string();
    }
    let mut out = String::from("\"");
    for c in arg.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
