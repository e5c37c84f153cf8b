//! The command table: parses a validated request line into a call against
//! [`Cubedb`] and produces the [`Reply`] to enqueue. Nothing here ever
//! blocks or returns an error out of band — every outcome, including a
//! malformed request, becomes a reply.

use itertools::Itertools;

use crate::config::Config;
use crate::ingest::dump;
use crate::ingest::row::{is_unset, parse_filter, parse_insert_columns, InsertRow};
use crate::mem_store::cube::CountResult;
use crate::mem_store::cubedb::Cubedb;
use crate::protocol::{is_printable_arg, split_args, Reply, ReplyCode, MAX_QUERY_LEN};

/// The effect of one dispatched command: the reply to send, and whether
/// the session should be closed once it's enqueued (`QUIT` only).
pub struct CommandOutcome {
    pub reply: Reply,
    pub close: bool,
}

impl CommandOutcome {
    fn reply(reply: Reply) -> CommandOutcome {
        CommandOutcome { reply, close: false }
    }

    fn code(code: ReplyCode) -> CommandOutcome {
        CommandOutcome::reply(Reply::Code(code))
    }
}

struct CommandSpec {
    name: &'static str,
    min_arity: usize,
    max_arity: usize,
    description: &'static str,
}

const COMMAND_TABLE: &[CommandSpec] = &[
    CommandSpec {
        name: "QUIT",
        min_arity: 0,
        max_arity: 0,
        description: "QUIT: close the connection",
    },
    CommandSpec {
        name: "PING",
        min_arity: 0,
        max_arity: 0,
        description: "PING: reply with PONG",
    },
    CommandSpec {
        name: "CUBES",
        min_arity: 0,
        max_arity: 0,
        description: "CUBES: list every cube",
    },
    CommandSpec {
        name: "ADDCUBE",
        min_arity: 1,
        max_arity: 1,
        description: "ADDCUBE <name>: create an empty cube, failing if one already exists",
    },
    CommandSpec {
        name: "DELCUBE",
        min_arity: 1,
        max_arity: 1,
        description: "DELCUBE <name>: drop a cube and all its partitions",
    },
    CommandSpec {
        name: "CUBE",
        min_arity: 1,
        max_arity: 1,
        description: "CUBE <name>: list the partitions of cube <name>",
    },
    CommandSpec {
        name: "PART",
        min_arity: 1,
        max_arity: 3,
        description: "PART <cube> [<partition> | <from> <to>]: columns and values observed in range",
    },
    CommandSpec {
        name: "DELPART",
        min_arity: 2,
        max_arity: 3,
        description: "DELPART <cube> (<partition> | <from> <to>): drop the matching partitions",
    },
    CommandSpec {
        name: "INSERT",
        min_arity: 4,
        max_arity: 4,
        description: "INSERT <cube> <partition> <col=val&...|null> <count>: add to a row's counter",
    },
    CommandSpec {
        name: "COUNT",
        min_arity: 1,
        max_arity: 5,
        description: "COUNT <cube> [<from> [<to> [<filter> [<group>]]]]: sum matching counters in range",
    },
    CommandSpec {
        name: "PCOUNT",
        min_arity: 1,
        max_arity: 5,
        description: "PCOUNT <cube> [<from> [<to> [<filter> [<group>]]]]: per-partition COUNT",
    },
    CommandSpec {
        name: "DUMP",
        min_arity: 0,
        max_arity: 0,
        description: "DUMP: write every cube to the configured dump directory",
    },
    CommandSpec {
        name: "HELP",
        min_arity: 0,
        max_arity: 0,
        description: "HELP: list this usage summary for every command",
    },
];

fn nullable(arg: &str) -> Option<&str> {
    if is_unset(arg) {
        None
    } else {
        Some(arg)
    }
}

/// Validates and dispatches one request line: length, tokenizing,
/// printable-argument check, command lookup, and arity, in that order —
/// matching the original's `process_cmd`.
pub fn process_query(line: &str, cubedb: &mut Cubedb, config: &Config) -> CommandOutcome {
    if line.len() > MAX_QUERY_LEN {
        return CommandOutcome::code(ReplyCode::ErrQueryTooLong);
    }
    let argv = match split_args(line) {
        Some(argv) if !argv.is_empty() => argv,
        _ => return CommandOutcome::code(ReplyCode::ErrWrongArg),
    };
    for arg in &argv {
        if !is_printable_arg(arg) {
            return CommandOutcome::code(ReplyCode::ErrMalformedArg);
        }
    }
    let command_name = argv[0].to_uppercase();
    let spec = match COMMAND_TABLE.iter().find(|spec| spec.name == command_name) {
        Some(spec) => spec,
        None => return CommandOutcome::code(ReplyCode::ErrNotFound),
    };
    let arity = argv.len() - 1;
    if arity < spec.min_arity || arity > spec.max_arity {
        return CommandOutcome::code(ReplyCode::ErrWrongArgNum);
    }
    dispatch(&command_name, &argv, cubedb, config)
}

fn dispatch(name: &str, argv: &[String], cubedb: &mut Cubedb, config: &Config) -> CommandOutcome {
    match name {
        "QUIT" => CommandOutcome {
            reply: Reply::Code(ReplyCode::Ok),
            close: true,
        },
        "PING" => CommandOutcome::reply(Reply::Str("PONG".to_string())),
        "CUBES" => CommandOutcome::reply(Reply::StrList(cubedb.cube_names().into_iter().sorted().collect())),
        "ADDCUBE" => {
            if cubedb.add_cube(&argv[1]) {
                CommandOutcome::code(ReplyCode::Ok)
            } else {
                CommandOutcome::code(ReplyCode::ErrObjExists)
            }
        }
        "DELCUBE" => {
            if cubedb.del_cube(&argv[1]) {
                CommandOutcome::code(ReplyCode::Ok)
            } else {
                CommandOutcome::code(ReplyCode::ErrObjNotFound)
            }
        }
        "CUBE" => match cubedb.find_cube(&argv[1]) {
            None => CommandOutcome::code(ReplyCode::ErrObjNotFound),
            Some(cube) => CommandOutcome::reply(Reply::StrList(cube.partition_names().into_iter().sorted().collect())),
        },
        "PART" => cmd_part(argv, cubedb),
        "DELPART" => cmd_delpart(argv, cubedb),
        "INSERT" => cmd_insert(argv, cubedb),
        "COUNT" => cmd_count(argv, cubedb),
        "PCOUNT" => cmd_pcount(argv, cubedb),
        "DUMP" => cmd_dump(cubedb, config),
        "HELP" => cmd_help(),
        _ => unreachable!("command table and dispatch must stay in sync"),
    }
}

fn cmd_part(argv: &[String], cubedb: &Cubedb) -> CommandOutcome {
    let cube = match cubedb.find_cube(&argv[1]) {
        Some(cube) => cube,
        None => return CommandOutcome::code(ReplyCode::ErrObjNotFound),
    };
    let value_set = match argv.len() {
        2 => cube.get_columns_to_value_set(None, None),
        3 => {
            let partition = match nullable(&argv[2]) {
                Some(p) => p,
                None => return CommandOutcome::code(ReplyCode::ErrWrongArg),
            };
            if !cube.has_partition(partition) {
                return CommandOutcome::code(ReplyCode::ErrObjNotFound);
            }
            cube.get_columns_to_value_set(Some(partition), Some(partition))
        }
        4 => cube.get_columns_to_value_set(nullable(&argv[2]), nullable(&argv[3])),
        _ => unreachable!("arity already checked"),
    };
    let entries: Vec<(String, Vec<String>)> = value_set
        .into_iter()
        .map(|(column, values)| (column, values.into_iter().sorted().collect()))
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect();
    CommandOutcome::reply(Reply::StrStrSetMap(entries))
}

fn cmd_delpart(argv: &[String], cubedb: &mut Cubedb) -> CommandOutcome {
    let cube = match cubedb.find_cube_mut(&argv[1]) {
        Some(cube) => cube,
        None => return CommandOutcome::code(ReplyCode::ErrObjNotFound),
    };
    match argv.len() {
        3 => {
            let partition = argv[2].as_str();
            if !cube.has_partition(partition) {
                return CommandOutcome::code(ReplyCode::ErrObjNotFound);
            }
            cube.delete_partition_from_to(Some(partition), Some(partition));
        }
        4 => {
            cube.delete_partition_from_to(nullable(&argv[2]), nullable(&argv[3]));
        }
        _ => unreachable!("arity already checked"),
    }
    CommandOutcome::code(ReplyCode::Ok)
}

fn cmd_insert(argv: &[String], cubedb: &mut Cubedb) -> CommandOutcome {
    let count: u64 = match argv[4].parse() {
        Ok(count) => count,
        Err(_) => return CommandOutcome::code(ReplyCode::ErrWrongArg),
    };
    let columns = match parse_insert_columns(&argv[3]) {
        Ok(columns) => columns,
        Err(_) => return CommandOutcome::code(ReplyCode::ErrWrongArg),
    };
    let row = InsertRow {
        cube: argv[1].clone(),
        partition: argv[2].clone(),
        columns,
        count,
    };
    if cubedb.insert(&row) {
        CommandOutcome::code(ReplyCode::Ok)
    } else {
        CommandOutcome::code(ReplyCode::ErrActionFailed)
    }
}

fn cmd_count(argv: &[String], cubedb: &Cubedb) -> CommandOutcome {
    let cube = match cubedb.find_cube(&argv[1]) {
        Some(cube) => cube,
        None => return CommandOutcome::code(ReplyCode::ErrObjNotFound),
    };
    let from = argv.get(2).and_then(|s| nullable(s));
    let to = argv.get(3).and_then(|s| nullable(s));
    let filter = match argv.get(4) {
        Some(token) => match parse_filter(token) {
            Ok(filter) => Some(filter),
            Err(_) => return CommandOutcome::code(ReplyCode::ErrWrongArg),
        },
        None => None,
    };
    let group = argv.get(5).and_then(|s| nullable(s));
    match cube.count_from_to(from, to, filter.as_ref(), group) {
        CountResult::Scalar(total) => CommandOutcome::reply(Reply::ScalarCounter(total)),
        CountResult::Grouped(map) => {
            let entries = map.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)).collect();
            CommandOutcome::reply(Reply::StrCountMap(entries))
        }
    }
}

fn cmd_pcount(argv: &[String], cubedb: &Cubedb) -> CommandOutcome {
    let cube = match cubedb.find_cube(&argv[1]) {
        Some(cube) => cube,
        None => return CommandOutcome::code(ReplyCode::ErrObjNotFound),
    };
    let from = argv.get(2).and_then(|s| nullable(s));
    let to = argv.get(3).and_then(|s| nullable(s));
    let filter = match argv.get(4) {
        Some(token) => match parse_filter(token) {
            Ok(filter) => Some(filter),
            Err(_) => return CommandOutcome::code(ReplyCode::ErrWrongArg),
        },
        None => None,
    };
    let group = argv.get(5).and_then(|s| nullable(s));
    let per_partition: Vec<(String, CountResult)> = cube
        .pcount_from_to(from, to, filter.as_ref(), group)
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect();

    if group.is_none() {
        let entries = per_partition
            .into_iter()
            .map(|(name, result)| match result {
                CountResult::Scalar(count) => (name, count),
                CountResult::Grouped(_) => unreachable!("ungrouped request returns scalars"),
            })
            .collect();
        CommandOutcome::reply(Reply::StrCountMap(entries))
    } else {
        let entries = per_partition
            .into_iter()
            .map(|(name, result)| match result {
                CountResult::Grouped(map) => {
                    let entries = map.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)).collect();
                    (name, entries)
                }
                CountResult::Scalar(_) => unreachable!("grouped request returns maps"),
            })
            .collect();
        CommandOutcome::reply(Reply::StrStrCountMap(entries))
    }
}

fn cmd_dump(cubedb: &Cubedb, config: &Config) -> CommandOutcome {
    let Some(dump_path) = &config.dump_path else {
        log::warn!("DUMP requested but no --dump-path was configured");
        return CommandOutcome::code(ReplyCode::ErrConfigurationErr);
    };
    match dump::write(dump_path, cubedb) {
        Ok(()) => CommandOutcome::code(ReplyCode::Ok),
        Err(e) => {
            log::warn!("DUMP to {} failed: {e}", dump_path.display());
            CommandOutcome::code(ReplyCode::ErrActionFailed)
        }
    }
}

fn cmd_help() -> CommandOutcome {
    let descriptions = COMMAND_TABLE.iter().map(|spec| spec.description.to_string()).collect();
    CommandOutcome::reply(Reply::StrList(descriptions))
}
