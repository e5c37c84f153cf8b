use std::fs::OpenOptions;
use std::process;

use clap::Parser;
use cubedb::config::Config;
use cubedb::errors::CubeDbError;
use cubedb::ingest::dump;
use cubedb::mem_store::cubedb::Cubedb;
use cubedb::server;

fn init_logging(config: &Config) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.log_filter());
    if let Some(path) = &config.log_path {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("cubedb: could not open log path {}: {e}", path.display());
                process::exit(1);
            }
        }
    }
    builder.init();
}

fn main() {
    let config = Config::parse();
    init_logging(&config);

    let mut cubedb = Cubedb::new();
    if let Some(dump_path) = &config.dump_path {
        match dump::load(dump_path, &mut cubedb) {
            Ok(loaded) => log::info!("loaded {loaded} rows from {}", dump_path.display()),
            Err(source) => {
                let error = CubeDbError::DumpLoad {
                    path: dump_path.clone(),
                    source,
                };
                log::error!("{error}");
                process::exit(1);
            }
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .expect("failed to build the tokio runtime");

    if let Err(e) = runtime.block_on(server::run(config, cubedb)) {
        log::error!("{e}");
        process::exit(1);
    }
}
