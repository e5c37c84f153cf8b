//! The single-threaded reactor: a `tokio` current-thread runtime plus a
//! `LocalSet`, so the whole server is one OS thread with cooperatively
//! scheduled per-connection tasks — no `Arc`/`Mutex`, no work ever crosses
//! a thread boundary. I/O is driven off `TcpStream::readable()`/`try_read()`
//! and `writable()`/`try_write()` rather than `AsyncReadExt`/`AsyncWriteExt`,
//! so the session owns explicit read/write buffers exactly as the original
//! non-blocking-socket design does.

pub mod commands;
pub mod session;

use std::cell::RefCell;
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::rc::Rc;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::LocalSet;

use crate::config::Config;
use crate::errors::CubeDbError;
use crate::mem_store::cubedb::Cubedb;
use crate::server::session::Session;

/// Binds the listener configured by `config.port`.
pub async fn bind(config: &Config) -> Result<TcpListener, CubeDbError> {
    let addr = format!("0.0.0.0:{}", config.port);
    TcpListener::bind(&addr).await.map_err(|source| CubeDbError::Listen {
        port: config.port.clone(),
        source,
    })
}

/// Binds the listener and runs the reactor until the process is killed.
/// Never returns on success; the only way out is a fatal bind failure.
pub async fn run(config: Config, cubedb: Cubedb) -> Result<(), CubeDbError> {
    let listener = bind(&config).await?;
    log::info!("cubedb listening on {}", listener.local_addr().map_or(config.port.clone(), |a| a.to_string()));
    serve(listener, cubedb, config).await;
    Ok(())
}

/// Runs the accept loop over an already-bound `listener` until the process
/// is killed. Split out from [`run`] so tests can bind an ephemeral port
/// and learn its address before serving.
pub async fn serve(listener: TcpListener, cubedb: Cubedb, config: Config) {
    let config = Rc::new(config);
    let cubedb = Rc::new(RefCell::new(cubedb));
    let local = LocalSet::new();

    local
        .run_until(async move {
            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        log::warn!("accept failed: {e}");
                        continue;
                    }
                };
                log::info!("accepted connection from {peer}");
                let config = Rc::clone(&config);
                let cubedb = Rc::clone(&cubedb);
                tokio::task::spawn_local(async move {
                    if let Err(e) = handle_connection(stream, peer, cubedb, config).await {
                        log::warn!("connection error with {peer}: {e}");
                    }
                    log::info!("connection closed with {peer}");
                });
            }
        })
        .await
}

/// Drains complete lines off the socket, dispatches each to the command
/// table, and flushes queued replies as the socket becomes writable.
///
/// `QUIT` (and a 0-byte read, signaling the peer hung up) close the
/// session immediately, discarding anything still queued but unsent —
/// matching the original reactor, which returns as if the connection had
/// been closed out from under it rather than draining the queue first.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    cubedb: Rc<RefCell<Cubedb>>,
    config: Rc<Config>,
) -> io::Result<()> {
    let mut session = Session::new(peer.to_string());
    let mut read_buf = [0u8; 4096];

    loop {
        tokio::select! {
            biased;

            readable = stream.readable() => {
                readable?;
                match stream.try_read(&mut read_buf) {
                    Ok(0) => return Ok(()),
                    Ok(n) => {
                        session.feed(&read_buf[..n]);
                        for line in session.drain_lines() {
                            let outcome = commands::process_query(&line, &mut cubedb.borrow_mut(), &config);
                            if outcome.close {
                                return Ok(());
                            }
                            session.enqueue_reply(outcome.reply.encode());
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                    Err(e) => return Err(e),
                }
            }

            _ = stream.writable(), if session.has_pending_replies() => {
                loop {
                    let Some(pending) = session.pending_head() else { break };
                    match stream.try_write(pending) {
                        Ok(0) => return Ok(()),
                        Ok(n) => session.advance_sent(n),
                        Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
}
