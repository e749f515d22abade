//! `rekeysrv`: the Kerberos principal re-keying service entry point.
//!
//! Three process models (spec §6): `-i` inetd (the accepted connection
//! is fd 0/1), `-d` daemonize (fork, detach, optional PID file), and
//! the foreground default (bind and accept in a loop, one task per
//! connection).

use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;
use rekey_kdb::process::ProcessKdb;
use rekey_kdb::KdbAdmin;
use rekey_server::config::{Args, Config, RunMode};
use rekey_server::session::Session;
use rekey_server::stdio::Stdio;
use rekey_server::{run_session, tls};
use rekey_store::RotationStore;
use rekey_transport::{ChannelBinding, Connection};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rekeysrv: {e}");
            return std::process::ExitCode::from(1);
        }
    };

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal startup error");
            std::process::ExitCode::from(1)
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    if config.mode == RunMode::Daemon {
        daemonize::Daemonize::new()
            .start()
            .map_err(|e| anyhow::anyhow!("daemonizing: {e}"))?;
    }

    if let Some(pidfile) = &config.pidfile {
        let mut f = std::fs::File::create(pidfile)?;
        writeln!(f, "{}", std::process::id())?;
    }
    install_signal_handlers(config.pidfile.clone());

    let store = RotationStore::connect(&config.store_path).await?;
    let kdb: Arc<dyn KdbAdmin> = Arc::new(ProcessKdb::new(config.kdb_command.clone()));
    let acceptor = tls::load_acceptor(&config.tls_cert_path, &config.tls_key_path)?;

    match config.mode {
        RunMode::Inetd => {
            let tls_stream = acceptor.accept(Stdio::new()).await?;
            let channel_binding = ChannelBinding::from_connection(tls_stream.get_ref().1)?;
            let conn = Connection::new(tls_stream);
            let mut session = Session::new(
                conn,
                channel_binding,
                store,
                kdb,
                config.default_realm.clone(),
                config.enctype_profile,
            )?;
            run_session(&mut session).await;
            Ok(())
        }
        RunMode::Daemon | RunMode::Foreground => {
            let listener = TcpListener::bind(config.listen_addr.as_str()).await?;
            tracing::info!(addr = %config.listen_addr, "listening");
            loop {
                let (socket, peer) = listener.accept().await?;
                let acceptor = acceptor.clone();
                let store = store.clone();
                let kdb = Arc::clone(&kdb);
                let default_realm = config.default_realm.clone();
                let enctype_profile = config.enctype_profile;

                tokio::spawn(async move {
                    let span = tracing::info_span!("connection", %peer);
                    let _enter = span.enter();
                    let tls_stream = match acceptor.accept(socket).await {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::warn!(error = %e, "TLS handshake failed");
                            return;
                        }
                    };
                    let channel_binding = match ChannelBinding::from_connection(tls_stream.get_ref().1) {
                        Ok(cb) => cb,
                        Err(e) => {
                            tracing::warn!(error = %e, "channel binding unavailable");
                            return;
                        }
                    };
                    let conn = Connection::new(tls_stream);
                    let mut session =
                        match Session::new(conn, channel_binding, store, kdb, default_realm, enctype_profile) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to build session");
                                return;
                            }
                        };
                    run_session(&mut session).await;
                });
            }
        }
    }
}

/// `SIGHUP` is ignored; `SIGINT`/`SIGTERM` remove the PID file and exit
/// 255 (spec §6). No `SIGCHLD` handler: there are no child processes to
/// reap under the task-per-connection model (see `DESIGN.md`).
fn install_signal_handlers(pidfile: Option<std::path::PathBuf>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");
        loop {
            hangup.recv().await;
            tracing::debug!("SIGHUP ignored");
        }
    });

    tokio::spawn(async move {
        let mut interrupt = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut terminate = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        if let Some(pidfile) = &pidfile {
            let _ = std::fs::remove_file(pidfile);
        }
        std::process::exit(255);
    });
}
