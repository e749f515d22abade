//! CLI surface and runtime configuration.
//!
//! The flags below are spec's CLI surface, verbatim; everything else
//! (store path, KDB adapter command, default realm, listen address,
//! TLS material) is an ambient deployment knob read from the
//! environment, the way a process that is mostly configured by flags
//! still pulls a handful of infrastructure settings from its
//! environment rather than growing more flags for them.

use std::path::PathBuf;

use clap::Parser;
use rekey_wire::EnctypeProfile;

/// `rekeysrv` — Kerberos principal re-keying service.
#[derive(Debug, Parser)]
#[command(name = "rekeysrv", version, about = "Kerberos principal re-keying service")]
pub struct Args {
    /// Run under inetd: fd 0 is the accepted connection.
    ///
    /// Mutually exclusive with `-d`/`-p`.
    #[arg(short = 'i', conflicts_with_all = ["daemonize", "pidfile"])]
    pub inetd: bool,

    /// Daemonize: fork, detach from the controlling terminal, write a
    /// PID file if `-p` was given.
    #[arg(short = 'd')]
    pub daemonize: bool,

    /// Write the server's PID to `F`; remove it on `SIGINT`/`SIGTERM`.
    #[arg(short = 'p', value_name = "F")]
    pub pidfile: Option<PathBuf>,

    /// Path to an ACL file enumerating permitted target principals.
    ///
    /// Parsed and carried in [`Config`] but not consulted by any
    /// handler, matching spec's explicit statement that the handlers
    /// don't gate on it.
    #[arg(short = 'T', value_name = "F")]
    pub target_acl: Option<PathBuf>,

    /// Force legacy (DES-only) enctype compatibility.
    #[arg(short = 'c')]
    pub compat_enctypes: bool,

    /// Admin-subsystem config, opaque to the core request pipeline.
    #[arg(short = 'a', value_name = "ARG")]
    pub admin_arg: Option<String>,
}

/// How the server obtains its first (and, outside inetd, every
/// subsequent) connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// fd 0/1 is the one accepted connection; exit after it closes.
    Inetd,
    /// Fork, detach, and listen for connections in the background.
    Daemon,
    /// Listen for connections in the foreground.
    Foreground,
}

/// Assembled runtime configuration: CLI flags plus environment-sourced
/// deployment knobs.
#[derive(Debug, Clone)]
pub struct Config {
    /// How this process was started.
    pub mode: RunMode,
    /// PID file path, if any.
    pub pidfile: Option<PathBuf>,
    /// ACL file path, if any (unused by handlers; see [`Args::target_acl`]).
    pub target_acl: Option<PathBuf>,
    /// Which enctypes `NEWREQ` generates by default.
    pub enctype_profile: EnctypeProfile,
    /// Opaque admin-subsystem argument.
    pub admin_arg: Option<String>,
    /// The realm this server administers. Principals outside it are
    /// never `is_admin`/`is_host`, per the authorization classifier.
    pub default_realm: String,
    /// Path to the SQLite rotation store.
    pub store_path: String,
    /// Address to listen on, outside inetd mode.
    pub listen_addr: String,
    /// PEM-encoded TLS certificate chain path.
    pub tls_cert_path: PathBuf,
    /// PEM-encoded TLS private key path.
    pub tls_key_path: PathBuf,
    /// The `kadmin`-style administrative command `rekey-kdb::ProcessKdb`
    /// shells out to.
    pub kdb_command: String,
}

/// Error building [`Config`] from [`Args`] and the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable was not set and has no default.
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
}

impl Config {
    /// Build the runtime configuration from parsed CLI args and the
    /// process environment.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let mode = if args.inetd {
            RunMode::Inetd
        } else if args.daemonize {
            RunMode::Daemon
        } else {
            RunMode::Foreground
        };

        let enctype_profile = if args.compat_enctypes {
            EnctypeProfile::Compat
        } else {
            EnctypeProfile::Modern
        };

        let default_realm = std::env::var("REKEYSRV_REALM").map_err(|_| ConfigError::MissingEnv("REKEYSRV_REALM"))?;
        let store_path =
            std::env::var("REKEYSRV_STORE").unwrap_or_else(|_| "/var/lib/rekeysrv/rotations.db".to_string());
        let listen_addr = std::env::var("REKEYSRV_LISTEN").unwrap_or_else(|_| "0.0.0.0:4446".to_string());
        let tls_cert_path = std::env::var("REKEYSRV_TLS_CERT")
            .unwrap_or_else(|_| "/etc/rekeysrv/tls.crt".to_string())
            .into();
        let tls_key_path = std::env::var("REKEYSRV_TLS_KEY")
            .unwrap_or_else(|_| "/etc/rekeysrv/tls.key".to_string())
            .into();
        let kdb_command = std::env::var("REKEYSRV_KDB_COMMAND").unwrap_or_else(|_| "kadmin-rekey-adapter".to_string());

        Ok(Self {
            mode,
            pidfile: args.pidfile,
            target_acl: args.target_acl,
            enctype_profile,
            admin_arg: args.admin_arg,
            default_realm,
            store_path,
            listen_addr,
            tls_cert_path,
            tls_key_path,
            kdb_command,
        })
    }
}
