//! Host side of the carmod client.
//!
//! # Overview
//! `carmod-core` never touches the network or the filesystem. This crate
//! supplies the pieces it leaves to the host: a `ureq`-backed `Transport`, a
//! JSON-file `TokenStore`, configuration from flags and environment, and an
//! interactive shell that stands in for the studio's view.

pub mod config;
pub mod recolor;
pub mod shell;
pub mod store;
pub mod transport;

pub use config::{Cli, Command};
pub use recolor::recolor_file;
pub use shell::{Flow, Shell};
pub use store::FileTokenStore;
pub use transport::UreqTransport;
