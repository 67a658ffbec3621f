//! Operator CLI for ClinicSync
//!
//! ```bash
//! # Merge a clinic laptop's dataset into the shared copy, keeping backups
//! clinic-sync reconcile --local clinic-local.json --remote /mnt/drive/clinic.json --backup-dir backups
//!
//! # Would a raw overwrite be safe? (exit code 2 when not)
//! clinic-sync check --local clinic-local.json --remote /mnt/drive/clinic.json
//!
//! # Record counts
//! clinic-sync stats clinic-local.json --json
//! ```

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command, StoreArgs};
