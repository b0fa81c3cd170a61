// SPDX-License-Identifier: Apache-2.0
#![allow(clippy::print_stdout)]
#![allow(clippy::missing_errors_doc)]
//! Command-line harness for building, merging, and inspecting causal tree
//! weaves stored as CBOR files on disk. A thin demonstration shell around
//! `weave-core`; all convergence logic lives in the library.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::instrument;
use weave_core::{AtomId, SiteId, Weave};

/// The atom payload this CLI works with: a single line of text per atom.
type DocValue = String;

#[derive(Parser)]
#[command(name = "weave", about = "Inspect and merge causal tree weaves", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new, empty weave owned by `--owner` and write it to `--out`.
    New {
        #[arg(long)]
        owner: SiteId,
        #[arg(long)]
        out: PathBuf,
    },
    /// Append a content atom.
    Add {
        #[arg(long = "in")]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Causal parent, formatted `site:index`.
        #[arg(long)]
        cause: String,
        #[arg(long)]
        value: String,
        #[arg(long, default_value_t = 0)]
        clock: u64,
    },
    /// Tombstone an existing atom.
    Delete {
        #[arg(long = "in")]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Atom to delete, formatted `site:index`.
        #[arg(long)]
        target: String,
        #[arg(long, default_value_t = 0)]
        clock: u64,
    },
    /// Merge one weave file into another, writing the result to `--out`.
    Merge {
        #[arg(long)]
        into: PathBuf,
        #[arg(long)]
        from: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run full structural validation against a weave file.
    Validate {
        #[arg(long = "in")]
        input: PathBuf,
    },
    /// Print the weave's atoms in canonical order.
    Show {
        #[arg(long = "in")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::New { owner, out } => cmd_new(owner, &out),
        Command::Add {
            input,
            out,
            cause,
            value,
            clock,
        } => cmd_add(&input, &out, &cause, value, clock),
        Command::Delete {
            input,
            out,
            target,
            clock,
        } => cmd_delete(&input, &out, &target, clock),
        Command::Merge { into, from, out } => cmd_merge(&into, &from, &out),
        Command::Validate { input } => cmd_validate(&input),
        Command::Show { input } => cmd_show(&input),
    }
}

fn parse_atom_id(raw: &str) -> Result<AtomId> {
    let (site, index) = raw
        .split_once(':')
        .with_context(|| format!("expected `site:index`, got {raw:?}"))?;
    Ok(AtomId {
        site: site.parse().context("invalid site id")?,
        index: index.parse().context("invalid yarn index")?,
    })
}

fn load_weave(path: &Path) -> Result<Weave<DocValue>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    weave_core::from_bytes(&bytes).with_context(|| format!("decoding {}", path.display()))
}

fn save_weave(weave: &Weave<DocValue>, path: &Path) -> Result<()> {
    let bytes = weave_core::to_bytes(weave).context("encoding weave")?;
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

#[instrument(skip(out))]
fn cmd_new(owner: SiteId, out: &Path) -> Result<()> {
    let weave: Weave<DocValue> = Weave::new(owner);
    save_weave(&weave, out)?;
    tracing::info!(owner, path = %out.display(), "created weave");
    Ok(())
}

#[instrument(skip(value))]
fn cmd_add(input: &Path, out: &Path, cause: &str, value: String, clock: u64) -> Result<()> {
    let mut weave = load_weave(input)?;
    let cause_id = parse_atom_id(cause)?;
    let Some(id) = weave.add_atom(value, cause_id, clock) else {
        bail!("cause {cause_id} not found or childless");
    };
    save_weave(&weave, out)?;
    tracing::info!(%id, "added atom");
    Ok(())
}

#[instrument]
fn cmd_delete(input: &Path, out: &Path, target: &str, clock: u64) -> Result<()> {
    let mut weave = load_weave(input)?;
    let target_id = parse_atom_id(target)?;
    let Some(id) = weave.delete_atom(target_id, clock) else {
        bail!("target {target_id} is not a live atom");
    };
    save_weave(&weave, out)?;
    tracing::info!(%id, "deleted atom");
    Ok(())
}

#[instrument(skip(into, from))]
fn cmd_merge(into: &Path, from: &Path, out: &Path) -> Result<()> {
    let mut local = load_weave(into)?;
    let remote = load_weave(from)?;
    local.integrate(&remote).context("merge failed")?;
    save_weave(&local, out)?;
    tracing::info!(weft = ?local.complete_weft(), "merged");
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<()> {
    let weave = load_weave(input)?;
    weave.validate().context("weave failed validation")?;
    println!("ok: {} atoms, weft {:?}", weave.weave().len(), weave.complete_weft());
    Ok(())
}

fn cmd_show(input: &Path) -> Result<()> {
    let weave = load_weave(input)?;
    for atom in weave.weave() {
        println!(
            "{:?} id={} cause={} ref={} clock={} value={:?}",
            atom.ty, atom.id, atom.cause, atom.reference, atom.clock, atom.value
        );
    }
    Ok(())
}
