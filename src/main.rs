//! pmt CLI - inspect the Merkle tree of a packed byte file
//!
//! The input file is read as one packed buffer: 32-byte chunks become
//! leaves, the last one zero-padded, and the leaves are merkleized at the
//! requested depth (by default the smallest depth that fits them).

use clap::{Parser, Subcommand};
use log::{debug, info};
use memmap2::Mmap;
use persistent_merkle::{
    bytes_to_leaves, zero_hash, Blake3Hasher, Gindex, Hasher, KeccakHasher, Tree,
};
use std::fs::File;
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "pmt";

#[derive(Parser)]
#[command(name = "pmt")]
#[command(about = "Merkle roots and proofs over packed byte files")]
#[command(version)]
struct Cli {
    /// Two-to-one hash function
    #[arg(long, default_value = "keccak")]
    hasher: HasherKind,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum HasherKind {
    Keccak,
    Blake3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the root of a packed file
    Root {
        /// Input file
        file: PathBuf,
        /// Tree depth (defaults to the smallest that fits)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// List the leaf chunks of a packed file
    Chunks {
        /// Input file
        file: PathBuf,
    },

    /// Prove a single node
    Prove {
        /// Input file
        file: PathBuf,
        /// Leaf index at the tree depth
        #[arg(short, long, conflicts_with = "gindex", required_unless_present = "gindex")]
        index: Option<u64>,
        /// Generalized index of any node
        #[arg(short, long)]
        gindex: Option<Gindex>,
        /// Tree depth (defaults to the smallest that fits)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Prove several leaves with one deduplicated witness set
    Multiprove {
        /// Input file
        file: PathBuf,
        /// Leaf indices at the tree depth
        #[arg(short, long, required = true, num_args = 1..)]
        index: Vec<u64>,
        /// Tree depth (defaults to the smallest that fits)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Root of the all-zero subtree of a given depth
    ZeroHash {
        /// Subtree depth
        depth: usize,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.hasher {
        HasherKind::Keccak => run::<KeccakHasher>(&cli),
        HasherKind::Blake3 => run::<Blake3Hasher>(&cli),
    };

    if let Err(e) = result {
        output(
            &cli.format,
            &serde_json::json!({
                "status": "error",
                "message": e.to_string()
            }),
        );
        std::process::exit(1);
    }
}

fn run<H: Hasher>(cli: &Cli) -> anyhow::Result<()> {
    debug!(target: LOG_TARGET, "Using hasher {}", H::NAME);

    match &cli.command {
        Commands::Root { file, depth } => {
            let (tree, depth, size) = load_tree::<H>(file, *depth)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "hasher": H::NAME,
                    "bytes": size,
                    "depth": depth,
                    "root": tree.root().to_hex()
                }),
            );
        }

        Commands::Chunks { file } => {
            let leaves = with_file_bytes(file, |bytes| Ok(bytes_to_leaves::<H>(bytes)))?;
            let chunks: Vec<_> = leaves.iter().map(|leaf| leaf.root().to_hex()).collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "count": chunks.len(),
                    "chunks": chunks
                }),
            );
        }

        Commands::Prove {
            file,
            index,
            gindex,
            depth,
        } => {
            let (tree, depth, _) = load_tree::<H>(file, *depth)?;
            let target = match (gindex, index) {
                (Some(g), _) => *g,
                (None, Some(i)) => Gindex::from_index_at_depth(depth, *i)?,
                (None, None) => anyhow::bail!("either --index or --gindex is required"),
            };
            let proof = tree.prove_single(target)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "hasher": H::NAME,
                    "root": tree.root().to_hex(),
                    "gindex": proof.gindex.to_string(),
                    "leaf": proof.leaf.to_hex(),
                    "witnesses": proof.witnesses.iter().map(|w| w.to_hex()).collect::<Vec<_>>()
                }),
            );
        }

        Commands::Multiprove { file, index, depth } => {
            let (tree, depth, _) = load_tree::<H>(file, *depth)?;
            let gindices = index
                .iter()
                .map(|&i| Gindex::from_index_at_depth(depth, i))
                .collect::<persistent_merkle::Result<Vec<_>>>()?;
            let proof = tree.prove_multi(&gindices)?;
            let witnesses: Vec<_> = proof
                .witnesses
                .iter()
                .map(|w| {
                    serde_json::json!({
                        "gindex": w.gindex.to_string(),
                        "hash": w.hash.to_hex()
                    })
                })
                .collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "hasher": H::NAME,
                    "root": tree.root().to_hex(),
                    "gindices": proof.gindices.iter().map(|g| g.to_string()).collect::<Vec<_>>(),
                    "leaves": proof.leaves.iter().map(|l| l.to_hex()).collect::<Vec<_>>(),
                    "witnesses": witnesses
                }),
            );
        }

        Commands::ZeroHash { depth } => {
            output(
                &cli.format,
                &serde_json::json!({
                    "hasher": H::NAME,
                    "depth": depth,
                    "root": zero_hash::<H>(*depth)?.to_hex()
                }),
            );
        }
    }

    Ok(())
}

/// Merkleize a packed file. Returns the tree, its depth and the byte size.
fn load_tree<H: Hasher>(
    path: &Path,
    depth: Option<usize>,
) -> anyhow::Result<(Tree<H>, usize, usize)> {
    let (leaves, size) =
        with_file_bytes(path, |bytes| Ok((bytes_to_leaves::<H>(bytes), bytes.len())))?;
    let depth = depth.unwrap_or_else(|| min_depth(leaves.len()));
    let tree = Tree::from_contents(&leaves, depth)?;
    info!(
        target: LOG_TARGET,
        "Merkleized {} byte(s) into {} chunk(s) at depth {}",
        size,
        leaves.len(),
        depth
    );
    Ok((tree, depth, size))
}

/// Smallest depth whose row holds `count` leaves
fn min_depth(count: usize) -> usize {
    count.max(1).next_power_of_two().trailing_zeros() as usize
}

fn with_file_bytes<T>(
    path: &Path,
    f: impl FnOnce(&[u8]) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return f(&[]);
    }
    // SAFETY: the map is read-only and dropped when `f` returns. If another
    // process truncates the file meanwhile, reads past the new end fault the
    // process with SIGBUS; pmt accepts that for inputs it does not own.
    let mmap = unsafe { Mmap::map(&file)? };
    f(&mmap)
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", value);
        }
        OutputFormat::Text => {
            let pretty =
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            println!("{}", pretty);
        }
    }
}
