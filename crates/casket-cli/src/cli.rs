use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use casket_types::{DigestKind, Geometry};

#[derive(Parser)]
#[command(
    name = "casket",
    about = "Casket — content-addressed block stream storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file and print its root address
    Put(PutArgs),
    /// Reconstruct a stream from its root address
    Get(GetArgs),
    /// Walk a stream's tree and re-hash every block
    Verify(VerifyArgs),
    /// Serve a block store over TCP
    Serve(ServeArgs),
}

/// Store location and geometry flags shared by all subcommands.
#[derive(Args)]
pub struct StoreArgs {
    /// Block store root directory
    #[arg(long, default_value = ".")]
    pub store: String,

    /// Total block size in bytes
    #[arg(long, default_value_t = 1024)]
    pub block_size: usize,

    /// Digest function deriving block addresses
    #[arg(long, value_enum, default_value = "blake3")]
    pub digest: DigestArg,

    /// Salt written into every block header
    #[arg(long, default_value_t = 0)]
    pub salt: u16,
}

impl StoreArgs {
    pub fn geometry(&self) -> Geometry {
        Geometry {
            block_size: self.block_size,
            digest: self.digest.into(),
            salt: self.salt,
            ..Geometry::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DigestArg {
    /// BLAKE3 truncated to 128 bits
    Blake3,
    /// Full 256-bit BLAKE3
    Blake3Full,
    /// SHA-256 truncated to 128 bits
    Sha256,
    /// Full SHA-256
    Sha256Full,
}

impl From<DigestArg> for DigestKind {
    fn from(arg: DigestArg) -> Self {
        match arg {
            DigestArg::Blake3 => DigestKind::Blake3_128,
            DigestArg::Blake3Full => DigestKind::Blake3_256,
            DigestArg::Sha256 => DigestKind::Sha256_128,
            DigestArg::Sha256Full => DigestKind::Sha256_256,
        }
    }
}

#[derive(Args)]
pub struct PutArgs {
    /// File to store
    pub file: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct GetArgs {
    /// Root address of the stream
    pub address: String,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Root address of the stream
    pub address: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TCP listen address
    #[arg(long, default_value = "127.0.0.1:4310")]
    pub bind: String,

    #[command(flatten)]
    pub store: StoreArgs,
}
