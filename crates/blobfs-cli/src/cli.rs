use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blobfs",
    about = "blobfs - typed blob storage on a plain directory tree",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Which store the client commands talk to.
#[derive(Args, Clone, Debug, Default)]
pub struct BackendArgs {
    /// Local store root directory
    #[arg(long, global = true, conflicts_with = "remote")]
    pub root: Option<PathBuf>,

    /// URL of a running blobfs server
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Prefix prepended to every path sent to the remote server
    #[arg(long, global = true, requires = "remote")]
    pub vroot: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve a local store over HTTP
    Serve(ServeArgs),
    /// Store a new blob
    Add(UploadArgs),
    /// Overwrite an existing blob
    Set(UploadArgs),
    /// Fetch a blob
    Get(GetArgs),
    /// Delete a blob
    Del(PathArg),
    /// Create a bucket
    Mkdir(BucketArg),
    /// Remove an empty bucket
    Rmdir(BucketArg),
    /// List the blobs in a bucket
    Ls(BucketArg),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Store unknown content types as application/octet-stream
    #[arg(long)]
    pub permissive: bool,
}

#[derive(Args)]
pub struct UploadArgs {
    /// Blob path, `bucket/name`
    pub path: String,
    /// File to upload
    pub file: PathBuf,
    /// MIME type; guessed from the file extension if omitted
    #[arg(long = "type")]
    pub mime: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub path: String,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PathArg {
    pub path: String,
}

#[derive(Args)]
pub struct BucketArg {
    pub bucket: String,
}
