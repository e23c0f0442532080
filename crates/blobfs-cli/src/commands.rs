use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use blobfs_remote::{RemoteConfig, RemoteStore};
use blobfs_server::{BlobServer, ServerConfig};
use blobfs_store::{BlobStorage, FsBlobStore, StoreConfig};
use blobfs_types::{ContentType, MimePolicy};
use bytes::Bytes;
use colored::Colorize;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        format,
        backend,
        ..
    } = cli;
    match command {
        Command::Serve(args) => cmd_serve(args, &backend).await,
        Command::Add(args) => {
            let storage = open_storage(&backend)?;
            cmd_upload(storage.as_ref(), args, false, format).await
        }
        Command::Set(args) => {
            let storage = open_storage(&backend)?;
            cmd_upload(storage.as_ref(), args, true, format).await
        }
        Command::Get(args) => cmd_get(open_storage(&backend)?.as_ref(), args, format).await,
        Command::Del(args) => {
            open_storage(&backend)?.del(&args.path).await?;
            report(
                format,
                format!("{} Deleted {}", "✓".green(), args.path.bold()),
                json!({ "deleted": args.path }),
            );
            Ok(())
        }
        Command::Mkdir(args) => {
            open_storage(&backend)?.mkdir(&args.bucket).await?;
            report(
                format,
                format!("{} Created bucket {}", "✓".green(), args.bucket.bold()),
                json!({ "created": args.bucket }),
            );
            Ok(())
        }
        Command::Rmdir(args) => {
            open_storage(&backend)?.rmdir(&args.bucket).await?;
            report(
                format,
                format!("{} Removed bucket {}", "✓".green(), args.bucket.bold()),
                json!({ "removed": args.bucket }),
            );
            Ok(())
        }
        Command::Ls(args) => cmd_ls(open_storage(&backend)?.as_ref(), args, format).await,
    }
}

/// The local engine, or a remote proxy when `--remote` is given.
fn open_storage(backend: &BackendArgs) -> anyhow::Result<Arc<dyn BlobStorage>> {
    if let Some(url) = &backend.remote {
        let mut config = RemoteConfig::new(url.clone());
        config.virtual_root = backend.vroot.clone();
        let store = RemoteStore::new(config).with_context(|| format!("connecting to {url}"))?;
        return Ok(Arc::new(store));
    }
    let config = match &backend.root {
        Some(root) => StoreConfig::new(root),
        None => StoreConfig::default(),
    };
    let store = FsBlobStore::open(config.clone())
        .with_context(|| format!("opening store at {}", config.root.display()))?;
    Ok(Arc::new(store))
}

fn report(format: OutputFormat, text: String, value: Value) {
    match format {
        OutputFormat::Text => println!("{text}"),
        OutputFormat::Json => println!("{value}"),
    }
}

/// Content type implied by a file extension.
fn guess_type(file: &Path) -> ContentType {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "text" => ContentType::Plain,
        "html" | "htm" => ContentType::Html,
        "json" => ContentType::Json,
        "css" => ContentType::Css,
        "js" | "mjs" => ContentType::Javascript,
        "mp3" => ContentType::Mp3,
        "ogg" => ContentType::Ogg,
        "jpg" | "jpeg" => ContentType::Jpeg,
        "png" => ContentType::Png,
        "gif" => ContentType::Gif,
        "mp4" => ContentType::Mp4,
        "webm" => ContentType::Webm,
        "mkv" => ContentType::Mkv,
        _ => ContentType::Stream,
    }
}

async fn cmd_serve(args: ServeArgs, backend: &BackendArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(root) = &backend.root {
        config.store.root = root.clone();
    }
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.permissive {
        config.mime_policy = MimePolicy::Permissive;
    }

    let server = match &backend.remote {
        Some(url) => {
            println!(
                "{} Proxying {} on {}",
                "▶".green().bold(),
                url.cyan(),
                config.bind_addr.to_string().bold()
            );
            BlobServer::with_storage(config, open_storage(backend)?)
        }
        None => {
            println!(
                "{} Serving {} on {}",
                "▶".green().bold(),
                config.store.root.display().to_string().cyan(),
                config.bind_addr.to_string().bold()
            );
            BlobServer::new(config)?
        }
    };
    server.serve().await?;
    Ok(())
}

async fn cmd_upload(
    storage: &dyn BlobStorage,
    args: UploadArgs,
    overwrite: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let content_type = match &args.mime {
        Some(mime) => mime.parse::<ContentType>()?,
        None => guess_type(&args.file),
    };
    let len = data.len() as u64;

    let (verb, written) = if overwrite {
        ("Updated", storage.set(content_type, &args.path, Bytes::from(data)).await?)
    } else {
        storage.add(content_type, &args.path, Bytes::from(data)).await?;
        ("Added", len)
    };
    report(
        format,
        format!(
            "{} {} {} ({}, {} bytes)",
            "✓".green(),
            verb,
            args.path.bold(),
            content_type.mime().cyan(),
            written
        ),
        json!({ "path": args.path, "content_type": content_type.mime(), "bytes": written }),
    );
    Ok(())
}

async fn cmd_get(
    storage: &dyn BlobStorage,
    args: GetArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut blob = storage.get(&args.path).await?;
    let content_type = blob.content_type;

    match &args.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("creating {}", path.display()))?;
            let copied = tokio::io::copy(&mut blob.reader, &mut file).await?;
            file.flush().await?;
            report(
                format,
                format!(
                    "{} Wrote {} bytes of {} to {}",
                    "✓".green(),
                    copied,
                    content_type.mime().cyan(),
                    path.display()
                ),
                json!({ "path": args.path, "content_type": content_type.mime(), "bytes": copied }),
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut blob.reader, &mut stdout).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn cmd_ls(
    storage: &dyn BlobStorage,
    args: BucketArg,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let listing = storage.lsdir(&args.bucket).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
        OutputFormat::Text if listing.is_empty() => {
            println!("{} is empty", args.bucket.bold());
        }
        OutputFormat::Text => {
            for (mime, name) in &listing {
                println!("{:<26} {}", mime.cyan(), name);
            }
        }
    }
    Ok(())
}
