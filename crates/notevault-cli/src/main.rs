//! notevault — encrypted notes from the command line.
//!
//! The binary is a thin caller over notevault-core: it wires the file-backed
//! store, the local signer, the terminal gate, and the HTTP blob client into
//! the vault and maps subcommands onto its operations.

mod gate;
mod ipfs;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use notevault_core::fs::FileKvStore;
use notevault_core::session::SessionState;
use notevault_core::signer::LocalSigner;
use notevault_core::{NoteVault, WalletSession};

#[derive(Parser)]
#[command(
    name = "notevault",
    version,
    about = "End-to-end encrypted notes with a wallet-derived key"
)]
struct Cli {
    /// Override the data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Remote blob store API endpoint.
    #[arg(long, global = true, default_value = ipfs::DEFAULT_API_ENDPOINT)]
    api_endpoint: String,

    /// Remote blob store read gateway.
    #[arg(long, global = true, default_value = ipfs::DEFAULT_GATEWAY)]
    gateway: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect the wallet and cache the encryption signature.
    Connect,
    /// Disconnect and purge all cached wallet credentials.
    Disconnect,
    /// Lock the vault, keeping cached credentials for unlock.
    Lock,
    /// Unlock the vault (biometric-gated when enabled).
    Unlock,
    /// Show session and index status.
    Status,
    /// Create a note.
    Create {
        title: String,
        body: String,
        /// Replicate the ciphertext to the remote blob store.
        #[arg(long)]
        remote: bool,
    },
    /// List note titles.
    List,
    /// Decrypt and print a note.
    Show { id: String },
    /// Re-encrypt a note with new content.
    Edit {
        id: String,
        title: String,
        body: String,
        #[arg(long)]
        remote: bool,
    },
    /// Delete a note from the index.
    Rm { id: String },
    /// Manage the remote upload credential.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Enable or disable biometric locking.
    Biometric {
        #[command(subcommand)]
        action: BiometricAction,
    },
    /// Forget this device: purge wallet credentials and the signer key.
    Forget,
}

#[derive(Subcommand)]
enum TokenAction {
    Set { token: String },
    Clear,
    Show,
}

#[derive(Subcommand)]
enum BiometricAction {
    Enable,
    Disable,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => ProjectDirs::from("io", "notevault", "notevault")
            .context("cannot determine data directory")?
            .data_dir()
            .to_path_buf(),
    };

    tracing::debug!(path = %data_dir.display(), "data directory resolved");

    let kv = Arc::new(FileKvStore::open(data_dir.join("store.json"))?);
    let signer = Arc::new(LocalSigner::load_or_generate(kv.as_ref()).await?);
    let mut session =
        WalletSession::restore(signer, Arc::new(gate::TerminalGate), kv.clone()).await?;
    let blobs = Arc::new(ipfs::HttpBlobStore::new(cli.api_endpoint, cli.gateway));
    let mut vault = NoteVault::open(kv.clone(), blobs).await?;

    match cli.command {
        Command::Connect => {
            session.connect().await?;
            println!("connected: {}", session.address().unwrap_or_default());
        }
        Command::Disconnect => {
            session.disconnect().await?;
            println!("disconnected, cached credentials purged");
        }
        Command::Lock => {
            session.lock().await?;
            println!("locked (cached credentials preserved)");
        }
        Command::Unlock => {
            if session.unlock().await? {
                println!("unlocked");
            } else {
                bail!("unlock denied");
            }
        }
        Command::Status => {
            let state = match session.state() {
                SessionState::Connected => "connected",
                SessionState::Locked => "locked",
                SessionState::Disconnected => "disconnected",
            };
            println!("session:   {state}");
            if let Some(address) = session.address() {
                println!("address:   {address}");
            }
            println!(
                "biometric: {} (available: {})",
                if session.biometric_enabled() { "on" } else { "off" },
                session.biometric_available()
            );
            println!(
                "remote:    {}",
                if vault.remote_token().await?.is_some() {
                    "credential set"
                } else {
                    "no credential"
                }
            );
            println!("notes:     {}", vault.list().len());
        }
        Command::Create { title, body, remote } => {
            let note = vault.create_note(&mut session, &title, &body, remote).await?;
            println!("created {}", note.id);
        }
        Command::List => {
            if vault.list().is_empty() {
                println!("no notes");
            }
            for entry in vault.list() {
                let kind = if entry.locator.is_remote() { "remote" } else { "inline" };
                println!(
                    "{}  {:6}  {}  {}",
                    entry.id,
                    kind,
                    entry.updated_at.format("%Y-%m-%d %H:%M"),
                    entry.title
                );
            }
        }
        Command::Show { id } => {
            let note = vault.read_note(&mut session, &id).await?;
            println!("# {}", note.title);
            println!();
            println!("{}", note.body);
        }
        Command::Edit { id, title, body, remote } => {
            vault
                .update_note(&mut session, &id, &title, &body, remote)
                .await?;
            println!("updated {id}");
        }
        Command::Rm { id } => {
            vault.delete_note(&id).await?;
            println!("deleted {id}");
        }
        Command::Token { action } => match action {
            TokenAction::Set { token } => {
                vault.set_remote_token(&token).await?;
                println!("remote credential saved");
            }
            TokenAction::Clear => {
                vault.clear_remote_token().await?;
                println!("remote credential cleared");
            }
            TokenAction::Show => {
                println!(
                    "{}",
                    if vault.remote_token().await?.is_some() {
                        "credential set"
                    } else {
                        "no credential"
                    }
                );
            }
        },
        Command::Biometric { action } => match action {
            BiometricAction::Enable => {
                if !session.biometric_available() {
                    bail!("no biometric capability available");
                }
                if session.enable_biometric().await? {
                    println!("biometric locking enabled");
                } else {
                    bail!("authentication denied");
                }
            }
            BiometricAction::Disable => {
                session.disable_biometric().await?;
                println!("biometric locking disabled");
            }
        },
        Command::Forget => {
            session.delete_wallet().await?;
            LocalSigner::forget(kv.as_ref()).await?;
            println!("wallet credentials and signer key removed");
        }
    }

    Ok(())
}
