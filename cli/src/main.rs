use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use client::net::supabase::SupabaseClient;
use client::net::types::FileUpload;
use client::services::directory::{Directory, ProfileLookup};
use client::services::registration::{self, Registration, RegistrationError};
use client::state::auth::SessionError;
use client::{AppRouter, BackendError, SessionStore};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("backend unavailable: {0}")]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("not signed in; pass --email and --password or set POSTWALL_EMAIL / POSTWALL_PASSWORD")]
    NotSignedIn,
    #[error("could not read {path}: {source}")]
    ReadPicture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("profile lookup failed: {0}")]
    Lookup(String),
    #[error("invalid JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "postwall", about = "Postwall session, directory and registration CLI")]
struct Cli {
    #[arg(long, env = "POSTWALL_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "POSTWALL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in identity and its display profile.
    Whoami,
    /// Navigate through one or more paths and print where each lands.
    Navigate {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Search profiles by name or username.
    Search { query: String },
    /// Show one profile by id.
    Profile { id: Uuid },
    /// Create an account, optionally with an avatar.
    Register(RegisterArgs),
    /// Send a password reset email.
    ForgotPassword { email: String },
    /// Set username and full name for the signed-in user.
    CompleteProfile {
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: String,
    },
    /// Sign in, then sign out.
    Logout,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    full_name: String,
    #[arg(long = "new-email")]
    email: String,
    #[arg(long = "new-password")]
    password: String,
    #[arg(long, help = "Avatar image file")]
    picture: Option<PathBuf>,
}

#[derive(Serialize)]
struct Whoami<'a> {
    identity: &'a client::Identity,
    display: client::DisplayProfile,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let backend = Arc::new(SupabaseClient::from_env()?);
    let session = Arc::new(SessionStore::new(backend.clone()));

    if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        if !matches!(cli.command, Command::Register(_) | Command::ForgotPassword { .. }) {
            session.sign_in(email, password).await?;
        }
    }

    match cli.command {
        Command::Whoami => run_whoami(&session).await,
        Command::Navigate { paths } => run_navigate(session, &paths).await,
        Command::Search { query } => run_search(&session, &query).await,
        Command::Profile { id } => run_profile(&session, id).await,
        Command::Register(args) => run_register(backend.as_ref(), args).await,
        Command::ForgotPassword { email } => {
            registration::request_password_reset(backend.as_ref(), &email).await?;
            println!("reset email requested for {}", email.trim());
            Ok(())
        }
        Command::CompleteProfile { username, full_name } => {
            let identity = session.complete_profile(&username, &full_name).await?;
            print_json(&identity)
        }
        Command::Logout => {
            require_identity(&session).await?;
            session.logout().await?;
            println!("signed out");
            Ok(())
        }
    }
}

async fn require_identity(session: &SessionStore) -> Result<client::Identity, CliError> {
    if let Some(identity) = session.current_identity().await {
        return Ok(identity);
    }
    session.load_initial_session().await;
    session.current_identity().await.ok_or(CliError::NotSignedIn)
}

async fn run_whoami(session: &SessionStore) -> Result<(), CliError> {
    let identity = require_identity(session).await?;
    let display = session.display_profile().await;
    print_json(&Whoami { identity: &identity, display })
}

async fn run_navigate(session: Arc<SessionStore>, paths: &[String]) -> Result<(), CliError> {
    let mut router = AppRouter::new(session);
    for path in paths {
        let landed = router.push(path).await;
        println!("{path} -> {landed}");
    }
    Ok(())
}

async fn run_search(session: &SessionStore, query: &str) -> Result<(), CliError> {
    require_identity(session).await?;
    let directory = Directory::for_session(session);
    let profiles = directory.search_users(query).await;
    print_json(&profiles)?;
    directory.release(&profiles);
    Ok(())
}

async fn run_profile(session: &SessionStore, id: Uuid) -> Result<(), CliError> {
    require_identity(session).await?;
    let directory = Directory::for_session(session);
    match directory.get_user_profile(id).await {
        ProfileLookup::Found(profile) => {
            print_json(&profile)?;
            directory.release(std::slice::from_ref(&profile));
            Ok(())
        }
        ProfileLookup::NotFound => {
            println!("no profile with id {id}");
            Ok(())
        }
        ProfileLookup::Failed(message) => Err(CliError::Lookup(message)),
    }
}

async fn run_register(backend: &SupabaseClient, args: RegisterArgs) -> Result<(), CliError> {
    let profile_picture = match args.picture {
        Some(path) => Some(read_picture(&path).await?),
        None => None,
    };
    let form = Registration {
        username: args.username,
        full_name: args.full_name,
        email: args.email,
        password: args.password,
        profile_picture,
    };
    match registration::register_user(backend, &form).await {
        Ok(user_id) => {
            println!("registered {user_id}");
            Ok(())
        }
        Err(e) => {
            if let Some(user_id) = e.orphaned_user() {
                tracing::warn!(%user_id, "auth identity created without a complete profile");
            }
            Err(e.into())
        }
    }
}

async fn read_picture(path: &Path) -> Result<FileUpload, CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::ReadPicture {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "avatar".to_owned());
    let content_type = content_type_for(path, &bytes);
    Ok(FileUpload { name, content_type, bytes })
}

/// MIME type of an avatar file: sniffed from its bytes, falling back to the
/// file extension.
fn content_type_for(path: &Path, bytes: &[u8]) -> String {
    match infer::get(bytes) {
        Some(kind) => kind.mime_type().to_owned(),
        None => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
