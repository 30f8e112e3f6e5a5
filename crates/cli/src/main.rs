//! SecureBank CLI - Drive the client session from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from the flag or $SECUREBANK_PASSWORD)
//! sb-cli login -u alice -p secret
//!
//! # Who is logged in, according to the backend?
//! sb-cli whoami
//!
//! # Would this page render?
//! sb-cli visit /admin
//!
//! # Authorized GET against the API
//! sb-cli get /accounts/my
//!
//! # Create an account (does not log in)
//! sb-cli register --name "Carol Doe" --username carol --email c@x.com \
//!     --password hunter22 --branch-code BR001
//!
//! sb-cli logout
//! ```
//!
//! # Environment Variables
//!
//! - `SECUREBANK_API_BASE_URL` - Backend base URL (default `http://localhost:8080/api`)
//! - `SECUREBANK_CREDENTIALS_PATH` - Where the session token is persisted
//! - `SECUREBANK_HTTP_TIMEOUT_SECS` - Per-request timeout
//! - `SECUREBANK_LOG_FORMAT` - `json` for JSON log lines
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - Error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use securebank_client::ClientConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "sb-cli")]
#[command(author, version, about = "SecureBank session tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session token
    Login {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long, env = "SECUREBANK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Page that sent you to the login screen
        #[arg(long)]
        from: Option<String>,
    },
    /// Forget the persisted session
    Logout,
    /// Create a new account
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        /// Username
        #[arg(long)]
        username: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(long, env = "SECUREBANK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Branch where the default account is opened
        #[arg(long)]
        branch_code: String,
    },
    /// Restore the persisted session and show who is logged in
    Whoami,
    /// Restore the session and show what a page visit would do
    Visit {
        /// Page path, e.g. `/dashboard`
        path: String,
    },
    /// Authorized GET against the API, printed as JSON
    Get {
        /// API path, e.g. `/accounts/my`
        path: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "securebank_client=info,securebank_cli=info".into());

    // Logs go to stderr; stdout carries command output.
    let json = std::env::var("SECUREBANK_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Sentry must be up before the tracing subscriber
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    init_tracing();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login {
            username,
            password,
            from,
        } => {
            let password = SecretString::from(password);
            commands::auth::login(config, &username, &password, from.as_deref()).await?;
        }
        Commands::Logout => commands::auth::logout(config)?,
        Commands::Register {
            name,
            username,
            email,
            password,
            phone,
            branch_code,
        } => {
            let registration = securebank_client::Registration {
                name,
                username,
                email,
                password: SecretString::from(password),
                phone,
                branch_code,
            };
            commands::auth::register(config, &registration).await?;
        }
        Commands::Whoami => commands::auth::whoami(config).await?,
        Commands::Visit { path } => commands::browse::visit(config, &path).await?,
        Commands::Get { path } => commands::browse::get(config, &path).await?,
    }
    Ok(())
}
