//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod ask;
pub mod auth;
pub mod conversations;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::core::backend::proxy::ProxyClient;
use crate::core::backend::{Backend, VendorBackend};
use crate::core::builtin_backends::{find_builtin_backend, load_builtin_backends};
use crate::core::config::Config;
use crate::core::credentials::SystemCredentials;
use crate::core::notice::StderrNotifier;
use crate::core::session::ChatSession;
use crate::core::store::storage::FileStorage;
use crate::core::store::ConversationStore;
use crate::server::{self, AppState};
use crate::utils::logging::{self, LogProfile};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ")"
);

#[derive(Parser)]
#[command(name = "duochat")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Ask DeepSeek or Groq from the terminal, with markdown and math rendering")]
#[command(
    long_about = "duochat forwards questions to DeepSeek or Groq and renders the markdown \
answers (code blocks, lists, links and LaTeX math) in the terminal or as HTML. \
Every exchange is kept in a local conversation store.\n\n\
Authentication:\n\
  Use 'duochat auth <backend>' to store an API key in your system keyring.\n\n\
Environment Variables (checked before the keyring):\n\
  DEEPSEEK_API_KEY  Your DeepSeek API key\n\
  GROQ_API_KEY      Your Groq API key\n\
  DUOCHAT_LOG       Log filter, same syntax as RUST_LOG\n\n\
Proxy:\n\
  'duochat serve' exposes POST /api/deepseek and POST /api/groq; point\n\
  'duochat ask --server <url>' at it to ask through the proxy."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write logs to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Directory holding the conversation store
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP proxy in front of both backends
    Serve {
        /// Listen address (overrides the configured bind address)
        #[arg(short = 'b', long, value_name = "ADDR")]
        bind: Option<String>,
        /// Only read API keys from environment variables, never the keyring
        #[arg(long)]
        env_only: bool,
    },
    /// Ask a question in the current conversation
    Ask {
        /// The question (several words are joined with spaces)
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
        /// Backend to ask (deepseek or groq)
        #[arg(short = 'b', long)]
        backend: Option<String>,
        /// Ask through a running proxy instead of calling the vendor directly
        #[arg(short = 's', long, value_name = "URL")]
        server: Option<String>,
        /// Start a new conversation first
        #[arg(short = 'n', long)]
        new: bool,
        /// Read the answer aloud
        #[arg(long)]
        speak: bool,
        /// Print the answer at once instead of typing it out
        #[arg(long)]
        no_animate: bool,
        #[command(flatten)]
        output: ask::OutputArgs,
    },
    /// Start a new conversation and make it current
    New,
    /// List conversations, newest first
    List {
        /// Only show conversations whose title, questions or answers match
        #[arg(short = 's', long)]
        search: Option<String>,
    },
    /// Show every exchange of a conversation (the current one by default)
    Show {
        id: Option<String>,
        /// Read the latest answer aloud
        #[arg(long)]
        speak: bool,
        #[command(flatten)]
        output: ask::OutputArgs,
    },
    /// Make a conversation current
    Switch { id: String },
    /// Rename a conversation
    Rename {
        id: String,
        #[arg(trailing_var_arg = true, required = true)]
        title: Vec<String>,
    },
    /// Export a conversation as conversation-<id>.txt
    Export {
        id: Option<String>,
        /// Directory to write into
        #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },
    /// Set configuration values, or show them all when no key is given
    Set {
        /// Key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Option<Vec<String>>,
    },
    /// Unset configuration values
    Unset {
        /// Key to unset
        key: String,
    },
    /// Store an API key in the system keyring
    Auth {
        /// Backend to authenticate; lists key status when omitted
        backend: Option<String>,
    },
    /// Remove a stored API key
    Deauth { backend: String },
}

/// Paths and configuration shared by every command.
pub struct Context {
    pub config_path: PathBuf,
    pub config: Config,
    pub data_dir: PathBuf,
}

impl Context {
    pub fn load(args: &Args) -> Result<Self, Box<dyn Error>> {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => Config::default_config_path()?,
        };
        let config = Config::load_from_path(&config_path)?;
        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => config.resolve_data_dir()?,
        };
        debug!(config = %config_path.display(), data = %data_dir.display(), "paths resolved");
        Ok(Self {
            config_path,
            config,
            data_dir,
        })
    }

    pub fn open_store(&self) -> Result<ConversationStore, Box<dyn Error>> {
        let storage = FileStorage::new(&self.data_dir);
        Ok(ConversationStore::load(Box::new(storage))?)
    }

    /// The backend `ask` talks to: the proxy when `server` is set, else the
    /// vendor directly.
    pub fn backend(
        &self,
        backend_id: Option<&str>,
        server: Option<&str>,
    ) -> Result<Arc<dyn Backend>, Box<dyn Error>> {
        let backend_id = backend_id.unwrap_or(self.config.default_backend());
        let Some(meta) = find_builtin_backend(backend_id) else {
            let known: Vec<String> = load_builtin_backends().into_iter().map(|b| b.id).collect();
            return Err(format!(
                "Unknown backend '{backend_id}' (expected one of: {})",
                known.join(", ")
            )
            .into());
        };
        let http = reqwest::Client::new();
        if let Some(url) = server {
            return Ok(Arc::new(ProxyClient::new(http, url, &meta.id)));
        }
        let base_url = self.config.base_url_for(&meta.id).map(str::to_string);
        let mut backend = VendorBackend::new(meta, http, Arc::new(SystemCredentials::default()));
        if let Some(url) = base_url {
            backend = backend.with_base_url(url);
        }
        Ok(Arc::new(backend))
    }

    pub fn session(
        &self,
        backend_id: Option<&str>,
        server: Option<&str>,
    ) -> Result<ChatSession, Box<dyn Error>> {
        let store = self.open_store()?;
        let backend = self.backend(backend_id, server)?;
        Ok(ChatSession::new(store, backend, Arc::new(StderrNotifier))
            .with_retry_policy(self.config.retry_policy()))
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let profile = match args.command {
        Some(Commands::Serve { .. }) => LogProfile::Server,
        _ => LogProfile::Client,
    };
    logging::init(profile, args.log.as_deref())?;
    let mut ctx = Context::load(&args)?;

    match args.command {
        Some(Commands::Serve { bind, env_only }) => {
            if let Some(bind) = bind {
                ctx.config.bind = Some(bind);
            }
            let state = AppState::from_config(
                &ctx.config,
                reqwest::Client::new(),
                Arc::new(SystemCredentials::new(env_only)),
            );
            server::serve(&ctx.config, state).await
        }
        Some(Commands::Ask {
            question,
            backend,
            server,
            new,
            speak,
            no_animate,
            output,
        }) => {
            let request = ask::AskOptions {
                question: question.join(" "),
                backend,
                server,
                new,
                speak,
                animate: !no_animate,
                output,
            };
            ask::run_ask(&ctx, request).await
        }
        Some(Commands::New) => conversations::new_conversation(&ctx),
        Some(Commands::List { search }) => conversations::list(&ctx, search.as_deref()),
        Some(Commands::Show { id, speak, output }) => {
            conversations::show(&ctx, id.as_deref(), speak, &output).await
        }
        Some(Commands::Switch { id }) => conversations::switch(&ctx, &id),
        Some(Commands::Rename { id, title }) => conversations::rename(&ctx, &id, &title.join(" ")),
        Some(Commands::Export { id, output }) => conversations::export(&ctx, id.as_deref(), &output),
        Some(Commands::Set { key, value }) => {
            let value = value.map(|parts| parts.join(" "));
            settings::set(&mut ctx, key.as_deref(), value.as_deref())
        }
        Some(Commands::Unset { key }) => settings::unset(&mut ctx, &key),
        Some(Commands::Auth { backend }) => auth::auth(backend.as_deref()),
        Some(Commands::Deauth { backend }) => auth::deauth(&backend),
        None => conversations::list(&ctx, None),
    }
}
