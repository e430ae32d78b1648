use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use redsol::api::ApiClient;
use redsol::config::RedsolConfig;
use redsol::console::{Console, ConsoleError};
use redsol::error::FailureReason;
use redsol::logging::{init_logging, LoggingConfig};
use redsol::notification::{Notice, NotificationRenderer, Notifier};
use redsol::request::{AttemptObserver, HttpTransport, RequestAttempt, RequestExecutor};
use redsol::session::SessionStore;
use redsol::ui::{color_allowed, ConsoleView, Theme};
use redsol::validation::{validate, FieldRecord, RecordKind};

#[derive(Parser, Debug)]
#[command(name = "redsol")]
#[command(version)]
#[command(about = "Terminal console for the Red Soluciones ISP backend")]
struct Cli {
    /// Configuration file (defaults to ./redsol.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend API base URL; the v2 API is expected under <URL>/v2
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Deadline for a single request attempt, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Attempts per request (at least 1)
    #[arg(long, global = true, value_name = "N")]
    max_retries: Option<u32>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, global = true, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Disable colors (also respects NO_COLOR environment variable)
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Fields of a client or prospect record.
#[derive(Args, Debug)]
struct RecordArgs {
    /// Full name
    #[arg(long)]
    name: String,

    /// Phone number (10 to 15 digits or separators)
    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// Service zone (Norte, Sur, Centro, Este, Oeste)
    #[arg(long)]
    zone: Option<String>,

    /// Monthly payment
    #[arg(long)]
    payment: Option<String>,
}

impl From<RecordArgs> for FieldRecord {
    fn from(args: RecordArgs) -> Self {
        FieldRecord {
            name: args.name,
            phone: args.phone,
            email: args.email,
            zone: args.zone,
            payment: args.payment,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List owners who can log in
    Users,
    /// Log in as an owner and remember the session
    Login {
        /// Owner name, e.g. carlos
        owner: String,
    },
    /// End the current session
    Logout,
    /// Show the logged-in owner
    Whoami,
    /// Show the dashboard (per-owner when logged in)
    Dashboard,
    /// Ask the business agent a question
    Chat {
        #[arg(required_unless_present = "action", conflicts_with = "action", num_args = 1..)]
        message: Vec<String>,

        /// Run a quick action offered by the agent, e.g. get_stats
        #[arg(long, value_name = "ID")]
        action: Option<String>,
    },
    /// List clients
    Clients {
        /// Only clients matching this term
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Validate and create a client
    AddClient(RecordArgs),
    /// List prospects
    Prospects,
    /// Show backend system status
    Status,
    /// Show business insights for the logged-in owner
    Insights,
    /// Ask the backend to refresh its data and reload everything
    Refresh,
    /// Write dashboard, insights and status to a JSON file
    Export {
        /// Output file
        path: PathBuf,
    },
    /// Validate a record without contacting the backend
    Validate {
        /// Record kind: client or prospect
        #[arg(long, default_value = "client")]
        kind: RecordKind,

        #[command(flatten)]
        record: RecordArgs,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Prints a status line for every scheduled retry.
struct RetryPrinter {
    renderer: NotificationRenderer,
}

impl AttemptObserver for RetryPrinter {
    fn on_retry(
        &self,
        _target: &str,
        attempt: &RequestAttempt,
        delay: Duration,
        failure: &FailureReason,
    ) {
        eprintln!(
            "{}",
            self.renderer.render_retry(
                attempt.attempt_number,
                attempt.max_attempts,
                delay,
                failure
            )
        );
    }
}

/// Exit codes
mod exit_codes {
    use std::process::ExitCode;

    pub fn ok() -> ExitCode {
        ExitCode::SUCCESS
    }

    /// Any failed action or invalid input
    pub fn failed() -> ExitCode {
        ExitCode::from(1)
    }
}

fn load_config(cli: &Cli) -> Result<RedsolConfig, redsol::config::ConfigError> {
    let mut config = RedsolConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        let base_url = base_url.trim_end_matches('/');
        config.api.base_url = base_url.to_string();
        config.api.v2_base_url = format!("{}/v2", base_url);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.api.timeout_ms = timeout_ms;
    }
    if let Some(max_retries) = cli.max_retries {
        config.api.max_retries = max_retries;
    }
    config.validate()?;
    Ok(config)
}

fn build_console(
    config: &RedsolConfig,
    renderer: &NotificationRenderer,
    quiet: bool,
) -> Result<Console, Box<dyn std::error::Error>> {
    let transport = Arc::new(HttpTransport::new()?);
    let mut executor = RequestExecutor::new(transport).with_policy(config.api.retry_policy());
    if !quiet {
        executor = executor.with_observer(Arc::new(RetryPrinter {
            renderer: renderer.clone(),
        }));
    }
    let api = ApiClient::with_executor(&config.api, executor)?;

    let sessions = match &config.session.path {
        Some(path) => SessionStore::new(path),
        None => SessionStore::default_location()?,
    };
    let notifier = Notifier::with_durations(
        Duration::from_secs(config.notices.error_display_secs),
        Duration::from_secs(config.notices.success_display_secs),
    );
    Ok(Console::new(api, sessions, notifier))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let use_color = !cli.no_color && color_allowed();

    init_logging(LoggingConfig::from_flags(cli.verbose, cli.quiet).with_ansi(use_color));

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return exit_codes::failed();
        }
    };

    let use_color = use_color && config.ui.color;
    let theme = Theme::default();
    let view = ConsoleView::new(theme)
        .with_width(config.ui.width)
        .with_color(use_color);
    let renderer = NotificationRenderer::new(theme)
        .with_width(config.ui.width)
        .with_color(use_color);

    // Offline commands
    match cli.command {
        Commands::Config => {
            return match config.to_toml() {
                Ok(rendered) => {
                    print!("{}", rendered);
                    exit_codes::ok()
                }
                Err(e) => {
                    eprintln!("error: {}", e);
                    exit_codes::failed()
                }
            };
        }
        Commands::Validate { kind, record } => {
            let result = validate(&record.into(), kind);
            print!("{}", view.render_validation(&result));
            return if result.is_valid {
                exit_codes::ok()
            } else {
                exit_codes::failed()
            };
        }
        _ => {}
    }

    let console = match build_console(&config, &renderer, cli.quiet) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("error: {}", e);
            return exit_codes::failed();
        }
    };
    if let Err(e) = console.restore_session() {
        tracing::warn!(error = %e, "Ignoring unreadable session file");
    }

    // Print notices as they are shown, so ones that expire mid-command
    // still reach the user.
    let show = |notice: &Notice| {
        if !cli.quiet || notice.is_error() {
            eprintln!("{}", renderer.render(notice));
        }
    };
    let mut notices = console.notifier().log();
    let command = run_command(cli.command, &console, &view);
    tokio::pin!(command);
    let outcome = loop {
        tokio::select! {
            outcome = &mut command => break outcome,
            Some(notice) = notices.next_shown() => show(&notice),
        }
    };
    for notice in notices.drain() {
        show(&notice);
    }

    match outcome {
        Ok(code) => code,
        Err(e) => {
            match e {
                // Already shown as a notice
                ConsoleError::Action(_) | ConsoleError::Invalid(_) => {}
                other => eprintln!("error: {}", other),
            }
            exit_codes::failed()
        }
    }
}

async fn run_command(
    command: Commands,
    console: &Console,
    view: &ConsoleView,
) -> Result<ExitCode, ConsoleError> {
    match command {
        Commands::Users => {
            let owners = console.owners().await?;
            print!("{}", view.render_owners(&owners));
        }
        Commands::Login { owner } => {
            let session = console.login(&owner).await?;
            print!("{}", view.render_whoami(&session.user, &session.session_id));
        }
        Commands::Logout => console.logout().await?,
        Commands::Whoami => match (console.state().user(), console.state().session_id()) {
            (Some(user), Some(session_id)) => print!("{}", view.render_whoami(&user, &session_id)),
            _ => return Err(ConsoleError::NotLoggedIn),
        },
        Commands::Dashboard => match console.state().current_user() {
            Some(user) => {
                let dashboard = console.load_user_dashboard().await?;
                print!("{}", view.render_user_dashboard(&user, &dashboard));
            }
            None => {
                let summary = console.load_dashboard().await?;
                print!("{}", view.render_summary(&summary));
            }
        },
        Commands::Chat { message, action } => {
            let outcome = match action {
                Some(id) => console.run_quick_action(&id).await,
                None => console.send_chat(&message.join(" ")).await,
            };
            if let Some(outcome) = outcome {
                print!(
                    "{}",
                    view.render_chat_reply(
                        &outcome.reply,
                        &outcome.suggestions,
                        &outcome.quick_actions
                    )
                );
                if outcome.error.is_some() {
                    return Ok(exit_codes::failed());
                }
            }
        }
        Commands::Clients { search } => {
            let clients = match search {
                Some(term) => console.search_clients(&term).await?,
                None => console.list_clients().await?,
            };
            print!("{}", view.render_clients(&clients));
        }
        Commands::AddClient(record) => {
            console.create_client(&record.into()).await?;
        }
        Commands::Prospects => {
            let prospects = console.list_prospects().await?;
            print!("{}", view.render_prospects(&prospects));
        }
        Commands::Status => {
            let status = console.load_system_status().await?;
            print!("{}", view.render_system_status(&status));
        }
        Commands::Insights => {
            let insights = console.load_insights().await?;
            print!("{}", view.render_insights(&insights));
        }
        Commands::Refresh => {
            let summary = console.refresh().await?;
            println!("Reloaded: {}", summary.reloaded.join(", "));
            if !summary.is_complete() {
                return Ok(exit_codes::failed());
            }
        }
        Commands::Export { path } => {
            console.export(&path).await?;
            println!("Report written to {}", path.display());
        }
        Commands::Validate { .. } | Commands::Config => {}
    }
    Ok(exit_codes::ok())
}
