use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OptionKind {
    Mailboxes,
    Users,
}

#[derive(Debug, Parser)]
#[command(name = "helpscout", version, about = "Help Scout Mailbox API connector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output structured JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Debug, Args)]
struct ConnectionArgs {
    /// OAuth2 application id
    #[arg(long, global = true, env = "HELPSCOUT_APP_ID")]
    app_id: Option<String>,
    /// OAuth2 application secret
    #[arg(long, global = true, env = "HELPSCOUT_APP_SECRET", hide_env_values = true)]
    app_secret: Option<String>,
    /// Static API key (Basic auth), used when no OAuth2 app is configured
    #[arg(long, global = true, env = "HELPSCOUT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, global = true, env = "HELPSCOUT_API_BASE")]
    api_base: Option<String>,
    #[arg(long, global = true, env = "HELPSCOUT_TOKEN_URL")]
    token_url: Option<String>,
    /// Abort collection fetches after this many pages
    #[arg(long, global = true, env = "HELPSCOUT_MAX_PAGES")]
    max_pages: Option<usize>,
    /// Webhook registration state file
    #[arg(long, global = true, env = "HELPSCOUT_STATE_PATH")]
    state_path: Option<PathBuf>,
    /// Reject deliveries that cannot be signature-verified
    #[arg(long, global = true, default_value_t = false)]
    strict_signatures: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one operation over one or more parameter items
    Exec(ExecArgs),
    /// List dropdown options
    Options { kind: OptionKind },
    /// Manage the receiver webhook
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },
    /// Run the JSON-RPC tool bridge over stdio
    Serve,
}

#[derive(Debug, Args)]
struct ExecArgs {
    resource: String,
    operation: String,
    /// Parameters as a JSON object, or an array of objects for several items
    #[arg(long, conflicts_with = "params_file")]
    params: Option<String>,
    #[arg(long)]
    params_file: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    continue_on_fail: bool,
}

#[derive(Debug, Subcommand)]
enum WebhookCommands {
    /// Check whether the webhook for a callback URL is registered
    Check { callback_url: String },
    /// Register a webhook for a callback URL
    Create {
        callback_url: String,
        /// Event name; repeat or comma-separate
        #[arg(long = "event", required = true, value_delimiter = ',')]
        events: Vec<String>,
        #[arg(long)]
        payload_version: Option<String>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        secret: Option<String>,
    },
    /// Delete the registered webhook and forget its secret
    Delete,
    /// Verify and normalize a delivery body read from a file or stdin
    Receive {
        #[arg(long)]
        body_file: Option<PathBuf>,
        #[arg(long)]
        signature: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::dispatch(cli).await
}

mod commands {
    use std::sync::Arc;

    use anyhow::{anyhow, Context, Result};
    use serde_json::{json, Value};
    use tokio::io::AsyncReadExt;

    use helpscout_connector::models::Credentials;
    use helpscout_connector::output::{self, OutputFormat};
    use helpscout_connector::webhook::{
        JsonFileStateStore, VerificationPolicy, WebhookOptions,
    };
    use helpscout_connector::{mcp, ClientConfig, Connector};

    use super::{Cli, Commands, ConnectionArgs, ExecArgs, OptionKind, WebhookCommands};

    pub async fn dispatch(cli: Cli) -> Result<()> {
        let format = OutputFormat::from_json_flag(cli.json);
        let connector = build_connector(&cli.connection)?;

        match cli.command {
            Commands::Exec(args) => handle_exec(&connector, args, format).await,
            Commands::Options { kind } => handle_options(&connector, kind, format).await,
            Commands::Webhook { command } => handle_webhook(&connector, command, format).await,
            Commands::Serve => {
                connector.emit_startup_notice();
                mcp::run_stdio_server(&connector).await
            }
        }
    }

    fn build_connector(args: &ConnectionArgs) -> Result<Connector> {
        let credentials = resolve_credentials(args)?;

        let mut config = ClientConfig::default().with_max_pages(args.max_pages);
        if let Some(base) = &args.api_base {
            config = config.with_base_url(base.clone());
        }
        if let Some(token_url) = &args.token_url {
            config = config.with_token_url(token_url.clone());
        }

        let state_path = match &args.state_path {
            Some(path) => path.clone(),
            None => JsonFileStateStore::default_path().context("resolve webhook state path")?,
        };
        let policy = if args.strict_signatures {
            VerificationPolicy::Strict
        } else {
            VerificationPolicy::FailOpen
        };

        let connector = Connector::new(
            config,
            Arc::new(credentials),
            Arc::new(JsonFileStateStore::new(state_path)),
        )
        .context("build help scout client")?;
        Ok(connector.with_verification_policy(policy))
    }

    fn resolve_credentials(args: &ConnectionArgs) -> Result<Credentials> {
        match (&args.app_id, &args.app_secret, &args.api_key) {
            (Some(app_id), Some(app_secret), _) => Ok(Credentials::oauth2(app_id, app_secret)),
            (None, None, Some(api_key)) => Ok(Credentials::api_key(api_key)),
            (Some(_), None, _) | (None, Some(_), _) => Err(anyhow!(
                "OAuth2 needs both --app-id and --app-secret"
            )),
            (None, None, None) => Err(anyhow!(
                "no credentials: set HELPSCOUT_APP_ID/HELPSCOUT_APP_SECRET or HELPSCOUT_API_KEY"
            )),
        }
    }

    async fn handle_exec(
        connector: &Connector,
        args: ExecArgs,
        format: OutputFormat,
    ) -> Result<()> {
        let raw = match (&args.params, &args.params_file) {
            (Some(raw), _) => raw.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("read params file {}", path.display()))?,
            (None, None) => "{}".to_string(),
        };
        let parsed: Value = serde_json::from_str(&raw).context("parse params JSON")?;
        let items = match parsed {
            Value::Array(items) => items,
            other => vec![other],
        };

        let records = connector
            .execute(&args.resource, &args.operation, &items, args.continue_on_fail)
            .await
            .with_context(|| format!("{} {}", args.resource, args.operation))?;
        println!("{}", output::format_records(format, &records)?);
        Ok(())
    }

    async fn handle_options(
        connector: &Connector,
        kind: OptionKind,
        format: OutputFormat,
    ) -> Result<()> {
        let options = match kind {
            OptionKind::Mailboxes => connector.mailbox_options().await,
            OptionKind::Users => connector.user_options().await,
        }
        .context("load options")?;
        println!("{}", output::format_options(format, &options)?);
        Ok(())
    }

    async fn handle_webhook(
        connector: &Connector,
        command: WebhookCommands,
        format: OutputFormat,
    ) -> Result<()> {
        let lifecycle = connector.webhooks();
        let summary = match command {
            WebhookCommands::Check { callback_url } => {
                json!({ "exists": lifecycle.check_exists(&callback_url).await? })
            }
            WebhookCommands::Create {
                callback_url,
                events,
                payload_version,
                label,
                secret,
            } => {
                let options = WebhookOptions {
                    payload_version,
                    label,
                    secret,
                };
                let registration = lifecycle
                    .create(&callback_url, &events, options)
                    .await
                    .context("create webhook")?;
                json!({
                    "webhookId": registration.webhook_id,
                    "targetUrl": registration.target_url,
                    "events": registration.events,
                    "payloadVersion": registration.payload_version,
                })
            }
            WebhookCommands::Delete => json!({ "deleted": lifecycle.delete().await? }),
            WebhookCommands::Receive {
                body_file,
                signature,
            } => {
                let body = match body_file {
                    Some(path) => tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("read delivery body {}", path.display()))?,
                    None => {
                        let mut body = Vec::new();
                        tokio::io::stdin()
                            .read_to_end(&mut body)
                            .await
                            .context("read delivery body from stdin")?;
                        body
                    }
                };
                let records = lifecycle.receive(&body, signature.as_deref())?;
                println!("{}", output::format_records(format, &records)?);
                return Ok(());
            }
        };

        println!("{}", output::format_value(format, &summary)?);
        Ok(())
    }
}
