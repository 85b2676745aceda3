use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hirestream::args::CommonArgs;
use hirestream::config::Config;
use hirestream::logging::{self, LogConfig};
use hirestream::streaming::{Delivery, FallbackController};
use hirestream::theme as t;
use hirestream::types::{ChatRequest, WorkflowStep};
use hirestream::{ChatSession, HttpTransport};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(
    name = "hirestream",
    version,
    about = "Talk to the recruiting assistant over its streaming chat API"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
        /// Continue an existing session
        #[arg(long, value_name = "ID")]
        session: Option<String>,
        /// Print the final result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive conversation (`/new` starts over, `/quit` exits)
    Chat {
        /// Continue an existing session
        #[arg(long, value_name = "ID")]
        session: Option<String>,
    },
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env();
    logging::init(if cli.common.verbose {
        log_config.verbose()
    } else {
        log_config
    });
    t::init_color(cli.common.no_color);

    let mut config = Config::load(cli.common.config.clone())?;
    cli.common.apply_overrides(&mut config);

    if let Commands::Init { force } = cli.command {
        let path = cli.common.config.clone().unwrap_or_else(Config::default_path);
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        config.save(Some(path.clone()))?;
        println!("{}", t::success(&format!("Wrote {}", path.display())));
        return Ok(());
    }

    let transport =
        Arc::new(HttpTransport::from_config(&config).context("Failed to set up HTTP transport")?);
    let client = FallbackController::new(transport).with_streaming(config.streaming);
    tracing::debug!(
        api_url = %config.api_url,
        streaming = client.streaming_enabled(),
        "client ready"
    );

    match cli.command {
        Commands::Send {
            message,
            session,
            json,
        } => send_once(&client, &config, message, session, json).await,
        Commands::Chat { session } => repl(client, &config, session).await,
        Commands::Init { .. } => Ok(()),
    }
}

fn print_token(token: &str) {
    print!("{}", token);
    let _ = std::io::stdout().flush();
}

fn print_step(step: &WorkflowStep) {
    let line = format!(
        "[{:>3.0}%] {} ({:?})",
        step.progress() * 100.0,
        step.label,
        step.status
    );
    if step.is_final() {
        eprintln!("{}", t::success(&line));
    } else {
        eprintln!("{}", t::muted(&line));
    }
}

async fn send_once(
    client: &FallbackController<HttpTransport>,
    config: &Config,
    message: String,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let request = ChatRequest::new(message, session).with_encouragement(config.encouragement_mode);

    let mut streamed = String::new();
    let outcome = client
        .send_detailed(
            &request,
            |token| {
                streamed.push_str(token);
                if !json {
                    print_token(token);
                }
            },
            |step| {
                if !json {
                    print_step(step);
                }
            },
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
        return Ok(());
    }

    if !streamed.is_empty() {
        println!();
    }
    if let Delivery::Fallback(reason) = outcome.via {
        eprintln!("{}", t::warn(&format!("(streaming failed: {}; used /chat)", reason)));
    }
    // The final reply is authoritative; tokens are only a preview.
    if streamed != outcome.result.reply {
        println!("{}", outcome.result.reply);
    }
    if let Some(suggestions) = &outcome.result.suggestions {
        for suggestion in suggestions {
            println!("  {} {}", t::accent("›"), suggestion);
        }
    }
    if let Some(id) = &outcome.result.session_id {
        eprintln!("{}", t::muted(&format!("session: {}", id)));
    }
    Ok(())
}

async fn repl(
    client: FallbackController<HttpTransport>,
    config: &Config,
    session_id: Option<String>,
) -> Result<()> {
    let mut session = ChatSession::new(client).with_encouragement(config.encouragement_mode);
    if let Some(id) = session_id {
        session.resume(id);
    }

    println!("{}", t::accent("hirestream chat"));
    println!("{}", t::muted("Type a message. /new starts over, /quit exits."));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", t::accent(">"));
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                session.new_conversation();
                println!("{}", t::success("Started a new conversation."));
                continue;
            }
            _ => {}
        }

        let mut streamed = String::new();
        let sent = session
            .send_user_message_with(
                line,
                |token| {
                    streamed.push_str(token);
                    print_token(token);
                },
                print_step,
            )
            .await;
        if !streamed.is_empty() {
            println!();
        }

        match sent {
            Ok(entry) => {
                if entry.content != streamed {
                    println!("{}", entry.content);
                }
                for suggestion in &entry.suggestions {
                    println!("  {} {}", t::accent("›"), suggestion);
                }
            }
            Err(e) => {
                let message = session
                    .transcript()
                    .last()
                    .map(|entry| entry.content.clone())
                    .unwrap_or_default();
                eprintln!("{} {}", t::error(&message), t::muted(&format!("({})", e)));
            }
        }
    }

    if let Some(id) = session.active_session_id() {
        println!("{}", t::muted(&format!("session: {}", id)));
    }
    Ok(())
}
