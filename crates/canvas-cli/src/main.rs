use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use canvas_core::{Canvas, CanvasError, ConnectEnd, Orchestrator, Settlement};
use canvas_llm::{Config, CredentialStore, FileCredentialStore, ProxyClient};

mod command;
mod measure;
mod render;

use command::{Command, HELP};
use measure::remeasure;
use render::{render_history, render_tree};

#[derive(Parser)]
#[command(name = "canvas-cli")]
#[command(about = "Branching conversations in the terminal")]
#[command(version)]
struct Cli {
    /// Proxy base URL (overrides config and CANVAS_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive canvas session (default)
    Chat,
    /// Validate and store an API key
    Login { api_key: String },
    /// Forget the stored API key
    Logout,
    /// Ask a single question from a fresh canvas
    Ask { message: String },
}

type Completion = (String, Result<Settlement, CanvasError>);

struct Session {
    orchestrator: Orchestrator,
    client: Arc<ProxyClient>,
    done_tx: mpsc::UnboundedSender<Completion>,
    in_flight: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.debug { "debug" } else { "warn" }),
    )
    .init();

    let mut config = Config::load();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    log::debug!("Using proxy at {}", config.api_url);

    let credentials: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::default());
    let client = Arc::new(ProxyClient::new(config, credentials));

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_interactive(client).await,
        Commands::Login { api_key } => login(&client, &api_key).await,
        Commands::Logout => {
            client.logout().await;
            println!("{}", "Logged out.".green());
            Ok(())
        }
        Commands::Ask { message } => ask_once(client, &message).await,
    }
}

async fn login(client: &ProxyClient, api_key: &str) -> anyhow::Result<()> {
    match client.login(api_key).await {
        Ok(()) => {
            println!("{}", "API key saved.".green());
            Ok(())
        }
        Err(e) => {
            println!("{}", e.to_string().red());
            anyhow::bail!("login failed")
        }
    }
}

async fn ask_once(client: Arc<ProxyClient>, message: &str) -> anyhow::Result<()> {
    let canvas = Arc::new(Mutex::new(Canvas::new()));
    let orchestrator = Orchestrator::new(canvas.clone(), client);

    let input_id = {
        let canvas = canvas.lock().await;
        canvas
            .graph()
            .leaves()
            .first()
            .map(|n| n.id.clone())
            .ok_or_else(|| anyhow::anyhow!("canvas has no input node"))?
    };

    orchestrator.submit(&input_id, message).await?;

    let canvas = canvas.lock().await;
    let reply = canvas
        .graph()
        .leaves()
        .first()
        .and_then(|n| n.as_message())
        .map(|m| m.content.clone())
        .unwrap_or_default();
    println!("{}", reply);
    Ok(())
}

async fn run_interactive(client: Arc<ProxyClient>) -> anyhow::Result<()> {
    let canvas = Arc::new(Mutex::new(Canvas::new()));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let mut session = Session {
        orchestrator: Orchestrator::new(canvas.clone(), client.clone()),
        client,
        done_tx,
        in_flight: 0,
    };

    if session.client.credentials().get().await.is_none() {
        println!("{}", "No API key stored. Use `login <api-key>` first.".yellow());
    }
    {
        let mut canvas = canvas.lock().await;
        remeasure(&mut canvas);
        println!("{}\n", render_tree(&canvas));
    }
    println!("{}", "Type `help` for commands.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => handle_command(&mut session, command).await,
                    Err(e) => println!("{}", e.red()),
                }
            }
            Some((input_id, result)) = done_rx.recv() => {
                session.in_flight = session.in_flight.saturating_sub(1);
                report_completion(&session, &input_id, result).await;
            }
        }
    }

    if session.in_flight > 0 {
        println!(
            "{}",
            format!("Leaving {} exchange(s) unfinished.", session.in_flight).dimmed()
        );
    }
    Ok(())
}

async fn report_completion(session: &Session, input_id: &str, result: Result<Settlement, CanvasError>) {
    let canvas = session.orchestrator.canvas();
    let mut canvas = canvas.lock().await;
    match result {
        Ok(Settlement::Completed) => println!("{}", format!("Reply received for {}.", input_id).green()),
        Ok(Settlement::Failed) => println!("{}", format!("Exchange from {} failed.", input_id).red()),
        Ok(Settlement::Discarded) => {
            println!("{}", format!("Reply for {} arrived after its branch was deleted.", input_id).dimmed())
        }
        Err(e) => println!("{}", e.to_string().red()),
    }
    let report = remeasure(&mut canvas);
    for id in &report.inserted {
        log::debug!("Follow-up input {} placed", id);
    }
    println!("{}", render_tree(&canvas));
}

fn spawn_exchange(session: &mut Session, input_id: String, text: Option<String>) {
    let orchestrator = session.orchestrator.clone();
    let tx = session.done_tx.clone();
    session.in_flight += 1;

    tokio::spawn(async move {
        let result = match text {
            Some(text) => orchestrator.submit(&input_id, &text).await,
            None => orchestrator.submit_draft(&input_id).await,
        };
        let _ = tx.send((input_id, result));
    });
}

async fn handle_command(session: &mut Session, command: Command) {
    let canvas = session.orchestrator.canvas();

    match command {
        Command::Help => println!("{}", HELP),
        Command::Tree => println!("{}", render_tree(&*canvas.lock().await)),
        Command::Dump => match serde_json::to_string_pretty(canvas.lock().await.graph()) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("{}", e.to_string().red()),
        },
        Command::Say { input_id, text } => spawn_exchange(session, input_id, Some(text)),
        Command::Send { input_id } => spawn_exchange(session, input_id, None),
        Command::Draft { input_id, text } => {
            let mut canvas = canvas.lock().await;
            match canvas.update_draft(&input_id, &text) {
                Ok(()) => {
                    remeasure(&mut canvas);
                }
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        Command::Branch {
            node_id,
            handle,
            at,
        } => {
            let mut canvas = canvas.lock().await;
            let gesture = ConnectEnd {
                from_node: node_id,
                from_handle: handle,
                is_valid: false,
                screen_position: at,
            };
            match canvas.connect_end(&gesture) {
                Ok(Some(input_id)) => {
                    remeasure(&mut canvas);
                    println!("{}", format!("Branch input {} created.", input_id).green());
                    println!("{}", render_tree(&canvas));
                }
                Ok(None) => {}
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        Command::View(viewport) => canvas.lock().await.set_viewport(viewport),
        Command::History { node_id } => {
            let history = canvas.lock().await.history(&node_id);
            if history.is_empty() {
                println!("{}", format!("No messages above {}.", node_id).dimmed());
            } else {
                println!("{}", render_history(&history));
            }
        }
        Command::State { node_id } => match canvas.lock().await.exchange_state(&node_id) {
            Some(state) => println!("{:?}", state),
            None => println!("{}", format!("{} has no exchange.", node_id).dimmed()),
        },
        Command::Delete { ids } => {
            let mut canvas = canvas.lock().await;
            let removed = canvas.delete_nodes(&ids);
            if removed.is_empty() {
                println!("{}", "Nothing to delete.".dimmed());
            } else {
                println!("{}", format!("Removed {}.", removed.join(", ")).yellow());
                println!("{}", render_tree(&canvas));
            }
        }
        Command::Login { api_key } => {
            if login(&session.client, &api_key).await.is_ok() {
                log::info!("Logged in");
            }
        }
        Command::Logout => {
            session.client.logout().await;
            let mut canvas = canvas.lock().await;
            canvas.reset();
            remeasure(&mut canvas);
            println!("{}", "Logged out; canvas cleared.".green());
            println!("{}", render_tree(&canvas));
        }
        Command::Quit => {}
    }
}
