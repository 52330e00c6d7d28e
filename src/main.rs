//! `habitat` — command-line front end for the Habitat client SDK.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse args
//!   3. Load config, init logger at the configured level
//!   4. Build the client context from the session cookie
//!   5. Run one command and exit
//!
//! # Usage
//!
//! ```text
//! habitat [--config <path>] <command>
//!
//! Commands:
//!   whoami                         show session DID and default host
//!   resolve <did>                  resolve a DID to its PDS host
//!   notes [--private] [--repo <did>]
//!   note <text> [--public] [--rkey <k>]
//!   data <collection> [--private] [--repo <did>] [--limit n] [--cursor c] [key:value ...]
//!   lexicons                       list collections known to the data debugger
//! ```

use std::process;

use habitat_client::api::notes::{self, NoteRecord};
use habitat_client::config;
use habitat_client::context::ClientContext;
use habitat_client::debugger::{self, DebugQuery};
use habitat_client::did::Did;
use habitat_client::error::AppError;
use habitat_client::logger;
use habitat_client::sdk::{ListParams, ListRecordsResponse};
use tracing::debug;

// ── CLI arg parsing ────────────────────────────────────────────────────────

struct Args {
    config: Option<String>,
    command: Option<String>,
    rest: Vec<String>,
}

fn parse_args() -> Args {
    let mut config = None;
    let mut command = None;
    let mut rest = Vec::new();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" if command.is_none() => {
                config = iter.next();
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--" => {
                rest.extend(iter);
                break;
            }
            _ if command.is_none() => command = Some(arg),
            _ => rest.push(arg),
        }
    }

    Args { config, command, rest }
}

fn print_help() {
    eprintln!("usage: habitat [--config <path>] <command>");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  whoami                              show session DID and default host");
    eprintln!("  resolve <did>                       resolve a DID to its PDS host");
    eprintln!("  notes [--private] [--repo <did>]    list notes");
    eprintln!("  note <text> [--public] [--rkey <k>] create a note (private by default)");
    eprintln!("  data <collection> [--private] [--repo <did>] [--limit n] [--cursor c] [key:value ...]");
    eprintln!("                                      list records with optional filters");
    eprintln!("  lexicons                            list debugger collections");
    eprintln!();
    eprintln!("flags:");
    eprintln!("  --config, -c <path>   config file (default: config/default.toml)");
    eprintln!("  --help,   -h          print this help");
    eprintln!();
    eprintln!("env: HABITAT_HOST, HABITAT_COOKIE, HABITAT_LOG_LEVEL, RUST_LOG");
}

enum Command {
    Whoami,
    Resolve { did: Did },
    Notes { private: bool, repo: Option<Did> },
    Note { text: String, public: bool, rkey: Option<String> },
    Data { query: DebugQuery, filter_text: String },
    Lexicons,
}

fn build_command(cmd: &str, rest: &[String]) -> Result<Command, String> {
    let mut private = false;
    let mut public = false;
    let mut repo = None;
    let mut rkey = None;
    let mut limit = None;
    let mut cursor = None;
    let mut positional = Vec::new();

    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--private" => private = true,
            "--public" => public = true,
            "--repo" => {
                let v = iter.next().ok_or("--repo needs a DID")?;
                repo = Some(Did::parse(v).map_err(|e| e.to_string())?);
            }
            "--rkey" => rkey = Some(iter.next().ok_or("--rkey needs a value")?.clone()),
            "--limit" => {
                let v = iter.next().ok_or("--limit needs a number")?;
                limit = Some(v.parse::<u32>().map_err(|e| format!("--limit: {e}"))?);
            }
            "--cursor" => cursor = Some(iter.next().ok_or("--cursor needs a value")?.clone()),
            _ => positional.push(arg.clone()),
        }
    }

    match cmd {
        "whoami" => Ok(Command::Whoami),
        "lexicons" => Ok(Command::Lexicons),
        "resolve" => {
            let did = positional.first().ok_or("usage: habitat resolve <did>")?;
            Ok(Command::Resolve { did: Did::parse(did).map_err(|e| e.to_string())? })
        }
        "notes" => Ok(Command::Notes { private, repo }),
        "note" => {
            if positional.is_empty() {
                return Err("usage: habitat note <text> [--public] [--rkey <k>]".into());
            }
            Ok(Command::Note { text: positional.join(" "), public, rkey })
        }
        "data" => {
            let (collection, filters) =
                positional.split_first().ok_or("usage: habitat data <collection> [key:value ...]")?;
            Ok(Command::Data {
                query: DebugQuery {
                    collection: collection.clone(),
                    private,
                    repo,
                    params: ListParams::new(limit, cursor),
                },
                filter_text: filters.join(" "),
            })
        }
        other => Err(format!("unknown command: {other}\n  run 'habitat --help' for usage")),
    }
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_args();

    let cmd_str = match args.command {
        Some(ref c) => c.clone(),
        None => {
            eprintln!("error: no command given");
            eprintln!("  run 'habitat --help' for usage");
            process::exit(1);
        }
    };

    let cmd = match build_command(&cmd_str, &args.rest) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(args.config.as_deref(), cmd).await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run(config_path: Option<&str>, cmd: Command) -> Result<(), AppError> {
    let config = config::load(config_path)?;
    logger::init(&config.log_level)?;

    debug!(
        host = %config.client.default_host,
        resolver = ?config.resolver.kind,
        "config loaded"
    );

    if let Command::Lexicons = cmd {
        for lexicon in &config.debugger.lexicons {
            println!("{lexicon}");
        }
        return Ok(());
    }

    let ctx = ClientContext::init(&config);
    let client = ctx.client()?;

    match cmd {
        Command::Whoami => {
            println!("did   {}", client.did());
            println!("host  {}", client.default_agent().host());
        }
        Command::Resolve { did } => {
            let agent = client.agent_for_did(&did).await?;
            println!("{did} -> {}", agent.host());
        }
        Command::Notes { private, repo } => {
            let page = if private {
                notes::list_private_notes(client, repo.as_ref()).await?
            } else {
                notes::list_notes(client, repo.as_ref()).await?
            };
            print_notes(&page);
        }
        Command::Note { text, public, rkey } => {
            let created = if public {
                notes::create_note(client, &text).await?
            } else {
                notes::put_private_note(client, &text, rkey.as_deref()).await?
            };
            println!("ok  {}", created.uri);
            println!("    cid {}", created.cid);
        }
        Command::Data { query, filter_text } => {
            let filters = debugger::parse_filters(&filter_text);
            if !config.debugger.lexicons.iter().any(|l| l == &query.collection) {
                debug!(collection = %query.collection, "collection not in configured lexicons");
            }
            let view = debugger::run(client, &query, &filters).await?;
            println!("{}", view.summary());
            for record in &view.records {
                println!();
                println!("rkey  {}", record.rkey().unwrap_or("unknown"));
                println!("cid   {}", record.cid);
                println!("uri   {}", record.uri);
                let pretty = serde_json::to_string_pretty(&record.value)
                    .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
                println!("{pretty}");
            }
            if let Some(cursor) = &view.cursor {
                println!();
                println!("next page: --cursor {cursor}");
            }
        }
        Command::Lexicons => {}
    }

    Ok(())
}

fn print_notes(page: &ListRecordsResponse<NoteRecord>) {
    println!("{} note(s) found", page.records.len());
    for record in &page.records {
        let rkey: String = record.rkey().unwrap_or("unknown").chars().take(8).collect();
        let when = record.value.created_at.as_deref().unwrap_or("unknown date");
        println!();
        println!("{when}  {rkey}");
        println!("{}", record.value.note);
    }
}
