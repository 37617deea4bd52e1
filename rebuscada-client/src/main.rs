use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use rebuscada_client::command::{Command, HELP};
use rebuscada_client::terminal::{
    LinePrompt, TerminalRenderer, next_line, render_games, render_ranking, render_session,
    render_standings, spawn_stdin_reader,
};
use rebuscada_client::{
    ClientError, Config, GameClient, HttpGameApi, Location, ResolveError, WsPushConnector,
};
use rebuscada_core::{COMPETITION_PARAM, GAME_PARAM, WORD_PARAM, encode_custom_word};
use rebuscada_persistence::connection::connect_and_migrate;
use rebuscada_persistence::{
    KeyValueStore, MemoryStore, SessionRepository, SqliteStore, StorageKeys,
};

#[derive(Parser)]
#[command(name = "rebuscada", version, about = "Play Rebuscada from the terminal")]
struct Cli {
    /// Page address to start from; its query chooses the puzzle
    #[arg(long)]
    url: Option<String>,
    /// Display name used in competitions
    #[arg(long)]
    name: Option<String>,
    /// Keep saved games in memory instead of the database
    #[arg(long)]
    memory: bool,
    /// Published game number, in Roman numerals
    #[arg(long)]
    joc: Option<String>,
    /// Competition to join or resume
    #[arg(long)]
    comp: Option<String>,
    /// Play a custom word
    #[arg(long)]
    word: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::new();
    info!("Starting Rebuscada client against {}", config.api_url);

    let mut location = Location::parse(cli.url.as_deref().unwrap_or(&config.page_url))
        .context("Invalid page URL")?;
    if let Some(word) = cli.word.as_deref() {
        location.set_param(WORD_PARAM, &encode_custom_word(word));
    }
    if let Some(joc) = cli.joc.as_deref() {
        location.set_param(GAME_PARAM, joc);
    }
    if let Some(comp) = cli.comp.as_deref() {
        location.set_param(COMPETITION_PARAM, comp);
    }

    let store: Arc<dyn KeyValueStore> = if cli.memory {
        Arc::new(MemoryStore::new())
    } else {
        let db = connect_and_migrate(&config.database_url)
            .await
            .context("Failed to open the storage database")?;
        let store = SqliteStore::new(db);
        store.watch(config.storage_poll_interval());
        Arc::new(store)
    };
    let repository = SessionRepository::new(store, StorageKeys::new(&config.storage_namespace));
    let mut storage_changes = repository.subscribe();

    let api_url = Url::parse(&config.api_url).context("Invalid REBUSCADA_API_URL")?;
    let ws_url = Url::parse(&config.ws_url).context("Invalid REBUSCADA_WS_URL")?;
    let api = Arc::new(HttpGameApi::new(api_url, config.request_timeout())?);
    let push = Arc::new(WsPushConnector::new(ws_url));

    let lines = spawn_stdin_reader();
    let confirm = Arc::new(LinePrompt::new(lines.clone()));

    let mut client = GameClient::new(api, push, confirm, repository, location)
        .with_player_name(cli.name.or(config.player_name.clone()));
    client.add_event_handler(Box::new(TerminalRenderer));

    let started = client.start().await;
    recover_from_start(&mut client, started).await;
    println!("{}", HELP);

    loop {
        tokio::select! {
            line = next_line(&lines) => {
                let Some(line) = line else { break };
                match Command::parse(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => run_command(&mut client, command).await,
                    None => {}
                }
            }
            Some(change) = storage_changes.recv() => client.handle_storage_change(change).await,
            Some(push) = client.next_push() => client.apply_push(push),
            _ = signal::ctrl_c() => break,
        }
    }

    info!("Bye");
    Ok(())
}

/// Report a failed start and fall back to something playable
async fn recover_from_start(
    client: &mut GameClient,
    started: Result<rebuscada_core::SessionPhase, ClientError>,
) {
    let err = match started {
        Ok(_) => {
            print_session(client);
            return;
        }
        Err(err) => err,
    };

    match err {
        ClientError::NameRequired(Some(competition_id)) => {
            println!(
                "Per entrar a la competició {} escriu: /uneix {} <nom>",
                competition_id, competition_id
            );
        }
        ClientError::Resolve(ResolveError::Api(err)) => {
            println!("! {}", err.user_message());
        }
        err => {
            println!("! {}", err);
            match client.open_default().await {
                Ok(_) => print_session(client),
                Err(err) => println!("! {}", err),
            }
        }
    }
}

fn print_session(client: &GameClient) {
    if let Some(session) = client.session() {
        println!("{}", render_session(session));
    }
}

async fn run_command(client: &mut GameClient, command: Command) {
    let reported_by_events = matches!(
        command,
        Command::Guess(_) | Command::Hint | Command::Surrender
    );
    let result = match command {
        Command::Guess(word) => client.submit_guess(&word).await.map(|_| ()),
        Command::Hint => client.request_hint().await.map(|_| ()),
        Command::Surrender => client.surrender().await.map(|_| ()),
        Command::Restart => client.restart().await.map(|_| print_session(client)),
        Command::WhyNot => client.why_not().await.map(|response| {
            println!("{}", response.reason);
            if let Some(suggestions) = response.suggestions.filter(|s| !s.is_empty()) {
                println!("Potser volies dir: {}", suggestions.join(", "));
            }
        }),
        Command::Ranking => client
            .ranking()
            .await
            .map(|ranking| println!("{}", render_ranking(&ranking))),
        Command::PreviousGames => client
            .previous_games()
            .await
            .map(|games| println!("{}", render_games(&games))),
        Command::OpenGame(game_id) => client.open_game(game_id).await.map(|_| print_session(client)),
        Command::Today => client.open_default().await.map(|_| print_session(client)),
        Command::CreateCompetition(name) => {
            match name.or_else(|| client.player_name().map(str::to_string)) {
                Some(name) => client.create_competition(&name).await.map(|id| {
                    info!("Competition {} created", id);
                    println!("Competició creada. Comparteix-la amb: {}", client.location());
                }),
                None => Err(ClientError::NameRequired(None)),
            }
        }
        Command::JoinCompetition {
            competition_id,
            name,
        } => match name.or_else(|| client.player_name().map(str::to_string)) {
            Some(name) => client.join_competition(&competition_id, &name).await,
            None => Err(ClientError::NameRequired(Some(competition_id))),
        },
        Command::LeaveCompetition => client.leave_competition().await,
        Command::Standings => client
            .refresh_standings()
            .await
            .map(|standings| println!("{}", render_standings(standings))),
        Command::Share(word) => {
            match client.share_link(&word) {
                Some(link) => println!("{}", link),
                None => println!("! Cal indicar una paraula"),
            }
            Ok(())
        }
        Command::Show => {
            print_session(client);
            Ok(())
        }
        Command::Help => {
            println!("{}", HELP);
            Ok(())
        }
        Command::Invalid(message) => {
            println!("! {}", message);
            Ok(())
        }
        Command::Quit => Ok(()),
    };

    match result {
        Ok(()) => {}
        // Already printed by the renderer
        Err(ClientError::Api(_)) if reported_by_events => {}
        Err(ClientError::CompetitionExpired(_)) => {}
        Err(ClientError::Api(err)) => println!("! {}", err.user_message()),
        Err(ClientError::Cancelled) => println!("Cancel·lat"),
        Err(err) => println!("! {}", err),
    }
}
