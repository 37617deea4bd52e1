use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};

use rebuscada_core::{Proximity, Session, SessionEvent, SessionEventHandler, progress_fraction};
use rebuscada_types::{GameSummary, Guess, PlayerStanding, PlayerStatus, RankingResponse};

use crate::competition::Confirm;

const PROGRESS_WIDTH: usize = 20;

pub type SharedLines = Arc<Mutex<mpsc::Receiver<String>>>;

/// Read stdin lines on a background task so both the main loop and
/// confirmation prompts can take turns consuming them.
pub fn spawn_stdin_reader() -> SharedLines {
    let (sender, receiver) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if sender.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    Arc::new(Mutex::new(receiver))
}

pub async fn next_line(lines: &SharedLines) -> Option<String> {
    lines.lock().await.recv().await
}

/// Yes/no question answered on the next input line
pub struct LinePrompt {
    lines: SharedLines,
}

impl LinePrompt {
    pub fn new(lines: SharedLines) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl Confirm for LinePrompt {
    async fn confirm(&self, prompt: &str) -> bool {
        println!("{} [s/N]", prompt);
        match next_line(&self.lines).await {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "s" | "si" | "sí" | "y" | "yes"),
            None => false,
        }
    }
}

pub fn progress_bar(rank: u32, total_words: u32) -> String {
    let filled = (progress_fraction(rank, total_words) * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(PROGRESS_WIDTH - filled))
}

pub fn render_guess(guess: &Guess) -> String {
    let proximity = Proximity::from_rank(guess.rank);
    let marker = if guess.is_hint { " (pista)" } else { "" };
    format!(
        "{:>6}  {:<24} {} {}{}",
        guess.rank,
        guess.display_text(),
        progress_bar(guess.rank, guess.total_words),
        proximity.label(),
        marker
    )
}

pub fn render_session(session: &Session) -> String {
    let state = &session.state;
    let mut lines = vec![format!(
        "Partida {} - {} | intents: {} | pistes: {}",
        state.key,
        state.status_label(),
        state.player_guess_count(),
        state.hints_used
    )];
    if let Some(guess) = session.last_guess() {
        lines.push(format!("Última: {}", render_guess(guess)));
    }
    if let Some(error) = session.error() {
        lines.push(format!("! {}", error));
    }
    if let Some(solution) = state.solution.as_deref().filter(|_| state.surrendered) {
        lines.push(format!("La paraula era «{}»", solution));
    }
    lines.extend(state.guesses.iter().map(render_guess));
    lines.join("\n")
}

pub fn render_standings(standings: &[PlayerStanding]) -> String {
    if standings.is_empty() {
        return "Encara no hi ha classificació".to_string();
    }
    standings
        .iter()
        .enumerate()
        .map(|(position, standing)| {
            let best = standing
                .best_rank
                .map(|rank| rank.to_string())
                .unwrap_or_else(|| "-".to_string());
            let status = match standing.status {
                PlayerStatus::Playing => "",
                PlayerStatus::Won => " (l'ha trobada)",
                PlayerStatus::Surrendered => " (s'ha rendit)",
            };
            format!(
                "{:>2}. {:<16} millor {:>6} | intents {:>3} | pistes {:>2}{}",
                position + 1,
                standing.name,
                best,
                standing.guess_count,
                standing.hint_count,
                status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_games(games: &[GameSummary]) -> String {
    games
        .iter()
        .map(|game| {
            format!(
                "#{:<8} {:<10} {} intents",
                game.roman, game.status, game.guess_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_ranking(ranking: &RankingResponse) -> String {
    ranking
        .ranking
        .iter()
        .map(|entry| format!("{:>6}  {}", entry.rank, entry.word))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prints session events as they happen
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl SessionEventHandler for TerminalRenderer {
    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PuzzleResolved { key, resumed: true } => {
                println!("Continues la partida {}", key)
            }
            SessionEvent::PuzzleResolved { key, resumed: false } => {
                println!("Nova partida {}", key)
            }
            SessionEvent::GuessAccepted { guess, .. } => println!("{}", render_guess(&guess)),
            SessionEvent::HintRevealed { guess, .. } => println!("Pista: {}", render_guess(&guess)),
            SessionEvent::DuplicateGuess { message, .. }
            | SessionEvent::GuessRejected { message, .. }
            | SessionEvent::RequestFailed { message } => println!("! {}", message),
            SessionEvent::GameWon { attempts, .. } => {
                println!("Enhorabona! Has trobat la paraula en {} intents", attempts)
            }
            SessionEvent::GameSurrendered { solution, .. } => {
                println!("T'has rendit. La paraula era «{}»", solution)
            }
            SessionEvent::SessionRestarted => println!("S'han esborrat les partides desades"),
            SessionEvent::SessionAdopted { .. } => {
                println!("Partida actualitzada des d'una altra finestra")
            }
            SessionEvent::StorageReset { version } => {
                println!("Nova versió ({}); s'han esborrat les dades locals", version)
            }
            SessionEvent::Redirected { url } => println!("Redirigit a {}", url),
            SessionEvent::CompetitionJoined { competition_id, .. } => {
                println!("Ets a la competició {}", competition_id)
            }
            SessionEvent::CompetitionLeft { competition_id } => {
                println!("Has sortit de la competició {}", competition_id)
            }
            SessionEvent::CompetitionExpired { message, .. } => println!("! {}", message),
            SessionEvent::StandingsUpdated { standings, .. } => {
                println!("{}", render_standings(&standings))
            }
        }
    }
}
