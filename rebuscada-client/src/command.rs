use rebuscada_core::from_roman;
use rebuscada_types::GameNumber;

/// A line typed by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Guess(String),
    Hint,
    Surrender,
    Restart,
    WhyNot,
    Ranking,
    PreviousGames,
    OpenGame(GameNumber),
    Today,
    CreateCompetition(Option<String>),
    JoinCompetition {
        competition_id: String,
        name: Option<String>,
    },
    LeaveCompetition,
    Standings,
    Share(String),
    Show,
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Escriu una paraula per provar-la. Ordres:
  /pista               demana una pista
  /rendirse            mostra la solució i acaba la partida
  /reinicia            esborra les partides desades i torna a començar
  /perque              explica per què no s'ha acceptat l'última paraula
  /ranking             paraules més properes (quan la partida ha acabat)
  /jocs                partides anteriors
  /joc <número>        obre una partida anterior (XII o 12)
  /avui                torna a la paraula del dia
  /crea [nom]          crea una competició amb la partida actual
  /uneix <id> [nom]    entra en una competició
  /surt                deixa la competició
  /classificacio       classificació de la competició
  /comparteix <paraula> enllaç per jugar amb una paraula pròpia
  /estat               mostra la partida
  /sortir              tanca el programa";

impl Command {
    /// `None` for blank lines
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Guess(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();
        let joined = (!args.is_empty()).then(|| args.join(" "));

        let command = match name.as_str() {
            "pista" | "hint" => Command::Hint,
            "rendirse" | "rendeix" | "surrender" => Command::Surrender,
            "reinicia" | "restart" => Command::Restart,
            "perque" | "whynot" => Command::WhyNot,
            "ranking" => Command::Ranking,
            "jocs" | "games" => Command::PreviousGames,
            "joc" | "game" => match args.first() {
                Some(id) => match parse_game_number(id) {
                    Some(number) => Command::OpenGame(number),
                    None => Command::Invalid(format!("Número de joc no vàlid: {}", id)),
                },
                None => Command::Invalid("Cal indicar el número de joc".to_string()),
            },
            "avui" | "today" => Command::Today,
            "crea" | "create" => Command::CreateCompetition(joined),
            "uneix" | "join" => match args.split_first() {
                Some((id, name)) => Command::JoinCompetition {
                    competition_id: id.to_string(),
                    name: (!name.is_empty()).then(|| name.join(" ")),
                },
                None => Command::Invalid("Cal indicar l'identificador de la competició".to_string()),
            },
            "surt" | "leave" => Command::LeaveCompetition,
            "classificacio" | "standings" => Command::Standings,
            "comparteix" | "share" => match joined {
                Some(word) => Command::Share(word),
                None => Command::Invalid("Cal indicar una paraula".to_string()),
            },
            "estat" | "show" => Command::Show,
            "ajuda" | "help" => Command::Help,
            "sortir" | "quit" | "exit" => Command::Quit,
            other => Command::Invalid(format!("Ordre desconeguda: /{}", other)),
        };
        Some(command)
    }
}

/// Roman numerals as used in links, or plain digits
fn parse_game_number(input: &str) -> Option<GameNumber> {
    input
        .parse::<GameNumber>()
        .ok()
        .filter(|number| *number > 0)
        .or_else(|| from_roman(input).ok())
}
