use std::fmt;
use url::Url;

use rebuscada_core::{
    COMPETITION_PARAM, GAME_PARAM, PuzzleRequest, WORD_PARAM, encode_custom_word,
    parse_puzzle_request, to_roman,
};
use rebuscada_types::GameNumber;

/// The page address the player sees; the puzzle is chosen from its query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(input)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn puzzle_request(&self) -> anyhow::Result<PuzzleRequest> {
        parse_puzzle_request(self.url.query_pairs())
    }

    pub fn competition_id(&self) -> Option<String> {
        self.param(COMPETITION_PARAM).filter(|id| !id.is_empty())
    }

    /// Replace every occurrence of `name` with a single `name=value`
    pub fn set_param(&mut self, name: &str, value: &str) {
        let mut pairs = self.pairs_without(name);
        pairs.push((name.to_string(), value.to_string()));
        self.write_pairs(pairs);
    }

    pub fn remove_param(&mut self, name: &str) {
        let pairs = self.pairs_without(name);
        self.write_pairs(pairs);
    }

    pub fn set_competition(&mut self, competition_id: Option<&str>) {
        match competition_id {
            Some(id) => self.set_param(COMPETITION_PARAM, id),
            None => self.remove_param(COMPETITION_PARAM),
        }
    }

    /// Point at a published game, dropping any other puzzle selector
    pub fn select_game(&mut self, game_id: GameNumber) -> anyhow::Result<()> {
        let roman = to_roman(game_id)?;
        self.remove_param(WORD_PARAM);
        self.remove_param(COMPETITION_PARAM);
        self.set_param(GAME_PARAM, &roman);
        Ok(())
    }

    /// The default page: no query, no fragment
    pub fn redirect_to_default(&mut self) {
        self.url.set_query(None);
        self.url.set_fragment(None);
        tracing::info!("Redirected to {}", self.url);
    }

    /// Link that opens a custom-word game for `word`
    pub fn share_link(&self, word: &str) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair(WORD_PARAM, &encode_custom_word(word));
        url.to_string()
    }

    fn pairs_without(&self, name: &str) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .filter(|(key, _)| key != name)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn write_pairs(&mut self, pairs: Vec<(String, String)>) {
        if pairs.is_empty() {
            self.url.set_query(None);
            return;
        }
        self.url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuscada_core::decode_custom_word;

    #[test]
    fn test_competition_param_round_trip() {
        let mut location = Location::parse("https://rebuscada.cat/?joc=XII").unwrap();
        location.set_competition(Some("abc"));
        assert_eq!(location.competition_id().as_deref(), Some("abc"));
        assert_eq!(location.param("joc").as_deref(), Some("XII"));

        location.set_competition(Some("def"));
        assert_eq!(location.to_string(), "https://rebuscada.cat/?joc=XII&comp=def");

        location.set_competition(None);
        assert_eq!(location.to_string(), "https://rebuscada.cat/?joc=XII");
        location.remove_param("joc");
        assert_eq!(location.to_string(), "https://rebuscada.cat/");
    }

    #[test]
    fn test_redirect_to_default() {
        let mut location = Location::parse("https://rebuscada.cat/?joc=C#top").unwrap();
        location.redirect_to_default();
        assert_eq!(location.to_string(), "https://rebuscada.cat/");
        assert_eq!(location.puzzle_request().unwrap(), PuzzleRequest::Daily);
    }

    #[test]
    fn test_select_game() {
        let mut location = Location::parse("https://rebuscada.cat/?comp=abc&word=Z2F0").unwrap();
        location.select_game(14).unwrap();
        assert_eq!(location.puzzle_request().unwrap(), PuzzleRequest::Game(14));
        assert!(location.competition_id().is_none());
    }

    #[test]
    fn test_share_link() {
        let location = Location::parse("https://rebuscada.cat/?joc=IV").unwrap();
        let link = location.share_link("ratolí");
        let shared = Location::parse(&link).unwrap();
        let encoded = shared.param("word").unwrap();
        assert_eq!(decode_custom_word(&encoded).unwrap(), "ratolí");
        assert!(shared.param("joc").is_none());
    }
}
