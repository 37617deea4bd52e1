use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::error::ApiError;
use rebuscada_types::{
    CompetitionJoined, CompetitionStateResponse, CreateCompetitionRequest, DailyPuzzleResponse,
    ErrorBody, GuessRequest, GuessResponse, HintRequest, HintResponse, JoinCompetitionRequest,
    PublicGamesResponse, RankingResponse, SurrenderRequest, SurrenderResponse, VersionResponse,
    WhyNotRequest, WhyNotResponse, messages,
};

/// The guessing and competition backends, as seen by the client.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn guess(&self, request: &GuessRequest) -> Result<GuessResponse, ApiError>;
    async fn hint(&self, request: &HintRequest) -> Result<HintResponse, ApiError>;
    async fn surrender(&self, request: &SurrenderRequest) -> Result<SurrenderResponse, ApiError>;
    async fn why_not(&self, request: &WhyNotRequest) -> Result<WhyNotResponse, ApiError>;
    async fn daily_puzzle(&self) -> Result<DailyPuzzleResponse, ApiError>;
    async fn public_games(&self) -> Result<PublicGamesResponse, ApiError>;
    async fn ranking(&self, puzzle: &str) -> Result<RankingResponse, ApiError>;
    async fn version(&self) -> Result<VersionResponse, ApiError>;
    async fn create_competition(
        &self,
        request: &CreateCompetitionRequest,
    ) -> Result<CompetitionJoined, ApiError>;
    async fn join_competition(
        &self,
        competition_id: &str,
        request: &JoinCompetitionRequest,
    ) -> Result<CompetitionJoined, ApiError>;
    async fn leave_competition(&self, competition_id: &str, player_name: &str)
    -> Result<(), ApiError>;
    async fn competition_state(
        &self,
        competition_id: &str,
    ) -> Result<CompetitionStateResponse, ApiError>;
}

/// Map a non-success response to an error. The backend puts its message in
/// a `detail` field; anything else falls back to a generic message.
pub fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|error| error.detail)
        .unwrap_or_else(|_| messages::UNEXPECTED_ERROR.to_string());

    if status == StatusCode::NOT_FOUND {
        ApiError::NotFound { detail }
    } else {
        ApiError::Rejected {
            status: status.as_u16(),
            detail,
        }
    }
}

/// JSON-over-HTTP implementation
pub struct HttpGameApi {
    client: Client,
    base_url: Url,
}

impl HttpGameApi {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("Invalid API base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!("Backend answered {}: {}", status, body);
            return Err(error_from_response(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_json<R: DeserializeOwned>(&self, url: Url) -> Result<R, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read(response).await
    }

    async fn post_json<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<R, ApiError> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read(response).await
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn guess(&self, request: &GuessRequest) -> Result<GuessResponse, ApiError> {
        self.post_json(self.endpoint(&["guess"])?, request).await
    }

    async fn hint(&self, request: &HintRequest) -> Result<HintResponse, ApiError> {
        self.post_json(self.endpoint(&["pista"])?, request).await
    }

    async fn surrender(&self, request: &SurrenderRequest) -> Result<SurrenderResponse, ApiError> {
        self.post_json(self.endpoint(&["rendirse"])?, request).await
    }

    async fn why_not(&self, request: &WhyNotRequest) -> Result<WhyNotResponse, ApiError> {
        self.post_json(self.endpoint(&["whynot"])?, request).await
    }

    async fn daily_puzzle(&self) -> Result<DailyPuzzleResponse, ApiError> {
        self.get_json(self.endpoint(&["paraula-dia"])?).await
    }

    async fn public_games(&self) -> Result<PublicGamesResponse, ApiError> {
        self.get_json(self.endpoint(&["public-games"])?).await
    }

    async fn ranking(&self, puzzle: &str) -> Result<RankingResponse, ApiError> {
        let mut url = self.endpoint(&["ranking"])?;
        url.query_pairs_mut().append_pair("rebuscada", puzzle);
        self.get_json(url).await
    }

    async fn version(&self) -> Result<VersionResponse, ApiError> {
        self.get_json(self.endpoint(&["version"])?).await
    }

    async fn create_competition(
        &self,
        request: &CreateCompetitionRequest,
    ) -> Result<CompetitionJoined, ApiError> {
        self.post_json(self.endpoint(&["competition", "create"])?, request)
            .await
    }

    async fn join_competition(
        &self,
        competition_id: &str,
        request: &JoinCompetitionRequest,
    ) -> Result<CompetitionJoined, ApiError> {
        self.post_json(
            self.endpoint(&["competition", competition_id, "join"])?,
            request,
        )
        .await
    }

    async fn leave_competition(
        &self,
        competition_id: &str,
        player_name: &str,
    ) -> Result<(), ApiError> {
        let mut url = self.endpoint(&["competition", competition_id, "leave"])?;
        url.query_pairs_mut().append_pair("nom_jugador", player_name);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    async fn competition_state(
        &self,
        competition_id: &str,
    ) -> Result<CompetitionStateResponse, ApiError> {
        self.get_json(self.endpoint(&["competition", competition_id])?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpGameApi {
        HttpGameApi::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let api = api("http://localhost:8000");
        assert_eq!(
            api.endpoint(&["guess"]).unwrap().as_str(),
            "http://localhost:8000/guess"
        );

        let api = self::api("https://example.org/api/");
        assert_eq!(
            api.endpoint(&["competition", "a b", "join"]).unwrap().as_str(),
            "https://example.org/api/competition/a%20b/join"
        );
    }

    #[test]
    fn test_error_mapping() {
        let err = error_from_response(StatusCode::BAD_REQUEST, r#"{"detail":"No és vàlida"}"#);
        assert_eq!(
            err,
            ApiError::Rejected {
                status: 400,
                detail: "No és vàlida".to_string()
            }
        );

        let err = error_from_response(StatusCode::NOT_FOUND, r#"{"detail":"Competició no trobada"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Competició no trobada");

        let err = error_from_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>");
        assert_eq!(err.user_message(), messages::UNEXPECTED_ERROR);
    }
}
