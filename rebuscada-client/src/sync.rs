use rebuscada_core::SessionEvent;
use rebuscada_persistence::{StorageChange, StorageKeyKind};

use crate::competition::CompetitionOverlay;
use crate::game_client::GameClient;

impl GameClient {
    /// Reconcile with a write made by another tab on the same store
    pub async fn handle_storage_change(&mut self, change: StorageChange) {
        let Some(key) = change.key else {
            tracing::debug!("Storage notifications were missed, re-reading everything");
            self.adopt_saved_session().await;
            self.sync_competition().await;
            return;
        };

        match self.repository.keys().classify(&key) {
            Some(StorageKeyKind::Session(storage_id)) => {
                let is_active = self
                    .session
                    .as_ref()
                    .is_some_and(|session| session.key().storage_id() == storage_id);
                if is_active {
                    self.adopt_saved_session().await;
                } else {
                    tracing::debug!("Ignoring change to session {}", storage_id);
                }
            }
            Some(StorageKeyKind::Current) => self.adopt_saved_session().await,
            Some(StorageKeyKind::Competition) => self.sync_competition().await,
            Some(StorageKeyKind::Directory) | Some(StorageKeyKind::ApiVersion) | None => {}
        }
    }

    /// Take over the saved copy of the active session when it differs
    async fn adopt_saved_session(&mut self) {
        let Some(key) = self.session.as_ref().map(|session| session.key().clone()) else {
            return;
        };
        let Some(saved) = self.repository.load(&key).await else {
            return;
        };

        let adopted = self
            .session
            .as_mut()
            .is_some_and(|session| session.adopt(saved));
        if adopted {
            tracing::info!("Adopted progress on {} from another tab", key);
            self.publish(SessionEvent::SessionAdopted { key });
        }
    }

    /// Mirror a competition joined or left in another tab
    async fn sync_competition(&mut self) {
        let stored = self.repository.load_competition().await;
        let current = self
            .competition
            .as_ref()
            .map(|overlay| overlay.info.competition_id.clone());

        match (stored, current) {
            (Some(info), Some(current)) if info.competition_id == current => {}
            (Some(info), _) => {
                tracing::info!("Competition {} joined in another tab", info.competition_id);
                if let Some(mut previous) = self.competition.take() {
                    previous.close();
                }
                self.location.set_competition(Some(&info.competition_id));
                self.player_name = Some(info.player_name.clone());

                self.switch_session_to(&info).await;
                self.competition = Some(CompetitionOverlay::new(info.clone()));
                self.connect_push().await;
                self.publish(SessionEvent::CompetitionJoined {
                    competition_id: info.competition_id,
                    puzzle: info.puzzle,
                });

                if self.pull_standings().await.is_err() && self.competition.is_none() {
                    self.return_to_single_player().await;
                }
            }
            (None, Some(current)) => {
                tracing::info!("Competition {} left in another tab", current);
                if let Some(mut overlay) = self.competition.take() {
                    overlay.close();
                }
                self.location.set_competition(None);
                self.publish(SessionEvent::CompetitionLeft {
                    competition_id: current,
                });
                self.return_to_single_player().await;
            }
            (None, None) => {}
        }
    }
}
