//! The "not played by" selection: picks questions a player has not yet been
//! served, scoped to a theme and bounded by a caller-supplied limit.

use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{dto::question::QuestionSummary, error::ServiceError, state::SharedState};

/// Select up to `limit` questions of `theme_id` that `player_id` has not played.
///
/// The limit is mandatory: there is no meaningful default round size, so its
/// absence (or zero) is a caller error. An unknown theme yields an empty
/// result, since a theme without questions is a valid and common state.
///
/// Qualifying questions are shuffled with the supplied RNG before the limit is
/// applied; passing a seeded RNG makes the selection reproducible. The
/// operation is read-only and never touches the play history.
pub async fn select_unplayed<R>(
    state: &SharedState,
    player_id: Uuid,
    theme_id: Uuid,
    limit: Option<usize>,
    rng: &mut R,
) -> Result<Vec<QuestionSummary>, ServiceError>
where
    R: Rng + Send,
{
    let limit = match limit {
        Some(limit) if limit > 0 => limit,
        _ => {
            return Err(ServiceError::InvalidArgument(
                "a positive `limit` parameter is required".into(),
            ));
        }
    };

    let questions = state.require_question_store().await?;
    let plays = state.require_play_history().await?;

    if state.bounded(questions.get_theme(theme_id)).await?.is_none() {
        return Ok(Vec::new());
    }

    let candidates = state.bounded(questions.find_by_theme(theme_id)).await?;
    let played = state.bounded(plays.played_set(player_id)).await?;

    let mut unplayed: Vec<_> = candidates
        .into_iter()
        .filter(|question| !played.contains(&question.id))
        .collect();

    unplayed.shuffle(rng);
    unplayed.truncate(limit);

    Ok(unplayed.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::SystemTime;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            bank_store::{PlayHistoryStore, QuestionStore, memory::MemoryBankStore},
            models::{QuestionEntity, ThemeEntity},
        },
        state::AppState,
    };

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    async fn state_with_store() -> (crate::state::SharedState, MemoryBankStore) {
        let store = MemoryBankStore::new();
        let state = AppState::new(AppConfig::default(), None);
        state
            .install_stores(Arc::new(store.clone()), Arc::new(store.clone()))
            .await;
        (state, store)
    }

    async fn seed_theme(store: &MemoryBankStore, name: &str) -> Uuid {
        let theme = ThemeEntity {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            description: String::new(),
            is_public: true,
            is_default: false,
            company_name: None,
            company_sub_name: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        };
        let id = theme.id;
        store.insert_theme(theme).await.unwrap();
        id
    }

    async fn seed_question(store: &MemoryBankStore, theme_id: Uuid, text: &str) -> Uuid {
        let question = QuestionEntity {
            id: Uuid::new_v4(),
            theme_id,
            text: text.to_owned(),
            answers: [
                "a".to_owned(),
                "b".to_owned(),
                "c".to_owned(),
                "d".to_owned(),
            ],
            image: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        };
        let id = question.id;
        store.insert_question(question).await.unwrap();
        id
    }

    #[tokio::test]
    async fn returns_exactly_the_unplayed_questions_of_the_theme() {
        let (state, store) = state_with_store().await;
        let theme = seed_theme(&store, "history").await;
        let player = Uuid::new_v4();

        let q1 = seed_question(&store, theme, "a").await;
        let q2 = seed_question(&store, theme, "b").await;
        let q3 = seed_question(&store, theme, "c").await;
        store.record_played(player, q1).await.unwrap();

        let selected =
            select_unplayed(&state, player, theme, Some(5), &mut seeded_rng()).await.unwrap();

        let ids: HashSet<Uuid> = selected.iter().map(|question| question.id).collect();
        assert_eq!(ids, HashSet::from([q2, q3]));
    }

    #[tokio::test]
    async fn excludes_questions_from_other_themes() {
        let (state, store) = state_with_store().await;
        let theme = seed_theme(&store, "history").await;
        let other = seed_theme(&store, "geography").await;
        let player = Uuid::new_v4();

        let wanted = seed_question(&store, theme, "in scope").await;
        seed_question(&store, other, "out of scope").await;

        let selected =
            select_unplayed(&state, player, theme, Some(10), &mut seeded_rng()).await.unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, wanted);
    }

    #[tokio::test]
    async fn result_length_is_min_of_limit_and_remaining() {
        let (state, store) = state_with_store().await;
        let theme = seed_theme(&store, "history").await;
        let player = Uuid::new_v4();

        for index in 0..4 {
            seed_question(&store, theme, &format!("question {index}")).await;
        }

        let two = select_unplayed(&state, player, theme, Some(2), &mut seeded_rng()).await.unwrap();
        assert_eq!(two.len(), 2);

        // A short result is returned as-is, not an error.
        let all = select_unplayed(&state, player, theme, Some(50), &mut seeded_rng()).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn missing_or_zero_limit_is_an_invalid_argument() {
        let (state, store) = state_with_store().await;
        let theme = seed_theme(&store, "history").await;
        let player = Uuid::new_v4();

        let err = select_unplayed(&state, player, theme, None, &mut seeded_rng())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));

        let err = select_unplayed(&state, player, theme, Some(0), &mut seeded_rng())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_theme_yields_an_empty_result() {
        let (state, _store) = state_with_store().await;

        let selected = select_unplayed(
            &state,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(5),
            &mut seeded_rng(),
        )
        .await
        .unwrap();

        assert!(selected.is_empty());
    }

    #[tokio::test]
    async fn selection_is_deterministic_for_a_seeded_rng() {
        let (state, store) = state_with_store().await;
        let theme = seed_theme(&store, "history").await;
        let player = Uuid::new_v4();

        for index in 0..8 {
            seed_question(&store, theme, &format!("question {index}")).await;
        }

        let first = select_unplayed(&state, player, theme, Some(3), &mut seeded_rng())
            .await
            .unwrap();
        let second = select_unplayed(&state, player, theme, Some(3), &mut seeded_rng())
            .await
            .unwrap();

        let first_ids: Vec<Uuid> = first.iter().map(|question| question.id).collect();
        let second_ids: Vec<Uuid> = second.iter().map(|question| question.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn selection_never_writes_to_the_play_history() {
        let (state, store) = state_with_store().await;
        let theme = seed_theme(&store, "history").await;
        let player = Uuid::new_v4();
        seed_question(&store, theme, "only one").await;

        select_unplayed(&state, player, theme, Some(1), &mut seeded_rng()).await.unwrap();
        select_unplayed(&state, player, theme, Some(1), &mut seeded_rng()).await.unwrap();

        assert!(store.played_set(player).await.unwrap().is_empty());
    }
}
