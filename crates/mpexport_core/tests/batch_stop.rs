use mpexport_core::{
    update, ArticleOutcome, BatchState, Effect, Msg, QueuedArticle, SessionState,
};

fn running_batch() -> BatchState {
    let articles = (1..=3)
        .map(|id| QueuedArticle {
            id,
            url: format!("https://a.example/{id}"),
            title: Some(format!("article {id}")),
        })
        .collect();
    let (state, _) = update(BatchState::new(), Msg::ArticlesQueued(articles));
    let (state, _) = update(state, Msg::Start);
    state
}

#[test]
fn stop_during_pause_finishes_without_next_article() {
    let state = running_batch();
    let (state, _) = update(state, Msg::ArticleStarted { id: 1 });
    let (state, _) = update(
        state,
        Msg::ArticleFinished {
            id: 1,
            outcome: ArticleOutcome::Exported {
                filepath: "1.md".to_string(),
            },
        },
    );

    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(effects, vec![Effect::Finish]);
    assert_eq!(state.session(), SessionState::Finished);

    let summary = state.summary();
    assert!(summary.stopped);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.not_started, 2);
}

#[test]
fn stop_before_dispatched_article_starts_requeues_it() {
    let state = running_batch();
    assert_eq!(state.current(), Some(1));

    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(effects, vec![Effect::Finish]);
    assert_eq!(state.current(), None);
    assert_eq!(state.queued_len(), 3);
    assert_eq!(state.summary().not_started, 3);
}

#[test]
fn stop_while_article_in_flight_waits_for_it() {
    let state = running_batch();
    let (state, _) = update(state, Msg::ArticleStarted { id: 1 });

    let (state, effects) = update(state, Msg::StopRequested);
    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Stopping);

    let (state, effects) = update(
        state,
        Msg::ArticleFinished {
            id: 1,
            outcome: ArticleOutcome::Exported {
                filepath: "1.md".to_string(),
            },
        },
    );
    assert_eq!(effects, vec![Effect::Finish]);

    let summary = state.summary();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.not_started, 2);
    assert!(summary.stopped);
}

#[test]
fn nothing_is_queued_after_finish() {
    let state = running_batch();
    let (state, _) = update(state, Msg::StopRequested);
    let (state, effects) = update(
        state,
        Msg::ArticlesQueued(vec![QueuedArticle {
            id: 9,
            url: "https://a.example/9".to_string(),
            title: None,
        }]),
    );

    assert!(effects.is_empty());
    assert!(state.record(9).is_none());
}

#[test]
fn repeated_stop_is_ignored() {
    let state = running_batch();
    let (state, _) = update(state, Msg::StopRequested);
    let (next, effects) = update(state.clone(), Msg::StopRequested);

    assert!(effects.is_empty());
    assert_eq!(next, state);
}
