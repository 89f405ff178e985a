use std::sync::Once;

use mpexport_core::{
    update, ArticleOutcome, BatchState, Effect, Msg, QueuedArticle, SessionState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(mpexport_logging::initialize_for_tests);
}

fn queued(id: u64, url: &str) -> QueuedArticle {
    QueuedArticle {
        id,
        url: url.to_string(),
        title: None,
    }
}

fn exported(path: &str) -> ArticleOutcome {
    ArticleOutcome::Exported {
        filepath: path.to_string(),
    }
}

fn queue_and_start(urls: &[&str]) -> (BatchState, Vec<Effect>) {
    let articles = urls
        .iter()
        .enumerate()
        .map(|(idx, url)| queued(idx as u64 + 1, url))
        .collect();
    let (state, _) = update(BatchState::new(), Msg::ArticlesQueued(articles));
    update(state, Msg::Start)
}

#[test]
fn start_dispatches_first_article_only() {
    init_logging();
    let (state, effects) = queue_and_start(&["https://a.example/1", "https://a.example/2"]);

    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(state.current(), Some(1));
    assert_eq!(state.queued_len(), 1);
    assert_eq!(
        effects,
        vec![Effect::ExportArticle {
            id: 1,
            url: "https://a.example/1".to_string(),
        }]
    );
}

#[test]
fn articles_are_exported_in_order_with_pauses_between() {
    init_logging();
    let (state, _) = queue_and_start(&["https://a.example/1", "https://a.example/2"]);

    let (state, _) = update(state, Msg::ArticleStarted { id: 1 });
    let (state, effects) = update(
        state,
        Msg::ArticleFinished {
            id: 1,
            outcome: exported("out/1.md"),
        },
    );
    assert_eq!(effects, vec![Effect::Pause { after_failure: false }]);

    let (state, effects) = update(state, Msg::PauseElapsed);
    assert_eq!(
        effects,
        vec![Effect::ExportArticle {
            id: 2,
            url: "https://a.example/2".to_string(),
        }]
    );

    let (state, _) = update(state, Msg::ArticleStarted { id: 2 });
    let (state, effects) = update(
        state,
        Msg::ArticleFinished {
            id: 2,
            outcome: exported("out/2.md"),
        },
    );
    assert_eq!(effects, vec![Effect::Finish]);
    assert_eq!(state.session(), SessionState::Finished);

    let summary = state.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert!(!summary.stopped);
}

#[test]
fn failure_is_recorded_and_batch_continues() {
    init_logging();
    let (state, _) = queue_and_start(&["https://a.example/1", "https://a.example/2"]);
    let (state, _) = update(state, Msg::ArticleStarted { id: 1 });
    let (state, effects) = update(
        state,
        Msg::ArticleFinished {
            id: 1,
            outcome: ArticleOutcome::Failed {
                message: "fetch failed".to_string(),
            },
        },
    );
    assert_eq!(effects, vec![Effect::Pause { after_failure: true }]);

    let (state, effects) = update(state, Msg::PauseElapsed);
    assert!(matches!(effects[..], [Effect::ExportArticle { id: 2, .. }]));

    let (state, _) = update(state, Msg::ArticleStarted { id: 2 });
    let (state, _) = update(
        state,
        Msg::ArticleFinished {
            id: 2,
            outcome: exported("out/2.md"),
        },
    );

    let summary = state.summary();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].url, "https://a.example/1");
    assert_eq!(summary.failures[0].message, "fetch failed");
}

#[test]
fn empty_queue_finishes_immediately() {
    init_logging();
    let (state, effects) = update(BatchState::new(), Msg::Start);

    assert_eq!(effects, vec![Effect::Finish]);
    assert_eq!(state.session(), SessionState::Finished);
    assert_eq!(state.summary().total, 0);
}

#[test]
fn stale_completion_is_ignored() {
    init_logging();
    let (state, _) = queue_and_start(&["https://a.example/1"]);
    let (next, effects) = update(
        state.clone(),
        Msg::ArticleFinished {
            id: 42,
            outcome: exported("out/x.md"),
        },
    );

    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn duplicate_urls_are_queued_once() {
    init_logging();
    let (state, _) = update(
        BatchState::new(),
        Msg::ArticlesQueued(vec![
            queued(1, "https://mp.weixin.qq.com/s?mid=1#rd"),
            queued(2, "http://mp.weixin.qq.com/s?mid=1"),
            queued(3, "https://mp.weixin.qq.com/s?mid=2"),
        ]),
    );

    assert_eq!(state.queued_len(), 2);
    assert_eq!(state.summary().skipped_duplicates, 1);
    assert!(state.record(2).is_none());
}

#[test]
fn restored_urls_are_not_exported_again() {
    init_logging();
    let (state, _) = update(
        BatchState::new(),
        Msg::RestoreCompleted(vec!["https://mp.weixin.qq.com/s?mid=1".to_string()]),
    );
    let (state, _) = update(
        state,
        Msg::ArticlesQueued(vec![
            queued(1, "https://mp.weixin.qq.com/s?mid=1#rd"),
            queued(2, "https://mp.weixin.qq.com/s?mid=2"),
        ]),
    );
    let (state, effects) = update(state, Msg::Start);

    assert!(matches!(effects[..], [Effect::ExportArticle { id: 2, .. }]));
    assert_eq!(state.summary().skipped_duplicates, 1);
}

#[test]
fn completed_urls_include_restored_and_new_exports() {
    init_logging();
    let (state, _) = update(
        BatchState::new(),
        Msg::RestoreCompleted(vec!["https://mp.weixin.qq.com/s?mid=1".to_string()]),
    );
    let (state, _) = update(
        state,
        Msg::ArticlesQueued(vec![
            queued(2, "https://mp.weixin.qq.com/s?mid=2"),
            queued(3, "https://mp.weixin.qq.com/s?mid=3"),
        ]),
    );
    let (state, _) = update(state, Msg::Start);
    let (state, _) = update(state, Msg::ArticleStarted { id: 2 });
    let (state, _) = update(
        state,
        Msg::ArticleFinished {
            id: 2,
            outcome: exported("out/2.md"),
        },
    );
    let (state, _) = update(state, Msg::PauseElapsed);
    let (state, _) = update(state, Msg::ArticleStarted { id: 3 });
    let (state, _) = update(
        state,
        Msg::ArticleFinished {
            id: 3,
            outcome: ArticleOutcome::Failed {
                message: "gone".to_string(),
            },
        },
    );

    assert_eq!(
        state.completed_urls(),
        vec![
            "https://mp.weixin.qq.com/s?mid=1".to_string(),
            "https://mp.weixin.qq.com/s?mid=2".to_string(),
        ]
    );
}
