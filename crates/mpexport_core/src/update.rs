use crate::{ArticleOutcome, BatchState, Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: BatchState, msg: Msg) -> (BatchState, Vec<Effect>) {
    let effects = match msg {
        Msg::RestoreCompleted(urls) => {
            state.restore_completed(urls);
            Vec::new()
        }
        Msg::ArticlesQueued(articles) => {
            match state.session() {
                SessionState::Stopping | SessionState::Finished => {
                    return (state, Vec::new());
                }
                SessionState::Idle | SessionState::Running => {}
            }
            state.enqueue(articles);
            Vec::new()
        }
        Msg::Start => {
            if state.session() == SessionState::Idle {
                state.set_session(SessionState::Running);
                dispatch_next(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::ArticleStarted { id } => {
            state.mark_started(id);
            Vec::new()
        }
        Msg::ArticleFinished { id, outcome } => {
            if state.current() != Some(id) {
                return (state, Vec::new());
            }
            let after_failure = matches!(outcome, ArticleOutcome::Failed { .. });
            state.finish_current(outcome);
            match state.session() {
                SessionState::Stopping => finish(&mut state),
                SessionState::Running if state.queued_len() == 0 => finish(&mut state),
                SessionState::Running => vec![Effect::Pause { after_failure }],
                SessionState::Idle | SessionState::Finished => Vec::new(),
            }
        }
        Msg::PauseElapsed => match state.session() {
            SessionState::Running => dispatch_next(&mut state),
            SessionState::Stopping => finish(&mut state),
            SessionState::Idle | SessionState::Finished => Vec::new(),
        },
        Msg::StopRequested => match state.session() {
            SessionState::Idle => {
                state.request_stop();
                finish(&mut state)
            }
            SessionState::Running => {
                state.request_stop();
                if state.current_started() {
                    state.set_session(SessionState::Stopping);
                    Vec::new()
                } else {
                    state.requeue_current();
                    finish(&mut state)
                }
            }
            SessionState::Stopping | SessionState::Finished => Vec::new(),
        },
    };

    (state, effects)
}

fn dispatch_next(state: &mut BatchState) -> Vec<Effect> {
    match state.pop_next() {
        Some((id, url)) => vec![Effect::ExportArticle { id, url }],
        None => finish(state),
    }
}

fn finish(state: &mut BatchState) -> Vec<Effect> {
    state.set_session(SessionState::Finished);
    vec![Effect::Finish]
}
