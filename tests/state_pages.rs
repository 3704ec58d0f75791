use chrono::Utc;

use matchdesk::state::{
    apply_delta, AnalysisSummary, AppState, Delta, Phase, TeamRef, TournamentRef,
};

fn item(id: &str) -> AnalysisSummary {
    AnalysisSummary {
        id: id.to_string(),
        home: TeamRef {
            name: "Home".to_string(),
            logo: None,
        },
        away: TeamRef {
            name: "Away".to_string(),
            logo: None,
        },
        score_home: 0,
        score_away: 0,
        tournament: TournamentRef {
            name: "Cup".to_string(),
            logo: None,
        },
        venue: None,
        date: None,
        summary: String::new(),
        full_text: None,
        views: 0,
        likes: None,
        created_at: Utc::now(),
    }
}

fn page_loaded(page: u32, ids: &[&str], pages: Option<u32>) -> Delta {
    Delta::PageLoaded {
        page,
        items: ids.iter().map(|id| item(id)).collect(),
        total: None,
        pages,
    }
}

fn ids(state: &AppState) -> Vec<&str> {
    state.analyses.iter().map(|a| a.id.as_str()).collect()
}

#[test]
fn pages_accumulate_in_order() {
    let mut state = AppState::new();
    apply_delta(&mut state, page_loaded(1, &["a", "b"], Some(3)));
    apply_delta(&mut state, page_loaded(2, &["c", "d"], Some(3)));

    assert_eq!(ids(&state), vec!["a", "b", "c", "d"]);
    assert_eq!(state.page, 2);
    assert!(state.more_available);
    assert_eq!(state.phase, Phase::Ready);
}

#[test]
fn page_one_replaces_for_refresh() {
    let mut state = AppState::new();
    apply_delta(&mut state, page_loaded(1, &["a", "b"], Some(2)));
    apply_delta(&mut state, page_loaded(2, &["c"], Some(2)));
    apply_delta(&mut state, page_loaded(1, &["x"], Some(1)));

    assert_eq!(ids(&state), vec!["x"]);
    assert!(!state.more_available);
}

#[test]
fn appended_duplicates_are_skipped() {
    let mut state = AppState::new();
    apply_delta(&mut state, page_loaded(1, &["a", "b"], Some(2)));
    apply_delta(&mut state, page_loaded(2, &["b", "c"], Some(2)));

    assert_eq!(ids(&state), vec!["a", "b", "c"]);
}

#[test]
fn failed_page_keeps_accumulated_data() {
    let mut state = AppState::new();
    apply_delta(&mut state, page_loaded(1, &["a", "b"], Some(3)));
    apply_delta(
        &mut state,
        Delta::PageFailed {
            page: 2,
            message: "http 502".to_string(),
        },
    );

    assert_eq!(ids(&state), vec!["a", "b"]);
    assert!(matches!(state.phase, Phase::Error { page: 2, .. }));

    // Retry re-enters Loading at the failed page.
    assert_eq!(state.start_retry(), Some(2));
    assert_eq!(state.phase, Phase::Loading { page: 2 });
}

#[test]
fn load_more_is_a_noop_when_exhausted() {
    let mut state = AppState::new();
    apply_delta(&mut state, page_loaded(1, &["a"], Some(1)));
    assert!(!state.more_available);

    let before = state.analyses.len();
    assert_eq!(state.start_load_more(), None);
    assert_eq!(state.analyses.len(), before);
    assert_eq!(state.phase, Phase::Ready);
}

#[test]
fn load_more_is_a_noop_while_in_flight() {
    let mut state = AppState::new();
    apply_delta(&mut state, page_loaded(1, &["a"], Some(5)));

    assert_eq!(state.start_load_more(), Some(2));
    // Second call while page 2 is outstanding.
    assert_eq!(state.start_load_more(), None);
    assert_eq!(state.phase, Phase::Loading { page: 2 });

    // Refresh is also suppressed while a load is outstanding.
    assert_eq!(state.start_refresh(), None);
}

#[test]
fn retry_requires_an_error() {
    let mut state = AppState::new();
    assert_eq!(state.start_retry(), None);
    apply_delta(&mut state, page_loaded(1, &["a"], Some(2)));
    assert_eq!(state.start_retry(), None);
}

#[test]
fn missing_page_count_falls_back_to_full_page_heuristic() {
    let mut state = AppState::new();
    state.page_size = 2;

    apply_delta(&mut state, page_loaded(1, &["a", "b"], None));
    assert!(state.more_available);

    apply_delta(&mut state, page_loaded(2, &["c"], None));
    assert!(!state.more_available);
}

#[test]
fn selection_is_clamped_after_refresh() {
    let mut state = AppState::new();
    apply_delta(&mut state, page_loaded(1, &["a", "b", "c"], Some(1)));
    state.selected = 2;
    apply_delta(&mut state, page_loaded(1, &["x"], Some(1)));
    assert_eq!(state.selected, 0);
}

#[test]
fn detail_refreshes_the_accumulated_copy() {
    let mut state = AppState::new();
    apply_delta(&mut state, page_loaded(1, &["a", "b"], Some(1)));

    let mut fresher = item("b");
    fresher.views = 99;
    apply_delta(&mut state, Delta::DetailLoaded { item: fresher });

    assert_eq!(state.analyses[1].views, 99);
    assert_eq!(ids(&state), vec!["a", "b"]);
}
