use std::collections::VecDeque;

use chrono::{DateTime, Duration as ChronoDuration, Local, Utc};

use crate::prefs::Preferences;

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRef {
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentRef {
    pub name: String,
    pub logo: Option<String>,
}

/// One match analysis as published by the remote service. The client never
/// writes these fields back; the like count shown on screen is derived via
/// `AppState::display_likes`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSummary {
    pub id: String,
    pub home: TeamRef,
    pub away: TeamRef,
    pub score_home: i32,
    pub score_away: i32,
    pub tournament: TournamentRef,
    pub venue: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub summary: String,
    pub full_text: Option<String>,
    pub views: u64,
    pub likes: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Recent,
    Popular,
    Today,
    Week,
    Trending,
    All,
}

impl FilterMode {
    pub fn label(self) -> &'static str {
        match self {
            FilterMode::Recent => "recent",
            FilterMode::Popular => "popular",
            FilterMode::Today => "today",
            FilterMode::Week => "week",
            FilterMode::Trending => "trending",
            FilterMode::All => "all",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            FilterMode::Recent => FilterMode::Popular,
            FilterMode::Popular => FilterMode::Today,
            FilterMode::Today => FilterMode::Week,
            FilterMode::Week => FilterMode::Trending,
            FilterMode::Trending => FilterMode::All,
            FilterMode::All => FilterMode::Recent,
        }
    }
}

/// Parse a filter mode name. Unknown names are rejected rather than mapped
/// to a default.
pub fn parse_filter_mode(raw: &str) -> Option<FilterMode> {
    match raw.trim().to_lowercase().as_str() {
        "recent" => Some(FilterMode::Recent),
        "popular" => Some(FilterMode::Popular),
        "today" => Some(FilterMode::Today),
        "week" => Some(FilterMode::Week),
        "trending" => Some(FilterMode::Trending),
        "all" => Some(FilterMode::All),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Date,
    Views,
    Likes,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Date => "date",
            SortMode::Views => "views",
            SortMode::Likes => "likes",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            SortMode::Date => SortMode::Views,
            SortMode::Views => SortMode::Likes,
            SortMode::Likes => SortMode::Date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub mode: FilterMode,
    pub tournament: Option<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            mode: FilterMode::Recent,
            tournament: None,
        }
    }
}

/// Filter and sort the accumulated list. Pure: the input is untouched and
/// the result only ever contains references into it.
///
/// The text query matches case-insensitively against home name, away name
/// and tournament name (OR across the three); the mode filter and the exact
/// tournament restriction are then ANDed on top. `now` is passed in so the
/// today/week windows are testable.
pub fn apply_filters<'a>(
    items: &'a [AnalysisSummary],
    filter: &FilterState,
    sort: SortMode,
    trending_min_views: u64,
    now: DateTime<Local>,
) -> Vec<&'a AnalysisSummary> {
    let query = filter.query.trim().to_lowercase();
    let week_ago = now - ChronoDuration::days(7);

    let mut out: Vec<&AnalysisSummary> = items
        .iter()
        .filter(|item| {
            if !query.is_empty() {
                let hit = item.home.name.to_lowercase().contains(&query)
                    || item.away.name.to_lowercase().contains(&query)
                    || item.tournament.name.to_lowercase().contains(&query);
                if !hit {
                    return false;
                }
            }

            let created_local = item.created_at.with_timezone(&Local);
            let mode_ok = match filter.mode {
                FilterMode::Today => created_local.date_naive() >= now.date_naive(),
                FilterMode::Week => created_local >= week_ago,
                FilterMode::Trending | FilterMode::Popular => item.views > trending_min_views,
                FilterMode::Recent | FilterMode::All => true,
            };
            if !mode_ok {
                return false;
            }

            if let Some(tournament) = &filter.tournament {
                if &item.tournament.name != tournament {
                    return false;
                }
            }
            true
        })
        .collect();

    match sort {
        SortMode::Date => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::Views => out.sort_by(|a, b| b.views.cmp(&a.views)),
        SortMode::Likes => {
            out.sort_by(|a, b| b.likes.unwrap_or(0).cmp(&a.likes.unwrap_or(0)));
        }
    }
    out
}

/// List-session state machine. `Error` keeps the last good accumulated data
/// around; only the failed page is lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading { page: u32 },
    Ready,
    Error { page: u32, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    List,
    Detail { id: String },
}

#[derive(Debug, Clone)]
pub enum Delta {
    PageLoaded {
        page: u32,
        items: Vec<AnalysisSummary>,
        total: Option<u64>,
        pages: Option<u32>,
    },
    PageFailed {
        page: u32,
        message: String,
    },
    DetailLoaded {
        item: AnalysisSummary,
    },
    DetailFailed {
        id: String,
        message: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchPage { page: u32, limit: u32 },
    FetchDetail { id: String },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub filter: FilterState,
    pub sort: SortMode,
    pub search_active: bool,
    pub selected: usize,
    pub analyses: Vec<AnalysisSummary>,
    pub phase: Phase,
    pub page: u32,
    pub page_size: u32,
    pub total: Option<u64>,
    pub more_available: bool,
    pub trending_min_views: u64,
    pub detail: Option<AnalysisSummary>,
    pub detail_loading: bool,
    pub detail_scroll: u16,
    pub prefs: Preferences,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::List,
            filter: FilterState::default(),
            sort: SortMode::Date,
            search_active: false,
            selected: 0,
            analyses: Vec::with_capacity(32),
            phase: Phase::Idle,
            page: 1,
            page_size: crate::config::page_size(),
            total: None,
            more_available: true,
            trending_min_views: crate::config::trending_min_views(),
            detail: None,
            detail_loading: false,
            detail_scroll: 0,
            prefs: Preferences::default(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(line.into());
    }

    /// The accumulated list seen through the current filters and sort.
    pub fn visible(&self) -> Vec<&AnalysisSummary> {
        apply_filters(
            &self.analyses,
            &self.filter,
            self.sort,
            self.trending_min_views,
            Local::now(),
        )
    }

    pub fn selected_id(&self) -> Option<String> {
        match &self.screen {
            Screen::Detail { id } => Some(id.clone()),
            Screen::List => self.visible().get(self.selected).map(|item| item.id.clone()),
        }
    }

    pub fn select_next(&mut self) {
        let len = self.visible().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selection_at_end(&self) -> bool {
        let len = self.visible().len();
        len > 0 && self.selected + 1 >= len
    }

    pub fn cycle_filter_mode(&mut self) {
        self.filter.mode = self.filter.mode.cycle();
        self.selected = 0;
        self.push_log(format!("[INFO] Filter: {}", self.filter.mode.label()));
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.cycle();
        self.selected = 0;
        self.push_log(format!("[INFO] Sort: {}", self.sort.label()));
    }

    /// Distinct tournament names across the accumulated list, sorted.
    pub fn tournaments(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .analyses
            .iter()
            .map(|item| item.tournament.name.clone())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Step the tournament restriction: none -> first -> ... -> last -> none.
    pub fn cycle_tournament(&mut self) {
        let names = self.tournaments();
        self.filter.tournament = match &self.filter.tournament {
            None => names.first().cloned(),
            Some(current) => match names.iter().position(|name| name == current) {
                Some(idx) => names.get(idx + 1).cloned(),
                None => None,
            },
        };
        self.selected = 0;
        match &self.filter.tournament {
            Some(name) => self.push_log(format!("[INFO] Tournament: {name}")),
            None => self.push_log("[INFO] Tournament filter cleared"),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    /// Start the initial page load (or a refresh). No-op while a load is in
    /// flight; a refresh replaces the accumulated list when page 1 lands.
    pub fn start_refresh(&mut self) -> Option<u32> {
        if self.is_loading() {
            return None;
        }
        self.phase = Phase::Loading { page: 1 };
        Some(1)
    }

    /// Advance the page cursor. No-op when the server reported no further
    /// pages or while a load is in flight, so at most one page load is
    /// outstanding and pages are requested in increasing order.
    pub fn start_load_more(&mut self) -> Option<u32> {
        if self.is_loading() || !self.more_available {
            return None;
        }
        let next = self.page + 1;
        self.phase = Phase::Loading { page: next };
        Some(next)
    }

    /// Re-enter `Loading` at the page that failed. Only valid from `Error`.
    pub fn start_retry(&mut self) -> Option<u32> {
        let Phase::Error { page, .. } = &self.phase else {
            return None;
        };
        let page = *page;
        self.phase = Phase::Loading { page };
        Some(page)
    }

    /// Like count to display for an item: the server count plus the local
    /// optimistic increment. Derived only, never written back.
    pub fn display_likes(&self, item: &AnalysisSummary) -> u64 {
        let base = item.likes.unwrap_or(0);
        if self.prefs.is_liked(&item.id) {
            base + 1
        } else {
            base
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::PageLoaded {
            page,
            items,
            total,
            pages,
        } => {
            let count = items.len();
            if page == 1 {
                state.analyses = items;
            } else {
                // Later pages append; ids already present are skipped so the
                // accumulated list stays unique even if the server shifts.
                for item in items {
                    if !state.analyses.iter().any(|have| have.id == item.id) {
                        state.analyses.push(item);
                    }
                }
            }
            state.page = page;
            state.total = total;
            state.more_available = match pages {
                Some(pages) => page < pages,
                // Without a page count in the envelope, assume more pages
                // exist as long as the server returned a full page.
                None => count as u32 == state.page_size,
            };
            state.phase = Phase::Ready;
            state.clamp_selection();
            state.push_log(format!("[INFO] Loaded page {page} ({count} analyses)"));
        }
        Delta::PageFailed { page, message } => {
            state.phase = Phase::Error {
                page,
                message: message.clone(),
            };
            state.push_log(format!("[WARN] Page {page} load failed: {message}"));
        }
        Delta::DetailLoaded { item } => {
            // Refresh the accumulated copy so list counts stay current.
            if let Some(have) = state.analyses.iter_mut().find(|have| have.id == item.id) {
                *have = item.clone();
            }
            if matches!(&state.screen, Screen::Detail { id } if *id == item.id) {
                state.detail = Some(item);
                state.detail_loading = false;
                state.detail_scroll = 0;
            }
        }
        Delta::DetailFailed { id, message } => {
            if matches!(&state.screen, Screen::Detail { id: want } if *want == id) {
                state.detail_loading = false;
            }
            state.push_log(format!("[WARN] Analysis {id} load failed: {message}"));
        }
        Delta::Log(line) => state.push_log(line),
    }
}
