use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;

use crate::state::{AnalysisSummary, Delta, ProviderCommand, TeamRef, TournamentRef};

const CORPUS_SIZE: usize = 57;

const TEAMS: &[&str] = &[
    "Al Ahly",
    "Zamalek",
    "Al Hilal",
    "Al Nassr",
    "Manchester City",
    "Liverpool",
    "Arsenal",
    "Real Madrid",
    "Barcelona",
    "Bayern Munich",
    "Inter",
    "Juventus",
    "Paris Saint-Germain",
    "Marseille",
    "Esperance",
    "Raja Casablanca",
];

const TOURNAMENTS: &[(&str, &str)] = &[
    ("Premier League", "Etihad Stadium"),
    ("La Liga", "Santiago Bernabeu"),
    ("Champions League", "Allianz Arena"),
    ("Egyptian Premier League", "Cairo International Stadium"),
    ("Saudi Pro League", "King Fahd Stadium"),
];

const SUMMARIES: &[&str] = &[
    "A tense first half gave way to relentless pressure after the hour mark, with the winning goal arriving from a set piece.",
    "The visitors dominated possession but struggled to create clear chances against a compact low block.",
    "An early red card shaped the whole match; the ten men defended deep and hit twice on the counter.",
    "Both goalkeepers were outstanding in a match that finished with over thirty shots combined.",
    "A tactical switch at half time flipped the midfield battle and the second half was one-way traffic.",
];

/// Offline provider serving a generated corpus. Same command/delta contract
/// as the live provider, with a short artificial latency so loading states
/// are visible.
pub fn spawn_fake_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let corpus = build_corpus(&mut rng);
        let _ = tx.send(Delta::Log(
            "[INFO] Analysis feed: offline sample data".to_string(),
        ));

        while let Ok(cmd) = cmd_rx.recv() {
            thread::sleep(Duration::from_millis(rng.gen_range(120..400)));
            match cmd {
                ProviderCommand::FetchPage { page, limit } => {
                    let limit = limit.max(1);
                    let start = ((page.saturating_sub(1)) * limit) as usize;
                    let items: Vec<AnalysisSummary> = corpus
                        .iter()
                        .skip(start)
                        .take(limit as usize)
                        .cloned()
                        .collect();
                    let pages = (corpus.len() as u32).div_ceil(limit).max(1);
                    let _ = tx.send(Delta::PageLoaded {
                        page,
                        items,
                        total: Some(corpus.len() as u64),
                        pages: Some(pages),
                    });
                }
                ProviderCommand::FetchDetail { id } => {
                    match corpus.iter().find(|item| item.id == id) {
                        Some(item) => {
                            let mut item = item.clone();
                            if item.full_text.is_none() {
                                item.full_text = Some(format!(
                                    "{}\n\nExpanded notes: {} controlled the tempo through midfield \
                                     while {} looked dangerous in transition. The xG race tracked \
                                     the scoreline closely.",
                                    item.summary, item.home.name, item.away.name
                                ));
                            }
                            let _ = tx.send(Delta::DetailLoaded { item });
                        }
                        None => {
                            let _ = tx.send(Delta::DetailFailed {
                                id,
                                message: "analysis not found".to_string(),
                            });
                        }
                    }
                }
            }
        }
    });
}

fn build_corpus(rng: &mut impl Rng) -> Vec<AnalysisSummary> {
    let now = Utc::now();
    let mut out = Vec::with_capacity(CORPUS_SIZE);
    for idx in 0..CORPUS_SIZE {
        let home_idx = rng.gen_range(0..TEAMS.len());
        let mut away_idx = rng.gen_range(0..TEAMS.len());
        if away_idx == home_idx {
            away_idx = (away_idx + 1) % TEAMS.len();
        }
        let (tournament, venue) = TOURNAMENTS[idx % TOURNAMENTS.len()];
        // Spread creation times over the trailing month so the today/week
        // filters have something to bite on.
        let created_at = now - ChronoDuration::hours(rng.gen_range(0..24 * 30));

        out.push(AnalysisSummary {
            id: format!("sample-{:03}", idx + 1),
            home: TeamRef {
                name: TEAMS[home_idx].to_string(),
                logo: None,
            },
            away: TeamRef {
                name: TEAMS[away_idx].to_string(),
                logo: None,
            },
            score_home: rng.gen_range(0..5),
            score_away: rng.gen_range(0..4),
            tournament: TournamentRef {
                name: tournament.to_string(),
                logo: None,
            },
            venue: Some(venue.to_string()),
            date: Some(created_at - ChronoDuration::hours(3)),
            summary: SUMMARIES[idx % SUMMARIES.len()].to_string(),
            full_text: None,
            views: rng.gen_range(5..5000),
            likes: if rng.gen_bool(0.7) {
                Some(rng.gen_range(0..400))
            } else {
                None
            },
            created_at,
        });
    }
    // Newest first, the order the live API serves.
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}
