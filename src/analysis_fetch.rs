use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::state::{AnalysisSummary, TeamRef, TournamentRef};

/// Failures at the API boundary. Everything else rides on anyhow context.
#[derive(Debug)]
pub enum ApiError {
    /// Non-2xx status from the server.
    Http { status: u16 },
    /// Empty body, unparseable JSON, or a `success: false` envelope.
    BadEnvelope(String),
    /// The requested analysis does not exist.
    NotFound,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http { status } => write!(f, "http {status}"),
            ApiError::BadEnvelope(msg) => write!(f, "bad envelope: {msg}"),
            ApiError::NotFound => write!(f, "analysis not found"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone)]
pub struct AnalysisPage {
    pub items: Vec<AnalysisSummary>,
    pub total: Option<u64>,
    pub pages: Option<u32>,
}

pub fn fetch_analysis_page(
    client: &Client,
    base: &str,
    page: u32,
    limit: u32,
) -> Result<AnalysisPage> {
    let url = format!("{base}/api/analysis?page={page}&limit={limit}");
    let body = get_text(client, &url)?;
    parse_analysis_page_json(&body).with_context(|| format!("bad analysis page from {url}"))
}

pub fn fetch_analysis_detail(client: &Client, base: &str, id: &str) -> Result<AnalysisSummary> {
    let url = format!("{base}/api/analysis/{id}");
    let body = get_text(client, &url)?;
    parse_analysis_detail_json(&body).with_context(|| format!("bad analysis from {url}"))
}

fn get_text(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request failed: {url}"))?;
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound.into());
    }
    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
        }
        .into());
    }
    resp.text().context("failed reading body")
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<AnalysisRow>,
    total: Option<u64>,
    pages: Option<u32>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<AnalysisRow>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnalysisRow {
    #[serde(rename = "_id", alias = "id")]
    id: Option<String>,
    #[serde(rename = "matchId")]
    match_id: Option<String>,
    #[serde(rename = "homeTeam")]
    home_team: Option<SideRow>,
    #[serde(rename = "awayTeam")]
    away_team: Option<SideRow>,
    score: Option<ScoreRow>,
    tournament: Option<TournamentRow>,
    venue: Option<String>,
    date: Option<String>,
    analysis: Option<AnalysisTextRow>,
    #[serde(default)]
    views: u64,
    likes: Option<u64>,
    #[serde(rename = "createdAt")]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SideRow {
    #[serde(default)]
    name: String,
    logo: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ScoreRow {
    #[serde(default)]
    home: i32,
    #[serde(default)]
    away: i32,
}

#[derive(Debug, Deserialize, Default)]
struct TournamentRow {
    #[serde(default)]
    name: String,
    logo: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct AnalysisTextRow {
    summary: Option<String>,
    #[serde(rename = "fullText")]
    full_text: Option<String>,
}

/// Parse a collection envelope. A non-success envelope is an error; rows
/// without any usable identifier are dropped rather than failing the page.
pub fn parse_analysis_page_json(raw: &str) -> Result<AnalysisPage> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(ApiError::BadEnvelope("empty response".to_string()).into());
    }
    let envelope: ListEnvelope = serde_json::from_str(trimmed)
        .map_err(|err| ApiError::BadEnvelope(err.to_string()))?;
    if !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| "server reported failure".to_string());
        return Err(ApiError::BadEnvelope(message).into());
    }
    Ok(AnalysisPage {
        items: envelope.data.into_iter().filter_map(row_to_summary).collect(),
        total: envelope.total,
        pages: envelope.pages,
    })
}

/// Parse a single-item envelope. `success: true` with a null payload means
/// the item is absent.
pub fn parse_analysis_detail_json(raw: &str) -> Result<AnalysisSummary> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(ApiError::BadEnvelope("empty response".to_string()).into());
    }
    let envelope: ItemEnvelope = serde_json::from_str(trimmed)
        .map_err(|err| ApiError::BadEnvelope(err.to_string()))?;
    if !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| "server reported failure".to_string());
        return Err(ApiError::BadEnvelope(message).into());
    }
    let row = envelope.data.ok_or(ApiError::NotFound)?;
    row_to_summary(row).ok_or_else(|| ApiError::BadEnvelope("row without id".to_string()).into())
}

fn row_to_summary(row: AnalysisRow) -> Option<AnalysisSummary> {
    let id = row
        .id
        .or(row.match_id)
        .filter(|id| !id.trim().is_empty())?;
    let score = row.score.unwrap_or_default();
    let text = row.analysis.unwrap_or_default();
    let created_at = row
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| row.date.as_deref().and_then(parse_timestamp))
        .unwrap_or(DateTime::UNIX_EPOCH);

    Some(AnalysisSummary {
        id,
        home: side_to_team(row.home_team),
        away: side_to_team(row.away_team),
        score_home: score.home,
        score_away: score.away,
        tournament: row
            .tournament
            .map(|t| TournamentRef {
                name: t.name,
                logo: t.logo,
            })
            .unwrap_or_else(|| TournamentRef {
                name: String::new(),
                logo: None,
            }),
        venue: row.venue.filter(|v| !v.trim().is_empty()),
        date: row.date.as_deref().and_then(parse_timestamp),
        summary: text.summary.unwrap_or_default(),
        full_text: text.full_text,
        views: row.views,
        likes: row.likes,
        created_at,
    })
}

fn side_to_team(side: Option<SideRow>) -> TeamRef {
    let side = side.unwrap_or_default();
    TeamRef {
        name: side.name,
        logo: side.logo,
    }
}

/// Timestamps arrive as RFC 3339, naive date-times, or bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
