use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Showtime details as served by the showtime service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowtimeDetails {
    pub id: String,
    pub movie_id: String,
    pub theater_id: String,
    pub screen_name: String,
    pub show_date_time: DateTime<Utc>,
    pub ticket_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: String,
    pub title: String,
    pub poster_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TheaterSummary {
    pub id: String,
    pub name: String,
    pub location: String,
    pub city: String,
}

/// Screen layout as configured in the theater service. One cell per physical
/// seat position; cells with status "disabled" produce no seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenLayout {
    pub rows: u32,
    pub seats_per_row: u32,
    pub categories: Vec<SeatCategorySpec>,
    pub cells: Vec<LayoutCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatCategorySpec {
    pub id: String,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutCell {
    pub row: u32,
    pub col: u32,
    pub category_id: String,
    pub status: String,
}

impl LayoutCell {
    pub fn is_enabled(&self) -> bool {
        self.status != "disabled"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Load-bearing inside the saga, optional enrichment everywhere else.
#[async_trait]
pub trait ShowtimeLookup: Send + Sync {
    async fn get_showtime(&self, id: &str) -> Result<ShowtimeDetails, LookupError>;
}

#[async_trait]
pub trait MovieLookup: Send + Sync {
    async fn get_movie(&self, id: &str) -> Result<MovieSummary, LookupError>;
}

#[async_trait]
pub trait TheaterLookup: Send + Sync {
    async fn get_theater(&self, id: &str) -> Result<TheaterSummary, LookupError>;
}

#[async_trait]
pub trait ScreenLayoutLookup: Send + Sync {
    async fn get_screen_layout(&self, screen_id: &str) -> Result<ScreenLayout, LookupError>;
}

/// Stand-in for collaborators that have no configured endpoint. Every call
/// fails, which callers on enrichment paths degrade to placeholders.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredLookup;

#[async_trait]
impl ShowtimeLookup for UnconfiguredLookup {
    async fn get_showtime(&self, _id: &str) -> Result<ShowtimeDetails, LookupError> {
        Err(LookupError::Unavailable("showtime service not configured".into()))
    }
}

#[async_trait]
impl MovieLookup for UnconfiguredLookup {
    async fn get_movie(&self, _id: &str) -> Result<MovieSummary, LookupError> {
        Err(LookupError::Unavailable("movie service not configured".into()))
    }
}

#[async_trait]
impl TheaterLookup for UnconfiguredLookup {
    async fn get_theater(&self, _id: &str) -> Result<TheaterSummary, LookupError> {
        Err(LookupError::Unavailable("theater service not configured".into()))
    }
}

#[async_trait]
impl ScreenLayoutLookup for UnconfiguredLookup {
    async fn get_screen_layout(&self, _screen_id: &str) -> Result<ScreenLayout, LookupError> {
        Err(LookupError::Unavailable("theater service not configured".into()))
    }
}
