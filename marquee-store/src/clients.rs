use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use marquee_core::{
    LayoutCell, LookupError, MovieLookup, MovieSummary, ScreenLayout, ScreenLayoutLookup,
    SeatCategorySpec, ShowtimeDetails, ShowtimeLookup, TheaterLookup, TheaterSummary,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: String) -> Result<T, LookupError> {
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| LookupError::Unavailable(e.to_string()))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(LookupError::NotFound(url));
    }
    if !response.status().is_success() {
        return Err(LookupError::Unavailable(format!("{url} returned {}", response.status())));
    }

    response.json().await.map_err(|e| LookupError::Unavailable(e.to_string()))
}

fn base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// The showtime service serializes its datetime without a timezone; treat it
/// as UTC and fall back to "now" on garbage rather than failing the lookup.
fn parse_show_datetime(raw: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return naive.and_utc();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    warn!(raw, "unparseable showtime datetime, substituting now");
    Utc::now()
}

pub struct HttpShowtimeLookup {
    base_url: String,
    http: reqwest::Client,
}

impl HttpShowtimeLookup {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base(base_url), http: reqwest::Client::new() }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShowtimeWire {
    id: String,
    movie_id: String,
    theater_id: String,
    #[serde(default)]
    screen: String,
    show_date_time: String,
    ticket_price: Option<f64>,
}

#[async_trait]
impl ShowtimeLookup for HttpShowtimeLookup {
    async fn get_showtime(&self, id: &str) -> Result<ShowtimeDetails, LookupError> {
        let wire: ShowtimeWire =
            get_json(&self.http, format!("{}/api/showtimes/{id}", self.base_url)).await?;
        Ok(ShowtimeDetails {
            id: wire.id,
            movie_id: wire.movie_id,
            theater_id: wire.theater_id,
            screen_name: wire.screen,
            show_date_time: parse_show_datetime(&wire.show_date_time),
            ticket_price: wire.ticket_price,
        })
    }
}

pub struct HttpMovieLookup {
    base_url: String,
    http: reqwest::Client,
}

impl HttpMovieLookup {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base(base_url), http: reqwest::Client::new() }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieWire {
    id: String,
    title: String,
    #[serde(default)]
    poster_url: String,
}

#[async_trait]
impl MovieLookup for HttpMovieLookup {
    async fn get_movie(&self, id: &str) -> Result<MovieSummary, LookupError> {
        let wire: MovieWire =
            get_json(&self.http, format!("{}/api/movies/{id}", self.base_url)).await?;
        Ok(MovieSummary { id: wire.id, title: wire.title, poster_url: wire.poster_url })
    }
}

pub struct HttpTheaterLookup {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTheaterLookup {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base(base_url), http: reqwest::Client::new() }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TheaterWire {
    id: String,
    name: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    city: String,
}

#[async_trait]
impl TheaterLookup for HttpTheaterLookup {
    async fn get_theater(&self, id: &str) -> Result<TheaterSummary, LookupError> {
        let wire: TheaterWire =
            get_json(&self.http, format!("{}/api/theaters/{id}", self.base_url)).await?;
        Ok(TheaterSummary {
            id: wire.id,
            name: wire.name,
            location: wire.location,
            city: wire.city,
        })
    }
}

pub struct HttpScreenLayoutLookup {
    base_url: String,
    http: reqwest::Client,
}

impl HttpScreenLayoutLookup {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base(base_url), http: reqwest::Client::new() }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScreenConfigWire {
    #[serde(default)]
    rows: u32,
    #[serde(default)]
    seats_per_row: u32,
    #[serde(default)]
    categories: Vec<CategoryWire>,
    seat_map: Vec<CellWire>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryWire {
    id: String,
    #[serde(default)]
    name: String,
    price: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellWire {
    row: u32,
    col: u32,
    category_id: String,
    #[serde(default)]
    status: String,
}

#[async_trait]
impl ScreenLayoutLookup for HttpScreenLayoutLookup {
    async fn get_screen_layout(&self, screen_id: &str) -> Result<ScreenLayout, LookupError> {
        let wire: ScreenConfigWire =
            get_json(&self.http, format!("{}/api/screens/{screen_id}/config", self.base_url))
                .await?;
        Ok(ScreenLayout {
            rows: wire.rows,
            seats_per_row: wire.seats_per_row,
            categories: wire
                .categories
                .into_iter()
                .map(|c| SeatCategorySpec { id: c.id, name: c.name, price: c.price })
                .collect(),
            cells: wire
                .seat_map
                .into_iter()
                .map(|c| LayoutCell {
                    row: c.row,
                    col: c.col,
                    category_id: c.category_id,
                    status: c.status,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_datetime_accepts_the_usual_formats() {
        let iso = parse_show_datetime("2026-08-07T18:30:00");
        assert_eq!(iso.to_rfc3339(), "2026-08-07T18:30:00+00:00");

        let spaced = parse_show_datetime("2026-08-07 18:30:00");
        assert_eq!(spaced, iso);

        let zoned = parse_show_datetime("2026-08-07T18:30:00+05:30");
        assert_eq!(zoned.to_rfc3339(), "2026-08-07T13:00:00+00:00");
    }

    #[test]
    fn garbage_datetime_degrades_instead_of_failing() {
        let before = Utc::now();
        let parsed = parse_show_datetime("next tuesday");
        assert!(parsed >= before);
    }
}
