use chrono::{DateTime, Utc};
use marquee_core::{MovieLookup, ShowtimeLookup, TheaterLookup};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};

const MOVIE_PLACEHOLDER: &str = "Movie Info Unavailable";
const THEATER_PLACEHOLDER: &str = "Theater Info Unavailable";

/// Booking enriched with display details from the movie/theater/showtime
/// collaborators. Enrichment is decoration only: every lookup failure
/// degrades to a placeholder, a read never fails because a collaborator is
/// down.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub user_id: String,
    pub movie_id: String,
    pub movie_title: String,
    pub movie_poster_url: String,
    pub theater_id: String,
    pub theater_name: String,
    pub theater_location: String,
    pub showtime_id: String,
    pub showtime: Option<DateTime<Utc>>,
    pub screen: Option<String>,
    pub ticket_price: Option<f64>,
    pub seats: Vec<Uuid>,
    pub seat_labels: Vec<String>,
    pub total_amount: f64,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub payment_id: Option<String>,
    pub payment_method: String,
    pub qr_code: String,
    pub ticket_number: String,
    pub refund_amount: Option<f64>,
    pub refund_date: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

pub(crate) async fn build_view(
    booking: Booking,
    showtimes: &dyn ShowtimeLookup,
    movies: &dyn MovieLookup,
    theaters: &dyn TheaterLookup,
) -> BookingView {
    let mut movie_id = String::new();
    let mut movie_title = String::new();
    let mut movie_poster_url = String::new();
    let mut theater_id = String::new();
    let mut theater_name = String::new();
    let mut theater_location = String::new();
    let mut showtime = None;
    let mut screen = booking.screen_name.clone();
    let mut ticket_price = booking.ticket_price_snapshot;

    if let Ok(details) = showtimes.get_showtime(&booking.showtime_id).await {
        movie_id = details.movie_id;
        theater_id = details.theater_id;
        showtime = Some(details.show_date_time);
        if screen.is_none() {
            screen = Some(details.screen_name);
        }
        if ticket_price.is_none() {
            ticket_price = details.ticket_price;
        }

        if !movie_id.is_empty() {
            match movies.get_movie(&movie_id).await {
                Ok(movie) => {
                    movie_title = movie.title;
                    movie_poster_url = movie.poster_url;
                }
                Err(_) => movie_title = MOVIE_PLACEHOLDER.to_string(),
            }
        }

        if !theater_id.is_empty() {
            match theaters.get_theater(&theater_id).await {
                Ok(theater) => {
                    theater_name = theater.name;
                    theater_location = match (theater.location.is_empty(), theater.city.is_empty()) {
                        (false, false) => format!("{}, {}", theater.location, theater.city),
                        (false, true) => theater.location,
                        (true, _) => theater.city,
                    };
                }
                Err(_) => theater_name = THEATER_PLACEHOLDER.to_string(),
            }
        }
    }

    BookingView {
        id: booking.id,
        user_id: booking.user_id,
        movie_id,
        movie_title,
        movie_poster_url,
        theater_id,
        theater_name,
        theater_location,
        showtime_id: booking.showtime_id,
        showtime,
        screen,
        ticket_price,
        seats: booking.seats,
        seat_labels: booking.seat_labels,
        total_amount: booking.total_amount,
        booking_date: booking.booking_date,
        status: booking.status,
        customer_name: booking.customer_name,
        customer_email: booking.customer_email,
        customer_phone: booking.customer_phone,
        payment_id: booking.payment_id,
        payment_method: booking.payment_method,
        qr_code: booking.qr_code,
        ticket_number: booking.ticket_number,
        refund_amount: booking.refund_amount,
        refund_date: booking.refund_date,
        cancellation_reason: booking.cancellation_reason,
    }
}
