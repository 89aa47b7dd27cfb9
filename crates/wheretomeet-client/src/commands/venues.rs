//! Venues command.
//!
//! Lists venue candidates around an explicit coordinate pair, or around
//! the midpoint of a meeting. The midpoint is computed client-side from
//! the fetched record, so the anchor printed here matches what the user
//! was shown.

use wheretomeet_core::Venue;
use wheretomeet_protocol::{Request, Response};

use crate::error::{ClientError, ClientResult};
use crate::socket::SocketClient;

/// Lists venues around an explicit coordinate pair.
pub async fn at(client: &SocketClient, lat: f64, lng: f64, json: bool) -> ClientResult<()> {
    let response = client.send(Request::nearby_venues(lat, lng)).await?;
    print_venues_response(response, json)
}

/// Lists venues around the midpoint of a meeting.
pub async fn for_meeting(client: &SocketClient, meeting_id: &str, json: bool) -> ClientResult<()> {
    let response = client.send(Request::get_meeting(meeting_id)).await?;
    let meeting = match response {
        Response::Meeting { meeting, .. } => meeting,
        Response::Error { error } => return Err(error.into()),
        other => {
            return Err(ClientError::Protocol(format!(
                "unexpected response: {:?}",
                other
            )));
        }
    };

    let Some(midpoint) = meeting.midpoint() else {
        return Err(ClientError::Server(format!(
            "meeting {} does not have both locations yet (status: {})",
            meeting.id, meeting.status
        )));
    };

    if !json {
        println!("Midpoint: {},{}", midpoint.lat, midpoint.lng);
    }

    let response = client
        .send(Request::nearby_venues(midpoint.lat, midpoint.lng))
        .await?;
    print_venues_response(response, json)
}

fn print_venues_response(response: Response, json: bool) -> ClientResult<()> {
    match response {
        Response::Venues { venues } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&venues).unwrap_or_default()
                );
            } else if venues.is_empty() {
                println!("No venues found.");
            } else {
                for venue in &venues {
                    print_venue(venue);
                }
            }
            Ok(())
        }
        Response::Error { error } => Err(error.into()),
        other => Err(ClientError::Protocol(format!(
            "unexpected response: {:?}",
            other
        ))),
    }
}

fn print_venue(venue: &Venue) {
    let price = if venue.price_level > 0 {
        "$".repeat(venue.price_level as usize)
    } else {
        "-".to_string()
    };
    println!(
        "{}  {}  rating {:.1}  price {}",
        venue.id, venue.name, venue.rating, price
    );
    println!("    {}", venue.address);
}
