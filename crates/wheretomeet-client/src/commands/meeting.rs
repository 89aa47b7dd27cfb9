//! Meeting commands: create, get, join, schedule.

use wheretomeet_core::{Location, Meeting};
use wheretomeet_protocol::{Request, Response};

use crate::error::{ClientError, ClientResult};
use crate::socket::SocketClient;

/// Creates a new meeting and prints the shareable link.
pub async fn create(
    client: &SocketClient,
    creator_id: &str,
    location: &str,
    json: bool,
) -> ClientResult<()> {
    let response = client
        .send(Request::create_meeting(creator_id, Location::raw(location)))
        .await?;
    print_meeting_response(response, json)
}

/// Fetches and prints a meeting record.
pub async fn get(client: &SocketClient, meeting_id: &str, json: bool) -> ClientResult<()> {
    let response = client.send(Request::get_meeting(meeting_id)).await?;
    print_meeting_response(response, json)
}

/// Joins a meeting with the invitee's location.
pub async fn join(
    client: &SocketClient,
    meeting_id: &str,
    location: &str,
    json: bool,
) -> ClientResult<()> {
    let response = client
        .send(Request::join_meeting(meeting_id, Location::raw(location)))
        .await?;
    print_meeting_response(response, json)
}

/// Schedules a meeting at the chosen venue.
pub async fn schedule(
    client: &SocketClient,
    meeting_id: &str,
    venue_id: &str,
    json: bool,
) -> ClientResult<()> {
    let response = client
        .send(Request::schedule_meeting(meeting_id, venue_id))
        .await?;

    match response {
        Response::Scheduled {
            event_id,
            event_link,
        } => {
            if json {
                let value = serde_json::json!({
                    "event_id": event_id,
                    "event_link": event_link,
                });
                println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            } else {
                println!("Scheduled. Calendar event: {}", event_link);
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

/// Prints a meeting response, or surfaces the server error.
fn print_meeting_response(response: Response, json: bool) -> ClientResult<()> {
    match response {
        Response::Meeting { meeting, link } => {
            if json {
                let value = serde_json::json!({
                    "meeting": meeting,
                    "link": link,
                });
                println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            } else {
                print_meeting(&meeting, &link);
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

fn print_meeting(meeting: &Meeting, link: &str) {
    println!("Meeting {}", meeting.id);
    println!("  status:  {}", meeting.status);
    println!("  creator: {}", meeting.creator_id);
    println!("  link:    {}", link);
    if let Some(midpoint) = meeting.midpoint() {
        println!("  midpoint: {},{}", midpoint.lat, midpoint.lng);
    }
    if let Some(ref venue) = meeting.selected_venue {
        println!("  venue:   {} ({})", venue.name, venue.address);
    }
    if let Some(ref event_id) = meeting.calendar_event_id {
        println!("  event:   {}", event_id);
    }
}
