//! Static sample payloads served while the API is unreachable.

use std::sync::LazyLock;

use serde_json::{Value, json};

static SAMPLE_EVENTS: LazyLock<Vec<Value>> = LazyLock::new(|| {
    vec![
        json!({
            "event_id": 1,
            "title": "Community Cleanup",
            "description": "Help clean up the local park and surrounding areas. Bring gloves and comfortable shoes.",
            "event_date": "2025-09-15",
            "location": "Central Park",
            "status": "active",
            "start_time": "09:00:00",
            "end_time": "13:00:00",
            "required_volunteers": 20,
            "organization_id": 1,
            "created_at": "2025-08-01"
        }),
        json!({
            "event_id": 2,
            "title": "Food Drive",
            "description": "Collecting non-perishable food items for local food banks.",
            "event_date": "2025-10-05",
            "location": "Community Center",
            "status": "active",
            "start_time": "10:00:00",
            "end_time": "16:00:00",
            "required_volunteers": 15,
            "organization_id": 2,
            "created_at": "2025-08-10"
        }),
        json!({
            "event_id": 3,
            "title": "Charity Run",
            "description": "Annual 5K charity run to raise funds for children's education.",
            "event_date": "2025-11-20",
            "location": "Downtown",
            "status": "active",
            "start_time": "07:30:00",
            "end_time": "12:00:00",
            "required_volunteers": 25,
            "organization_id": 3,
            "created_at": "2025-08-15"
        }),
    ]
});

static SAMPLE_CONTRIBUTIONS: LazyLock<Vec<Value>> = LazyLock::new(|| {
    vec![
        json!({ "volunteer_id": 101, "name": "Alex Johnson", "total_hours": 12, "avg_rating": 4.8 }),
        json!({ "volunteer_id": 102, "name": "Sam Wilson", "total_hours": 8, "avg_rating": 4.5 }),
        json!({ "volunteer_id": 103, "name": "Taylor Chen", "total_hours": 15, "avg_rating": 4.9 }),
    ]
});

/// Sample records for `endpoint`.
///
/// Matching is by substring in priority order: `contributions` first, then
/// `pub/events`; anything else yields an empty slice. The returned slice is
/// the same static data on every call.
///
/// # Examples
///
/// ```
/// use vconnect_client::domain::get_mock_payload;
///
/// assert_eq!(get_mock_payload("pub/events/").len(), 3);
/// assert!(get_mock_payload("api/admin/organizations").is_empty());
/// ```
pub fn get_mock_payload(endpoint: &str) -> &'static [Value] {
    if endpoint.contains("contributions") {
        SAMPLE_CONTRIBUTIONS.as_slice()
    } else if endpoint.contains("pub/events") {
        SAMPLE_EVENTS.as_slice()
    } else {
        &[]
    }
}
