//! Volunteer application records and their status vocabulary.
//!
//! The server speaks `pending | accepted | rejected`; the dashboard speaks
//! `pending | approved | rejected`. All translation between the two happens
//! in [`ApplicationStatus::from_wire`] and [`ApplicationStatus::as_wire`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Identifier of one volunteer application, unique within an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(i64);

impl ApplicationId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Return the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = std::num::ParseIntError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim().parse().map(Self)
    }
}

/// Identifier of an organization event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Return the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = std::num::ParseIntError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim().parse().map(Self)
    }
}

/// Dashboard-side status of a volunteer application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Awaiting an organization decision.
    Pending,
    /// Accepted by the organization. The server calls this `accepted`.
    Approved,
    /// Declined by the organization.
    Rejected,
}

impl ApplicationStatus {
    /// Parse a status as reported by the server, mapping `accepted` onto
    /// [`ApplicationStatus::Approved`].
    ///
    /// # Examples
    ///
    /// ```
    /// use vconnect_client::domain::ApplicationStatus;
    ///
    /// assert_eq!(ApplicationStatus::from_wire("accepted"), Some(ApplicationStatus::Approved));
    /// assert_eq!(ApplicationStatus::from_wire("withdrawn"), None);
    /// ```
    pub fn from_wire(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        [
            ("pending", Self::Pending),
            ("approved", Self::Approved),
            ("accepted", Self::Approved),
            ("rejected", Self::Rejected),
        ]
        .into_iter()
        .find_map(|(label, status)| trimmed.eq_ignore_ascii_case(label).then_some(status))
    }

    /// Value the status-update endpoint expects in its `status` query field.
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Dashboard label, also used when persisting overrides.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a user-supplied status is not one of the three
/// dashboard values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status `{0}` (expected pending, approved or rejected)")]
pub struct UnknownApplicationStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownApplicationStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(UnknownApplicationStatus(raw.to_owned())),
        }
    }
}

/// One application as returned by the applications listing endpoint.
///
/// Decoding is lenient: ids may arrive as numbers or numeric strings, text
/// fields of the wrong JSON type decode as absent, and fields this crate does
/// not model are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerApplication {
    /// Application identifier; records without one cannot be reconciled.
    #[serde(default, deserialize_with = "lenient_integer")]
    pub application_id: Option<i64>,
    /// Applicant volunteer identifier.
    #[serde(default, deserialize_with = "lenient_integer")]
    pub volunteer_id: Option<i64>,
    /// Display name, when the server joins it in.
    #[serde(default, deserialize_with = "lenient_text")]
    pub volunteer_name: Option<String>,
    /// Raw server status (`pending`, `accepted`, `rejected`).
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    /// Submission timestamp, passed through untouched.
    #[serde(default, deserialize_with = "lenient_text")]
    pub applied_at: Option<String>,
    /// Applicant message.
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerApplication {
    /// Decode a listing payload, skipping entries that are not objects.
    pub fn decode_listing(payload: &Value) -> Vec<Self> {
        let Some(entries) = payload.as_array() else {
            warn!(
                kind = json_kind(payload),
                "applications payload is not an array; treating as empty"
            );
            return Vec::new();
        };

        entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match Self::deserialize(entry) {
                Ok(application) => Some(application),
                Err(error) => {
                    warn!(index, error = %error, "skipping undecodable application entry");
                    None
                }
            })
            .collect()
    }
}

/// Normalised application as held by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationRecord {
    /// Application identifier.
    pub application_id: ApplicationId,
    /// Applicant volunteer identifier, when known.
    pub volunteer_id: Option<i64>,
    /// Display name; synthesised from the volunteer id when missing.
    pub volunteer_name: String,
    /// Effective status after reconciliation.
    pub status: ApplicationStatus,
    /// Submission timestamp as sent by the server.
    pub applied_at: Option<String>,
    /// Applicant message, empty when absent.
    pub message: String,
    /// Server fields carried through verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Label shown for applicants the server did not name.
pub fn fallback_volunteer_name(volunteer_id: Option<i64>) -> String {
    match volunteer_id {
        Some(id) => format!("Volunteer #{id}"),
        None => "Volunteer #unknown".to_owned(),
    }
}

/// Durable map of user-chosen statuses, keyed by application id only.
///
/// The persisted form is a flat JSON object of string ids to dashboard
/// status labels, e.g. `{"7":"rejected"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusOverrides(BTreeMap<ApplicationId, ApplicationStatus>);

impl StatusOverrides {
    /// Empty override map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the override for `id`.
    pub fn get(&self, id: ApplicationId) -> Option<ApplicationStatus> {
        self.0.get(&id).copied()
    }

    /// Record `status` for `id`, returning the entry it replaced.
    pub fn insert(
        &mut self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Option<ApplicationStatus> {
        self.0.insert(id, status)
    }

    /// Drop the override for `id`, returning it when present.
    pub fn remove(&mut self, id: ApplicationId) -> Option<ApplicationStatus> {
        self.0.remove(&id)
    }

    /// Number of stored overrides.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no override is stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ApplicationId, ApplicationStatus)> + '_ {
        self.0.iter().map(|(id, status)| (*id, *status))
    }

    /// Serialise to the persisted JSON layout.
    ///
    /// # Errors
    ///
    /// Returns an error if `serde_json` fails to render the map.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let flat: BTreeMap<String, &'static str> = self
            .0
            .iter()
            .map(|(id, status)| (id.to_string(), status.as_str()))
            .collect();
        serde_json::to_string(&flat)
    }

    /// Parse the persisted JSON layout.
    ///
    /// Entries whose key is not an integer or whose value is not a known
    /// status are dropped with a warning; only a document that is not a JSON
    /// object is an error.
    ///
    /// # Errors
    ///
    /// Returns an error when `raw` is not a JSON object.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let flat: BTreeMap<String, Value> = serde_json::from_str(raw)?;
        let entries = flat
            .into_iter()
            .filter_map(|(key, value)| {
                let id = key.parse::<ApplicationId>().ok();
                let status = value.as_str().and_then(ApplicationStatus::from_wire);
                match (id, status) {
                    (Some(id), Some(status)) => Some((id, status)),
                    _ => {
                        warn!(key = %key, value = %value, "ignoring malformed status override");
                        None
                    }
                }
            })
            .collect();
        Ok(Self(entries))
    }
}

impl FromIterator<(ApplicationId, ApplicationStatus)> for StatusOverrides {
    fn from_iter<T: IntoIterator<Item = (ApplicationId, ApplicationStatus)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::String(text) => Some(text),
        _ => None,
    }))
}

pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    //! Status vocabulary, lenient decoding and override persistence format.

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("pending", Some(ApplicationStatus::Pending))]
    #[case("accepted", Some(ApplicationStatus::Approved))]
    #[case("approved", Some(ApplicationStatus::Approved))]
    #[case(" Rejected ", Some(ApplicationStatus::Rejected))]
    #[case("", None)]
    #[case("withdrawn", None)]
    fn wire_statuses_map_onto_dashboard_statuses(
        #[case] raw: &str,
        #[case] expected: Option<ApplicationStatus>,
    ) {
        assert_eq!(ApplicationStatus::from_wire(raw), expected);
    }

    #[test]
    fn approved_is_sent_as_accepted() {
        assert_eq!(ApplicationStatus::Approved.as_wire(), "accepted");
        assert_eq!(ApplicationStatus::Pending.as_wire(), "pending");
        assert_eq!(ApplicationStatus::Rejected.as_wire(), "rejected");
    }

    #[test]
    fn user_input_rejects_the_wire_synonym() {
        let error = "accepted"
            .parse::<ApplicationStatus>()
            .expect_err("accepted is not a dashboard status");
        assert_eq!(error, UnknownApplicationStatus("accepted".to_owned()));
        assert_eq!(
            "APPROVED".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::Approved)
        );
    }

    #[test]
    fn listing_decodes_mixed_id_representations() {
        let payload = json!([
            { "application_id": 7, "volunteer_id": "12", "status": "accepted", "shift": "am" },
            { "application_id": "8", "volunteer_name": 42, "message": null },
        ]);

        let decoded = ServerApplication::decode_listing(&payload);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].application_id, Some(7));
        assert_eq!(decoded[0].volunteer_id, Some(12));
        assert_eq!(decoded[0].extra.get("shift"), Some(&json!("am")));
        assert_eq!(decoded[1].application_id, Some(8));
        assert_eq!(decoded[1].volunteer_name, None);
        assert_eq!(decoded[1].message, None);
    }

    #[test]
    fn listing_skips_non_object_entries() {
        let payload = json!([42, { "application_id": 1 }]);
        let decoded = ServerApplication::decode_listing(&payload);
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn non_array_listing_is_empty() {
        assert!(ServerApplication::decode_listing(&json!({ "error": "nope" })).is_empty());
    }

    #[test]
    fn overrides_round_trip_through_flat_json() {
        let overrides: StatusOverrides = [
            (ApplicationId::new(7), ApplicationStatus::Rejected),
            (ApplicationId::new(42), ApplicationStatus::Approved),
        ]
        .into_iter()
        .collect();

        let rendered = overrides.to_json().expect("render overrides");
        assert_eq!(rendered, r#"{"42":"approved","7":"rejected"}"#);
        assert_eq!(StatusOverrides::from_json(&rendered).expect("parse"), overrides);
    }

    #[test]
    fn malformed_override_entries_are_dropped() {
        let raw = r#"{"7":"accepted","x":"pending","9":"maybe","10":3}"#;
        let parsed = StatusOverrides::from_json(raw).expect("object parses");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get(ApplicationId::new(7)), Some(ApplicationStatus::Approved));
    }

    #[test]
    fn override_document_must_be_an_object() {
        assert!(StatusOverrides::from_json("[]").is_err());
    }

    #[rstest]
    #[case(Some(12), "Volunteer #12")]
    #[case(None, "Volunteer #unknown")]
    fn fallback_names_use_the_volunteer_id(#[case] id: Option<i64>, #[case] expected: &str) {
        assert_eq!(fallback_volunteer_name(id), expected);
    }
}
