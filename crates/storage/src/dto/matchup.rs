use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::{MatchupError, Result};
use crate::models::{
    MatchupId, MatchupRecord, MatchupStatus, Participant, SkillLevel, UserId,
};

/// Creation form as filled in by the user. The creator is taken from the session.
#[derive(Debug, Clone)]
pub struct MatchupDraft {
    pub title: String,
    pub description: String,
    pub sport: String,
    pub location: String,
    pub max_participants: u32,
    pub skill_level: SkillLevel,
    pub event_date: DateTime<Utc>,
}

/// Request payload for `POST /matchups`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchupRequest {
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "not_blank", message = "Title is required")
    )]
    pub title: String,

    pub description: String,

    #[validate(
        length(max = 100),
        custom(function = "not_blank", message = "Sport is required")
    )]
    pub sport: String,

    #[validate(
        length(max = 255),
        custom(function = "not_blank", message = "Location is required")
    )]
    pub location: String,

    #[validate(range(min = 1, message = "Max participants must be at least 1"))]
    pub max_participants: u32,

    pub skill_level: SkillLevel,

    pub event_date: DateTime<Utc>,

    pub creator_id: UserId,
}

fn not_blank(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        Err(validator::ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

impl CreateMatchupRequest {
    pub fn from_draft(draft: MatchupDraft, creator_id: UserId) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            sport: draft.sport,
            location: draft.location,
            max_participants: draft.max_participants,
            skill_level: draft.skill_level,
            event_date: draft.event_date,
            creator_id,
        }
    }

    /// Field validation plus the schedule rule: the event must lie strictly after `now`.
    pub fn check(&self, now: DateTime<Utc>) -> Result<()> {
        self.validate()
            .map_err(|e| MatchupError::Validation(describe(&e)))?;

        if self.event_date <= now {
            return Err(MatchupError::Validation(
                "Event date must be in the future".to_string(),
            ));
        }

        Ok(())
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                format!(
                    "{}: {}",
                    field,
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                )
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Timestamps arrive either as ISO-8601 text or as epoch milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireDate {
    Millis(i64),
    Text(String),
}

impl WireDate {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            WireDate::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            WireDate::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .map(|naive| Utc.from_utc_datetime(&naive))
                })
                .ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPayload {
    pub id: Option<i64>,
    pub display_name: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub username: Option<String>,
}

impl ParticipantPayload {
    fn display_name(&self) -> String {
        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(name) = non_empty(&self.display_name) {
            return name;
        }
        match (non_empty(&self.firstname), non_empty(&self.lastname)) {
            (Some(first), Some(last)) => return format!("{} {}", first, last),
            (Some(only), None) | (None, Some(only)) => return only,
            (None, None) => {}
        }
        non_empty(&self.username).unwrap_or_else(|| "Unknown User".to_string())
    }
}

/// Loosely typed matchup as sent by the remote API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupPayload {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub sport: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<WireDate>,
    pub max_participants: Option<i64>,
    pub skill_level: Option<String>,
    #[serde(alias = "createdBy")]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub participants: Vec<ParticipantPayload>,
    pub status: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: Option<WireDate>,
}

fn required<T>(value: Option<T>, field: &str, id: Option<i64>) -> Result<T> {
    value.ok_or_else(|| {
        MatchupError::Malformed(match id {
            Some(id) => format!("matchup {}: missing field '{}'", id, field),
            None => format!("missing field '{}'", field),
        })
    })
}

impl TryFrom<MatchupPayload> for MatchupRecord {
    type Error = MatchupError;

    fn try_from(payload: MatchupPayload) -> Result<Self> {
        let raw_id = payload.id;
        let id = MatchupId(required(raw_id, "id", None)?);
        let malformed = |msg: String| MatchupError::Malformed(format!("matchup {}: {}", id, msg));

        let title = required(payload.title, "title", raw_id)?;
        let sport = required(payload.sport, "sport", raw_id)?;
        let location = required(payload.location, "location", raw_id)?;
        let event_date = required(payload.event_date, "eventDate", raw_id)?
            .to_utc()
            .ok_or_else(|| malformed("unreadable eventDate".to_string()))?;

        let max_raw = required(payload.max_participants, "maxParticipants", raw_id)?;
        let max_participants = u32::try_from(max_raw)
            .ok()
            .filter(|max| *max >= 1)
            .ok_or_else(|| malformed(format!("invalid maxParticipants {}", max_raw)))?;

        let skill_level = required(payload.skill_level, "skillLevel", raw_id)?
            .parse::<SkillLevel>()
            .map_err(|e| malformed(e.to_string()))?;

        let creator_id = UserId(required(payload.creator_id, "creatorId", raw_id)?);

        let status = match required(payload.status, "status", raw_id)?
            .trim()
            .to_lowercase()
            .as_str()
        {
            "open" => MatchupStatus::Open,
            "closed" => MatchupStatus::Closed,
            other => return Err(malformed(format!("unknown status '{}'", other))),
        };

        let mut seen = HashSet::new();
        let mut participants = Vec::with_capacity(payload.participants.len());
        for p in &payload.participants {
            let pid = UserId(p.id.ok_or_else(|| malformed("participant without id".to_string()))?);
            if !seen.insert(pid) {
                return Err(malformed(format!("duplicate participant {}", pid)));
            }
            participants.push(Participant::new(pid, p.display_name()));
        }

        if participants.len() > max_participants as usize {
            return Err(malformed(format!(
                "{} participants exceed capacity {}",
                participants.len(),
                max_participants
            )));
        }

        Ok(Self {
            id,
            title,
            sport,
            location,
            description: payload.description.unwrap_or_default(),
            event_date,
            max_participants,
            skill_level,
            creator_id,
            participants,
            status,
            contact_email: payload.contact_email,
            created_at: payload.created_at.as_ref().and_then(WireDate::to_utc),
        })
    }
}
