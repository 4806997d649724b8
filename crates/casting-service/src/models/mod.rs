//! Casting Agency models.
//!
//! Entities as stored and rendered, request bodies as received, and the
//! validated forms handlers pass to repositories.

use crate::errors::CastingError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Date format accepted in request bodies and used in responses.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Movie as stored and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub release_date: NaiveDate,
}

/// Actor as stored and rendered.
///
/// The birth date is read from `dob` in request bodies but rendered as
/// `"date of birth"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: i32,
    pub name: String,
    #[serde(rename = "date of birth")]
    pub date_of_birth: NaiveDate,
    pub gender: String,
}

// ============================================================================
// Create
// ============================================================================

/// Body of `POST /movies`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateMovieRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Body of `POST /actors`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateActorRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// Validated fields for a new movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: NaiveDate,
}

/// Validated fields for a new actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActor {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
}

pub const MOVIE_REQUIRED_MESSAGE: &str = "Title and release date are required.";
pub const ACTOR_REQUIRED_MESSAGE: &str = "Actor name, dob and gender is required";

impl CreateMovieRequest {
    /// Check required fields and parse the release date.
    ///
    /// # Errors
    ///
    /// `CastingError::BadRequest` when a field is missing, blank, or the date
    /// is not `YYYY-MM-DD`.
    pub fn validate(self) -> Result<NewMovie, CastingError> {
        let (Some(title), Some(release_date)) = (non_blank(self.title), non_blank(self.release_date))
        else {
            return Err(CastingError::BadRequest(MOVIE_REQUIRED_MESSAGE.to_string()));
        };

        let release_date = parse_date(&release_date).ok_or_else(|| {
            CastingError::BadRequest("release_date must be a date in YYYY-MM-DD format.".to_string())
        })?;

        Ok(NewMovie {
            title,
            release_date,
        })
    }
}

impl CreateActorRequest {
    /// Check required fields and parse the birth date.
    ///
    /// # Errors
    ///
    /// `CastingError::BadRequest` when a field is missing, blank, or `dob` is
    /// not `YYYY-MM-DD`.
    pub fn validate(self) -> Result<NewActor, CastingError> {
        let (Some(name), Some(dob), Some(gender)) = (
            non_blank(self.name),
            non_blank(self.dob),
            non_blank(self.gender),
        ) else {
            return Err(CastingError::BadRequest(ACTOR_REQUIRED_MESSAGE.to_string()));
        };

        let date_of_birth = parse_date(&dob).ok_or_else(|| {
            CastingError::BadRequest("dob must be a date in YYYY-MM-DD format.".to_string())
        })?;

        Ok(NewActor {
            name,
            date_of_birth,
            gender,
        })
    }
}

// ============================================================================
// Update
// ============================================================================

/// Body of `PATCH /movies/{id}`.
///
/// Outer `None` means the field was absent; `Some(None)` means it was `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMovieRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub release_date: Option<Option<String>>,
}

/// Body of `PATCH /actors/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateActorRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub dob: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Option<String>>,
}

/// Validated movie changes. `None` leaves the column as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
}

/// Validated actor changes. `None` leaves the column as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorChanges {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

impl UpdateMovieRequest {
    /// # Errors
    ///
    /// `CastingError::Unprocessable` when a present field is null, blank, or
    /// an invalid date.
    pub fn validate(self) -> Result<MovieChanges, CastingError> {
        Ok(MovieChanges {
            title: self.title.map(required_text).transpose()?,
            release_date: self.release_date.map(required_date).transpose()?,
        })
    }
}

impl UpdateActorRequest {
    /// # Errors
    ///
    /// `CastingError::Unprocessable` when a present field is null, blank, or
    /// an invalid date.
    pub fn validate(self) -> Result<ActorChanges, CastingError> {
        Ok(ActorChanges {
            name: self.name.map(required_text).transpose()?,
            date_of_birth: self.dob.map(required_date).transpose()?,
            gender: self.gender.map(required_text).transpose()?,
        })
    }
}

impl MovieChanges {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(release_date) = self.release_date {
            movie.release_date = release_date;
        }
    }
}

impl ActorChanges {
    pub fn apply(self, actor: &mut Actor) {
        if let Some(name) = self.name {
            actor.name = name;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            actor.date_of_birth = date_of_birth;
        }
        if let Some(gender) = self.gender {
            actor.gender = gender;
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Body of a successful `PATCH /movies/{id}`.
#[derive(Debug, Serialize)]
pub struct MovieUpdated {
    pub success: bool,
    pub movie: Movie,
}

/// Body of a successful `PATCH /actors/{id}`.
#[derive(Debug, Serialize)]
pub struct ActorUpdated {
    pub success: bool,
    pub actor: Actor,
}

/// Readiness check response.
///
/// Returned by the `/ready` endpoint (readiness probe).
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,

    /// Error message (generic, no infrastructure details).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Deserialize a field that may be absent, `null`, or a value.
///
/// Used with `#[serde(default)]`: absence leaves the outer `None`, while an
/// explicit `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn required_text(value: Option<String>) -> Result<String, CastingError> {
    non_blank(value).ok_or_else(CastingError::unprocessable)
}

fn required_date(value: Option<String>) -> Result<NaiveDate, CastingError> {
    let text = required_text(value)?;
    parse_date(&text).ok_or_else(CastingError::unprocessable)
}
