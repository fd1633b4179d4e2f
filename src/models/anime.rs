//! Anime model

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Anime record
///
/// `id` is absent until the store assigns one. A missing or `null` `name` in a
/// request body deserializes to an empty string so it fails validation like `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate, ToSchema)]
pub struct Anime {
    #[schema(example = 1)]
    pub id: Option<i32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Dragon Ball")]
    pub name: String,
}

impl Anime {
    /// New, not yet persisted anime
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(self, id: i32) -> Self {
        Self { id: Some(id), ..self }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn without_id(self) -> Self {
        Self { id: None, ..self }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank")
            .with_message(Cow::Borrowed("The name of this anime cannot be empty")));
    }
    Ok(())
}
