use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, stable identifier of a role or permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identity of a subject in the store: its model type plus its own id.
///
/// Subject ids are whatever the host application uses (numeric keys,
/// UUIDs, usernames), so they are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectKey {
    pub model_type: String,
    pub id: String,
}

impl SubjectKey {
    pub fn new(model_type: impl Into<String>, id: impl ToString) -> Self {
        Self {
            model_type: model_type.into(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model_type, self.id)
    }
}

/// Anything that can hold permissions directly: a role or a subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Holder {
    Role { id: EntityId },
    Subject(SubjectKey),
}

impl Holder {
    pub fn role(id: EntityId) -> Self {
        Holder::Role { id }
    }

    pub fn as_subject(&self) -> Option<&SubjectKey> {
        match self {
            Holder::Subject(key) => Some(key),
            Holder::Role { .. } => None,
        }
    }
}

impl From<SubjectKey> for Holder {
    fn from(key: SubjectKey) -> Self {
        Holder::Subject(key)
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Role { id } => write!(f, "role:{id}"),
            Holder::Subject(key) => key.fmt(f),
        }
    }
}
