//! Read-only views of organizational records owned elsewhere

use dt_core::traits::Id;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Id,
    pub name: String,
    pub team_id: Option<Id>,
}

impl Employee {
    pub fn new(id: Id, name: impl Into<String>, team_id: Id) -> Self {
        Self {
            id,
            name: name.into(),
            team_id: Some(team_id),
        }
    }

    pub fn belongs_to(&self, team_id: Id) -> bool {
        self.team_id == Some(team_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workstation {
    pub id: Id,
    pub name: String,
    pub team_id: Option<Id>,
}

impl Workstation {
    pub fn new(id: Id, name: impl Into<String>, team_id: Id) -> Self {
        Self {
            id,
            name: name.into(),
            team_id: Some(team_id),
        }
    }
}
