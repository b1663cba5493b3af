//! Named subview predicates.
//!
//! A subview selects applications by id, group subtree, team, or status.
//! An application matches when it satisfies at least one include criterion
//! (or no include criterion is declared at all) and is not explicitly
//! excluded. Matching looks at the application alone, so filtering is
//! monotonic: the result holds exactly the matching applications.

use serde::{Deserialize, Serialize};

use crate::model::application::{Application, Status};
use crate::model::group::{normalize_path, path_within};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SubView {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_applications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_teams: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_statuses: Vec<Status>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_applications: Vec<String>,
}

impl SubView {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn has_include_criteria(&self) -> bool {
        !(self.include_applications.is_empty()
            && self.include_groups.is_empty()
            && self.include_teams.is_empty()
            && self.include_statuses.is_empty())
    }

    /// Evaluate the predicate for one application.
    #[must_use]
    pub fn matches(&self, app: &Application) -> bool {
        if self.exclude_applications.iter().any(|id| id == &app.id) {
            return false;
        }
        if !self.has_include_criteria() {
            return true;
        }

        let by_id = self.include_applications.iter().any(|id| id == &app.id);
        let by_group = app.group.as_deref().is_some_and(|path| {
            self.include_groups
                .iter()
                .filter_map(|g| normalize_path(g))
                .any(|prefix| path_within(path, &prefix))
        });
        let by_team = app
            .team
            .as_deref()
            .is_some_and(|team| self.include_teams.iter().any(|t| t == team));
        let by_status = self.include_statuses.contains(&app.status);

        by_id || by_group || by_team || by_status
    }
}
