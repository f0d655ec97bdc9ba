use chrono::{DateTime, Utc};
use db::{
    models::task::{NewTask, TaskMetadata},
    types::{AssignmentMode, EscrowStatus, TaskPriority, TaskStatus},
};
use points::Settlement;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};

const MAX_TITLE_LEN: usize = 300;
const MAX_LABELS: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: Option<String>,
    #[serde(alias = "description")]
    pub content: Option<String>,
    pub url: Option<String>,
    pub points: Option<i64>,
    pub deadline: Option<DateTime<Utc>>,
    pub acceptance_criteria: Option<String>,
    pub tests: Option<String>,
    pub assignment_mode: Option<AssignmentMode>,
    pub priority: Option<TaskPriority>,
    pub labels: Option<Vec<String>>,
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub estimated_effort: Option<String>,
    #[serde(default)]
    pub escrow: bool,
}

impl CreateTask {
    /// Checks required fields and builds the row. Escrow amounts are filled in
    /// when `escrow` is set.
    pub fn into_new_task(self) -> Result<NewTask> {
        let title = non_empty(self.title)
            .ok_or_else(|| TaskError::Validation("title is required.".to_string()))?;
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(TaskError::Validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters."
            )));
        }
        let content = non_empty(self.content).ok_or_else(|| {
            TaskError::Validation("description (or content) is required.".to_string())
        })?;
        let points = match self.points {
            Some(points) if points >= 1 => points,
            _ => {
                return Err(TaskError::Validation(
                    "points must be a positive integer.".to_string(),
                ));
            }
        };

        let (poster_escrow, escrow_status) = if self.escrow {
            (points, EscrowStatus::PosterHeld)
        } else {
            (0, EscrowStatus::None)
        };

        Ok(NewTask {
            title,
            content,
            url: non_empty(self.url),
            points,
            priority: self.priority.unwrap_or_default(),
            assignment_mode: self.assignment_mode.unwrap_or_default(),
            deadline: self.deadline,
            poster_escrow,
            escrow_status,
            labels: normalize_labels(self.labels.unwrap_or_default())?,
            repo_url: non_empty(self.repo_url),
            branch: non_empty(self.branch),
            pr_url: None,
            estimated_effort: non_empty(self.estimated_effort),
            acceptance_criteria: non_empty(self.acceptance_criteria),
            tests: non_empty(self.tests),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignTask {
    pub handle: Option<String>,
}

impl AssignTask {
    pub fn handle(&self) -> Result<String> {
        self.handle
            .as_deref()
            .map(|handle| handle.trim().trim_start_matches('@').to_string())
            .filter(|handle| !handle.is_empty())
            .ok_or_else(|| TaskError::Validation("handle is required.".to_string()))
    }
}

/// Body of the generic PATCH. Empty strings clear a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub labels: Option<Vec<String>>,
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub pr_url: Option<String>,
    pub estimated_effort: Option<String>,
}

impl UpdateTask {
    pub fn metadata(&self) -> Result<TaskMetadata> {
        Ok(TaskMetadata {
            priority: self.priority,
            labels: self.labels.clone().map(normalize_labels).transpose()?,
            repo_url: clearable(&self.repo_url),
            branch: clearable(&self.branch),
            pr_url: clearable(&self.pr_url),
            estimated_effort: clearable(&self.estimated_effort),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettleTask {
    pub assignee_payout: Option<i64>,
    pub poster_refund: Option<i64>,
    pub assignee_escrow_return: Option<i64>,
    pub assignee_escrow_penalty: Option<i64>,
    pub reason: Option<String>,
}

impl SettleTask {
    pub fn settlement(&self) -> Result<Settlement> {
        match (
            self.assignee_payout,
            self.poster_refund,
            self.assignee_escrow_return,
            self.assignee_escrow_penalty,
        ) {
            (Some(assignee_payout), Some(poster_refund), Some(return_), Some(penalty))
                if [assignee_payout, poster_refund, return_, penalty]
                    .iter()
                    .all(|amount| *amount >= 0) =>
            {
                Ok(Settlement {
                    assignee_payout,
                    poster_refund,
                    assignee_escrow_return: return_,
                    assignee_escrow_penalty: penalty,
                })
            }
            _ => Err(TaskError::Conservation(
                "All settlement amounts must be non-negative integers.".to_string(),
            )),
        }
    }

    pub fn reason(&self) -> String {
        non_empty(self.reason.clone()).unwrap_or_else(|| "Settlement".to_string())
    }
}

/// Trimmed, lower-cased and deduplicated in first-seen order.
pub fn normalize_labels(labels: Vec<String>) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::new();
    for label in labels {
        let label = label.trim().to_lowercase();
        if !label.is_empty() && !normalized.contains(&label) {
            normalized.push(label);
        }
    }
    if normalized.len() > MAX_LABELS {
        return Err(TaskError::Validation(format!(
            "At most {MAX_LABELS} labels are allowed."
        )));
    }
    Ok(normalized)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn clearable(value: &Option<String>) -> Option<Option<String>> {
    value.as_ref().map(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
