//! Project tracker port: issues, labels and project boards.

use std::collections::BTreeSet;

use super::PortFuture;
use crate::model::{Card, ColumnRef, LabelInfo, NewIssue, ProjectBoard, TargetIssue};

/// Access to the repository that holds mirror issues.
///
/// Issues are addressed by number, cards and columns by id.
pub trait ProjectTracker: Send + Sync {
    /// Lists every label defined in the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the labels cannot be listed.
    fn list_labels(&self) -> PortFuture<'_, Vec<LabelInfo>>;

    /// Lists issues, open and closed, carrying the given label.
    ///
    /// # Errors
    ///
    /// Returns an error if the issues cannot be listed.
    fn list_issues_by_label(&self, label: &str) -> PortFuture<'_, Vec<TargetIssue>>;

    /// Creates an issue and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be created.
    fn create_issue(&self, issue: &NewIssue) -> PortFuture<'_, TargetIssue>;

    /// Replaces the issue's title and body.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be updated.
    fn update_content(&self, number: u64, title: &str, body: &str) -> PortFuture<'_, ()>;

    /// Replaces the issue's full label set.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be updated.
    fn update_labels(&self, number: u64, labels: &BTreeSet<String>) -> PortFuture<'_, ()>;

    /// Opens or closes the issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be updated.
    fn set_open_state(&self, number: u64, open: bool) -> PortFuture<'_, ()>;

    /// Makes `login` the issue's only assignee.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be updated.
    fn set_assignee(&self, number: u64, login: &str) -> PortFuture<'_, ()>;

    /// Posts a comment on the issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the comment cannot be created.
    fn add_comment(&self, number: u64, body: &str) -> PortFuture<'_, ()>;

    /// Lists the owner's project boards with their columns and cards.
    ///
    /// # Errors
    ///
    /// Returns an error if any board, column or card listing fails.
    fn list_project_boards(&self) -> PortFuture<'_, Vec<ProjectBoard>>;

    /// Returns the column a card is currently in.
    ///
    /// # Errors
    ///
    /// Returns an error if the card cannot be read.
    fn get_project_column(&self, card_id: u64) -> PortFuture<'_, ColumnRef>;

    /// Moves a card to the bottom of a column.
    ///
    /// # Errors
    ///
    /// Returns an error if the card cannot be moved.
    fn move_card(&self, card_id: u64, column_id: u64) -> PortFuture<'_, ()>;

    /// Adds a card for an issue to a column. `issue_id` is [`TargetIssue::id`].
    ///
    /// # Errors
    ///
    /// Returns an error if the card cannot be created.
    fn create_card(&self, column_id: u64, issue_id: u64) -> PortFuture<'_, Card>;
}
