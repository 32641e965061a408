//! Project board placement.
//!
//! Card placement is level-triggered: every run computes where the card
//! should be from the issue's state after this run, and compares it with
//! where the card is now. Missed runs therefore never leave a card behind.

use crate::config::SyncPolicy;
use crate::model::{BugId, CardColumn, IssueRef, MutationIntent, ProjectBoard};

/// Where an issue's card currently is on one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    /// The issue has no card on the board.
    NoCard,
    /// The card is in a column of this kind.
    OnColumn(CardColumn),
}

/// The issue state the board mapper places a card for.
#[derive(Debug, Clone)]
pub struct Placement<'a> {
    /// Source bug.
    pub bug: BugId,
    /// Issue the card shows.
    pub issue: IssueRef,
    /// API URL of an existing issue, `None` for one created this run.
    pub issue_url: Option<&'a str>,
    /// Whether the issue is open before this run's changes.
    pub open_now: bool,
    /// Whether the issue is open after this run's changes.
    pub open_after: bool,
    /// Whether the bug has an assignee.
    pub assigned: bool,
}

/// Column kind the card belongs in.
#[must_use]
pub fn target_column(open_after: bool, assigned: bool) -> CardColumn {
    if !open_after {
        CardColumn::Done
    } else if assigned {
        CardColumn::InProgress
    } else {
        CardColumn::Todo
    }
}

/// Column kind the card should move to, or `None` to leave it.
///
/// Custom columns (sprint lanes and the like) are owned by people: a card
/// there is only ever moved to `Done`, and only when the policy allows.
#[must_use]
pub fn transition(
    state: BoardState,
    target: CardColumn,
    placement_open: bool,
    policy: SyncPolicy,
) -> Option<CardColumn> {
    match state {
        BoardState::NoCard if placement_open => Some(target),
        BoardState::NoCard => None,
        BoardState::OnColumn(current) if current == target => None,
        BoardState::OnColumn(CardColumn::Other) => {
            (target == CardColumn::Done && policy.done_overrides_custom_columns).then_some(target)
        }
        BoardState::OnColumn(_) => Some(target),
    }
}

/// Plans the card intent for one issue on one board.
///
/// Returns `None` when the card is where it belongs, when an issue that was
/// already closed has no card, or when the board lacks a column of the
/// target kind.
#[must_use]
pub fn plan_card_move(
    board: &ProjectBoard,
    placement: &Placement<'_>,
    policy: SyncPolicy,
) -> Option<MutationIntent> {
    let existing = placement.issue_url.and_then(|url| board.find_card(url));
    let state = existing.map_or(BoardState::NoCard, |(column, _)| {
        BoardState::OnColumn(CardColumn::classify(&column.name))
    });
    let target = target_column(placement.open_after, placement.assigned);
    let visible = placement.open_now || placement.open_after;

    let Some(kind) = transition(state, target, visible, policy) else {
        if let Some((column, _)) = existing {
            tracing::debug!(bug = %placement.bug, project = %board.name, column = %column.name, "card stays");
        }
        return None;
    };

    let Some(column) = board.first_column(kind) else {
        tracing::warn!(
            bug = %placement.bug,
            project = %board.name,
            "board has no {kind:?} column; card not placed"
        );
        return None;
    };

    Some(MutationIntent::MoveCard {
        bug: placement.bug,
        issue: placement.issue,
        project: board.name.clone(),
        card: existing.map(|(_, card)| card.id),
        column: column.column_ref(),
    })
}
