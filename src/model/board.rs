//! Project board snapshot.

use serde::{Deserialize, Serialize};

/// Classification of a board column by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardColumn {
    /// "To do" or "Not started".
    Todo,
    /// "In progress".
    InProgress,
    /// "Done".
    Done,
    /// Any custom column, e.g. a sprint lane.
    Other,
}

impl CardColumn {
    /// Classifies a column name, case-insensitively.
    #[must_use]
    pub fn classify(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "to do" | "not started" => Self::Todo,
            "in progress" => Self::InProgress,
            "done" => Self::Done,
            _ => Self::Other,
        }
    }
}

/// A card on a board column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card id.
    pub id: u64,
    /// API URL of the issue the card shows; `None` for note cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

/// A board column and the cards currently in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    /// Column id.
    pub id: u64,
    /// Column name as shown on the board.
    pub name: String,
    /// Cards in the column.
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl BoardColumn {
    /// Reference to this column without its cards.
    #[must_use]
    pub fn column_ref(&self) -> ColumnRef {
        ColumnRef { id: self.id, name: self.name.clone() }
    }
}

/// A column identified by id and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Column id.
    pub id: u64,
    /// Column name.
    pub name: String,
}

impl ColumnRef {
    /// Classification of this column.
    #[must_use]
    pub fn kind(&self) -> CardColumn {
        CardColumn::classify(&self.name)
    }
}

/// A project board with its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBoard {
    /// Project id.
    pub id: u64,
    /// Project name, matched against `[project=NAME]` annotations.
    pub name: String,
    /// Columns in board order.
    #[serde(default)]
    pub columns: Vec<BoardColumn>,
}

impl ProjectBoard {
    /// Finds the card showing the issue at `issue_url`, with its column.
    #[must_use]
    pub fn find_card(&self, issue_url: &str) -> Option<(&BoardColumn, &Card)> {
        self.columns.iter().find_map(|column| {
            column
                .cards
                .iter()
                .find(|card| card.content_url.as_deref() == Some(issue_url))
                .map(|card| (column, card))
        })
    }

    /// First column of the given kind, in board order.
    #[must_use]
    pub fn first_column(&self, kind: CardColumn) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| CardColumn::classify(&c.name) == kind)
    }
}
