//! Ordered block-list editing shared by the statement template builder and
//! the compliance document builder.

use thiserror::Error;

use crate::models::{Account, DocBlock, TemplateBlock};

pub const DEFAULT_HEADER_TEXT: &str = "NEW PAGE HEADER";
pub const DEFAULT_TITLE_TEXT: &str = "New Section Title";
pub const DEFAULT_LINE_LABEL: &str = "Line Item Name";
pub const DEFAULT_SUBTOTAL_LABEL: &str = "Total Name";
pub const DEFAULT_TEXT_CONTENT: &str = "<p>Write your content here...</p>";
pub const DEFAULT_SIGNATORIES_TITLE: &str = "For {{client.company.name}}";

/// Placeholders offered for insertion into a document text block.
pub const DOCUMENT_VARIABLES: [(&str, &str); 2] = [
    ("Company Name", " {{client.company.name}} "),
    ("FY", " {{assignment.financialyear}} "),
];

#[derive(Debug, Error, PartialEq)]
pub enum BlockError {
    #[error("no block at position {0}")]
    OutOfRange(usize),
    #[error("unknown block kind `{0}`")]
    UnknownKind(String),
    #[error("`{kind}` blocks have no `{field}` field")]
    UnknownField { kind: &'static str, field: String },
    #[error("invalid value for `{field}`: {value}")]
    InvalidValue { field: String, value: String },
    #[error("block {0} is not a line item")]
    NotALineItem(usize),
    #[error("block {0} is not a text block")]
    NotText(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }
}

/// A block kind the builders know how to create and edit field by field.
pub trait Block: Sized + Clone {
    /// Block with the kind's default fields; `kind` is the wire tag.
    fn with_defaults(kind: &str) -> Result<Self, BlockError>;

    fn kind(&self) -> &'static str;

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), BlockError>;
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "true" | "on" | "1" | "yes")
}

impl Block for TemplateBlock {
    fn with_defaults(kind: &str) -> Result<Self, BlockError> {
        Ok(match kind {
            "header_block" => TemplateBlock::HeaderBlock {
                text: DEFAULT_HEADER_TEXT.into(),
            },
            "title" => TemplateBlock::Title {
                text: DEFAULT_TITLE_TEXT.into(),
            },
            "financial_line_item" => TemplateBlock::FinancialLineItem {
                label: DEFAULT_LINE_LABEL.into(),
                account_head_id: 0,
                note_ref: None,
                mandatory: false,
            },
            "subtotal" => TemplateBlock::Subtotal {
                label: DEFAULT_SUBTOTAL_LABEL.into(),
                id: 0,
                mandatory: true,
            },
            other => return Err(BlockError::UnknownKind(other.to_string())),
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            TemplateBlock::HeaderBlock { .. } => "header_block",
            TemplateBlock::Title { .. } => "title",
            TemplateBlock::FinancialLineItem { .. } => "financial_line_item",
            TemplateBlock::Subtotal { .. } => "subtotal",
        }
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), BlockError> {
        let kind = self.kind();
        let invalid = || BlockError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        };
        match (self, field) {
            (TemplateBlock::HeaderBlock { text } | TemplateBlock::Title { text }, "text") => {
                *text = value.to_string();
            }
            (
                TemplateBlock::FinancialLineItem { label, .. } | TemplateBlock::Subtotal { label, .. },
                "label",
            ) => *label = value.to_string(),
            (TemplateBlock::FinancialLineItem { account_head_id, .. }, "account_head_id") => {
                *account_head_id = if value.trim().is_empty() {
                    0
                } else {
                    value.trim().parse().map_err(|_| invalid())?
                };
            }
            (TemplateBlock::FinancialLineItem { note_ref, .. }, "note_ref") => {
                let trimmed = value.trim();
                *note_ref = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            (
                TemplateBlock::FinancialLineItem { mandatory, .. }
                | TemplateBlock::Subtotal { mandatory, .. },
                "mandatory",
            ) => *mandatory = parse_bool(value),
            (TemplateBlock::Subtotal { id, .. }, "id") => {
                *id = if value.trim().is_empty() {
                    0
                } else {
                    value.trim().parse().map_err(|_| invalid())?
                };
            }
            (_, other) => {
                return Err(BlockError::UnknownField {
                    kind,
                    field: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Block for DocBlock {
    fn with_defaults(kind: &str) -> Result<Self, BlockError> {
        Ok(match kind {
            "text" => DocBlock::Text {
                content: DEFAULT_TEXT_CONTENT.into(),
            },
            "signatories" => DocBlock::Signatories {
                title: DEFAULT_SIGNATORIES_TITLE.into(),
            },
            other => return Err(BlockError::UnknownKind(other.to_string())),
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            DocBlock::Text { .. } => "text",
            DocBlock::Signatories { .. } => "signatories",
        }
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), BlockError> {
        let kind = self.kind();
        match (self, field) {
            (DocBlock::Text { content }, "content") => *content = value.to_string(),
            (DocBlock::Signatories { title }, "title") => *title = value.to_string(),
            (_, other) => {
                return Err(BlockError::UnknownField {
                    kind,
                    field: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// What the submit button of an editor form asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Keep the field edits, change nothing else.
    Refresh,
    Append(String),
    Move(usize, Direction),
    Delete(usize),
    /// Block index and position in [`DOCUMENT_VARIABLES`].
    InsertVariable(usize, usize),
    Save,
}

impl EditorAction {
    /// Forms: `append:<kind>`, `move:<i>:up|down`, `delete:<i>`,
    /// `insert:<i>:<variable>`, `save`, `refresh`.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        let index = |at: usize| parts.get(at).and_then(|p| p.parse::<usize>().ok());
        let action = match parts.as_slice() {
            ["refresh"] => EditorAction::Refresh,
            ["save"] => EditorAction::Save,
            ["append", kind] => EditorAction::Append((*kind).to_string()),
            ["delete", _] => EditorAction::Delete(index(1)?),
            ["move", _, direction] => EditorAction::Move(index(1)?, Direction::parse(direction)?),
            ["insert", _, _] => EditorAction::InsertVariable(index(1)?, index(2)?),
            _ => return None,
        };
        Some(action)
    }
}

/// Splits an editor field name of the form `block.<index>.<field>`.
pub fn parse_field_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("block.")?;
    let (index, field) = rest.split_once('.')?;
    Some((index.parse().ok()?, field))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockList<B> {
    blocks: Vec<B>,
}

// Written out so an empty list needs no `B: Default`.
impl<B> Default for BlockList<B> {
    fn default() -> Self {
        BlockList { blocks: Vec::new() }
    }
}

impl<B: Block> BlockList<B> {
    pub fn new(blocks: Vec<B>) -> Self {
        BlockList { blocks }
    }

    pub fn blocks(&self) -> &[B] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<B> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn append(&mut self, kind: &str) -> Result<(), BlockError> {
        self.blocks.push(B::with_defaults(kind)?);
        Ok(())
    }

    pub fn update(&mut self, index: usize, field: &str, value: &str) -> Result<(), BlockError> {
        self.blocks
            .get_mut(index)
            .ok_or(BlockError::OutOfRange(index))?
            .set_field(field, value)
    }

    /// Swaps with the neighbour in `direction`; a no-op at either end.
    pub fn move_block(&mut self, index: usize, direction: Direction) -> Result<(), BlockError> {
        if index >= self.blocks.len() {
            return Err(BlockError::OutOfRange(index));
        }
        let target = match direction {
            Direction::Up if index == 0 => return Ok(()),
            Direction::Up => index - 1,
            Direction::Down if index + 1 == self.blocks.len() => return Ok(()),
            Direction::Down => index + 1,
        };
        self.blocks.swap(index, target);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<B, BlockError> {
        if index >= self.blocks.len() {
            return Err(BlockError::OutOfRange(index));
        }
        Ok(self.blocks.remove(index))
    }

    /// Applies the structural part of an editor action. Save, refresh and
    /// variable insertion leave the list as it is.
    pub fn apply(&mut self, action: &EditorAction) -> Result<(), BlockError> {
        match action {
            EditorAction::Append(kind) => self.append(kind),
            EditorAction::Move(index, direction) => self.move_block(*index, *direction),
            EditorAction::Delete(index) => self.delete(*index).map(drop),
            EditorAction::Refresh | EditorAction::Save | EditorAction::InsertVariable(..) => Ok(()),
        }
    }
}

impl BlockList<TemplateBlock> {
    /// Points a line item at `account_id`. The label follows the account name
    /// unless the user has typed a label of their own: an empty label, the
    /// placeholder, or the previous account's name are all replaced.
    pub fn set_line_item_account(
        &mut self,
        index: usize,
        account_id: i64,
        accounts: &[Account],
    ) -> Result<(), BlockError> {
        let block = self
            .blocks
            .get_mut(index)
            .ok_or(BlockError::OutOfRange(index))?;
        let TemplateBlock::FinancialLineItem {
            label,
            account_head_id,
            ..
        } = block
        else {
            return Err(BlockError::NotALineItem(index));
        };

        let previous_name = accounts
            .iter()
            .find(|a| a.id == *account_head_id)
            .map(|a| a.name.as_str());
        let untouched = label.is_empty()
            || label.as_str() == DEFAULT_LINE_LABEL
            || previous_name.is_some_and(|name| label.as_str() == name);

        if untouched {
            if let Some(next) = accounts.iter().find(|a| a.id == account_id) {
                *label = next.name.clone();
            }
        }
        *account_head_id = account_id;
        Ok(())
    }
}

impl BlockList<DocBlock> {
    /// Appends the `variable`-th entry of [`DOCUMENT_VARIABLES`] to a text block.
    pub fn insert_known_variable(&mut self, index: usize, variable: usize) -> Result<(), BlockError> {
        let (_, placeholder) = DOCUMENT_VARIABLES
            .get(variable)
            .ok_or_else(|| BlockError::InvalidValue {
                field: "variable".into(),
                value: variable.to_string(),
            })?;
        self.insert_variable(index, placeholder)
    }

    pub fn insert_variable(&mut self, index: usize, variable: &str) -> Result<(), BlockError> {
        match self.blocks.get_mut(index) {
            Some(DocBlock::Text { content }) => {
                content.push_str(variable);
                Ok(())
            }
            Some(_) => Err(BlockError::NotText(index)),
            None => Err(BlockError::OutOfRange(index)),
        }
    }
}
