//! Statement preview: splits a template definition into pages and turns
//! computed balances into table rows.

use std::collections::HashMap;

use crate::models::{Balance, NoteGroup, StatementPreview, TemplateBlock};

/// Line items whose value is smaller than this are hidden unless mandatory.
pub const SUPPRESS_EPSILON: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Title,
    Line,
    Subtotal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    pub label: String,
    pub note_ref: String,
    pub current: String,
    pub previous: String,
}

impl Row {
    pub fn is_title(&self) -> bool {
        self.kind == RowKind::Title
    }

    pub fn is_subtotal(&self) -> bool {
        self.kind == RowKind::Subtotal
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Text of the header block that opened the page.
    pub heading: Option<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteLineView {
    pub name: String,
    pub current: String,
    pub previous: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteView {
    pub note_ref: String,
    pub title: String,
    pub lines: Vec<NoteLineView>,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStatement {
    pub pages: Vec<Page>,
    pub notes: Vec<NoteView>,
}

impl RenderedStatement {
    pub fn has_notes_page(&self) -> bool {
        !self.notes.is_empty()
    }

    /// Statement pages plus the trailing notes page, if any.
    pub fn page_count(&self) -> usize {
        self.pages.len() + usize::from(self.has_notes_page())
    }
}

/// Groups blocks into pages. Every header block opens a page; other blocks
/// land on the page opened last. Blocks before the first header get a page
/// without a heading.
pub fn paginate(blocks: &[TemplateBlock]) -> Vec<(Option<&str>, Vec<&TemplateBlock>)> {
    let mut pages: Vec<(Option<&str>, Vec<&TemplateBlock>)> = Vec::new();
    for block in blocks {
        match block {
            TemplateBlock::HeaderBlock { text } => pages.push((Some(text.as_str()), Vec::new())),
            other => match pages.last_mut() {
                Some((_, body)) => body.push(other),
                None => pages.push((None, vec![other])),
            },
        }
    }
    pages
}

fn lookup(balances: &HashMap<i64, Balance>, id: i64) -> (f64, f64) {
    balances
        .get(&id)
        .map(|b| (b.current(), b.previous()))
        .unwrap_or((0.0, 0.0))
}

fn value_row(kind: RowKind, label: &str, note_ref: &str, (current, previous): (f64, f64)) -> Row {
    Row {
        kind,
        label: label.to_string(),
        note_ref: note_ref.to_string(),
        current: format_amount(current),
        previous: format_amount(previous),
    }
}

fn is_suppressed(current: f64, mandatory: bool) -> bool {
    current.abs() < SUPPRESS_EPSILON && !mandatory
}

pub fn render_statement(preview: &StatementPreview, custom_notes: &HashMap<String, String>) -> RenderedStatement {
    let pages = paginate(&preview.template_definition)
        .into_iter()
        .map(|(heading, body)| Page {
            heading: heading.map(str::to_string),
            rows: body
                .into_iter()
                .filter_map(|block| match block {
                    TemplateBlock::HeaderBlock { .. } => None,
                    TemplateBlock::Title { text } => Some(Row {
                        kind: RowKind::Title,
                        label: text.clone(),
                        note_ref: String::new(),
                        current: String::new(),
                        previous: String::new(),
                    }),
                    TemplateBlock::FinancialLineItem {
                        label,
                        account_head_id,
                        note_ref,
                        mandatory,
                    } => {
                        let values = lookup(&preview.balances, *account_head_id);
                        (!is_suppressed(values.0, *mandatory)).then(|| {
                            value_row(
                                RowKind::Line,
                                label,
                                note_ref.as_deref().unwrap_or_default(),
                                values,
                            )
                        })
                    }
                    TemplateBlock::Subtotal { label, id, mandatory } => {
                        let values = lookup(&preview.balances, *id);
                        (!is_suppressed(values.0, *mandatory))
                            .then(|| value_row(RowKind::Subtotal, label, "", values))
                    }
                })
                .collect(),
        })
        .collect();

    RenderedStatement {
        pages,
        notes: preview
            .notes
            .iter()
            .map(|note| note_view(note, custom_notes))
            .collect(),
    }
}

fn note_view(note: &NoteGroup, custom_notes: &HashMap<String, String>) -> NoteView {
    NoteView {
        note_ref: note.note_ref.clone(),
        title: note.title.clone(),
        lines: note
            .children
            .iter()
            .map(|line| NoteLineView {
                name: line.name.clone(),
                current: format_amount(line.current),
                previous: format_amount(line.previous),
            })
            .collect(),
        narrative: custom_notes.get(&note.note_ref).cloned().unwrap_or_default(),
    }
}

/// Two decimals with Indian digit grouping: `1234567.5` → `12,34,567.50`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = if int_part.len() <= 3 {
        int_part.to_string()
    } else {
        let (head, last3) = int_part.split_at(int_part.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (h, t) = rest.split_at(rest.len() - 2);
            groups.push(t);
            rest = h;
        }
        if !rest.is_empty() {
            groups.push(rest);
        }
        groups.reverse();
        format!("{},{}", groups.join(","), last3)
    };

    let negative = value < 0.0 && fixed != "0.00";
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteLine;

    fn header(text: &str) -> TemplateBlock {
        TemplateBlock::HeaderBlock { text: text.into() }
    }

    fn title(text: &str) -> TemplateBlock {
        TemplateBlock::Title { text: text.into() }
    }

    fn line(label: &str, account: i64, mandatory: bool) -> TemplateBlock {
        TemplateBlock::FinancialLineItem {
            label: label.into(),
            account_head_id: account,
            note_ref: None,
            mandatory,
        }
    }

    #[test]
    fn mandatory_zero_line_is_rendered_on_a_single_page() {
        let preview = StatementPreview {
            template_definition: vec![
                header("BALANCE SHEET"),
                title("Assets"),
                line("Cash", 5, true),
                TemplateBlock::Subtotal {
                    label: "Total Assets".into(),
                    id: 999,
                    mandatory: true,
                },
            ],
            balances: HashMap::from([(5, Balance::Amount(0.0))]),
            notes: vec![],
        };
        let rendered = render_statement(&preview, &HashMap::new());
        assert_eq!(rendered.page_count(), 1);
        let rows = &rendered.pages[0].rows;
        assert_eq!(rendered.pages[0].heading.as_deref(), Some("BALANCE SHEET"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].label, "Cash");
        assert_eq!(rows[1].current, "0.00");
        assert!(rows[2].is_subtotal());
    }

    #[test]
    fn near_zero_optional_line_is_suppressed() {
        let preview = StatementPreview {
            template_definition: vec![header("P&L"), line("Other income", 8, false), line("Sales", 9, false)],
            balances: HashMap::from([(8, Balance::Amount(0.001)), (9, Balance::Amount(125.0))]),
            notes: vec![],
        };
        let rendered = render_statement(&preview, &HashMap::new());
        let labels: Vec<_> = rendered.pages[0].rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["Sales"]);
    }

    #[test]
    fn pages_split_at_headers_and_keep_relative_order() {
        let blocks = vec![
            header("BALANCE SHEET"),
            title("Assets"),
            line("Cash", 1, true),
            header("PROFIT AND LOSS"),
            title("Income"),
            line("Sales", 2, true),
            line("Other", 3, true),
        ];
        let pages = paginate(&blocks);
        assert_eq!(pages.len(), 2);
        let non_header: usize = pages.iter().map(|(_, body)| body.len()).sum();
        assert_eq!(non_header, 5);
        assert_eq!(pages[1].1[0], &title("Income"));
        assert_eq!(pages[1].1[2], &line("Other", 3, true));
    }

    #[test]
    fn notes_add_a_trailing_page_with_saved_narrative() {
        let preview = StatementPreview {
            template_definition: vec![header("BALANCE SHEET"), line("Cash", 5, true)],
            balances: HashMap::new(),
            notes: vec![NoteGroup {
                note_ref: "3".into(),
                title: "Cash and cash equivalents".into(),
                children: vec![NoteLine {
                    name: "Cash in hand".into(),
                    current: 1500.0,
                    previous: 900.0,
                }],
            }],
        };
        let saved = HashMap::from([("3".to_string(), "Held at head office".to_string())]);
        let rendered = render_statement(&preview, &saved);
        assert_eq!(rendered.page_count(), 2);
        assert_eq!(rendered.notes[0].narrative, "Held at head office");
        assert_eq!(rendered.notes[0].lines[0].current, "1,500.00");
    }

    #[test]
    fn blocks_before_first_header_get_an_untitled_page() {
        let blocks = vec![title("Orphan"), header("BS")];
        let pages = paginate(&blocks);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].0, None);
    }

    #[test]
    fn amounts_use_indian_grouping() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234567.891), "12,34,567.89");
        assert_eq!(format_amount(-25000.0), "-25,000.00");
        assert_eq!(format_amount(-0.001), "0.00");
    }
}
