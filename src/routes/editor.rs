// Form plumbing shared by the statement template and compliance document editors.
//
// The editor page posts its whole state on every button press: the block list
// as JSON in `definition`, the visible inputs as `block.<i>.<field>`, and the
// pressed button as `action`.

use serde::de::DeserializeOwned;

use crate::blocks::{Block, BlockError, BlockList, EditorAction, parse_field_key};

#[derive(Debug, Default)]
pub(crate) struct EditorForm {
    pub id: Option<i64>,
    pub name: String,
    pub definition: String,
    pub action: Option<EditorAction>,
    pub edits: Vec<(usize, String, String)>,
    rest: Vec<(String, String)>,
}

impl EditorForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = EditorForm::default();
        for (key, value) in pairs {
            if let Some((index, field)) = parse_field_key(&key) {
                form.edits.push((index, field.to_string(), value));
                continue;
            }
            match key.as_str() {
                "id" => form.id = value.trim().parse().ok(),
                "name" => form.name = value,
                "definition" => form.definition = value,
                "action" => form.action = EditorAction::parse(&value),
                _ => form.rest.push((key, value)),
            }
        }
        form
    }

    /// Last value submitted under `key`.
    pub fn value(&self, key: &str) -> &str {
        self.rest
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    /// Every value submitted under `key`, in order (checkbox groups).
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.rest
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn blocks<B: DeserializeOwned>(&self) -> Result<Vec<B>, String> {
        if self.definition.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.definition).map_err(|err| format!("editor state unreadable: {err}"))
    }

    /// Applies every field edit except those named in `skip`, in submission order.
    pub fn apply_edits<B: Block>(&self, list: &mut BlockList<B>, skip: &[&str]) -> Result<(), BlockError> {
        for (index, field, value) in &self.edits {
            if skip.contains(&field.as_str()) {
                continue;
            }
            list.update(*index, field, value)?;
        }
        Ok(())
    }

    pub fn edits_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        self.edits
            .iter()
            .filter(move |(_, f, _)| f == field)
            .map(|(i, _, v)| (*i, v.as_str()))
    }
}
