//! Chart-of-accounts tree: category → head → sub-head, with search filtering.

use std::collections::{BTreeSet, HashMap};

use crate::models::{Account, AccountType, CategoryType, NewAccount};
use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, PartialEq)]
pub struct HeadNode {
    pub head: Account,
    pub sub_heads: Vec<Account>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    pub category: Account,
    pub heads: Vec<HeadNode>,
}

fn matches(account: &Account, needle: &str) -> bool {
    account.name.to_lowercase().contains(needle)
}

/// Builds the three-level tree from a flat list. Input order is preserved
/// within each level; accounts whose parent is missing or of the wrong type
/// are left out.
///
/// With a non-empty `query` a head survives when it or one of its sub-heads
/// matches; matching sub-heads are shown alone, or every sub-head when only
/// the head itself matched. A category survives when it matches or keeps at
/// least one head.
pub fn build_tree(accounts: &[Account], query: &str) -> Vec<CategoryNode> {
    let needle = query.trim().to_lowercase();
    let searching = !needle.is_empty();

    let mut children: HashMap<(i64, AccountType), Vec<&Account>> = HashMap::new();
    for account in accounts {
        if let Some(parent) = account.parent_id {
            children
                .entry((parent, account.account_type))
                .or_default()
                .push(account);
        }
    }

    let kids = |parent: i64, kind: AccountType| -> Vec<&Account> {
        children.get(&(parent, kind)).cloned().unwrap_or_default()
    };

    accounts
        .iter()
        .filter(|a| a.account_type == AccountType::Category)
        .filter_map(|category| {
            let heads: Vec<HeadNode> = kids(category.id, AccountType::Head)
                .into_iter()
                .filter_map(|head| {
                    let all_subs = kids(head.id, AccountType::SubHead);
                    if !searching {
                        return Some(HeadNode {
                            head: head.clone(),
                            sub_heads: all_subs.into_iter().cloned().collect(),
                        });
                    }
                    let hits: Vec<&Account> = all_subs
                        .iter()
                        .copied()
                        .filter(|s| matches(s, &needle))
                        .collect();
                    if hits.is_empty() && !matches(head, &needle) {
                        return None;
                    }
                    let shown = if hits.is_empty() { all_subs } else { hits };
                    Some(HeadNode {
                        head: head.clone(),
                        sub_heads: shown.into_iter().cloned().collect(),
                    })
                })
                .collect();

            if searching && heads.is_empty() && !matches(category, &needle) {
                return None;
            }
            Some(CategoryNode {
                category: category.clone(),
                heads,
            })
        })
        .collect()
}

/// Valid parents for a new account of `kind`.
pub fn parent_options(accounts: &[Account], kind: AccountType) -> Vec<&Account> {
    let wanted = match kind {
        AccountType::Category => return Vec::new(),
        AccountType::Head => AccountType::Category,
        AccountType::SubHead => AccountType::Head,
    };
    let mut options: Vec<&Account> = accounts.iter().filter(|a| a.account_type == wanted).collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));
    options
}

/// Checks the create-account form. Heads and sub-heads need a parent of the
/// level directly above; categories never carry one.
pub fn validate_new_account(
    accounts: &[Account],
    name: &str,
    kind: &str,
    category_type: &str,
    parent: Option<&str>,
) -> Result<NewAccount, ValidationError> {
    let name = validation::required("name", name)?;
    let account_type = AccountType::parse(kind).ok_or(ValidationError::InvalidChoice("type"))?;
    let category_type =
        CategoryType::parse(category_type).ok_or(ValidationError::InvalidChoice("category type"))?;
    let parent_id = validation::account_parent(account_type, parent)?;
    if let Some(id) = parent_id {
        let valid = parent_options(accounts, account_type).iter().any(|a| a.id == id);
        if !valid && !accounts.is_empty() {
            return Err(ValidationError::InvalidChoice("parent"));
        }
    }
    Ok(NewAccount {
        name,
        account_type,
        category_type,
        parent_id,
    })
}

/// Expanded/collapsed flag per node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandState {
    open: BTreeSet<i64>,
}

impl ExpandState {
    /// State after a fresh fetch: every category open, everything else closed.
    pub fn fresh(accounts: &[Account]) -> Self {
        ExpandState {
            open: accounts
                .iter()
                .filter(|a| a.account_type == AccountType::Category)
                .map(|a| a.id)
                .collect(),
        }
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.open.contains(&id)
    }

    pub fn toggle(&mut self, id: i64) {
        if !self.open.remove(&id) {
            self.open.insert(id);
        }
    }

    /// State with `id` flipped, leaving `self` untouched (used to build toggle links).
    pub fn toggled(&self, id: i64) -> Self {
        let mut next = self.clone();
        next.toggle(id);
        next
    }

    /// Comma-separated ids, the form carried in the `open` query parameter.
    pub fn encode(&self) -> String {
        self.open
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn decode(raw: &str) -> Self {
        ExpandState {
            open: raw
                .split(',')
                .filter_map(|part| part.trim().parse().ok())
                .collect(),
        }
    }
}
