// routes/accounts.rs
// Chart of accounts: collapsible tree with search, create form, CSV bulk upload.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    models::{Account, AccountType, CategoryType},
    routes::helpers::{Choice, Nav, href, page, read_multipart},
    sections::Section,
    session::SessionUser,
    state::{ApiClient, AppState, bulk_upload_accounts, create_account, list_accounts},
    tree::{ExpandState, build_tree, parent_options, validate_new_account},
    validation::ValidationError,
};

#[derive(Template)]
#[template(path = "accounts/index.html")]
struct AccountsTemplate {
    nav: Nav,
    query: String,
    rows: Vec<TreeRow>,
    searching: bool,
    kinds: Vec<Choice>,
    category_types: Vec<Choice>,
    parents: Vec<Choice>,
    form_name: String,
    notice: Option<String>,
    errors: Option<String>,
}

/// One visible line of the tree, already flattened in display order.
struct TreeRow {
    name: String,
    depth: u8,
    kind: &'static str,
    category_type: &'static str,
    has_children: bool,
    expanded: bool,
    toggle_href: String,
}

#[derive(Deserialize, Default)]
pub struct AccountsQuery {
    #[serde(default)]
    q: String,
    open: Option<String>,
    notice: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct AccountFormData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    account_type: String,
    #[serde(default)]
    category_type: String,
    #[serde(default)]
    parent_id: Option<String>,
}

fn tree_rows(accounts: &[Account], query: &str, expand: &ExpandState) -> Vec<TreeRow> {
    let searching = !query.trim().is_empty();
    let open = |id: i64| searching || expand.is_expanded(id);
    let toggle = |id: i64| {
        href(
            "/accounts",
            &[("q", query), ("open", &expand.toggled(id).encode())],
        )
    };
    let row = |account: &Account, depth: u8, has_children: bool| TreeRow {
        name: account.name.clone(),
        depth,
        kind: account.account_type.as_str(),
        category_type: account.category_type.as_str(),
        has_children,
        expanded: open(account.id),
        toggle_href: toggle(account.id),
    };

    let mut rows = Vec::new();
    for category in build_tree(accounts, query) {
        rows.push(row(&category.category, 0, !category.heads.is_empty()));
        if !open(category.category.id) {
            continue;
        }
        for head in &category.heads {
            rows.push(row(&head.head, 1, !head.sub_heads.is_empty()));
            if open(head.head.id) {
                rows.extend(head.sub_heads.iter().map(|s| row(s, 2, false)));
            }
        }
    }
    rows
}

struct PageInput {
    query: String,
    expand: Option<ExpandState>,
    form: AccountFormData,
    notice: Option<String>,
    errors: Option<String>,
}

fn accounts_page(nav: Nav, section: &Section<Vec<Account>>, input: PageInput) -> Response {
    let accounts = section.items();
    let expand = input.expand.unwrap_or_else(|| ExpandState::fresh(accounts));
    let mut parents: Vec<Choice> = parent_options(accounts, AccountType::Head)
        .into_iter()
        .chain(parent_options(accounts, AccountType::SubHead))
        .map(|a| {
            Choice::new(
                a.id.to_string(),
                format!("{} ({})", a.name, a.account_type.as_str()),
                input.form.parent_id.as_deref() == Some(a.id.to_string().as_str()),
            )
        })
        .collect();
    parents.insert(0, Choice::new("", "No parent (category)", false));

    page(AccountsTemplate {
        nav,
        rows: tree_rows(accounts, &input.query, &expand),
        searching: !input.query.trim().is_empty(),
        query: input.query,
        kinds: [AccountType::Category, AccountType::Head, AccountType::SubHead]
            .iter()
            .map(|k| Choice::new(k.as_str(), k.as_str(), k.as_str() == input.form.account_type))
            .collect(),
        category_types: CategoryType::ALL
            .iter()
            .map(|c| Choice::new(c.as_str(), c.as_str(), c.as_str() == input.form.category_type))
            .collect(),
        parents,
        form_name: input.form.name,
        notice: input.notice,
        errors: input.errors.or_else(|| section.error().map(str::to_string)),
    })
}

async fn load(api: &ApiClient) -> Section<Vec<Account>> {
    Section::from_result("accounts", list_accounts(api).await)
}

pub async fn accounts_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountsQuery>,
) -> Response {
    let api = session_user.api(&state);
    let section = load(&api).await;
    accounts_page(
        Nav::of(&session_user),
        &section,
        PageInput {
            query: query.q,
            expand: query.open.as_deref().map(ExpandState::decode),
            form: AccountFormData::default(),
            notice: query.notice,
            errors: None,
        },
    )
}

pub async fn accounts_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<AccountFormData>,
) -> Response {
    let api = session_user.api(&state);
    let section = load(&api).await;
    let new_account = validate_new_account(
        section.items(),
        &form.name,
        &form.account_type,
        &form.category_type,
        form.parent_id.as_deref(),
    );
    let result = match new_account {
        Ok(account) => create_account(&api, &account)
            .await
            .map(|()| account.name)
            .map_err(|err| err.user_message()),
        Err(err) => Err(err.to_string()),
    };
    match result {
        Ok(name) => {
            info!(name = %name, "account created");
            Redirect::to("/accounts").into_response()
        }
        Err(message) => accounts_page(
            Nav::of(&session_user),
            &section,
            PageInput {
                query: String::new(),
                expand: None,
                form,
                notice: None,
                errors: Some(message),
            },
        ),
    }
}

pub async fn accounts_bulk_upload(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    let api = session_user.api(&state);
    let upload = match read_multipart(multipart).await {
        Ok(form) => form.file.filter(|f| !f.is_empty()),
        Err(status) => return status.into_response(),
    };
    let result = match upload {
        Some(file) => bulk_upload_accounts(&api, file)
            .await
            .map_err(|err| err.user_message()),
        None => Err(ValidationError::Required("CSV file").to_string()),
    };
    match result {
        Ok(summary) => {
            info!(sub_heads = summary.sub_heads_processed, "chart of accounts uploaded");
            let notice = format!("{} sub-heads processed", summary.sub_heads_processed);
            Redirect::to(&href("/accounts", &[("notice", &notice)])).into_response()
        }
        Err(message) => {
            let section = load(&api).await;
            accounts_page(
                Nav::of(&session_user),
                &section,
                PageInput {
                    query: String::new(),
                    expand: None,
                    form: AccountFormData::default(),
                    notice: None,
                    errors: Some(message),
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(id: i64, name: &str, kind: AccountType, parent: Option<i64>) -> Account {
        Account {
            id,
            name: name.into(),
            account_type: kind,
            category_type: CategoryType::Asset,
            parent_id: parent,
        }
    }

    fn chart() -> Vec<Account> {
        vec![
            acc(1, "Assets", AccountType::Category, None),
            acc(10, "Cash and Cash Equivalents", AccountType::Head, Some(1)),
            acc(11, "Cash in Hand", AccountType::SubHead, Some(10)),
        ]
    }

    #[test]
    fn collapsed_heads_hide_their_sub_heads() {
        let accounts = chart();
        let rows = tree_rows(&accounts, "", &ExpandState::fresh(&accounts));
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Assets", "Cash and Cash Equivalents"]);
        assert!(rows[1].has_children && !rows[1].expanded);
        assert!(rows[1].toggle_href.contains("open=1%2C10"));
    }

    #[test]
    fn searching_opens_every_level() {
        let accounts = chart();
        let rows = tree_rows(&accounts, "hand", &ExpandState::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].depth, 2);
    }
}
