// routes/home.rs
// GET / -> dashboard with record counts for the signed-in user.

use std::sync::Arc;

use askama::Template;
use axum::{extract::State, http::StatusCode, response::Html};

use crate::routes::helpers::{Nav, render};
use crate::sections::Section;
use crate::session::SessionUser;
use crate::state::{AppState, list_companies, list_templates, list_works};

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    nav: Nav,
    cards: Vec<CountCard>,
}

struct CountCard {
    label: &'static str,
    href: &'static str,
    count: String,
    error: Option<String>,
}

fn card<T>(label: &'static str, href: &'static str, section: &Section<Vec<T>>) -> CountCard {
    CountCard {
        label,
        href,
        count: if section.is_failed() {
            "-".into()
        } else {
            section.len().to_string()
        },
        error: section.error().map(str::to_string),
    }
}

pub async fn home(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, StatusCode> {
    let api = session_user.api(&state);
    let (companies, works, templates) = futures::join!(
        list_companies(&api),
        list_works(&api),
        list_templates(&api),
    );
    let companies = Section::from_list("companies", companies);
    let works = Section::from_list("works", works);
    let templates = Section::from_list("statement templates", templates);

    render(HomeTemplate {
        nav: Nav::of(&session_user),
        cards: vec![
            card("Companies", "/companies", &companies),
            card("Works", "/works", &works),
            card("Statement templates", "/templates", &templates),
        ],
    })
}
