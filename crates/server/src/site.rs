//! Handlers for the HTML pages.

use axum::{extract::Form, response::Html};
use serde::Deserialize;

use crate::{page::Page, render};

#[derive(Debug, Deserialize)]
pub(crate) struct IndexForm {
    user_input: String,
}

pub(crate) async fn index() -> Html<String> {
    Html(render::index(None))
}

/// Echo the submitted text back on the index page.
pub(crate) async fn echo(Form(form): Form<IndexForm>) -> Html<String> {
    Html(render::index(Some(&form.user_input)))
}

pub(crate) async fn options() -> Html<String> {
    Html(render::options())
}

pub(crate) async fn show(page: Page) -> Html<String> {
    Html(render::page(page))
}
