//! Calculator page route handler

use askama::Template;
use axum::response::Html;

use crate::error::Result;
use crate::gas::{TankSpec, TANKS};

/// Calculator page template
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    tanks: &'static [TankSpec],
}

/// Calculator page handler
pub async fn index() -> Result<Html<String>> {
    let template = IndexTemplate { tanks: &TANKS };
    Ok(Html(template.render()?))
}
