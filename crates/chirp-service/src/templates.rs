//! Server-side page templates.
//!
//! Templates are compiled into the binary and loaded on first use. Names end
//! in `.html`, which turns on HTML auto-escaping for every rendered value.

use std::sync::OnceLock;

use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::error::ApiError;

/// Look up the source of a bundled template.
fn template_source(name: &str) -> Option<&'static str> {
    let source = match name {
        "base.html" => include_str!("../templates/base.html"),
        "main.html" => include_str!("../templates/main.html"),
        "set-username.html" => include_str!("../templates/set-username.html"),
        "add-tweet.html" => include_str!("../templates/add-tweet.html"),
        "edit-tweet.html" => include_str!("../templates/edit-tweet.html"),
        "view-profile.html" => include_str!("../templates/view-profile.html"),
        "user-search-results.html" => include_str!("../templates/user-search-results.html"),
        "tweet-search-results.html" => include_str!("../templates/tweet-search-results.html"),
        "tweet.html" => include_str!("../templates/tweet.html"),
        "error.html" => include_str!("../templates/error.html"),
        _ => return None,
    };
    Some(source)
}

/// The compiled template environment.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Create the environment over the bundled templates.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| Ok(template_source(name).map(str::to_owned)));
        Self { env }
    }

    /// The process-wide environment, built on first use.
    ///
    /// Used where no [`AppState`](crate::state::AppState) is at hand, such as
    /// error responses.
    #[must_use]
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<Templates> = OnceLock::new();
        SHARED.get_or_init(Self::new)
    }

    /// Render a page.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if the template is missing or fails to render.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, ApiError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| ApiError::Internal(format!("template {name}: {e}")))?;
        template
            .render(ctx)
            .map(Html)
            .map_err(|e| ApiError::Internal(format!("render {name}: {e}")))
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}
