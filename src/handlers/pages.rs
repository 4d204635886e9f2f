use axum::response::{Html, Redirect};
use tracing::{debug, instrument};

use crate::auth::{CurrentUser, RequireUser};
use crate::session::Session;
use crate::templates;

/// GET / - send callers to the graph or the login page
#[instrument(skip_all)]
pub async fn index(current: CurrentUser) -> Redirect {
    if current.is_authenticated() {
        debug!("Authenticated request to /, redirecting to /graph");
        Redirect::to("/graph")
    } else {
        debug!("Anonymous request to /, redirecting to /login");
        Redirect::to("/login")
    }
}

/// GET /graph - placeholder for the graph view
#[instrument(skip_all)]
pub async fn graph(RequireUser(user): RequireUser, mut session: Session) -> Html<String> {
    let flashes = session.take_flashes();
    Html(templates::graph_page(&user.username, &flashes))
}
