//! GitHub-to-Slack identity resolution.

use tracing::instrument;

use crate::{
    base::types::{Participant, Res},
    service::db::DbClient,
};

/// Resolve a GitHub login to a Slack user id within a workspace.
///
/// An unlinked login is a normal outcome and resolves to `None`, not an
/// error. When the store returns more than one link for the same login,
/// the first one wins; no tie-break is applied beyond store order.
#[instrument(skip(db))]
pub async fn resolve(db: &DbClient, workspace: &str, github_name: &str) -> Res<Participant> {
    let links = db.load_links(workspace, github_name).await?;

    let slack = links.into_iter().next().map(|link| link.slack);

    Ok(Participant {
        github: github_name.to_string(),
        slack,
    })
}

// Tests.
