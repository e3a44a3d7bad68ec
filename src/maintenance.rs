//! One-off data repairs run by `blogsmith-maint`.

use crate::api::blogs::share_url;
use crate::db::repository::BlogRepository;
use crate::error::AppError;

/// Outcome of a share-URL refresh.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShareUrlReport {
    pub updated: u64,
    pub unchanged: u64,
}

/// Give blogs stored before likes existed an empty like set.
pub async fn backfill_engagement(repo: &dyn BlogRepository) -> Result<u64, AppError> {
    let modified = repo.backfill_engagement().await?;
    tracing::info!(modified, "Backfilled likes on legacy blogs");
    Ok(modified)
}

/// Recompute the share URL of every published blog against `base_url`,
/// e.g. after the public origin moved. With `dry_run` nothing is written.
pub async fn refresh_share_urls(
    repo: &dyn BlogRepository,
    base_url: &str,
    dry_run: bool,
) -> Result<ShareUrlReport, AppError> {
    let mut report = ShareUrlReport::default();

    for blog in repo.list_published().await? {
        let expected = share_url(base_url, &blog.id);
        if blog.share_url == expected {
            report.unchanged += 1;
            continue;
        }

        tracing::info!(
            blog_id = %blog.id,
            from = %blog.share_url,
            to = %expected,
            dry_run,
            "Refreshing share URL"
        );
        if !dry_run {
            repo.set_share_url(&blog.id, &expected).await?;
        }
        report.updated += 1;
    }

    Ok(report)
}
