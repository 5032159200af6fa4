use super::{ApiResult, GithubClient, is_github};
use crate::collector::CollectError;
use crate::signals::{FieldDef, FieldKind, RepoSpec, SignalSet, Source};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;

static FIELDS: &[FieldDef] = &[
    FieldDef::new("url", FieldKind::Text),
    FieldDef::new("language", FieldKind::Text),
    FieldDef::new("stars", FieldKind::Int),
    FieldDef::new("forks", FieldKind::Int),
    FieldDef::new("watchers", FieldKind::Int),
    FieldDef::new("open_issues", FieldKind::Int),
    FieldDef::new("archived", FieldKind::Bool),
    FieldDef::new("created_at", FieldKind::Timestamp),
    FieldDef::new("updated_at", FieldKind::Timestamp),
    FieldDef::new("created_since", FieldKind::Int),
    FieldDef::new("updated_since", FieldKind::Int),
];

#[derive(Debug, Deserialize)]
struct Repository {
    html_url: Option<String>,
    language: Option<String>,
    stargazers_count: Option<u64>,
    forks_count: Option<u64>,
    subscribers_count: Option<u64>,
    open_issues_count: Option<u64>,
    archived: Option<bool>,
    created_at: Option<DateTime<Utc>>,
    pushed_at: Option<DateTime<Utc>>,
}

/// Repository statistics from the GitHub REST API, namespace `repo`.
///
/// `created_since` and `updated_since` are whole months before the time the source
/// was constructed. `updated_at` is the time of the last push.
#[derive(Debug, Clone)]
pub struct GithubRepoSource {
    client: GithubClient,
    now: DateTime<Utc>,
}

impl GithubRepoSource {
    pub const NAMESPACE: &'static str = "repo";

    #[must_use]
    pub const fn new(client: GithubClient, now: DateTime<Utc>) -> Self {
        Self { client, now }
    }

    fn months_since(&self, at: Option<DateTime<Utc>>) -> Option<i64> {
        at.map(|at| (self.now - at).num_days().max(0) / 30)
    }

    async fn fetch_set(&self, repo: &RepoSpec) -> Result<SignalSet, CollectError> {
        let path = format!("/repos/{}/{}", repo.owner(), repo.repo());
        let info: Repository = match self.client.get_json(&path, &[]).await {
            ApiResult::Success(info) => info,
            ApiResult::Gone(status) => return Err(CollectError::uncollectable(repo, format!("GitHub answered {status}"))),
            ApiResult::Failed(e) => return Err(CollectError::Failed(e)),
        };

        let mut set = self.empty_set();
        set.set("url", info.html_url.as_deref())?;
        set.set("language", info.language.as_deref())?;
        set.set("stars", info.stargazers_count)?;
        set.set("forks", info.forks_count)?;
        set.set("watchers", info.subscribers_count)?;
        set.set("open_issues", info.open_issues_count)?;
        set.set("archived", info.archived)?;
        set.set("created_at", info.created_at)?;
        set.set("updated_at", info.pushed_at)?;
        set.set("created_since", self.months_since(info.created_at))?;
        set.set("updated_since", self.months_since(info.pushed_at))?;
        Ok(set)
    }
}

impl Source for GithubRepoSource {
    fn empty_set(&self) -> SignalSet {
        SignalSet::empty(Self::NAMESPACE, FIELDS)
    }

    fn supports(&self, repo: &RepoSpec) -> bool {
        is_github(repo)
    }

    fn fetch<'a>(&'a self, repo: &'a RepoSpec, _job_id: &'a str) -> BoxFuture<'a, Result<SignalSet, CollectError>> {
        Box::pin(self.fetch_set(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_repository_deserialize() {
        let json = r#"{
            "html_url": "https://github.com/ossf/criticality_score",
            "stargazers_count": 1000,
            "forks_count": 200,
            "subscribers_count": 50,
            "created_at": "2020-01-01T00:00:00Z",
            "unrelated": true
        }"#;

        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.stargazers_count, Some(1000));
        assert_eq!(repo.subscribers_count, Some(50));
        assert!(repo.pushed_at.is_none());
        assert!(repo.language.is_none());
    }

    #[test]
    fn test_months_since() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let source = GithubRepoSource::new(GithubClient::new(None, "http://localhost").unwrap(), now);

        assert_eq!(source.months_since(Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap())), Some(2));
        assert_eq!(source.months_since(Some(now + chrono::Duration::days(3))), Some(0));
        assert_eq!(source.months_since(None), None);
    }

    #[test]
    fn test_supports_only_github() {
        let source = GithubRepoSource::new(GithubClient::new(None, "http://localhost").unwrap(), Utc::now());
        assert!(source.supports(&"https://github.com/a/b".parse().unwrap()));
        assert!(!source.supports(&"https://gitlab.com/a/b".parse().unwrap()));
    }
}
