use super::{ApiResult, GithubClient, is_github};
use crate::collector::CollectError;
use crate::signals::{FieldDef, FieldKind, RepoSpec, SignalSet, Source};
use futures::future::BoxFuture;
use serde::Deserialize;

static FIELDS: &[FieldDef] = &[FieldDef::new("mention_count", FieldKind::Int)];

#[derive(Debug, Deserialize)]
struct SearchResult {
    total_count: u64,
}

/// Number of commits across GitHub mentioning a repository, namespace `github_mentions`.
#[derive(Debug, Clone)]
pub struct GithubMentionsSource {
    client: GithubClient,
}

impl GithubMentionsSource {
    pub const NAMESPACE: &'static str = "github_mentions";

    #[must_use]
    pub const fn new(client: GithubClient) -> Self {
        Self { client }
    }

    async fn fetch_set(&self, repo: &RepoSpec) -> Result<SignalSet, CollectError> {
        let query = format!("\"{}\"", repo.full_name());
        let result: SearchResult = match self
            .client
            .get_json("/search/commits", &[("q", query.as_str()), ("per_page", "1")])
            .await
        {
            ApiResult::Success(result) => result,
            ApiResult::Gone(status) => return Err(CollectError::uncollectable(repo, format!("commit search answered {status}"))),
            ApiResult::Failed(e) => return Err(CollectError::Failed(e)),
        };

        Ok(self.empty_set().with("mention_count", result.total_count)?)
    }
}

impl Source for GithubMentionsSource {
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
