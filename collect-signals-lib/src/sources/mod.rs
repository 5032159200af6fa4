//! Signal sources backed by the GitHub REST API
//!
//! - [`GithubRepoSource`] (namespace `repo`): stars, forks, issues, and activity dates
//! - [`GithubMentionsSource`] (namespace `github_mentions`): commits mentioning the repository
//!
//! Both sources support only repositories hosted on `github.com` and report renamed,
//! deleted, or blocked repositories as uncollectable.

mod github_client;
mod mentions_source;
mod repo_source;

use crate::signals::RepoSpec;

pub use github_client::{ApiResult, DEFAULT_GITHUB_API_URL, GithubClient};
pub use mentions_source::GithubMentionsSource;
pub use repo_source::GithubRepoSource;

fn is_github(repo: &RepoSpec) -> bool {
    repo.host() == "github.com"
}
