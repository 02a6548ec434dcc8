//! Repositories of a GitHub account.

use async_trait::async_trait;
use gitbackup_core::{Credentials, GitRepo};
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::{ApiClient, PER_PAGE, base_url, endpoint};
use crate::error::SourceError;
use crate::traits::RepoSource;

/// Default API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

fn default_api_url() -> String {
    GITHUB_API_URL.to_string()
}

/// Parameters of a `github` source.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubParams {
    /// Personal access token.
    pub token: String,

    /// API root, for GitHub Enterprise.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl std::fmt::Debug for GithubParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubParams")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Repository {
    clone_url: String,
    full_name: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

/// The repositories a GitHub user owns or can see as an organization member.
#[derive(Debug)]
pub struct GithubSource {
    name: String,
    token: String,
    api: Url,
    client: ApiClient,
}

impl GithubSource {
    /// Creates a source from its parameters.
    pub fn new(name: impl Into<String>, params: GithubParams) -> Result<Self, SourceError> {
        let name = name.into();
        let api = base_url(&name, &params.api_url)?;
        let headers = ApiClient::secret_header(
            &name,
            AUTHORIZATION,
            &format!("Bearer {}", params.token),
        )?;
        let client = ApiClient::new(headers)?.with_header(ACCEPT, "application/vnd.github+json");

        Ok(Self {
            name,
            token: params.token,
            api,
            client,
        })
    }

    /// Returns the host serving Git for this API (`github.com` for
    /// `api.github.com`).
    pub fn git_host(&self) -> String {
        git_host(&self.api)
    }
}

/// Maps an API root to the host repositories are cloned from.
fn git_host(api: &Url) -> String {
    let host = api.host_str().unwrap_or_default();
    host.strip_prefix("api.").unwrap_or(host).to_string()
}

#[async_trait]
impl RepoSource for GithubSource {
    async fn list_repos(&self) -> Result<Vec<GitRepo>, SourceError> {
        let mut url = endpoint(&self.name, &self.api, "user/repos")?;
        url.query_pairs_mut()
            .append_pair("affiliation", "owner,organization_member")
            .append_pair("per_page", &PER_PAGE.to_string());

        let repos: Vec<Repository> = self.client.get_all(url).await?;
        info!("GitHub source '{}' lists {} repositories", self.name, repos.len());

        Ok(repos
            .into_iter()
            .map(|r| GitRepo::new(r.clone_url, r.full_name, r.name))
            .collect())
    }

    async fn credentials(&self) -> Result<Credentials, SourceError> {
        let user: User = self
            .client
            .get(endpoint(&self.name, &self.api, "user")?)
            .await?;
        debug!("GitHub source '{}' authenticated as {}", self.name, user.login);

        Ok(Credentials::token(self.git_host(), user.login, &self.token))
    }

    fn kind(&self) -> &'static str {
        "github"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_default_api_url() {
        let params: GithubParams = serde_yaml::from_str("token: ghp_secret").unwrap();
        assert_eq!(params.api_url, GITHUB_API_URL);
        assert!(!format!("{:?}", params).contains("ghp_secret"));
    }

    #[test]
    fn test_params_require_token() {
        let result: Result<GithubParams, _> = serde_yaml::from_str("api_url: https://x");
        assert!(result.is_err());
    }

    #[test]
    fn test_git_host() {
        let public = Url::parse("https://api.github.com/").unwrap();
        assert_eq!(git_host(&public), "github.com");

        let enterprise = Url::parse("https://ghe.example.com/api/v3/").unwrap();
        assert_eq!(git_host(&enterprise), "ghe.example.com");
    }

    #[test]
    fn test_parse_repositories() {
        let json = r#"[
            {
                "id": 1296269,
                "name": "Hello-World",
                "full_name": "octocat/Hello-World",
                "private": false,
                "clone_url": "https://github.com/octocat/Hello-World.git",
                "ssh_url": "git@github.com:octocat/Hello-World.git"
            }
        ]"#;

        let repos: Vec<Repository> = serde_json::from_str(json).unwrap();
        assert_eq!(repos[0].full_name, "octocat/Hello-World");
        assert_eq!(repos[0].name, "Hello-World");
        assert_eq!(
            repos[0].clone_url,
            "https://github.com/octocat/Hello-World.git"
        );
    }
}
