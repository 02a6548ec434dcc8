//! Projects owned by a GitLab account.

use async_trait::async_trait;
use gitbackup_core::{Credentials, GitRepo};
use reqwest::Url;
use reqwest::header::HeaderName;
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::{ApiClient, PER_PAGE, base_url, endpoint};
use crate::error::SourceError;
use crate::traits::RepoSource;

/// Default instance.
pub const GITLAB_URL: &str = "https://gitlab.com";

fn default_url() -> String {
    GITLAB_URL.to_string()
}

/// Parameters of a `gitlab` source.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitlabParams {
    /// Personal access token with `read_api` and `read_repository`.
    pub token: String,

    /// Instance URL, for self-hosted GitLab.
    #[serde(default = "default_url")]
    pub url: String,
}

impl std::fmt::Debug for GitlabParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabParams")
            .field("token", &"<redacted>")
            .field("url", &self.url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Project {
    http_url_to_repo: String,
    path_with_namespace: String,
    path: String,
}

#[derive(Debug, Deserialize)]
struct User {
    username: String,
}

/// The projects a GitLab user owns.
#[derive(Debug)]
pub struct GitlabSource {
    name: String,
    token: String,
    base: Url,
    client: ApiClient,
}

impl GitlabSource {
    /// Creates a source from its parameters.
    pub fn new(name: impl Into<String>, params: GitlabParams) -> Result<Self, SourceError> {
        let name = name.into();
        let base = base_url(&name, &params.url)?;
        let headers = ApiClient::secret_header(
            &name,
            HeaderName::from_static("private-token"),
            &params.token,
        )?;

        Ok(Self {
            client: ApiClient::new(headers)?,
            name,
            token: params.token,
            base,
        })
    }
}

#[async_trait]
impl RepoSource for GitlabSource {
    async fn list_repos(&self) -> Result<Vec<GitRepo>, SourceError> {
        let mut url = endpoint(&self.name, &self.base, "api/v4/projects")?;
        url.query_pairs_mut()
            .append_pair("owned", "true")
            .append_pair("simple", "true")
            .append_pair("per_page", &PER_PAGE.to_string());

        let projects: Vec<Project> = self.client.get_all(url).await?;
        info!("GitLab source '{}' lists {} projects", self.name, projects.len());

        Ok(projects
            .into_iter()
            .map(|p| GitRepo::new(p.http_url_to_repo, p.path_with_namespace, p.path))
            .collect())
    }

    async fn credentials(&self) -> Result<Credentials, SourceError> {
        let user: User = self
            .client
            .get(endpoint(&self.name, &self.base, "api/v4/user")?)
            .await?;
        debug!("GitLab source '{}' authenticated as {}", self.name, user.username);

        let host = self.base.host_str().unwrap_or_default().to_string();
        Ok(Credentials::token(host, user.username, &self.token))
    }

    fn kind(&self) -> &'static str {
        "gitlab"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
