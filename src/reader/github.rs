//! Imports text files from a GitHub repository through the REST v3 API.

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::Value;

use crate::config::VerbaConfig;
use crate::error::{Error, ErrorContext};
use crate::reader::{has_extension, Document, InputForm, Reader, ReaderInput};
use crate::transport::{AuthScheme, Credential, HttpTransport};
use crate::Result;

const NAME: &str = "GithubReader";
const DOC_EXTENSIONS: &[&str] = &["md", "mdx", "txt", "json"];
const ACCEPT: (&str, &str) = ("accept", "application/vnd.github.v3+json");

/// `owner/repo[/folder]` as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RepoPath {
    owner: String,
    repo: String,
    folder: String,
}

impl RepoPath {
    fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.trim().trim_matches('/').split('/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
                folder: parts.collect::<Vec<_>>().join("/"),
            }),
            _ => Err(Error::validation_with_context(
                "expected a path like owner/repo/folder",
                ErrorContext::new()
                    .with_field_path("paths")
                    .with_details(raw)
                    .with_source(NAME),
            )),
        }
    }
}

/// A downloaded repository file.
struct RepoFile {
    content: String,
    link: String,
    path: String,
}

#[derive(Debug)]
pub struct GithubReader {
    transport: HttpTransport,
    branch: String,
}

impl GithubReader {
    pub fn new(config: &VerbaConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(
                &config.endpoints.github_api_url,
                Some(Credential::required("GITHUB_TOKEN", AuthScheme::Token)),
                &config.http,
            )?,
            branch: config.reader.github_branch.clone(),
        })
    }

    /// Paths of importable files under the requested folder.
    async fn fetch_docs(&self, repo: &RepoPath) -> Result<Vec<String>> {
        let url = format!(
            "/repos/{}/{}/git/trees/{}?recursive=1",
            repo.owner, repo.repo, self.branch
        );
        let tree = self.transport.get_json(&url, &[ACCEPT]).await?;
        let files: Vec<String> = tree["tree"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|item| item["type"].as_str() != Some("tree"))
            .filter_map(|item| item["path"].as_str())
            .filter(|path| path.starts_with(&repo.folder) && has_extension(path, DOC_EXTENSIONS))
            .map(str::to_string)
            .collect();

        tracing::info!(
            "{}: fetched {} file names from {}/{} (folder '{}')",
            NAME,
            files.len(),
            repo.owner,
            repo.repo,
            repo.folder
        );
        Ok(files)
    }

    async fn download_file(&self, repo: &RepoPath, file_path: &str) -> Result<RepoFile> {
        let url = format!("/repos/{}/{}/contents/{}", repo.owner, repo.repo, file_path);
        let resp = self.transport.get_json(&url, &[ACCEPT]).await?;
        parse_contents(&resp, file_path)
    }
}

fn parse_contents(resp: &Value, file_path: &str) -> Result<RepoFile> {
    let invalid = |details: &str| {
        Error::validation_with_context(
            "unexpected contents response",
            ErrorContext::new()
                .with_field_path(file_path)
                .with_details(details)
                .with_source(NAME),
        )
    };

    // GitHub wraps the base64 payload at 60 columns.
    let encoded: String = resp["content"]
        .as_str()
        .ok_or_else(|| invalid("missing content"))?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let raw = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| invalid(&e.to_string()))?;
    let content = String::from_utf8(raw).map_err(|e| invalid(&e.to_string()))?;

    Ok(RepoFile {
        content,
        link: resp["html_url"].as_str().unwrap_or_default().to_string(),
        path: resp["path"].as_str().unwrap_or(file_path).to_string(),
    })
}

#[async_trait]
impl Reader for GithubReader {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Downloads text files from a GitHub repository. Use the format {owner}/{repo}/{folder}"
    }

    fn input_form(&self) -> InputForm {
        InputForm::Input
    }

    fn requires_env(&self) -> &[&'static str] {
        &["GITHUB_TOKEN"]
    }

    async fn load(&self, input: ReaderInput) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for raw in input.paths.iter().filter(|p| !p.is_empty()) {
            let repo = RepoPath::parse(raw)?;
            for file in self.fetch_docs(&repo).await? {
                let downloaded = match self.download_file(&repo, &file).await {
                    Ok(downloaded) => downloaded,
                    Err(e) => {
                        tracing::warn!("{}: couldn't load {}, skipping: {}", NAME, file, e);
                        continue;
                    }
                };

                let document = if has_extension(&file, &["json"]) {
                    Document::from_json_str(&downloaded.content)?
                } else {
                    Document::new(downloaded.content, &input.document_type, &file, NAME)
                        .with_link(downloaded.link)
                        .with_path(downloaded.path)
                };
                documents.push(document);
            }
        }

        tracing::info!("{}: loaded {} documents", NAME, documents.len());
        Ok(documents)
    }
}
