use std::{fmt, str::FromStr};

use url::Url;

const AZURE_DEVOPS_HOST: &str = "dev.azure.com";
const VISUAL_STUDIO_SUFFIX: &str = "visualstudio.com";

#[derive(Debug, thiserror::Error)]
pub enum ProjectUrlError {
    #[error("invalid url {0:?}: {1}")]
    Invalid(String, #[source] url::ParseError),
    #[error("error parsing {0:?} into components")]
    Components(String),
    #[error("the hostname {0:?} cannot be used for creation")]
    Host(String),
}

/// Normalized Azure DevOps project URL.
///
/// Accepts both `https://dev.azure.com/{org}/{project}` and
/// `https://{org}.visualstudio.com/{project}`, optionally with an
/// `_apis/projects/` segment or a `_git/{repo}` suffix, and reduces them to the
/// bare project URL. Credentials in the user-info part are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AzdoProjectUrl {
    url: Url,
    organization_name: String,
    organization_url: String,
    project_id_or_name: String,
}

impl AzdoProjectUrl {
    pub fn parse(value: &str) -> Result<Self, ProjectUrlError> {
        let url = Url::parse(value.trim())
            .map_err(|e| ProjectUrlError::Invalid(value.to_string(), e))?;
        Self::from_url(url, value)
    }

    /// Build a project URL from its parts.
    pub fn create(
        hostname: &str,
        organization_name: &str,
        project_id_or_name: &str,
    ) -> Result<Self, ProjectUrlError> {
        let raw = if hostname.eq_ignore_ascii_case(AZURE_DEVOPS_HOST) {
            format!("https://{hostname}/{organization_name}/{project_id_or_name}")
        } else if is_visual_studio_host(hostname) {
            format!("https://{hostname}/{project_id_or_name}")
        } else {
            return Err(ProjectUrlError::Host(hostname.to_string()));
        };
        Self::parse(&raw)
    }

    fn from_url(mut url: Url, raw: &str) -> Result<Self, ProjectUrlError> {
        let components = || ProjectUrlError::Components(raw.to_string());
        let host = url.host_str().ok_or_else(components)?.to_string();

        // the project path ignores the `_apis/projects/` segment entirely
        let path = url.path().replace("_apis/projects/", "");
        let segments: Vec<&str> = path.split('/').collect();

        let (organization_name, org_path, project) = if host.eq_ignore_ascii_case(AZURE_DEVOPS_HOST)
        {
            let org = segments.get(1).copied().unwrap_or_default();
            let project = segments.get(2).copied().unwrap_or_default();
            (org.to_string(), format!("/{org}/"), project)
        } else if is_visual_studio_host(&host) {
            let org = host.split('.').next().unwrap_or_default();
            let project = segments.get(1).copied().unwrap_or_default();
            (org.to_string(), "/".to_string(), project)
        } else {
            return Err(components());
        };

        if organization_name.is_empty() || project.is_empty() || project.starts_with('_') {
            return Err(components());
        }
        let project = project.to_string();

        url.set_username("").map_err(|_| components())?;
        url.set_password(None).map_err(|_| components())?;
        url.set_query(None);
        url.set_fragment(None);

        url.set_path(&org_path);
        let organization_url = url.to_string();

        url.set_path(&format!("{org_path}{project}"));
        let project_id_or_name = url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            url,
            organization_name,
            organization_url,
            project_id_or_name,
        })
    }

    pub fn organization_name(&self) -> &str {
        &self.organization_name
    }

    /// Organization URL with a trailing slash, e.g. `https://dev.azure.com/fabrikam/`.
    pub fn organization_url(&self) -> &str {
        &self.organization_url
    }

    /// Project segment as it appears in the URL (percent-encoded where needed).
    pub fn project_id_or_name(&self) -> &str {
        &self.project_id_or_name
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

fn is_visual_studio_host(host: &str) -> bool {
    host.len() >= VISUAL_STUDIO_SUFFIX.len()
        && host[host.len() - VISUAL_STUDIO_SUFFIX.len()..].eq_ignore_ascii_case(VISUAL_STUDIO_SUFFIX)
}

impl fmt::Display for AzdoProjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl FromStr for AzdoProjectUrl {
    type Err = ProjectUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_shapes() {
        let cases = [
            (
                "https://dev.azure.com/fabrikam/DefaultCollection",
                "https://dev.azure.com/fabrikam/DefaultCollection",
            ),
            (
                "https://dev.azure.com/fabrikam/_apis/projects/DefaultCollection",
                "https://dev.azure.com/fabrikam/DefaultCollection",
            ),
            (
                "https://dev.azure.com/fabrikam/_apis/projects/6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
                "https://dev.azure.com/fabrikam/6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
            ),
            (
                "https://fabrikam.visualstudio.com/DefaultCollection",
                "https://fabrikam.visualstudio.com/DefaultCollection",
            ),
            (
                "https://dev.azure.com/fabrikam/DefaultCollection/_apis/projects/6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
                "https://dev.azure.com/fabrikam/DefaultCollection",
            ),
            (
                "https://dev.azure.com/fabrikam/DefaultCollection/_git/Fabrikam",
                "https://dev.azure.com/fabrikam/DefaultCollection",
            ),
            (
                "https://tingle@dev.azure.com/fabrikam/DefaultCollection/_git/Fabrikam",
                "https://dev.azure.com/fabrikam/DefaultCollection",
            ),
        ];

        for (input, expected) in cases {
            let url = AzdoProjectUrl::parse(input).unwrap();
            assert_eq!(url.to_string(), expected, "input {input}");
        }
    }

    #[test]
    fn exposes_components() {
        let url = AzdoProjectUrl::parse("https://dev.azure.com/fabrikam/DefaultCollection/_git/Fabrikam")
            .unwrap();
        assert_eq!(url.organization_name(), "fabrikam");
        assert_eq!(url.organization_url(), "https://dev.azure.com/fabrikam/");
        assert_eq!(url.project_id_or_name(), "DefaultCollection");

        let url = AzdoProjectUrl::parse("https://fabrikam.visualstudio.com/DefaultCollection").unwrap();
        assert_eq!(url.organization_name(), "fabrikam");
        assert_eq!(url.organization_url(), "https://fabrikam.visualstudio.com/");
        assert_eq!(url.project_id_or_name(), "DefaultCollection");
    }

    #[test]
    fn parsing_is_idempotent() {
        for input in [
            "https://dev.azure.com/fabrikam/DefaultCollection/_git/Fabrikam",
            "https://fabrikam.visualstudio.com/_apis/projects/6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
            "https://dev.azure.com/fabrikam/My%20Project",
        ] {
            let first = AzdoProjectUrl::parse(input).unwrap();
            let second = AzdoProjectUrl::parse(&first.to_string()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn host_comparison_ignores_case() {
        let a = AzdoProjectUrl::parse("https://DEV.AZURE.COM/fabrikam/DefaultCollection").unwrap();
        let b = AzdoProjectUrl::parse("https://dev.azure.com/fabrikam/DefaultCollection").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn create_from_parts() {
        let url = AzdoProjectUrl::create("dev.azure.com", "fabrikam", "DefaultCollection").unwrap();
        assert_eq!(url.to_string(), "https://dev.azure.com/fabrikam/DefaultCollection");

        let url =
            AzdoProjectUrl::create("fabrikam.visualstudio.com", "fabrikam", "DefaultCollection").unwrap();
        assert_eq!(url.to_string(), "https://fabrikam.visualstudio.com/DefaultCollection");

        assert!(AzdoProjectUrl::create("github.com", "fabrikam", "DefaultCollection").is_err());
    }

    #[test]
    fn rejects_unsupported_urls() {
        assert!(AzdoProjectUrl::parse("https://github.com/fabrikam/DefaultCollection").is_err());
        assert!(AzdoProjectUrl::parse("https://dev.azure.com/fabrikam").is_err());
        assert!(AzdoProjectUrl::parse("not a url").is_err());
    }
}
