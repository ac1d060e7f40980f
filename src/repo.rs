use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A repository to benchmark, parsed from `name[:branch[,branch...]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub name: String,
    pub branches: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoSpecError {
    #[error("repository name is empty in `{input}`")]
    EmptyName { input: String },

    #[error("empty branch name in `{input}`")]
    EmptyBranch { input: String },

    #[error("repository name `{name}` must be a relative path without `.` or `..` components")]
    UnsafeName { name: String },
}

impl RepoSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            branches: Vec::new(),
        }
    }

    pub fn with_branches<I, S>(name: impl Into<String>, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            branches: branches.into_iter().map(Into::into).collect(),
        }
    }
}

impl FromStr for RepoSpec {
    type Err = RepoSpecError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (name, branch_list) = match input.split_once(':') {
            Some((name, branches)) => (name, Some(branches)),
            None => (input, None),
        };

        if name.is_empty() {
            return Err(RepoSpecError::EmptyName {
                input: input.to_string(),
            });
        }

        if !is_relative_name(name) {
            return Err(RepoSpecError::UnsafeName {
                name: name.to_string(),
            });
        }

        let mut branches = Vec::new();
        if let Some(list) = branch_list {
            for branch in list.split(',') {
                if branch.is_empty() {
                    return Err(RepoSpecError::EmptyBranch {
                        input: input.to_string(),
                    });
                }
                branches.push(branch.to_string());
            }
        }

        Ok(RepoSpec {
            name: name.to_string(),
            branches,
        })
    }
}

/// Names are joined onto scratch directories, so every `/`-separated segment
/// must be a plain directory name.
fn is_relative_name(name: &str) -> bool {
    name.split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.branches.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.branches.join(", "))
        }
    }
}

/// Expand a URL template such as `ssh://{remote}/{repo}`
pub fn repo_url(template: &str, remote: &str, repo: &str) -> String {
    template.replace("{remote}", remote).replace("{repo}", repo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let spec: RepoSpec = "myrepo".parse().unwrap();
        assert_eq!(spec, RepoSpec::new("myrepo"));
    }

    #[test]
    fn test_parse_branches_keep_order() {
        let spec: RepoSpec = "myrepo:main,develop,release/1.x".parse().unwrap();
        assert_eq!(spec.name, "myrepo");
        assert_eq!(spec.branches, vec!["main", "develop", "release/1.x"]);
    }

    #[test]
    fn test_parse_nested_repo_name() {
        let spec: RepoSpec = "team/tools:main".parse().unwrap();
        assert_eq!(spec.name, "team/tools");
        assert_eq!(spec.branches, vec!["main"]);
    }

    #[test]
    fn test_parse_rejects_empty_parts() {
        assert!(matches!(
            ":main".parse::<RepoSpec>(),
            Err(RepoSpecError::EmptyName { .. })
        ));
        assert!(matches!(
            "".parse::<RepoSpec>(),
            Err(RepoSpecError::EmptyName { .. })
        ));
        assert!(matches!(
            "repo:".parse::<RepoSpec>(),
            Err(RepoSpecError::EmptyBranch { .. })
        ));
        assert!(matches!(
            "repo:a,,b".parse::<RepoSpec>(),
            Err(RepoSpecError::EmptyBranch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_names_leaving_scratch_dir() {
        for input in ["/srv/git/tools", "../outside", "a/../b", "./repo", "team//tools", "repo/:main"] {
            assert!(
                matches!(
                    input.parse::<RepoSpec>(),
                    Err(RepoSpecError::UnsafeName { .. })
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RepoSpec::new("solo").to_string(), "solo");
        assert_eq!(
            RepoSpec::with_branches("myrepo", ["main", "develop"]).to_string(),
            "myrepo: main, develop"
        );
    }

    #[test]
    fn test_repo_url() {
        assert_eq!(
            repo_url("ssh://{remote}/{repo}", "myhost.example.com", "myrepo"),
            "ssh://myhost.example.com/myrepo"
        );
        assert_eq!(
            repo_url("file://{remote}/{repo}", "/srv/git", "tools"),
            "file:///srv/git/tools"
        );
    }
}
