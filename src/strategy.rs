//! Clone strategies and the commands each one runs.
//!
//! A [`StrategyKind`] is plain data bound to a repository (and branches where it
//! needs them). [`StrategyKind::plan`] turns it into a [`CommandPlan`], which is the
//! single source for both the argument vectors handed to the git client and the
//! human-readable listing written to the transcript.

use std::path::{Component, Path};

use crate::repo::RepoSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyKind {
    PlainClone {
        repository: String,
    },
    ShallowClone {
        repository: String,
    },
    SingleBranchClone {
        repository: String,
        branch: String,
    },
    SelectedBranchesClone {
        repository: String,
        branches: Vec<String>,
    },
    SelectedBranchesNoTagsClone {
        repository: String,
        branches: Vec<String>,
    },
}

/// Commands for one strategy, run in order inside a scratch directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    /// Subdirectory of the scratch directory to create and run in.
    /// Always relative, built by [`scratch_subdir`].
    pub workdir: Option<String>,
    /// Git argument vectors, without the program name
    pub steps: Vec<Vec<String>>,
}

impl StrategyKind {
    pub fn repository(&self) -> &str {
        match self {
            StrategyKind::PlainClone { repository }
            | StrategyKind::ShallowClone { repository }
            | StrategyKind::SingleBranchClone { repository, .. }
            | StrategyKind::SelectedBranchesClone { repository, .. }
            | StrategyKind::SelectedBranchesNoTagsClone { repository, .. } => repository,
        }
    }

    /// Branches this strategy is bound to, empty for whole-repository clones
    pub fn branch_context(&self) -> &[String] {
        match self {
            StrategyKind::PlainClone { .. } | StrategyKind::ShallowClone { .. } => &[],
            StrategyKind::SingleBranchClone { branch, .. } => std::slice::from_ref(branch),
            StrategyKind::SelectedBranchesClone { branches, .. }
            | StrategyKind::SelectedBranchesNoTagsClone { branches, .. } => branches,
        }
    }

    /// Stable identifier, also used as the scratch directory prefix
    pub fn slug(&self) -> &'static str {
        match self {
            StrategyKind::PlainClone { .. } => "plain-clone",
            StrategyKind::ShallowClone { .. } => "shallow-clone",
            StrategyKind::SingleBranchClone { .. } => "single-branch-clone",
            StrategyKind::SelectedBranchesClone { .. } => "selected-branches-clone",
            StrategyKind::SelectedBranchesNoTagsClone { .. } => "selected-branches-no-tags-clone",
        }
    }

    pub fn title(&self) -> String {
        match self {
            StrategyKind::PlainClone { .. } => "Plain clone".to_string(),
            StrategyKind::ShallowClone { .. } => "Shallow clone (depth 1)".to_string(),
            StrategyKind::SingleBranchClone { branch, .. } => {
                format!("Single-branch clone of {branch}")
            }
            StrategyKind::SelectedBranchesClone { branches, .. } => {
                format!("Clone of selected branches {}", branches.join(", "))
            }
            StrategyKind::SelectedBranchesNoTagsClone { branches, .. } => {
                format!(
                    "Clone of selected branches {} without tags",
                    branches.join(", ")
                )
            }
        }
    }

    pub fn plan(&self, url: &str, checkout_ref: &str) -> CommandPlan {
        match self {
            StrategyKind::PlainClone { .. } => CommandPlan {
                workdir: None,
                steps: vec![args(&["clone", url])],
            },
            StrategyKind::ShallowClone { .. } => CommandPlan {
                workdir: None,
                steps: vec![args(&["clone", "--depth", "1", url])],
            },
            StrategyKind::SingleBranchClone { branch, .. } => CommandPlan {
                workdir: None,
                steps: vec![args(&["clone", "--branch", branch, "--single-branch", url])],
            },
            StrategyKind::SelectedBranchesClone {
                repository,
                branches,
            } => CommandPlan {
                workdir: scratch_subdir(repository),
                steps: vec![
                    args(&["init"]),
                    remote_add(branches, url),
                    args(&["checkout", checkout_ref]),
                ],
            },
            StrategyKind::SelectedBranchesNoTagsClone {
                repository,
                branches,
            } => CommandPlan {
                workdir: scratch_subdir(repository),
                steps: vec![
                    args(&["init"]),
                    args(&["config", "remote.origin.tagopt", "--no-tags"]),
                    remote_add(branches, url),
                    args(&["checkout", checkout_ref]),
                    args(&["config", "--unset", "remote.origin.tagopt"]),
                ],
            },
        }
    }
}

impl CommandPlan {
    /// Shell-style listing of exactly what will run
    pub fn listing(&self, program: &str) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.steps.len() + 1);
        if let Some(dir) = &self.workdir {
            let dir = shell_quote(dir);
            lines.push(format!("mkdir -p {dir} && cd {dir}"));
        }
        lines.extend(self.steps.iter().map(|step| render_command(program, step)));
        lines
    }
}

/// Relative directory for a repository inside a scratch directory.
///
/// Only plain path segments are kept, so roots, `.` and `..` never reach the
/// join. `None` when nothing usable is left.
pub fn scratch_subdir(repository: &str) -> Option<String> {
    let segments: Vec<&str> = Path::new(repository)
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Strategies to run for a repository, in execution order
pub fn applicable_strategies(spec: &RepoSpec) -> Vec<StrategyKind> {
    let repository = spec.name.clone();
    let mut strategies = vec![
        StrategyKind::PlainClone {
            repository: repository.clone(),
        },
        StrategyKind::ShallowClone {
            repository: repository.clone(),
        },
    ];

    strategies.extend(
        spec.branches
            .iter()
            .map(|branch| StrategyKind::SingleBranchClone {
                repository: repository.clone(),
                branch: branch.clone(),
            }),
    );

    if spec.branches.len() >= 2 {
        strategies.push(StrategyKind::SelectedBranchesClone {
            repository: repository.clone(),
            branches: spec.branches.clone(),
        });
        strategies.push(StrategyKind::SelectedBranchesNoTagsClone {
            repository,
            branches: spec.branches.clone(),
        });
    }

    strategies
}

pub fn render_command(program: &str, args: &[String]) -> String {
    let mut line = shell_quote(program);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg));
    }
    line
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%~".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

fn remote_add(branches: &[String], url: &str) -> Vec<String> {
    let mut step = args(&["remote", "add"]);
    for branch in branches {
        step.push("-t".to_string());
        step.push(branch.clone());
    }
    step.extend(args(&["-f", "origin", url]));
    step
}
