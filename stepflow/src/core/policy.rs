//! Tool and shell-command permissions derived from the step kind.
//!
//! `work` and `verification` share one policy: base tools only, boundary
//! commands blocked. `closure` may call boundary tools, but boundary actions
//! must still go through those structured tools, so its shell commands are
//! screened with the same patterns.
//!
//! Command screening is pattern matching over free text, not a shell parser.
//! A sufficiently obfuscated command can slip past it; the pattern list is an
//! enumeration of known bypass shapes.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::types::{PermissionResult, StepKind, ToolSet};

/// Tools every step kind may use.
pub const BASE_TOOLS: &[&str] = &[
    "Skill",
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Bash",
    "Glob",
    "Grep",
    "Task",
    "TodoWrite",
    "WebFetch",
    "WebSearch",
];

/// Tools that mutate externally visible state. Closure steps only.
pub const BOUNDARY_TOOLS: &[&str] = &[
    "mcp__github__close_issue",
    "mcp__github__update_issue",
    "mcp__github__merge_pull_request",
    "mcp__github__close_pull_request",
    "mcp__github__create_release",
    "mcp__github__delete_branch",
];

static BASE_AND_BOUNDARY_TOOLS: LazyLock<Vec<&'static str>> =
    LazyLock::new(|| BASE_TOOLS.iter().chain(BOUNDARY_TOOLS).copied().collect());

const RESTRICTED: ToolSet = ToolSet {
    allowed: BASE_TOOLS,
    denied: BOUNDARY_TOOLS,
    block_boundary_bash: true,
};

static CLOSURE: LazyLock<ToolSet> = LazyLock::new(|| ToolSet {
    allowed: BASE_AND_BOUNDARY_TOOLS.as_slice(),
    denied: &[],
    block_boundary_bash: true,
});

/// Host whose API is the target of indirect bypass attempts.
pub const API_HOST: &str = "api.github.com";

/// Any run of flags, with or without values (`-R owner/repo`, `--repo=o/r`).
const FLAGS: &str = r"(?:--?[\w-]+(?:[= ]\S+)?\s+)*";
/// `gh` followed by any global flags.
const GH: &str = r"\bgh\s+(?:--?[\w-]+(?:[= ]\S+)?\s+)*";

struct BoundaryPattern {
    label: &'static str,
    regex: Regex,
}

static BOUNDARY_PATTERNS: LazyLock<Vec<BoundaryPattern>> = LazyLock::new(|| {
    let host = regex::escape(API_HOST);
    let patterns = [
        // Direct CLI subcommands that close, merge, delete, or publish.
        ("gh issue mutation", format!(r"{GH}issue\s+{FLAGS}(?:close|delete|transfer|lock)\b")),
        ("gh pr mutation", format!(r"{GH}pr\s+{FLAGS}(?:merge|close)\b")),
        ("gh release mutation", format!(r"{GH}release\s+{FLAGS}(?:create|delete|edit|upload)\b")),
        ("gh repo mutation", format!(r"{GH}repo\s+{FLAGS}(?:delete|archive)\b")),
        ("remote branch deletion", r"\bgit\s+push\b[^|;&\n]*\s(?:--delete|-d)\b".to_string()),
        // Raw API passthrough can express any mutation.
        ("gh api passthrough", format!(r"{GH}api\b")),
        // Generic HTTP clients aimed at the API host.
        (
            "http client to api host",
            format!(r"\b(?:curl|wget|http|https|xh|httpie)\b[^|;&\n]*{host}"),
        ),
        // Interpreter one-liners aimed at the API host; quotes may hide `;`.
        (
            "script to api host",
            format!(r"\b(?:python3?|node|deno|bun|ruby|perl|php)\b[^\n]*{host}"),
        ),
        // State-mutation payloads, wherever they appear in the pipeline.
        (
            "state mutation payload",
            r#"(?:^|[^\w-])\\?["']?state\\?["']?\s*(?::|=>?)\s*\\?["']?(?:closed|merged)\b"#.to_string(),
        ),
        (
            "graphql mutation",
            r"\b(?:closeIssue|closePullRequest|mergePullRequest|deleteRef|createRelease)\b"
                .to_string(),
        ),
    ];
    patterns
        .into_iter()
        .map(|(label, pattern)| BoundaryPattern {
            label,
            regex: Regex::new(&pattern).expect("boundary pattern should compile"),
        })
        .collect()
});

/// Tool set in force for `kind`.
pub fn tool_set(kind: StepKind) -> &'static ToolSet {
    match kind {
        StepKind::Work | StepKind::Verification => &RESTRICTED,
        StepKind::Closure => &*CLOSURE,
    }
}

/// Decide whether `tool` may be invoked from a step of `kind`.
///
/// The deny list is consulted before the allow list; a boundary tool is
/// rejected even if an allow list also names it.
pub fn is_tool_allowed(tool: &str, kind: StepKind) -> PermissionResult {
    decide_tool(tool_set(kind), tool, kind)
}

fn decide_tool(set: &ToolSet, tool: &str, kind: StepKind) -> PermissionResult {
    if set.denied.contains(&tool) {
        debug!(tool, %kind, "boundary tool denied");
        return PermissionResult::deny(format!(
            "'{tool}' is a boundary tool; boundary actions are only permitted in closure steps (current step kind: {kind})"
        ));
    }
    if set.allowed.contains(&tool) {
        return PermissionResult::allow();
    }
    debug!(tool, %kind, "tool not in allowed set");
    PermissionResult::deny(format!("'{tool}' is not in the tool set for {kind} steps"))
}

/// Decide whether a shell command may run from a step of `kind`.
///
/// Rejects on the first matching boundary pattern and echoes the match.
pub fn is_bash_command_allowed(command: &str, kind: StepKind) -> PermissionResult {
    if !tool_set(kind).block_boundary_bash {
        return PermissionResult::allow();
    }
    for pattern in BOUNDARY_PATTERNS.iter() {
        if let Some(found) = pattern.regex.find(command) {
            let matched = found.as_str().trim();
            debug!(command, %kind, pattern = pattern.label, "boundary command denied");
            return PermissionResult::deny(format!(
                "command matches boundary pattern ({}): '{matched}'; boundary actions must use structured closure tools, not shell commands",
                pattern.label
            ));
        }
    }
    PermissionResult::allow()
}

/// Drop every configured tool on the kind's deny list, keeping order.
///
/// Only denied tools are removed. Tools on neither list are kept here but
/// still refused by [`is_tool_allowed`], so the result is not a grant.
pub fn filter_allowed_tools<S: AsRef<str>>(configured: &[S], kind: StepKind) -> Vec<String> {
    let denied = tool_set(kind).denied;
    configured
        .iter()
        .map(AsRef::as_ref)
        .filter(|tool| !denied.contains(tool))
        .map(str::to_string)
        .collect()
}

/// Every tool known to the policy, base tools first.
pub fn all_known_tools() -> &'static [&'static str] {
    BASE_AND_BOUNDARY_TOOLS.as_slice()
}
