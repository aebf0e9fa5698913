//! Resume parsing heuristics.
//!
//! Builds a [`SessionProfile`] from raw resume text. Extraction is strictly
//! evidence-based: the candidate name and every skill must appear verbatim in
//! the text (or, for the name, in the uploaded filename). Nothing is
//! inferred or invented.

use chrono::Utc;

use crate::session::SessionProfile;

/// Fallback when no plausible name can be found anywhere.
const DEFAULT_NAME: &str = "Candidate";

/// Lines containing these tokens are never treated as a name.
const NAME_BLOCKLIST: &[&str] = &[
    "resume",
    "curriculum",
    "vitae",
    "email",
    "phone",
    "linkedin",
    "github",
    "profile",
    "summary",
    "objective",
];

/// Skill lexicon: canonical name plus the aliases that count as evidence.
const SKILL_ALIASES: &[(&str, &[&str])] = &[
    ("python", &["python"]),
    ("rust", &["rust"]),
    ("java", &["java"]),
    ("javascript", &["javascript", "js"]),
    ("typescript", &["typescript", "ts"]),
    ("go", &["golang"]),
    ("c++", &["c++", "cpp"]),
    ("sql", &["sql", "postgresql", "postgres", "mysql"]),
    ("docker", &["docker"]),
    ("kubernetes", &["kubernetes", "k8s"]),
    ("aws", &["aws", "amazon web services"]),
    ("gcp", &["gcp", "google cloud"]),
    ("azure", &["azure"]),
    ("terraform", &["terraform"]),
    ("react", &["react"]),
    ("node.js", &["node.js", "nodejs"]),
    ("django", &["django"]),
    ("fastapi", &["fastapi"]),
    ("machine learning", &["machine learning", "ml engineer"]),
    ("data analysis", &["data analysis", "data analyst", "pandas"]),
    ("devops", &["devops"]),
    ("ci/cd", &["ci/cd", "cicd", "jenkins", "github actions"]),
];

/// Build a profile from resume text.
///
/// Returns `None` when the text is empty or whitespace-only; such an upload
/// carries no evidence to extract from.
pub fn profile_from_text(
    session_id: &str,
    resume_text: &str,
    filename_hint: Option<&str>,
) -> Option<SessionProfile> {
    if resume_text.trim().is_empty() {
        return None;
    }

    let candidate_name = extract_name(resume_text, filename_hint);
    let extracted_fields = extract_skills(resume_text);

    tracing::debug!(
        session = session_id,
        name = %candidate_name,
        skills = extracted_fields.len(),
        "built candidate profile"
    );

    Some(SessionProfile {
        session_id: session_id.to_string(),
        resume_text: resume_text.to_string(),
        candidate_name,
        extracted_fields,
        created_at: Utc::now(),
    })
}

/// Best-effort name extraction, in order of confidence: an explicit
/// `Name:` label, the first plausible short line, the filename stem, and
/// finally a neutral placeholder.
fn extract_name(resume_text: &str, filename_hint: Option<&str>) -> String {
    for line in resume_text.lines().take(20) {
        let line = line.trim();
        if let Some(rest) = strip_label(line, "name") {
            if is_plausible_name(rest) {
                return rest.to_string();
            }
        }
    }

    for line in resume_text.lines().take(5) {
        let line = line.trim();
        if is_plausible_name(line) {
            return line.to_string();
        }
    }

    if let Some(hint) = filename_hint {
        let stem = hint
            .rsplit('/')
            .next()
            .unwrap_or(hint)
            .split('.')
            .next()
            .unwrap_or("")
            .replace(['_', '-'], " ");
        let stem = stem.trim();
        if is_plausible_name(stem) {
            return stem.to_string();
        }
    }

    DEFAULT_NAME.to_string()
}

/// Case-insensitive `<label>:` prefix strip.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let (head, rest) = line.split_once(':')?;
    if head.trim().eq_ignore_ascii_case(label) {
        Some(rest.trim())
    } else {
        None
    }
}

/// A plausible name: one to four words, letters only (plus `.`/`-`/`'`),
/// no blocklisted resume-boilerplate tokens.
fn is_plausible_name(line: &str) -> bool {
    if line.is_empty() || line.len() > 60 {
        return false;
    }

    let lowered = line.to_lowercase();
    if NAME_BLOCKLIST.iter().any(|token| lowered.contains(token)) {
        return false;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() || words.len() > 4 {
        return false;
    }

    words.iter().all(|word| {
        word.chars()
            .all(|ch| ch.is_alphabetic() || matches!(ch, '.' | '-' | '\''))
    })
}

/// Collect skills that appear verbatim in the text (any section, including
/// an explicit `Skills:` list), canonicalized and sorted. Only lexicon
/// entries count; free-form skill claims outside it are ignored.
fn extract_skills(resume_text: &str) -> Vec<String> {
    let lowered = resume_text.to_lowercase();

    let mut skills: Vec<String> = SKILL_ALIASES
        .iter()
        .filter(|(_, aliases)| aliases.iter().any(|alias| contains_term(&lowered, alias)))
        .map(|(canonical, _)| canonical.to_string())
        .collect();

    skills.sort();
    skills.dedup();
    skills
}

/// Word-boundary-ish containment: the match must not be glued to adjacent
/// alphanumerics, so "go" does not fire inside "google" or "algorithm".
fn contains_term(haystack: &str, term: &str) -> bool {
    let mut search_from = 0;
    while let Some(pos) = haystack[search_from..].find(term) {
        let start = search_from + pos;
        let end = start + term.len();

        let before_ok = start == 0
            || !haystack[..start]
                .chars()
                .next_back()
                .is_some_and(|ch| ch.is_alphanumeric());
        let after_ok = end == haystack.len()
            || !haystack[end..]
                .chars()
                .next()
                .is_some_and(|ch| ch.is_alphanumeric());

        if before_ok && after_ok {
            return true;
        }
        search_from = start + 1;
    }
    false
}
