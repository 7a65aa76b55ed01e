use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CONFLICT_RE: Regex = Regex::new(r"(\S+)\s+and\s+(\S+) are in conflict").unwrap();
    static ref REQUIRED_BY_RE: Regex = Regex::new(r"(\S+)\s+required by\s+(\S+)").unwrap();
    static ref DEPENDENCY_UNSATISFY_RE: Regex =
        Regex::new(r"unable to satisfy dependency '(\S+)' required by\s+(\S+)").unwrap();
    static ref TARGET_NOT_FOUND_RE: Regex = Regex::new(r"\s*target not found:\s+(\S+)").unwrap();
    static ref NOTHING_TO_FIX_RE: Regex = Regex::new(r"there is nothing to do").unwrap();
    static ref UP_TO_DATE_RE: Regex = Regex::new(r"\s*is up to date\s*-+\s*reinstalling").unwrap();
    static ref WAS_NOT_FOUND_RE: Regex = Regex::new(r"package '(\S+)' was not found").unwrap();
    static ref REQUIRED_BY_FIELD_RE: Regex = Regex::new(r"Required By\s+:\s+(.+)").unwrap();
}

/// Classification of one package-manager run, decided by the first
/// matching pattern in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    Conflict,
    RequiredBy,
    DependencyUnsatisfy,
    TargetNotFound,
    NothingToFix,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueMatch {
    pub primary: String,
    pub secondary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub kind: IssueType,
    pub matches: Vec<IssueMatch>,
}

/// Pattern table for pacman's human-readable diagnostics. Every piece of
/// output parsing lives here so another back-end only has to swap this type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacmanDiagnostics;

impl PacmanDiagnostics {
    pub fn new() -> Self {
        Self
    }

    /// Ordered classification: conflict, required-by (only when no
    /// unsatisfiable dependency is reported), unsatisfiable dependency,
    /// target not found, nothing to do. Returns `None` for output none of
    /// the patterns recognize.
    pub fn classify(&self, output: &str) -> Option<Diagnosis> {
        let conflicts = self.conflict_matches(output);
        if !conflicts.is_empty() {
            return Some(Diagnosis {
                kind: IssueType::Conflict,
                matches: conflicts,
            });
        }

        let unsatisfied = capture_pairs(&DEPENDENCY_UNSATISFY_RE, output);
        if REQUIRED_BY_RE.is_match(output) && unsatisfied.is_empty() {
            return Some(Diagnosis {
                kind: IssueType::RequiredBy,
                matches: capture_pairs(&REQUIRED_BY_RE, output),
            });
        }
        if !unsatisfied.is_empty() {
            return Some(Diagnosis {
                kind: IssueType::DependencyUnsatisfy,
                matches: unsatisfied,
            });
        }

        if TARGET_NOT_FOUND_RE.is_match(output) {
            return Some(Diagnosis {
                kind: IssueType::TargetNotFound,
                matches: capture_singles(&TARGET_NOT_FOUND_RE, output),
            });
        }

        if NOTHING_TO_FIX_RE.is_match(output) {
            return Some(Diagnosis {
                kind: IssueType::NothingToFix,
                matches: Vec::new(),
            });
        }

        None
    }

    // pacman echoes the conflicting pair once more inside the interactive
    // "[y/N]" prompt; prompt lines are dropped before matching so only the
    // diagnostic line counts.
    fn conflict_matches(&self, output: &str) -> Vec<IssueMatch> {
        let filtered: Vec<&str> = output.lines().filter(|l| !l.contains("[y/N]")).collect();
        capture_pairs(&CONFLICT_RE, &filtered.join("\n"))
    }

    pub fn is_up_to_date(&self, output: &str) -> bool {
        UP_TO_DATE_RE.is_match(output)
    }

    /// Matches the `package '<name>' was not found` reply of `-Qi`/`-Si`.
    pub fn package_not_found(&self, output: &str) -> bool {
        WAS_NOT_FOUND_RE.is_match(output)
    }

    pub fn target_not_found(&self, output: &str) -> bool {
        TARGET_NOT_FOUND_RE.is_match(output)
    }

    /// Parses the `Required By : ...` field of `-Qi` output. A missing field
    /// and the literal `None` both mean no dependents.
    pub fn required_by_list(&self, output: &str) -> Vec<String> {
        if let Some(caps) = REQUIRED_BY_FIELD_RE.captures(output) {
            let value = caps[1].trim();
            if value != "None" {
                return value.split_whitespace().map(str::to_string).collect();
            }
        }
        Vec::new()
    }
}

fn capture_pairs(re: &Regex, text: &str) -> Vec<IssueMatch> {
    re.captures_iter(text)
        .map(|caps| IssueMatch {
            primary: caps[1].to_string(),
            secondary: caps.get(2).map(|m| m.as_str().to_string()),
        })
        .collect()
}

fn capture_singles(re: &Regex, text: &str) -> Vec<IssueMatch> {
    re.captures_iter(text)
        .map(|caps| IssueMatch {
            primary: caps[1].to_string(),
            secondary: None,
        })
        .collect()
}
