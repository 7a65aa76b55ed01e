use std::collections::{BTreeSet, HashSet};

/// Per-run engine state. One value is threaded through the whole
/// resolution; a fresh context means a fresh run.
#[derive(Debug, Clone, Default)]
pub struct ResolverContext {
    /// Names visited in the current resolution cycle. Re-entry of a name
    /// signals that the recursion must unwind and remove it.
    pub processed: HashSet<String>,

    /// Packages this run uninstalled that must be reinstalled at the start
    /// of the next driver iteration.
    pub removed_pending: BTreeSet<String>,

    /// The package whose removal the engine is currently escaping towards.
    /// `Some` is the removal flag; cleared once the package is gone.
    pub removal_target: Option<String>,

    pub removed_reinstalled: BTreeSet<String>,
    pub removed_not_reinstalled: BTreeSet<String>,
    pub conflicts_resolved: BTreeSet<String>,
    pub requiredby_resolved: BTreeSet<String>,
    pub not_found_in_repos: BTreeSet<String>,
    pub dependency_unsatisfy_removed: BTreeSet<String>,
}

impl ResolverContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn removal_pending(&self) -> bool {
        self.removal_target.is_some()
    }

    /// A name lives in at most one of the reinstalled / not-reinstalled
    /// groups; the later recording wins.
    pub fn record_reinstalled(&mut self, name: &str) {
        self.removed_not_reinstalled.remove(name);
        self.removed_reinstalled.insert(name.to_string());
    }

    /// Not reinstalled always implies not found in the repositories.
    pub fn record_not_reinstalled(&mut self, name: &str) {
        self.removed_reinstalled.remove(name);
        self.removed_not_reinstalled.insert(name.to_string());
        self.not_found_in_repos.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_is_empty() {
        let ctx = ResolverContext::new();
        assert!(ctx.processed.is_empty());
        assert!(ctx.removed_pending.is_empty());
        assert!(!ctx.removal_pending());
    }

    #[test]
    fn test_reinstall_groups_are_exclusive() {
        let mut ctx = ResolverContext::new();
        ctx.record_not_reinstalled("pkg");
        assert!(ctx.removed_not_reinstalled.contains("pkg"));
        ctx.record_reinstalled("pkg");
        assert!(ctx.removed_reinstalled.contains("pkg"));
        assert!(!ctx.removed_not_reinstalled.contains("pkg"));
        ctx.record_not_reinstalled("pkg");
        assert!(!ctx.removed_reinstalled.contains("pkg"));
        assert!(ctx.removed_not_reinstalled.contains("pkg"));
    }

    #[test]
    fn test_not_reinstalled_implies_not_found() {
        let mut ctx = ResolverContext::new();
        ctx.record_not_reinstalled("pkg");
        assert!(ctx.not_found_in_repos.contains("pkg"));
    }

    #[test]
    fn test_removal_flag_follows_target() {
        let mut ctx = ResolverContext::new();
        assert!(!ctx.removal_pending());
        ctx.removal_target = Some("pkg".to_string());
        assert!(ctx.removal_pending());
        ctx.removal_target = None;
        assert!(!ctx.removal_pending());
    }
}
