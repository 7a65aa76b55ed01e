use crate::error::FixResult;
use crate::state::ResolverContext;
use chrono::Local;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Rewrites the report file from the current context. Called once per
/// driver iteration, so the file always reflects the last completed one.
pub fn write_report(ctx: &ResolverContext, path: &Path) -> FixResult<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "pacfix report")?;
    writeln!(out, "Date: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "{}", "=".repeat(40))?;

    write_group(&mut out, "Removed and reinstalled", &ctx.removed_reinstalled)?;
    write_group(&mut out, "Removed, not reinstalled", &ctx.removed_not_reinstalled)?;
    write_group(&mut out, "Conflicts resolved", &ctx.conflicts_resolved)?;
    write_group(&mut out, "Required-by chains resolved", &ctx.requiredby_resolved)?;
    write_group(&mut out, "Not found in repositories", &ctx.not_found_in_repos)?;
    write_group(
        &mut out,
        "Removed for unsatisfied dependencies",
        &ctx.dependency_unsatisfy_removed,
    )?;

    out.flush()?;
    Ok(())
}

fn write_group(out: &mut impl Write, label: &str, names: &BTreeSet<String>) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}:", label)?;
    if names.is_empty() {
        writeln!(out, "(none)")?;
    } else {
        for name in names {
            writeln!(out, "  {}", name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_prints_none_for_every_group() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixConflicts.log");
        write_report(&ResolverContext::new(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("pacfix report\nDate: "));
        assert_eq!(content.matches("(none)").count(), 6);
    }

    #[test]
    fn test_groups_appear_in_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixConflicts.log");
        let mut ctx = ResolverContext::new();
        ctx.record_reinstalled("bash");
        ctx.record_not_reinstalled("obsoletePkg");
        ctx.conflicts_resolved.insert("pkgA".to_string());
        ctx.requiredby_resolved.insert("toolY".to_string());
        ctx.dependency_unsatisfy_removed.insert("appR".to_string());
        write_report(&ctx, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let order = [
            "Removed and reinstalled:",
            "Removed, not reinstalled:",
            "Conflicts resolved:",
            "Required-by chains resolved:",
            "Not found in repositories:",
            "Removed for unsatisfied dependencies:",
        ];
        let positions: Vec<usize> = order.iter().map(|l| content.find(l).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(content.contains("  bash"));
        assert!(content.contains("  obsoletePkg"));
        assert!(content.contains("  pkgA"));
        assert!(content.contains("  toolY"));
        assert!(content.contains("  appR"));
        // the not-found group was filled by the not-reinstalled recording
        assert_eq!(content.matches("(none)").count(), 0);
    }

    #[test]
    fn test_report_is_rewritten_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixConflicts.log");
        let mut ctx = ResolverContext::new();
        ctx.conflicts_resolved.insert("pkgA".to_string());
        write_report(&ctx, &path).unwrap();
        write_report(&ctx, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("pacfix report").count(), 1);
    }
}
