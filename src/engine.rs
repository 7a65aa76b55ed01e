use crate::config::Config;
use crate::diagnostics::{Diagnosis, IssueMatch, IssueType, PacmanDiagnostics};
use crate::error::{FixError, FixResult};
use crate::report;
use crate::runner::CommandRunner;
use crate::state::ResolverContext;
use colored::Colorize;
use log::{debug, info, warn};

/// Sentinel target selecting the full automated fixup instead of a single
/// package.
pub const FIX_ALL: &str = "--fix";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NothingToDo,
    ConflictsResolved,
    RequiredByResolved,
    TargetNotFoundResolved,
    DependencyUnsatisfyResolved,
    InstalledPackage,
    /// Escape signal: a name was re-entered, the recursion must unwind to
    /// the frame that owns its removal.
    RemovalRequired,
    ContinueProcessing,
    Done,
    ErrorOccurred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    NotInstalled,
    Failed,
}

/// The conflict resolution engine. Repeatedly invokes the package manager,
/// classifies its diagnostics, and removes or reinstalls packages until the
/// system reports nothing left to do.
pub struct ConflictEngine<R: CommandRunner> {
    config: Config,
    runner: R,
    diagnostics: PacmanDiagnostics,
    ctx: ResolverContext,
}

impl<R: CommandRunner> ConflictEngine<R> {
    pub fn new(config: Config, runner: R) -> Self {
        Self {
            config,
            runner,
            diagnostics: PacmanDiagnostics::new(),
            ctx: ResolverContext::new(),
        }
    }

    pub fn context(&self) -> &ResolverContext {
        &self.ctx
    }

    /// Driver loop: reinstall whatever the previous iteration removed,
    /// write the report, inspect again. The first iteration inspects the
    /// caller's target; every later one verifies the whole system.
    pub fn run(&mut self, target: &str) -> FixResult<Status> {
        println!(
            "\nRunning {} to see packages in conflict...\n",
            self.config.pacman_command
        );

        let mut target = target.to_string();
        let mut status;
        loop {
            if !self.ctx.removed_pending.is_empty() {
                self.reinstall_pending();
            }
            report::write_report(&self.ctx, &self.config.log_file)?;

            status = self.inspect(&target)?;
            target = FIX_ALL.to_string();

            if status == Status::NothingToDo || status == Status::ErrorOccurred {
                break;
            }
        }

        println!(
            "\n{} All conflicts and required packages processed.\n",
            "[FINISHED]".green().bold()
        );
        println!("If any package was removed, it has been reinstalled.");
        println!(
            "You may want to run '{} {} -Syu' to ensure the system is up to date.",
            self.config.sudo_command, self.config.pacman_command
        );
        println!("Execute the program again if there are still conflicts.\n");

        Ok(status)
    }

    fn reinstall_pending(&mut self) {
        println!("\n{}", "[REINSTALLING REMOVED PACKAGES]".cyan().bold());

        let pending: Vec<String> = self.ctx.removed_pending.iter().cloned().collect();
        for name in &pending {
            let output = self.runner.run(&self.config.repo_info_command(name));
            if self.diagnostics.package_not_found(&output) {
                println!(
                    "{} >> {} was not found in the repositories. Skipping reinstall.",
                    "[PACKAGE NOT FOUND]".yellow().bold(),
                    name
                );
                self.ctx.removed_pending.remove(name);
                self.ctx.record_not_reinstalled(name);
            }
        }

        if self.ctx.removed_pending.is_empty() {
            return;
        }

        let names: Vec<String> = self.ctx.removed_pending.iter().cloned().collect();
        self.runner.run(&self.config.reinstall_command(&names));
        for name in &names {
            self.ctx.record_reinstalled(name);
        }
        self.ctx.removed_pending.clear();
        info!("reinstalled {} package(s)", names.len());
    }

    /// Inspector: cycle-break bookkeeping, one package-manager invocation,
    /// classification, dispatch to the resolver, status mapping.
    pub fn inspect(&mut self, target: &str) -> FixResult<Status> {
        if target == FIX_ALL {
            self.ctx.processed.clear();
        } else if self.ctx.processed.contains(target) {
            println!(
                "\n{} >> {}\n",
                "[REMOVAL REQUIRED]".yellow().bold(),
                target
            );
            self.ctx.removal_target = Some(target.to_string());
            return Ok(Status::RemovalRequired);
        } else {
            self.ctx.processed.insert(target.to_string());
        }

        let command = if target == FIX_ALL {
            println!(
                "\n{}\n",
                "[RESOLVING ALL CONFLICTS AUTOMATICALLY]".cyan().bold()
            );
            self.config.upgrade_command()
        } else {
            println!("\n{} >> {}\n", "[RESOLVING FOR]".cyan().bold(), target);
            self.config.install_command(target)
        };

        let output = self.runner.run(&command);

        if output.is_empty() {
            println!("{}", "[EMPTY OUTPUT]".yellow());
            println!("\n{}\n", "[DONE]".green().bold());
            self.ctx.processed.clear();
            return Ok(Status::Done);
        }

        if let Some(diagnosis) = self.diagnostics.classify(&output) {
            debug!("classified output as {:?}", diagnosis.kind);
            self.resolve_issue(&diagnosis)?;

            let status = match diagnosis.kind {
                IssueType::Conflict => Status::ConflictsResolved,
                IssueType::RequiredBy => {
                    if self.ctx.removal_pending() {
                        // keep the processed set: the escape is still
                        // unwinding through the frames above
                        return Ok(Status::ContinueProcessing);
                    }
                    Status::RequiredByResolved
                }
                IssueType::DependencyUnsatisfy => Status::RequiredByResolved,
                IssueType::TargetNotFound => Status::TargetNotFoundResolved,
                IssueType::NothingToFix => Status::NothingToDo,
                IssueType::Unknown => Status::Done,
            };
            self.ctx.processed.clear();
            return Ok(status);
        }

        if self.diagnostics.is_up_to_date(&output) {
            println!(
                "\n{} >> {} is already installed and up to date.",
                "[UP TO DATE]".green().bold(),
                target
            );
            self.ctx.processed.clear();
            return Ok(Status::InstalledPackage);
        }

        println!("\n{}\n", "[DONE]".green().bold());
        self.ctx.processed.clear();
        Ok(Status::Done)
    }

    fn resolve_issue(&mut self, diagnosis: &Diagnosis) -> FixResult<()> {
        for m in &diagnosis.matches {
            match diagnosis.kind {
                IssueType::Conflict => self.resolve_conflict(m)?,
                IssueType::RequiredBy => {
                    if self.resolve_required_by(m)? {
                        return Ok(());
                    }
                }
                IssueType::DependencyUnsatisfy => self.resolve_dependency_unsatisfy(m)?,
                IssueType::TargetNotFound => self.resolve_target_not_found(m),
                IssueType::NothingToFix | IssueType::Unknown => {}
            }
        }
        if diagnosis.kind == IssueType::NothingToFix {
            println!("\n{}\n", "[DONE]".green().bold());
        }
        Ok(())
    }

    fn resolve_conflict(&mut self, m: &IssueMatch) -> FixResult<()> {
        let other = m.secondary.clone().unwrap_or_default();
        println!(
            "\n{} >> {} and {}",
            "[CONFLICT BETWEEN]".red().bold(),
            m.primary,
            other
        );

        loop {
            let status = self.inspect(&m.primary)?;
            if matches!(
                status,
                Status::Done | Status::InstalledPackage | Status::TargetNotFoundResolved
            ) {
                break;
            }
        }

        self.ctx.conflicts_resolved.insert(m.primary.clone());
        if !other.is_empty() {
            self.ctx.conflicts_resolved.insert(other);
        }
        Ok(())
    }

    /// Walks one step up a required-by chain. Returns `true` when the
    /// escape signal must keep propagating to the caller's caller.
    fn resolve_required_by(&mut self, m: &IssueMatch) -> FixResult<bool> {
        let dependent = match &m.secondary {
            Some(dependent) => dependent.clone(),
            None => return Ok(false),
        };
        println!(
            "\n{} >> {} required by {}\n",
            "[REQUIRED BY]".red().bold(),
            m.primary,
            dependent
        );

        for _pass in 0..self.config.requiredby_passes {
            if self.ctx.removed_pending.contains(&dependent) {
                debug!("{} already removed and pending reinstall", dependent);
                break;
            }

            let mut status = self.inspect(&dependent)?;
            if status == Status::RemovalRequired {
                return Ok(true);
            }

            if self.ctx.removal_pending() && self.ctx.processed.contains(&dependent) {
                // this frame's inspect call first inserted the name, so
                // this frame owns its removal
                println!("\n{} >> {}", "[REMOVING]".red().bold(), dependent);
                match self.remove_package(&dependent) {
                    RemovalOutcome::Failed => {
                        println!(
                            "\n{} >> {}",
                            "[FAILED REMOVING PACKAGE]".red().bold(),
                            dependent
                        );
                        return Err(FixError::RemovalFailed(dependent));
                    }
                    _ => {
                        self.ctx.processed.remove(&dependent);
                        status = Status::Done;
                    }
                }
                if self.ctx.removal_target.as_deref() == Some(dependent.as_str()) {
                    self.ctx.removal_target = None;
                }
            } else {
                debug!("no removal owed for {} at this frame", dependent);
            }

            if matches!(
                status,
                Status::Done | Status::InstalledPackage | Status::TargetNotFoundResolved
            ) {
                break;
            }
        }

        self.ctx.requiredby_resolved.insert(m.primary.clone());
        self.ctx.requiredby_resolved.insert(dependent);
        Ok(false)
    }

    /// The dependent of an unsatisfiable dependency is removed and never
    /// reinstalled.
    fn resolve_dependency_unsatisfy(&mut self, m: &IssueMatch) -> FixResult<()> {
        let dependent = match &m.secondary {
            Some(dependent) => dependent.clone(),
            None => return Ok(()),
        };
        println!(
            "\n{} >> cannot satisfy '{}' required by {}",
            "[UNSATISFIED DEPENDENCY]".red().bold(),
            m.primary,
            dependent
        );

        match self.remove_package(&dependent) {
            RemovalOutcome::Failed => {
                println!(
                    "\n{} >> {}",
                    "[FAILED REMOVING PACKAGE]".red().bold(),
                    dependent
                );
                Err(FixError::RemovalFailed(dependent))
            }
            _ => {
                self.ctx.removed_pending.remove(&dependent);
                self.ctx
                    .dependency_unsatisfy_removed
                    .insert(dependent.clone());
                info!("removed {} for an unsatisfiable dependency", dependent);
                Ok(())
            }
        }
    }

    fn resolve_target_not_found(&mut self, m: &IssueMatch) {
        println!(
            "\n{} >> {} - uninstalling",
            "[TARGET NOT FOUND]".yellow().bold(),
            m.primary
        );
        loop {
            match self.remove_package(&m.primary) {
                RemovalOutcome::Removed | RemovalOutcome::NotInstalled => break,
                RemovalOutcome::Failed => {
                    warn!("retrying removal of {}", m.primary);
                }
            }
        }
        self.ctx.not_found_in_repos.insert(m.primary.clone());
    }

    /// Remover: uninstalls a package after its reverse dependencies,
    /// bottom-up. Every leaf removal is recorded for reinstall.
    pub fn remove_package(&mut self, name: &str) -> RemovalOutcome {
        let mut stack = Vec::new();
        self.remove_package_inner(name, &mut stack)
    }

    fn remove_package_inner(&mut self, name: &str, stack: &mut Vec<String>) -> RemovalOutcome {
        println!(
            "\n{} >> {}\n",
            "[CHECKING DEPENDENCIES FOR]".cyan().bold(),
            name
        );

        let info = self.runner.run(&self.config.local_info_command(name));
        if self.diagnostics.package_not_found(&info) {
            println!(
                "{} >> {} was not found in the system.",
                "[PACKAGE NOT INSTALLED]".yellow().bold(),
                name
            );
            return RemovalOutcome::NotInstalled;
        }

        // a name already on the removal stack is a required-by cycle;
        // uninstall it directly instead of recursing forever
        let dependents: Vec<String> = if stack.iter().any(|s| s == name) {
            Vec::new()
        } else {
            self.diagnostics
                .required_by_list(&info)
                .into_iter()
                .filter(|dependent| dependent != name)
                .collect()
        };

        if dependents.is_empty() {
            println!(
                "{} >> no packages depending on {}\n",
                "[REMOVING]".red().bold(),
                name
            );
            self.ctx.removed_pending.insert(name.to_string());
            return self.uninstall(name);
        }

        let mut order = Vec::with_capacity(dependents.len() + 1);
        order.push(name.to_string());
        for dependent in dependents {
            println!("  marking {} for removal", dependent);
            order.push(dependent);
        }
        // dependents come off first, the package itself last
        order.reverse();

        stack.push(name.to_string());
        for pkge in &order {
            if self.remove_package_inner(pkge, stack) == RemovalOutcome::Failed {
                stack.pop();
                return RemovalOutcome::Failed;
            }
        }
        stack.pop();

        println!(
            "{} >> {} and its dependents were removed.",
            "[PACKAGE REMOVED]".green().bold(),
            name
        );
        RemovalOutcome::Removed
    }

    /// Success is the attempt whose output confirms the target is gone.
    fn uninstall(&mut self, name: &str) -> RemovalOutcome {
        let command = self.config.uninstall_command(name);
        for _attempt in 0..self.config.removal_attempts.max(1) {
            let output = self.runner.run(&command);
            if self.diagnostics.target_not_found(&output) {
                return RemovalOutcome::Removed;
            }
        }
        RemovalOutcome::Failed
    }
}
