use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use colored::Colorize;
use log::info;
use pacfix::{
    config::Config,
    engine::{ConflictEngine, FIX_ALL},
    error::{FixError, FixResult},
    runner::ShellRunner,
};

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    if let Err(e) = run(&matches) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("pacfix")
        .version(pacfix::PACFIX_VERSION)
        .about("Drives the package manager back to a clean state after a failed upgrade by resolving conflicts, broken required-by chains, and obsolete targets.")
        .arg(Arg::new("fix")
            .long("fix")
            .action(ArgAction::SetTrue)
            .help("Fix all conflicts automatically"))
        .arg(Arg::new("package")
            .value_name("PACKAGE")
            .help("Fix conflicts for a specific package"))
        .group(ArgGroup::new("target")
            .args(["fix", "package"])
            .required(true))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help("Enable debug logging"))
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .value_name("CONFIG")
            .help("Use an alternate configuration file"))
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn run(matches: &ArgMatches) -> FixResult<()> {
    let config = Config::load(matches.get_one::<String>("config").map(|s| s.as_str()))?;

    let target = if matches.get_flag("fix") {
        FIX_ALL.to_string()
    } else {
        let name = matches
            .get_one::<String>("package")
            .cloned()
            .unwrap_or_default();
        validate_package_name(&name)?;
        name
    };

    let mut engine = ConflictEngine::new(config, ShellRunner::new());
    let status = engine.run(&target)?;
    info!("finished with status {:?}", status);
    Ok(())
}

// package names end up inside a shell command line, so only the characters
// pacman itself allows in a name may pass
fn validate_package_name(name: &str) -> FixResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-'));
    if valid {
        Ok(())
    } else {
        Err(FixError::InvalidPackageName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_package_name() {
        assert!(validate_package_name("firefox").is_ok());
        assert!(validate_package_name("lib32-glibc").is_ok());
        assert!(validate_package_name("python-setuptools_scm").is_ok());
        assert!(validate_package_name("gtk3+").is_ok());
        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("two words").is_err());
        assert!(validate_package_name("pkg; rm -rf /").is_err());
    }

    #[test]
    fn test_cli_requires_a_target() {
        assert!(build_cli().try_get_matches_from(["pacfix"]).is_err());
        assert!(build_cli().try_get_matches_from(["pacfix", "--fix"]).is_ok());
        assert!(build_cli().try_get_matches_from(["pacfix", "firefox"]).is_ok());
        assert!(build_cli()
            .try_get_matches_from(["pacfix", "--fix", "firefox"])
            .is_err());
    }
}
