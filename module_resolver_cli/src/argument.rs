use anstyle::{AnsiColor, Style};
use clap::Parser;
use clap::builder::Styles;

const CYAN: Style = AnsiColor::Cyan.on_default();
const GREEN: Style = AnsiColor::Green.on_default();
const GREEN_BOLD: Style = AnsiColor::Green.on_default().bold();
const RED_BOLD: Style = AnsiColor::Red.on_default().bold();
const YELLOW: Style = AnsiColor::Yellow.on_default();

const STYLES: Styles = Styles::styled()
    .header(GREEN_BOLD)
    .usage(GREEN_BOLD)
    .literal(CYAN)
    .placeholder(CYAN)
    .error(RED_BOLD)
    .valid(GREEN)
    .invalid(YELLOW);

/// A thin command-line front end exercising the module resolver driver end-to-end with an
/// in-memory file manager, for manual smoke-testing.
#[derive(Debug, Parser)]
#[command(name = "modulec", about = "Module resolver smoke-test driver", version)]
#[clap(styles = STYLES)]
pub struct Arguments {
    /// Name of the single root module to declare and resolve.
    #[arg(default_value = "app")]
    pub module: String,

    /// A module name this root requires; may be repeated. Names that are never declared
    /// themselves surface as unresolved-requires diagnostics.
    #[arg(long = "requires", value_name = "NAME")]
    pub requires: Vec<String>,

    /// Disables the module system entirely: every module declaration is rejected.
    #[arg(long = "disable-module-system")]
    pub disable_module_system: bool,

    /// Ignores any injected resolver strategy and always uses the built-in one.
    #[arg(long = "force-builtin-resolver")]
    pub force_builtin_resolver: bool,

    /// Path to a module library providing a pluggable resolver strategy. This smoke-test driver
    /// has no dynamic loader, so a configured path that cannot be found is reported through the
    /// normal `module.library.not.found` diagnostic rather than consulted.
    #[arg(long = "module-library-path", value_name = "PATH")]
    pub module_library_path: Option<std::path::PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_single_module_named_app() {
        let arguments = Arguments::parse_from(["modulec"]);
        assert_eq!(arguments.module, "app");
        assert!(arguments.requires.is_empty());
        assert!(!arguments.disable_module_system);
        assert!(!arguments.force_builtin_resolver);
        assert!(arguments.module_library_path.is_none());
    }

    #[test]
    fn test_parses_requires_and_flags() {
        let arguments = Arguments::parse_from([
            "modulec",
            "app",
            "--requires",
            "util",
            "--requires",
            "net",
            "--force-builtin-resolver",
        ]);
        assert_eq!(arguments.module, "app");
        assert_eq!(arguments.requires, vec!["util".to_string(), "net".to_string()]);
        assert!(arguments.force_builtin_resolver);
    }

    #[test]
    fn test_disable_module_system_flag() {
        let arguments = Arguments::parse_from(["modulec", "--disable-module-system"]);
        assert!(arguments.disable_module_system);
    }
}
