//! Where the crate's log messages go and which of them are emitted. Per-day results are not
//! logged; `crate::report` writes those.
//!
//! The `log` macros are re-exported from here. Nothing is emitted until a level is set, either
//! with `--log-level <spec>` or `-v`/`-vv`/`-vvv` on the command line, or with `set_log_level`,
//! `enable_logging` and `disable_logging` from code. `set_module_filter(s)` and
//! `remove_module_filter` adjust single module paths:
//!
//! ```rust
//! use outbreak::log::{set_module_filter, set_log_level, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // Enable `info` log messages globally.
//!     set_log_level(LevelFilter::Info);
//!     // Silence the per-event scheduling messages.
//!     set_module_filter("outbreak::schedule", LevelFilter::Off);
//!     // Trace every exposure and severity decision.
//!     set_module_filter("outbreak::engine", LevelFilter::Trace);
//! }
//! ```
mod standard_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;
use std::str::FromStr;

use crate::error::OutbreakError;
use crate::hashing::HashMap;
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// A level filter for one module path such as `"outbreak::engine"`.
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// The process-wide logger state behind `LOG_CONFIGURATION`. Every change rebuilds the log4rs
/// config and swaps it in through `root_handle`.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Applies to every module without its own filter.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        LogConfiguration {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::default(),
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    // False when `module` already had `level`.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }

            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated: bool = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// Emits every message from every module.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Sets the global level to `LevelFilter::Off`. Modules with their own filter keep it.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the level for modules without their own filter. `LevelFilter::Off` silences them.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level_filter)]);
}

/// Drops the filter for `module_path`, so the global level applies to it again.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Sets several module filters and rebuilds the logger once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Applies a log specification of the form `level` or `module=level,module=level`, optionally
/// mixed (`info,outbreak::schedule=off`). A bare level sets the global level; a bare module path
/// enables that module at `trace`.
///
/// # Errors
///
/// Returns `OutbreakError::OutbreakError` if a level cannot be parsed. Nothing is applied in
/// that case.
pub fn apply_log_spec(spec: &str) -> Result<(), OutbreakError> {
    let mut global = None;
    let mut modules = Vec::new();
    for directive in spec.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        match directive.split_once('=') {
            Some((module, level)) => {
                modules.push((module.trim(), parse_level(level)?));
            }
            None => match LevelFilter::from_str(directive) {
                Ok(level) => global = Some(level),
                Err(_) => modules.push((directive, LevelFilter::Trace)),
            },
        }
    }

    if let Some(level) = global {
        set_log_level(level);
    } else if !modules.is_empty() && get_log_configuration().global_log_level == LevelFilter::Off
    {
        // Module directives on their own must not be swallowed by a disabled root logger.
        set_log_level(LevelFilter::Error);
    }
    set_module_filters(&modules);
    for (module, level) in &modules {
        info!("Logging enabled for {module} at level {level}");
    }
    Ok(())
}

fn parse_level(level: &str) -> Result<LevelFilter, OutbreakError> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| OutbreakError::from(format!("unknown log level `{}`", level.trim())))
}

/// Maps `-v` counts to a level: one is `info`, two `debug`, three or more `trace`.
#[must_use]
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::{
        apply_log_spec, get_log_configuration, level_for_verbosity, remove_module_filter,
        set_log_level, set_module_filters,
    };
    use log::{error, trace, LevelFilter};
    use std::sync::{LazyLock, Mutex};

    // The logger is global.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn test_set_log_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Trace);
        set_log_level(LevelFilter::Error);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Error);
            error!("test_set_log_level: global set to error");
            trace!("test_set_log_level: NOT EMITTED");
        }
        set_log_level(LevelFilter::Trace);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Trace);
            trace!("test_set_log_level: global set to trace");
        }
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn test_set_remove_module_filters() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        for module in ["outbreak::engine", "outbreak::schedule"] {
            remove_module_filter(module);
        }

        let filters = [
            ("outbreak::engine", LevelFilter::Trace),
            ("outbreak::schedule", LevelFilter::Off),
        ];
        set_module_filters(&filters);
        {
            let config = get_log_configuration();
            for (module_path, level) in &filters {
                assert_eq!(
                    config.module_configurations.get(*module_path),
                    Some(&((*module_path, *level).into()))
                );
            }
        }

        remove_module_filter("outbreak::schedule");
        {
            let config = get_log_configuration();
            assert!(!config.module_configurations.contains_key("outbreak::schedule"));
            assert!(config.module_configurations.contains_key("outbreak::engine"));
        }
        remove_module_filter("outbreak::engine");
    }

    #[test]
    fn test_apply_log_spec() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        apply_log_spec("debug,outbreak::clock=trace").unwrap();
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Debug);
            assert_eq!(
                config.module_configurations.get("outbreak::clock"),
                Some(&(("outbreak::clock", LevelFilter::Trace).into()))
            );
        }
        assert!(apply_log_spec("outbreak=loud").is_err());
        remove_module_filter("outbreak::clock");
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Off);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(7), LevelFilter::Trace);
    }
}
