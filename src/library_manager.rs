//! # Library Manager Module
//!
//! ## Purpose
//! Keeps the persistent settings of EquiThe in one JSON file: the path of the species database and
//! the default options of the equilibrium solver. Code that needs a setting reads it through the
//! global manager instead of hardcoding it.
//!
//! ## Architecture
//! - **LibraryConfig**: serializable settings (database path + solver defaults)
//! - **LibraryManager**: loads, validates and saves the settings
//! - **Global Access**: `OnceLock<Mutex<_>>` singleton with a separate test manager
//! - **Configuration File**: `equithe_config.json` in the working directory
//!
//! ## Configuration Format
//! ```json
//! {
//!   "database": "",
//!   "solver": {
//!     "tolerance": 1e-8,
//!     "max_iterations": 100,
//!     "epsilon": 1e-16,
//!     "max_log_step": 3.0,
//!     "amount_floor": 1e-10,
//!     "line_search": true
//!   }
//! }
//! ```
//! An empty database path means the database bundled with the crate.
//!
//! ## Usage Patterns
//!
//! ### Read-only Access
//! ```rust
//! use EquiThe::library_manager::with_library_manager;
//!
//! let tolerance = with_library_manager(|manager| manager.solver_defaults().tolerance);
//! assert!(tolerance > 0.0);
//! ```
//!
//! ### Mutable Access
//! ```rust,no_run
//! use EquiThe::library_manager::with_library_manager_mut;
//!
//! with_library_manager_mut(|manager| manager.set_database("my_database.json")).unwrap();
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// name of the configuration file
pub const CONFIG_FILE: &str = "equithe_config.json";

/// Default options of the equilibrium solver.
///
/// # Fields
/// * `tolerance` - convergence threshold of the maximum scaled residual
/// * `max_iterations` - Newton iterations before giving up
/// * `epsilon` - log-barrier parameter, the smallest amount a species can reach is of this order
/// * `max_log_step` - largest change of ln(n) in one iteration
/// * `amount_floor` - initial amount given to species that start at zero
/// * `line_search` - backtracking on the residual norm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverDefaults {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub epsilon: f64,
    pub max_log_step: f64,
    pub amount_floor: f64,
    pub line_search: bool,
}

impl Default for SolverDefaults {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
            epsilon: 1e-16,
            max_log_step: 3.0,
            amount_floor: 1e-10,
            line_search: true,
        }
    }
}

impl SolverDefaults {
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        let positive = [
            ("tolerance", self.tolerance),
            ("epsilon", self.epsilon),
            ("max_log_step", self.max_log_step),
            ("amount_floor", self.amount_floor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{} must be positive, got {}", name, value).into());
            }
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        Ok(())
    }
}

/// Persistent settings.
///
/// # Fields
/// * `database` - path to a JSON species database, empty for the bundled one
/// * `solver` - default solver options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LibraryConfig {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub solver: SolverDefaults,
}

/// Loads, validates and persists [`LibraryConfig`].
#[derive(Debug, Clone)]
pub struct LibraryManager {
    config: LibraryConfig,
    config_file: String,
}

impl LibraryManager {
    /// Manager reading `equithe_config.json` from the working directory, defaults when absent.
    pub fn new() -> Self {
        Self::with_config_file(CONFIG_FILE)
    }

    /// Manager with a custom configuration file, used by tests and embedding applications.
    pub fn with_config_file(config_file: &str) -> Self {
        let config = match Self::load_config(config_file) {
            Ok(config) => config,
            Err(e) => {
                warn!("can not read {}: {}, using defaults", config_file, e);
                LibraryConfig::default()
            }
        };
        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    fn load_config(config_file: &str) -> Result<LibraryConfig, Box<dyn std::error::Error>> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            let config: LibraryConfig = serde_json::from_str(&content)?;
            config.solver.validate()?;
            info!("configuration loaded from {}", config_file);
            Ok(config)
        } else {
            Ok(LibraryConfig::default())
        }
    }

    /// Writes the configuration file. Does nothing in tests.
    pub fn save_config(&self) -> Result<(), Box<dyn std::error::Error>> {
        #[cfg(test)]
        {
            return Ok(());
        }

        #[cfg(not(test))]
        {
            let content = serde_json::to_string_pretty(&self.config)?;
            fs::write(&self.config_file, content)?;
            Ok(())
        }
    }

    /// path of the species database, empty for the bundled one
    pub fn database_path(&self) -> &str {
        &self.config.database
    }

    pub fn solver_defaults(&self) -> &SolverDefaults {
        &self.config.solver
    }

    /// Sets the database file. The file must exist; an empty path selects the bundled database.
    pub fn set_database(&mut self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        if path.is_empty() || Path::new(path).exists() {
            self.config.database = path.to_string();
            self.save_config()?;
            Ok(())
        } else {
            Err(format!("File does not exist: {}", path).into())
        }
    }

    pub fn set_solver_defaults(
        &mut self,
        solver: SolverDefaults,
    ) -> Result<(), Box<dyn std::error::Error>> {
        solver.validate()?;
        self.config.solver = solver;
        self.save_config()?;
        Ok(())
    }

    /// Updates several settings given as text, all or nothing.
    ///
    /// Keys: "database", "tolerance", "max_iterations", "epsilon", "max_log_step",
    /// "amount_floor", "line_search".
    pub fn update_settings(
        &mut self,
        updates: HashMap<&str, &str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut config = self.config.clone();
        for (key, value) in &updates {
            match *key {
                "database" => {
                    if !value.is_empty() && !Path::new(value).exists() {
                        return Err(format!("File does not exist: {}", value).into());
                    }
                    config.database = value.to_string();
                }
                "tolerance" => config.solver.tolerance = value.parse()?,
                "max_iterations" => config.solver.max_iterations = value.parse()?,
                "epsilon" => config.solver.epsilon = value.parse()?,
                "max_log_step" => config.solver.max_log_step = value.parse()?,
                "amount_floor" => config.solver.amount_floor = value.parse()?,
                "line_search" => config.solver.line_search = value.parse()?,
                _ => return Err(format!("Unknown setting: {}", key).into()),
            }
        }
        config.solver.validate()?;
        self.config = config;
        self.save_config()?;
        Ok(())
    }

    pub fn get_config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.config = LibraryConfig::default();
        self.save_config()?;
        Ok(())
    }
}

impl Default for LibraryManager {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_LIBRARY_MANAGER: OnceLock<Mutex<LibraryManager>> = OnceLock::new();

/// Swaps the global manager for `manager`, whether or not the global was already in use.
/// Every later call of `get_library_manager` sees the new one.
#[cfg(test)]
pub fn set_test_manager(manager: LibraryManager) {
    *get_library_manager() = manager;
}

/// Puts back a manager read from the default configuration file.
#[cfg(test)]
pub fn clear_test_manager() {
    *get_library_manager() = LibraryManager::new();
}

/// Guard of the global manager. A poisoned lock is recovered, the settings stay valid.
pub fn get_library_manager() -> MutexGuard<'static, LibraryManager> {
    GLOBAL_LIBRARY_MANAGER
        .get_or_init(|| Mutex::new(LibraryManager::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// Runs `f` with read access to the global manager.
pub fn with_library_manager<F, R>(f: F) -> R
where
    F: FnOnce(&LibraryManager) -> R,
{
    let manager = get_library_manager();
    f(&manager)
}

/// Runs `f` with write access to the global manager.
pub fn with_library_manager_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut LibraryManager) -> R,
{
    let mut manager = get_library_manager();
    f(&mut manager)
}
