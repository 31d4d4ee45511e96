use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;

/// Env gives access to environment variables and the home directory.
pub trait Env: Debug + Send + Sync + 'static {
    /// Value of `key`, or `None` when unset or not valid utf-8.
    fn var(&self, key: &str) -> Option<String>;

    /// Every variable as `(name, value)` pairs.
    fn vars(&self) -> HashMap<String, String>;

    /// Home directory of the current user, or `None` if it cannot be found.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Env backed by the environment of the running process.
#[derive(Debug, Copy, Clone)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key)?.into_string().ok()
    }

    fn vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        home::home_dir()
    }
}

/// Env with a fixed set of variables, handy in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// Home directory to report.
    pub home_dir: Option<PathBuf>,
    /// Variables to report.
    pub envs: HashMap<String, String>,
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).cloned()
    }

    fn vars(&self) -> HashMap<String, String> {
        self.envs.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir.clone()
    }
}

/// Env that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnv;

impl Env for NoopEnv {
    fn var(&self, _key: &str) -> Option<String> {
        None
    }

    fn vars(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        None
    }
}
