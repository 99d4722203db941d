use std::path::{Path, PathBuf};

pub const ACCOUNTS_FILE: &str = "accounts.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

/// Where the bank keeps its snapshot and its activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
            log_file: log_file.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(ACCOUNTS_FILE)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.data_dir.join(TRANSACTIONS_FILE)
    }
}
