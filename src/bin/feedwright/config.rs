use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use feedwright::config::{read_config, Config};

use crate::CFG_FILE_NAME;

const SITE_ENV: &str = "SITE";

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    let candidates = [exe_dir, env::current_dir().ok(), dirs::config_dir()];

    candidates.into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let config_path = match cfg_path.or_else(get_config_path) {
        Some(path) => path,
        None => return Err(anyhow!("Could not find {}. Please run feedwright --help", CFG_FILE_NAME)),
    };

    println!("Reading config from {}", config_path.display());
    let mut config = read_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Ok(site) = env::var(SITE_ENV) {
        if !site.trim().is_empty() {
            println!("Using site url {} from {}", site, SITE_ENV);
            config.site.url = Some(site);
        }
    }

    match config.log {
        Some(ref log) => match log.location {
            Some(ref location) => println!("Log enabled. Files will be written in {}", location.display()),
            None => println!("Log enabled. Using the console"),
        },
        None => println!("No [log] section. Using the console"),
    }

    Ok(config)
}
