use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::Duration,
};

use anyhow::Context;
use debounce::EventDebouncer;
use log::warn;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

pub struct ConfigManager<T> {
    path: PathBuf,
    current: Arc<RwLock<T>>,
    debouncer: EventDebouncer<UpdateConfigEvent>,
}

const CONFIG_DEBOUNCE_DURATION_MS: u64 = 200;

pub trait Config:
    Sized + Default + Clone + Send + Sync + Serialize + for<'a> Deserialize<'a> + 'static
{
    fn get_path() -> &'static str;

    fn is_valid(&self) -> bool {
        true
    }

    fn create_manager() -> anyhow::Result<ConfigManager<Self>> {
        Self::create_manager_at(PathBuf::from(Self::get_path()))
    }

    fn create_manager_at(path: PathBuf) -> anyhow::Result<ConfigManager<Self>> {
        let manager = ConfigManager::new(path);
        manager
            .load_if_exists()
            .with_context(|| format!("Failed to load config from {:?}", manager.path()))?;
        Ok(manager)
    }
}

#[derive(Clone, Copy, PartialEq)]
struct UpdateConfigEvent;

fn write_config<T: Config>(path: &Path, config: &T) -> anyhow::Result<()> {
    let serialized = ron::ser::to_string_pretty(config, PrettyConfig::default())?;
    let mut writer =
        File::create(path).with_context(|| format!("Failed to create config file {:?}", path))?;
    writer.write_all(serialized.as_bytes())?;
    Ok(())
}

impl<T> ConfigManager<T>
where
    T: Config,
{
    pub fn new(path: PathBuf) -> Self {
        let current = Arc::new(RwLock::new(T::default()));
        let current_clone = current.clone();
        let path_clone = path.clone();

        let on_update = move |_event: UpdateConfigEvent| {
            let config = match current_clone.read() {
                Ok(config) => config.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };

            if !config.is_valid() {
                warn!("Attempted to write invalid config to {:?}", &path_clone);
                return;
            }

            if let Err(e) = write_config(&path_clone, &config) {
                log::error!("Failed to save config to {:?}: {:?}", &path_clone, e);
            }
        };

        Self {
            path,
            current,
            debouncer: EventDebouncer::new(
                Duration::from_millis(CONFIG_DEBOUNCE_DURATION_MS),
                on_update,
            ),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Arc<RwLock<T>> {
        self.current.clone()
    }

    /// Returns a copy of the current config, so callers don't have to hold the lock.
    pub fn snapshot(&self) -> T {
        match self.current.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn load_if_exists(&self) -> anyhow::Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let config_data = std::fs::read_to_string(&self.path)?;
        if config_data.is_empty() {
            return Ok(());
        }

        let config: T = ron::from_str(&config_data)
            .with_context(|| format!("Failed to parse config from {:?}", &self.path))?;

        if !config.is_valid() {
            warn!(
                "Config in {:?} is invalid, falling back to defaults",
                &self.path
            );
            return Ok(());
        }

        match self.current.write() {
            Ok(mut current) => current.clone_from(&config),
            Err(poisoned) => poisoned.into_inner().clone_from(&config),
        }
        Ok(())
    }

    /// Writes the current config right away, bypassing the debouncer.
    pub fn save_now(&self) -> anyhow::Result<()> {
        let config = self.snapshot();
        anyhow::ensure!(
            config.is_valid(),
            "Refusing to write invalid config to {:?}",
            &self.path
        );
        write_config(&self.path, &config)
    }

    pub fn update_and_save<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut T),
    {
        match self.current.write() {
            Ok(mut config) => update_fn(&mut config),
            Err(poisoned) => update_fn(&mut poisoned.into_inner()),
        }
        self.debouncer.put(UpdateConfigEvent);
    }
}
