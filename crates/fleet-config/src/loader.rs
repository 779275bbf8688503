use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::FleetConfig;

/// 环境变量前缀，例如 `FLEET__MONITOR__INTERVAL_SECS=10`
pub const ENV_PREFIX: &str = "FLEET";
const ENV_SEPARATOR: &str = "__";

/// 配置加载器
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// 加载配置：默认值 <- 配置文件 <- 环境变量
    pub fn load(&self) -> Result<FleetConfig> {
        self.load_with_env(None)
    }

    fn load_with_env(&self, env: Option<HashMap<String, String>>) -> Result<FleetConfig> {
        let mut builder = Config::builder();

        // 配置文件不存在时只使用默认值和环境变量
        if self.config_path.exists() {
            builder = builder.add_source(File::new(
                self.config_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let config: FleetConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl FleetConfig {
    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            return Err(anyhow!("monitor.interval_secs must be greater than 0"));
        }

        if self.monitor.shutdown_grace_secs == 0 {
            return Err(anyhow!("monitor.shutdown_grace_secs must be greater than 0"));
        }

        if let Some(device) = self.demo.devices.iter().find(|d| d.name.is_empty()) {
            return Err(anyhow!(
                "demo device name must not be empty (device_type = {})",
                device.device_type
            ));
        }

        Ok(())
    }
}
