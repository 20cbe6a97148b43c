use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{info, warn};
use std::env;
use std::fs;

/// 覆盖 `port` 的环境变量名
pub const PORT_ENV: &str = "PROTOEXPRESS_PORT";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default = "default_static_root")]
    static_root: String,
}

fn default_port() -> u16 {
    8080
}

fn default_local() -> bool {
    true
}

fn default_static_root() -> String {
    "public".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: default_port(),
            local: default_local(),
            static_root: default_static_root(),
        }
    }

    /// 从 TOML 文件读取配置，文件缺失或格式错误时使用默认配置
    pub fn from_toml(filename: &str) -> Self {
        let str_val = match fs::read_to_string(filename) {
            Ok(s) => s,
            Err(e) => {
                warn!("无法读取配置文件{}：{}，使用默认配置", filename, e);
                return Config::new();
            }
        };
        Self::parse(&str_val)
    }

    pub fn parse(str_val: &str) -> Self {
        match toml::from_str(str_val) {
            Ok(t) => t,
            Err(e) => {
                warn!("无法成功从配置文件构建配置对象：{}，使用默认配置", e);
                Config::new()
            }
        }
    }

    /// 用环境变量覆盖端口
    pub fn with_env(self) -> Self {
        self.with_port_override(env::var(PORT_ENV).ok().as_deref())
    }

    fn with_port_override(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            match value.parse::<u16>() {
                Ok(port) => {
                    info!("环境变量{}指定端口{}", PORT_ENV, port);
                    self.port = port;
                }
                Err(_) => warn!("环境变量{}的值{}不是合法端口，忽略", PORT_ENV, value),
            }
        }
        self
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn static_root(&self) -> &str {
        &self.static_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse("port = 9000\nlocal = false\nstatic_root = \"www\"\n");
        assert_eq!(config.port(), 9000);
        assert!(!config.local());
        assert_eq!(config.static_root(), "www");
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let config = Config::parse("port = 9000\n");
        assert_eq!(config.port(), 9000);
        assert!(config.local());
        assert_eq!(config.static_root(), "public");
    }

    #[test]
    fn test_invalid_toml_falls_back() {
        assert_eq!(Config::parse("port = \"not a number\""), Config::new());
    }

    #[test]
    fn test_missing_file_falls_back() {
        assert_eq!(Config::from_toml("no/such/file.toml"), Config::new());
    }

    #[test]
    fn test_port_override() {
        assert_eq!(Config::new().with_port_override(Some("8888")).port(), 8888);
        assert_eq!(Config::new().with_port_override(Some("oops")).port(), 8080);
        assert_eq!(Config::new().with_port_override(None).port(), 8080);
    }
}
