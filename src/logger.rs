//! 日志初始化。优先读取 log4rs 的 YAML 配置，失败时退回到控制台输出。

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

pub const LOG_CONFIG: &str = "config/log4rs.yaml";

const FALLBACK_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

pub fn init(path: &str) {
    let err = match log4rs::init_file(path, Default::default()) {
        Ok(()) => return,
        Err(e) => e,
    };
    eprintln!("无法从{}初始化日志系统：{}，改用控制台输出", path, err);

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FALLBACK_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("日志系统初始化失败：{}", e);
            }
        }
        Err(e) => eprintln!("日志配置无效：{}", e),
    }
}
