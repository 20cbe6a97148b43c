// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 演示服务器
//!
//! 读取配置、初始化日志，然后在单线程运行时上启动演示应用：
//! - `/hello/:name` 与 `/hello` 的问候路由
//! - `public` 目录下的静态文件
//! - 其余路径的欢迎页

use protoexpress::{config::Config, demo::demo_app, exception::Exception, logger};

use log::info;

use std::net::Ipv4Addr;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Exception> {
    logger::init(logger::LOG_CONFIG);

    let config = Config::from_toml("config/development.toml").with_env();
    info!("配置文件已载入");
    info!("static root: {}", config.static_root());

    let mut app = demo_app(config.static_root());
    if !config.local() {
        app.set_host(Ipv4Addr::UNSPECIFIED);
    }

    app.listen_then(config.port(), |addr| {
        info!("Ctrl-click to visit http://localhost:{}", addr.port());
    })
    .await
}
