// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 演示应用的路由装配，供 `main.rs` 与集成测试共用。

use crate::{app::App, router::handler, static_files::serve_static};

use log::info;

use std::{collections::BTreeMap, path::Path};

pub const WELCOME: &str = "Welcome to a simple HTTP server that emulates Express!";

pub fn demo_app(static_root: impl AsRef<Path>) -> App {
    let mut app = App::new();

    // 打印每个请求。备选模式决定了这里能看到哪些参数
    app.use_route(
        ["/:one/:two", "/:only", "/"],
        handler(|req, res, next| {
            let params: BTreeMap<_, _> = req.params().iter().collect();
            info!(
                "[ID{}]Request received for {}://{}{} params: {}",
                req.id(),
                req.protocol(),
                req.host().unwrap_or(""),
                req.original_path(),
                serde_json::to_string(&params).unwrap_or_default()
            );
            next.advance(req, res)
        }),
    );

    app.use_route(
        "/hello/:name",
        handler(|req, res, _next| {
            let name = req.param("name").unwrap_or("").to_string();
            res.send(format!("Hello {}!", name))
        }),
    );

    app.use_route("/hello", handler(|_req, res, _next| res.send("Hello World!")));

    // 找不到文件时静态中间件会继续分发，由下面的兜底路由回复
    app.use_handler(serve_static(static_root));

    app.use_route("/", handler(|_req, res, _next| res.send(WELCOME)));

    app
}
