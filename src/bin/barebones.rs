// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 最简服务器：不做路由，对任何请求都回复同一段文本。

use protoexpress::{exception::Exception, logger, router::handler, App};

use log::info;

const PORT: u16 = 8000;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Exception> {
    logger::init(logger::LOG_CONFIG);

    let mut app = App::new();
    app.use_handler(handler(|_req, res, _next| {
        res.send("Response from barebones server")
    }));

    app.listen_then(PORT, |addr| {
        info!("Ctrl-click to visit http://localhost:{}", addr.port());
    })
    .await
}
