// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 应用模块
//!
//! `App` 是对外的注册与监听入口：
//! - `use_handler` / `use_route` 在启动前填充路由表，之后路由表只读。
//! - `handle` 为单个请求构建上下文和匹配队列，并驱动分发器。
//! - `listen` 在固定主机上接受连接，每个连接一个任务，处理完一个请求即关闭。

use crate::{
    context::augment,
    dispatcher::Dispatcher,
    exception::Exception,
    param::{HOST, MAX_HEAD_SIZE},
    pattern::{path_segments, PatternSpec},
    request::Request,
    response::Response,
    router::{Handler, RouteTable},
};

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
    time::Instant,
};

pub struct App {
    routes: RouteTable,
    host: Ipv4Addr,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            host: HOST,
        }
    }

    /// 修改监听地址。默认只监听本地回环地址
    pub fn set_host(&mut self, host: Ipv4Addr) -> &mut Self {
        self.host = host;
        self
    }

    /// 以隐式的兜底模式 `/` 注册处理器
    pub fn use_handler(&mut self, handler: Handler) -> &mut Self {
        self.routes.register(PatternSpec::root(), handler);
        self
    }

    /// 以单个模式或备选模式列表注册处理器
    pub fn use_route(&mut self, spec: impl Into<PatternSpec>, handler: Handler) -> &mut Self {
        self.routes.register(spec.into(), handler);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// 处理一个已解析的请求，返回分发结束时的响应。
    ///
    /// 没有任何处理器结束响应时，返回的响应 `is_finalized()` 为假。
    pub fn handle(&self, request: Request, secure: bool, id: u128) -> Response {
        let (mut req, mut res) = augment(request, secure, id);
        let queue = self.routes.build_queue(&path_segments(req.path()));
        debug!("[ID{}]匹配队列长度: {}", id, queue.len());

        let dispatcher = Dispatcher::new(queue);
        let state = dispatcher.run(&mut req, &mut res);
        debug!("[ID{}]分发结束，状态: {:?}", id, state);
        res
    }

    pub async fn listen(self, port: u16) -> Result<(), Exception> {
        self.listen_then(port, |_| {}).await
    }

    /// 绑定端口后调用一次 `ready`（参数为实际绑定的地址），然后开始接受连接
    pub async fn listen_then<F>(self, port: u16, ready: F) -> Result<(), Exception>
    where
        F: FnOnce(SocketAddr),
    {
        let socket = SocketAddrV4::new(self.host, port);
        let listener = match TcpListener::bind(socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定端口：{}，错误：{}", port, e);
                return Err(Exception::BindFailed);
            }
        };
        let addr = listener.local_addr()?;
        info!("{}绑定完成，开始接受连接", addr);
        ready(addr);
        self.serve(listener).await
    }

    async fn serve(self, listener: TcpListener) -> Result<(), Exception> {
        let app = Arc::new(self);
        let mut id: u128 = 0;
        loop {
            let (mut stream, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("接受连接失败: {}", e);
                    continue;
                }
            };
            debug!("[ID{}]新的连接：{}", id, addr);

            let app = Arc::clone(&app);
            tokio::spawn(async move {
                app.handle_connection(&mut stream, id).await;
            });
            id += 1;
        }
    }

    async fn handle_connection(&self, stream: &mut TcpStream, id: u128) {
        let head = match read_head(stream, id).await {
            Some(head) => head,
            None => return,
        };
        let start_time = Instant::now();

        let response = match head.and_then(|buffer| Request::try_from(&buffer, id)) {
            Ok(request) => {
                let summary = format!(
                    "{}, {}, {}, {}",
                    request.version(),
                    request.path(),
                    request.method(),
                    request.user_agent()
                );
                let response = self.handle(request, false, id);
                info!(
                    "[ID{}] {}, {}, {}",
                    id,
                    summary,
                    response.status_code(),
                    response.information()
                );
                response
            }
            Err(e) => {
                warn!("[ID{}]解析HTTP请求失败: {}，返回400", id, e);
                bad_request(id)
            }
        };

        if !response.is_finalized() {
            warn!("[ID{}]没有处理器结束响应，直接关闭连接", id);
            return;
        }
        debug!(
            "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
            id,
            start_time.elapsed().as_millis()
        );

        if let Err(e) = stream.write_all(&response.as_bytes()).await {
            error!("[ID{}]发送响应失败: {}", id, e);
            return;
        }
        if let Err(e) = stream.flush().await {
            debug!("[ID{}]刷新TCPStream失败: {}", id, e);
        }
    }
}

/// 读取到空行为止的请求头部。连接在发送任何数据前关闭时返回 `None`；
/// 超过 `MAX_HEAD_SIZE` 仍未读到空行时返回 `Exception::MalformedRequest`。
async fn read_head(stream: &mut TcpStream, id: u128) -> Option<Result<Vec<u8>, Exception>> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return None;
            }
        }
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buffer.len() > MAX_HEAD_SIZE {
            warn!("[ID{}]请求头部超过{}字节", id, MAX_HEAD_SIZE);
            return Some(Err(Exception::MalformedRequest));
        }
    }
    if buffer.is_empty() {
        debug!("[ID{}]客户端未发送数据即关闭连接", id);
        return None;
    }
    Some(Ok(buffer))
}

fn bad_request(id: u128) -> Response {
    let mut response = Response::new(id);
    if let Err(e) = response.status(400).send("Bad Request") {
        error!("[ID{}]无法构建400响应: {}", id, e);
    }
    response
}
