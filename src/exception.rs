// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 定义请求解析、分发以及静态文件读取过程中可能出现的错误。
//!
//! 注意“未匹配到路由”和“静态文件不存在”都不是错误：前者表现为空的
//! 匹配队列（由分发器回复 404），后者表现为带 `SuppressNotFound` 信号的 `advance`。

use std::{fmt, io};

/// 服务器处理请求过程中发生的异常类型。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exception {
    /// 请求头部无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行或头部格式不符合 HTTP/1.x 规范，对应 `400 Bad Request`。
    MalformedRequest,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 同一个响应被 `send` 了第二次。第一次写入的内容保持不变。
    ResponseAlreadySent,
    /// 响应已经结束之后，处理器仍然调用了 `advance`。
    AdvanceAfterSend,
    /// 处理器在执行过程中 panic，已被分发器捕获。
    HandlerPanicked,
    /// 状态码不在 100..=999 范围内。
    InvalidStatusCode(u16),
    /// 文件系统错误（“文件不存在”之外的情况，例如权限不足）。
    Io(io::ErrorKind),
    /// 监听端口绑定失败。
    BindFailed,
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequest => write!(f, "Malformed HTTP request (400)"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            ResponseAlreadySent => write!(f, "Response has already been sent"),
            AdvanceAfterSend => write!(f, "advance() called after the response was sent"),
            HandlerPanicked => write!(f, "A handler panicked during dispatch"),
            InvalidStatusCode(code) => write!(f, "Invalid status code: {}", code),
            Io(kind) => write!(f, "File system error: {}", kind),
            BindFailed => write!(f, "Couldn't bind the listening socket"),
        }
    }
}

impl std::error::Error for Exception {}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        Io(e.kind())
    }
}
