// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块集中定义了分发器与 HTTP 层共用的常量和强类型：
//! - 路由模式中的参数标记、静态目录的默认首页。
//! - 常见 HTTP 状态码的原因短语，以及静态文件使用的 MIME 映射表。
//! - HTTP 方法与协议版本的枚举。

use lazy_static::lazy_static;
use std::{collections::HashMap, fmt, net::Ipv4Addr};

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "protoexpress";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 路由模式中标记参数段的前缀字符，例如 `/hello/:name`
pub const PARAM_MARKER: char = ':';

/// 静态中间件将 `/` 映射到的默认文件
pub const DEFAULT_INDEX: &str = "/index.html";

/// `listen` 固定绑定的主机地址（等价于 `localhost`）
pub const HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// 未设置状态码时 `send` 写出的默认状态
pub const DEFAULT_STATUS: u16 = 200;

/// 单个请求头部允许的最大字节数，超过即视为畸形请求
pub const MAX_HEAD_SIZE: usize = 8192;

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(100, "Continue");
        map.insert(101, "Switching Protocols");

        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(204, "No Content");
        map.insert(206, "Partial Content");

        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(307, "Temporary Redirect");
        map.insert(308, "Permanent Redirect");

        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(406, "Not Acceptable");
        map.insert(408, "Request Timeout");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(413, "Content Too Large");
        map.insert(414, "URI Too Long");
        map.insert(415, "Unsupported Media Type");
        map.insert(418, "I'm a teapot");
        map.insert(422, "Unprocessable Content");
        map.insert(429, "Too Many Requests");

        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

lazy_static! {
    /// 文件后缀名到 MIME 类型的映射表，静态中间件据此设置 `Content-Type`。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("css", "text/css;charset=utf-8");
        map.insert("csv", "text/csv");
        map.insert("gif", "image/gif");
        map.insert("htm", "text/html;charset=utf-8");
        map.insert("html", "text/html;charset=utf-8");
        map.insert("ico", "image/x-icon");
        map.insert("jpg", "image/jpeg");
        map.insert("jpeg", "image/jpeg");
        map.insert("js", "text/javascript;charset=utf-8");
        map.insert("json", "application/json");
        map.insert("mjs", "text/javascript;charset=utf-8");
        map.insert("md", "text/markdown;charset=utf-8");
        map.insert("pdf", "application/pdf");
        map.insert("png", "image/png");
        map.insert("svg", "image/svg+xml");
        map.insert("txt", "text/plain;charset=utf-8");
        map.insert("wasm", "application/wasm");
        map.insert("webp", "image/webp");
        map.insert("woff", "font/woff");
        map.insert("woff2", "font/woff2");
        map.insert("xml", "application/xml");
        map
    };
}

/// 无法识别后缀时使用的兜底类型
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpVersion {
    V1_0,
    V1_1,
}

/// HTTP 请求方法。
///
/// 路由匹配完全忽略方法，这里的枚举只用于日志和 404 文本。
/// 不在标准列表中的方法以 `Extension` 原样保留。
#[derive(Debug, Clone, PartialEq)]
pub enum HttpRequestMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
    Extension(String),
}

impl HttpRequestMethod {
    /// 从请求行中的方法名构造（大小写不敏感）
    pub fn parse(method: &str) -> Self {
        match method.to_uppercase().as_str() {
            "GET" => HttpRequestMethod::Get,
            "HEAD" => HttpRequestMethod::Head,
            "OPTIONS" => HttpRequestMethod::Options,
            "POST" => HttpRequestMethod::Post,
            "PUT" => HttpRequestMethod::Put,
            "PATCH" => HttpRequestMethod::Patch,
            "DELETE" => HttpRequestMethod::Delete,
            other => HttpRequestMethod::Extension(other.to_string()),
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "HTTP/1.0"),
            HttpVersion::V1_1 => write!(f, "HTTP/1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Post => write!(f, "POST"),
            HttpRequestMethod::Put => write!(f, "PUT"),
            HttpRequestMethod::Patch => write!(f, "PATCH"),
            HttpRequestMethod::Delete => write!(f, "DELETE"),
            HttpRequestMethod::Extension(m) => write!(f, "{}", m),
        }
    }
}
