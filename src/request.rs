// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求解析模块
//!
//! 负责把从 TCP 流读到的请求头部字节解析为 `Request`：
//! 1. 请求行（方法、路径、版本）。
//! 2. 全部头部字段，按出现顺序保存，查询时大小写不敏感。
//!
//! 请求体、查询字符串都不在解析范围内，路径原样保留。

use crate::{exception::Exception, param::*};
use log::error;

/// 一个原始 HTTP 请求的头部信息。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法，路由时被忽略
    method: HttpRequestMethod,
    /// 请求的资源路径（包含查询字符串）
    path: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 头部字段 (名称, 值)，名称保持原始大小写
    headers: Vec<(String, String)>,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的头部数据（可以带有请求体，会被忽略）。
    /// * `id` - 连接 ID，用于日志追踪。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        // 只关心空行之前的头部
        let head = match request_string.split_once("\r\n\r\n") {
            Some((head, _body)) => head,
            None => request_string,
        };
        let mut request_lines = head.split(CRLF);

        // 请求行 (e.g., "GET /index.html HTTP/1.1")
        let first_line = request_lines.next().unwrap_or("");
        let first_line_parts: Vec<&str> = first_line.split(' ').collect();
        if first_line_parts.len() != 3 || first_line_parts.iter().any(|p| p.is_empty()) {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, first_line);
            return Err(Exception::MalformedRequest);
        }

        let method = HttpRequestMethod::parse(first_line_parts[0]);

        let version = match first_line_parts[2].to_uppercase().as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            other => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, other);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        let path = first_line_parts[1].to_string();
        if !path.starts_with('/') {
            error!("[ID{}]请求路径必须以'/'开头：{}", id, path);
            return Err(Exception::MalformedRequest);
        }

        let mut headers = vec![];
        for line in request_lines {
            if line.is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.push((name.trim().to_string(), value.trim().to_string()))
                }
                None => {
                    error!("[ID{}]无法解析的头部行：{}", id, line);
                    return Err(Exception::MalformedRequest);
                }
            }
        }

        Ok(Self {
            method,
            path,
            version,
            headers,
        })
    }
}

impl Request {
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }

    pub fn method(&self) -> &HttpRequestMethod {
        &self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// 按名称查找头部（大小写不敏感），重复字段返回第一个
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn host(&self) -> Option<&str> {
        self.header("host")
    }

    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or("")
    }
}
