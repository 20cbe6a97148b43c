// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应上下文模块
//!
//! `Response` 是交给每个处理器的响应对象：
//! - `status` 只记录待写出的状态码，不产生任何输出，可以多次调用。
//! - `send` 写出状态码和响应体并结束响应，**每个请求只能调用一次**。
//!   第二次调用返回 `Exception::ResponseAlreadySent`，先写入的内容保持不变。
//!
//! 响应结束后由连接层调用 `as_bytes` 序列化为 HTTP/1.1 报文。

use crate::{exception::Exception, param::*};

use bytes::Bytes;
use chrono::prelude::*;
use log::error;

#[derive(Debug, Clone)]
pub struct Response {
    id: u128,
    status_code: u16,
    information: String,
    content_type: String,
    content: Option<Bytes>,
    date: DateTime<Utc>,
    server_name: String,
    head_only: bool,
}

impl Response {
    pub fn new(id: u128) -> Self {
        Self {
            id,
            status_code: DEFAULT_STATUS,
            information: reason_phrase(DEFAULT_STATUS).to_string(),
            content_type: "text/html;charset=utf-8".to_string(),
            content: None,
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            head_only: false,
        }
    }

    /// HEAD 请求只写出头部，`Content-Length` 仍按响应体计算
    pub(crate) fn set_head_only(&mut self, head_only: bool) -> &mut Self {
        self.head_only = head_only;
        self
    }

    /// 记录待写出的状态码。结束之后再调用会被忽略并记录错误。
    pub fn status(&mut self, code: u16) -> &mut Self {
        if self.is_finalized() {
            error!("[ID{}]响应已结束，忽略状态码{}", self.id, code);
            return self;
        }
        self.status_code = code;
        self.information = reason_phrase(code).to_string();
        self
    }

    /// 设置 `Content-Type`，默认为 `text/html;charset=utf-8`
    pub fn content_type(&mut self, content_type: &str) -> &mut Self {
        self.content_type = content_type.to_string();
        self
    }

    /// 写出状态码与响应体，并把响应标记为已结束。
    pub fn send(&mut self, body: impl Into<Bytes>) -> Result<(), Exception> {
        if self.is_finalized() {
            error!("[ID{}]同一个响应被发送了两次", self.id);
            return Err(Exception::ResponseAlreadySent);
        }
        if !(100..=999).contains(&self.status_code) {
            error!("[ID{}]非法的状态码：{}", self.id, self.status_code);
            return Err(Exception::InvalidStatusCode(self.status_code));
        }
        self.date = Utc::now();
        self.content = Some(body.into());
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.content.is_some()
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    pub fn content_length(&self) -> u64 {
        self.content.as_ref().map_or(0, |c| c.len() as u64)
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let status_code: &str = &self.status_code.to_string();
        let content_length: &str = &self.content_length().to_string();
        let date: &str = &format_date(&self.date);
        let information: &str = &self.information;
        let content_type: &str = &self.content_type;
        let server: &str = &self.server_name;

        let header = [
            "HTTP/1.1 ",
            status_code,
            " ",
            information,
            CRLF,
            "Content-Type: ",
            content_type,
            CRLF,
            "Content-Length: ",
            content_length,
            CRLF,
            "Date: ",
            date,
            CRLF,
            "Server: ",
            server,
            CRLF,
            "Connection: close",
            CRLF,
            CRLF,
        ]
        .concat();
        let body: &[u8] = match &self.content {
            Some(c) if !self.head_only => c.as_ref(),
            _ => b"",
        };
        [header.as_bytes(), body].concat()
    }
}

fn reason_phrase(code: u16) -> &'static str {
    STATUS_CODES.get(&code).copied().unwrap_or("Unknown")
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
