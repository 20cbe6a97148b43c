// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求上下文模块
//!
//! `augment` 在请求到达时为原始请求补充派生字段，并创建对应的响应对象：
//! - `protocol`：根据连接是否加密得到，之后不再改变。
//! - `original_path`：任何处理器修改路径之前的快照。
//! - `params`：当前匹配项的参数绑定，分发器每次 `advance` 都会整体替换。

use crate::{
    param::{HttpRequestMethod, HttpVersion},
    pattern::Params,
    request::Request,
    response::Response,
};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    id: u128,
    request: Request,
    protocol: Protocol,
    original_path: String,
    params: Params,
}

/// 由原始请求构造请求上下文和响应上下文。
///
/// `secure` 表示底层连接是否经过加密传输。
pub fn augment(request: Request, secure: bool, id: u128) -> (RequestContext, Response) {
    let protocol = match secure {
        true => Protocol::Https,
        false => Protocol::Http,
    };
    let mut response = Response::new(id);
    response.set_head_only(*request.method() == HttpRequestMethod::Head);
    let context = RequestContext {
        id,
        original_path: request.path().to_string(),
        request,
        protocol,
        params: Params::new(),
    };
    (context, response)
}

impl RequestContext {
    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    /// 当前路径，处理器可以通过 `set_path` 改写
    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.request.set_path(path.into());
    }

    pub fn method(&self) -> &HttpRequestMethod {
        self.request.method()
    }

    pub fn version(&self) -> HttpVersion {
        self.request.version()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn host(&self) -> Option<&str> {
        self.request.host()
    }

    pub fn user_agent(&self) -> &str {
        self.request.user_agent()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|v| v.as_str())
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }
}
