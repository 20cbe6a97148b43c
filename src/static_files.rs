// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 静态文件中间件
//!
//! `serve_static(dir)` 生成一个与普通处理器签名相同的处理器：
//! 1. 把请求路径映射到 `dir` 下的文件，`/` 映射为 `/index.html`。
//! 2. 先查缓存；未命中时读取文件，成功则以 (内容, 200) 写入缓存并回复。
//! 3. 文件不存在时不写响应，而是以 `Signal::SuppressNotFound` 继续分发，
//!    让后面已经入队的匹配项有机会处理请求。
//!
//! “不存在”之外的文件系统错误（例如权限不足）作为 `Exception::Io` 返回，由分发器转为 500。

use crate::{
    cache::{CachedFile, FileCache},
    context::RequestContext,
    dispatcher::{Next, Signal},
    exception::Exception,
    param::{DEFAULT_INDEX, DEFAULT_STATUS, FALLBACK_MIME, MIME_TYPES},
    response::Response,
    router::{handler, Handler},
};

use bytes::Bytes;
use log::{debug, warn};

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

pub struct StaticFiles {
    root: PathBuf,
    cache: Mutex<FileCache>,
}

/// 以 `dir` 为根目录创建静态文件处理器
pub fn serve_static(dir: impl AsRef<Path>) -> Handler {
    Arc::new(StaticFiles::new(dir)).into_handler()
}

impl StaticFiles {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            root: dir.as_ref().to_path_buf(),
            cache: Mutex::new(FileCache::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 访问本中间件独占的缓存。锁被污染时恢复并继续使用。
    pub fn cache(&self) -> MutexGuard<'_, FileCache> {
        match self.cache.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("静态文件缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }

    pub fn into_handler(self: Arc<Self>) -> Handler {
        handler(move |req, res, next| self.handle(req, res, next))
    }

    /// 把请求路径解析为根目录下的文件路径。
    ///
    /// 包含 `..` 等越出根目录的成分时返回 `None`，按“文件不存在”处理。
    pub fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let url_path = match url_path {
            "/" => DEFAULT_INDEX,
            other => other,
        };
        let relative = Path::new(url_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    pub fn handle(
        &self,
        req: &mut RequestContext,
        res: &mut Response,
        next: Next<'_>,
    ) -> Result<(), Exception> {
        let id = req.id();
        let path = match self.resolve(req.path()) {
            Some(path) => path,
            None => {
                warn!("[ID{}]请求的路径：{} 越出了静态目录", id, req.path());
                return next.advance_with(req, res, Signal::SuppressNotFound);
            }
        };

        let cached = self.cache().find(&path).cloned();
        let file = match cached {
            Some(file) => {
                debug!("[ID{}]缓存命中：{}", id, path.display());
                file
            }
            None => match self.load(&path, id)? {
                Some(file) => file,
                None => {
                    debug!("[ID{}]静态文件{}不存在，继续分发", id, path.display());
                    return next.advance_with(req, res, Signal::SuppressNotFound);
                }
            },
        };

        res.status(file.status)
            .content_type(file.content_type)
            .send(file.content)
    }

    /// 读取文件并写入缓存；文件不存在（或不是普通文件）时返回 `Ok(None)`。
    ///
    /// 读取期间不持有缓存锁，同一路径的并发首次读取会收敛到先写入的值。
    fn load(&self, path: &Path, id: u128) -> Result<Option<CachedFile>, Exception> {
        let content = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => match fs::read(path) {
                Ok(content) => content,
                Err(e) if is_absent(path, &e) => return Ok(None),
                Err(e) => return Err(e.into()),
            },
            Ok(_) => return Ok(None),
            Err(e) if is_absent(path, &e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!("[ID{}]读取静态文件{}，{} bytes", id, path.display(), content.len());

        let file = CachedFile {
            content: Bytes::from(content),
            status: DEFAULT_STATUS,
            content_type: get_mime(path),
        };
        Ok(Some(self.cache().push(path, file)))
    }
}

// 路径的某个上级是普通文件时（例如 `a.txt/b`）同样视为不存在
fn is_absent(path: &Path, e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound || path.ancestors().skip(1).any(|a| a.is_file())
}

fn get_mime(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| MIME_TYPES.get(e.to_lowercase().as_str()).copied())
        .unwrap_or(FALLBACK_MIME)
}
