use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;

/// 缓存中的一个静态文件：内容与状态码
#[derive(Debug, Clone, PartialEq)]
pub struct CachedFile {
    pub content: Bytes,
    pub status: u16,
    pub content_type: &'static str,
}

/// 静态文件缓存。
///
/// 随静态中间件一起创建，生存期与服务进程相同；不设容量上限，也从不失效。
#[derive(Debug, Default)]
pub struct FileCache {
    cache: HashMap<PathBuf, CachedFile>,
}

impl FileCache {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    // 放入。已有条目时保留先写入的值，返回最终缓存中的值
    pub fn push(&mut self, path: &Path, file: CachedFile) -> CachedFile {
        self.cache
            .entry(path.to_path_buf())
            .or_insert(file)
            .clone()
    }

    // 查询
    pub fn find(&self, path: &Path) -> Option<&CachedFile> {
        self.cache.get(path)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
