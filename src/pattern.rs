// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由模式匹配模块
//!
//! 把 `/hello/:name` 这样的模式编译为逐段比较的结构，并对请求路径做**前缀匹配**：
//! - 字面量段必须与路径段逐字节相等（区分大小写）。
//! - 以 `:` 开头的参数段匹配任意单个路径段，并记录 `name -> 段值`。
//! - 路径中超出模式长度的尾部段被忽略，也不会被捕获。
//!
//! 因此空模式（`/`）会匹配任何路径，相当于兜底路由。

use crate::param::PARAM_MARKER;

use std::collections::HashMap;

/// 一次匹配捕获到的参数绑定，每次匹配都是全新的映射
pub type Params = HashMap<String, String>;

/// 把原始路径按 `/` 切分，并丢弃空段。
///
/// `"/path/to//treat/"` -> `["path", "to", "treat"]`
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// 模式中的单个段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// 必须精确相等的字面量
    Literal(String),
    /// 捕获任意单段的参数（已去掉 `:` 前缀）
    Param(String),
}

impl PatternSegment {
    fn parse(segment: &str) -> Self {
        match segment.strip_prefix(PARAM_MARKER) {
            Some(name) => PatternSegment::Param(name.to_string()),
            None => PatternSegment::Literal(segment.to_string()),
        }
    }
}

/// 编译后的单个模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<PatternSegment>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        Self {
            segments: path_segments(pattern)
                .into_iter()
                .map(PatternSegment::parse)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 用本模式去匹配路径段的前缀。
    ///
    /// 模式比路径长时直接失败；任何一个字面量段不相等都会使整个模式失败。
    pub fn matches(&self, path: &[&str]) -> Option<Params> {
        if self.segments.len() > path.len() {
            return None;
        }
        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                PatternSegment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
                PatternSegment::Literal(literal) => {
                    if literal != value {
                        return None;
                    }
                }
            }
        }
        Some(params)
    }
}

/// 注册时提供的模式描述：单个模式，或按顺序尝试的一组备选模式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSpec {
    Single(String),
    Alternatives(Vec<String>),
}

impl PatternSpec {
    /// 隐式的兜底模式，等价于 `"/"`
    pub fn root() -> Self {
        PatternSpec::Single("/".to_string())
    }
}

impl From<&str> for PatternSpec {
    fn from(pattern: &str) -> Self {
        PatternSpec::Single(pattern.to_string())
    }
}

impl From<String> for PatternSpec {
    fn from(pattern: String) -> Self {
        PatternSpec::Single(pattern)
    }
}

impl From<Vec<&str>> for PatternSpec {
    fn from(patterns: Vec<&str>) -> Self {
        PatternSpec::Alternatives(patterns.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for PatternSpec {
    fn from(patterns: Vec<String>) -> Self {
        PatternSpec::Alternatives(patterns)
    }
}

impl<const N: usize> From<[&str; N]> for PatternSpec {
    fn from(patterns: [&str; N]) -> Self {
        PatternSpec::Alternatives(patterns.iter().map(|p| p.to_string()).collect())
    }
}

/// 一个路由条目编译后的全部备选模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPatternSet {
    patterns: Vec<Pattern>,
}

impl CompiledPatternSet {
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// 按列出的顺序尝试每个备选模式，第一个匹配成功的胜出，其余不再尝试。
    pub fn find_match(&self, path: &[&str]) -> Option<Params> {
        self.patterns.iter().find_map(|pattern| pattern.matches(path))
    }
}

/// 统一编译单个模式和备选模式列表
pub fn compile(spec: &PatternSpec) -> CompiledPatternSet {
    let patterns = match spec {
        PatternSpec::Single(pattern) => vec![Pattern::parse(pattern)],
        PatternSpec::Alternatives(patterns) => {
            patterns.iter().map(|p| Pattern::parse(p)).collect()
        }
    };
    CompiledPatternSet { patterns }
}
