// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表模块
//!
//! 路由表按注册顺序保存 (模式, 处理器) 条目，从不重排也不去重，顺序即优先级。
//! 每个请求到达时，`build_queue` 按顺序遍历所有条目，把**所有**匹配的条目
//! 连同各自的参数绑定放入匹配队列，交给分发器逐个执行。

use crate::{
    context::RequestContext,
    dispatcher::Next,
    exception::Exception,
    pattern::{compile, CompiledPatternSet, Params, PatternSpec},
    response::Response,
};

use std::sync::Arc;

/// 处理器：`(请求上下文, 响应, 继续)`。
///
/// 处理器要么调用 `res.send` 结束响应，要么调用 `next.advance` 把控制权交给下一个匹配项。
pub type Handler =
    Arc<dyn Fn(&mut RequestContext, &mut Response, Next<'_>) -> Result<(), Exception> + Send + Sync>;

/// 把闭包包装为 `Handler`，闭包的参数类型由这里的约束推导
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut RequestContext, &mut Response, Next<'_>) -> Result<(), Exception>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// 路由表中的一个条目
pub struct Route {
    spec: PatternSpec,
    patterns: CompiledPatternSet,
    handler: Handler,
}

impl Route {
    pub fn spec(&self) -> &PatternSpec {
        &self.spec
    }
}

/// 一次匹配：处理器及其独立的参数绑定
#[derive(Clone)]
pub struct Match {
    handler: Handler,
    params: Params,
}

impl Match {
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// 针对单个请求计算出的有序匹配队列，构建后不再改变
pub type MatchQueue = Vec<Match>;

#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: vec![] }
    }

    /// 在表尾追加一个条目，注册时即完成模式编译
    pub fn register(&mut self, spec: PatternSpec, handler: Handler) {
        let patterns = compile(&spec);
        self.routes.push(Route {
            spec,
            patterns,
            handler,
        });
    }

    /// 按注册顺序收集全部匹配项。没有任何条目匹配时返回空队列。
    pub fn build_queue(&self, path: &[&str]) -> MatchQueue {
        self.routes
            .iter()
            .filter_map(|route| {
                route.patterns.find_match(path).map(|params| Match {
                    handler: Arc::clone(&route.handler),
                    params,
                })
            })
            .collect()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::path_segments;

    fn noop() -> Handler {
        handler(|_req, _res, _next| Ok(()))
    }

    #[test]
    fn test_empty_table_yields_empty_queue() {
        let table = RouteTable::new();
        assert!(table.build_queue(&["anything"]).is_empty());
    }

    #[test]
    fn test_all_matching_entries_queued_in_order() {
        let mut table = RouteTable::new();
        table.register(PatternSpec::from("/hello/:name"), noop());
        table.register(PatternSpec::from("/bye"), noop());
        table.register(PatternSpec::from("/hello"), noop());
        table.register(PatternSpec::root(), noop());

        let queue = table.build_queue(&path_segments("/hello/Ada"));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue[0].params().get("name").map(|s| s.as_str()), Some("Ada"));
        assert!(queue[1].params().is_empty());
        assert!(queue[2].params().is_empty());
    }

    #[test]
    fn test_same_handler_queued_twice() {
        let handler = noop();
        let mut table = RouteTable::new();
        table.register(PatternSpec::from("/a"), Arc::clone(&handler));
        table.register(PatternSpec::from("/:x"), Arc::clone(&handler));

        let queue = table.build_queue(&["a"]);
        assert_eq!(queue.len(), 2);
        assert!(Arc::ptr_eq(queue[0].handler(), queue[1].handler()));
    }

    #[test]
    fn test_alternatives_and_root_both_queued() {
        let mut table = RouteTable::new();
        table.register(PatternSpec::from(["/:one/:two", "/:only", "/"]), noop());
        table.register(PatternSpec::from("/"), noop());

        let queue = table.build_queue(&["a", "b"]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].params().len(), 2);
        assert_eq!(queue[0].params().get("one").map(|s| s.as_str()), Some("a"));
        assert_eq!(queue[0].params().get("two").map(|s| s.as_str()), Some("b"));
        assert!(queue[1].params().is_empty());
    }

    #[test]
    fn test_table_keeps_duplicates() {
        let mut table = RouteTable::new();
        table.register(PatternSpec::from("/a"), noop());
        table.register(PatternSpec::from("/a"), noop());
        assert_eq!(table.len(), 2);
        assert_eq!(table.routes()[1].spec(), &PatternSpec::from("/a"));
    }
}
