// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 分发器模块
//!
//! 分发器持有一个不可变的匹配队列和一个游标，以“继续”（`advance`）驱动处理器链：
//!
//! ```text
//! Ready --advance--> Running --send--> Finalized
//!   |                   |
//!   +--(空队列)--> Exhausted <--(游标越过队尾)
//! ```
//!
//! - 每次 `advance` 把游标加一，用该匹配项的参数**替换**请求上下文中的 `params`，
//!   然后同步调用它的处理器。
//! - 游标越过队尾时进入 `Exhausted`，写出 `404 Cannot <METHOD> <path>`；
//!   如果这次 `advance` 携带 `Signal::SuppressNotFound`，则不写 404。
//! - 每次调用处理器都有保护边界：处理器返回错误或 panic 时，若响应尚未结束，
//!   以 500 结束响应。

use crate::{
    context::RequestContext,
    exception::Exception,
    response::Response,
    router::MatchQueue,
};

use log::{debug, error, warn};

use std::{
    cell::Cell,
    panic::{self, AssertUnwindSafe},
};

/// 分发器所处的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// 队列已构建，尚未调用任何处理器
    Ready,
    /// 至少调用过一个处理器，响应尚未结束
    Running,
    /// 响应已经由处理器结束
    Finalized,
    /// 游标越过了队尾
    Exhausted,
}

/// 随 `advance` 传递的信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// 普通的继续
    Continue,
    /// “这里什么也没找到，但不要因为我而回复 404”，由静态文件中间件使用
    SuppressNotFound,
}

pub struct Dispatcher {
    queue: MatchQueue,
    /// `None` 表示尚未开始（游标 = -1）
    cursor: Cell<Option<usize>>,
    state: Cell<DispatchState>,
    /// 响应是否由分发器自己的 404 结束
    not_found_sent: Cell<bool>,
}

impl Dispatcher {
    pub fn new(queue: MatchQueue) -> Self {
        Self {
            queue,
            cursor: Cell::new(None),
            state: Cell::new(DispatchState::Ready),
            not_found_sent: Cell::new(false),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state.get()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor.get()
    }

    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    /// 自动执行第一次 `advance`，返回分发结束时的状态。
    pub fn run(&self, req: &mut RequestContext, res: &mut Response) -> DispatchState {
        if self.state() != DispatchState::Ready {
            warn!("[ID{}]分发器已经运行过，忽略重复的run调用", req.id());
            return self.state();
        }
        if let Err(e) = self.advance(req, res, Signal::Continue) {
            error!("[ID{}]分发过程中出现错误: {}", req.id(), e);
        }
        self.state()
    }

    /// 把控制权交给队列中的下一个匹配项。
    pub fn advance(
        &self,
        req: &mut RequestContext,
        res: &mut Response,
        signal: Signal,
    ) -> Result<(), Exception> {
        if res.is_finalized() {
            error!("[ID{}]响应已经结束，却仍然调用了advance", req.id());
            return Err(Exception::AdvanceAfterSend);
        }

        let cursor = self.cursor.get().map_or(0, |c| c + 1);
        self.cursor.set(Some(cursor));

        let item = match self.queue.get(cursor) {
            Some(item) => item,
            None => {
                self.state.set(DispatchState::Exhausted);
                match signal {
                    Signal::Continue => {
                        not_found(req, res)?;
                        self.not_found_sent.set(true);
                    }
                    Signal::SuppressNotFound => {
                        debug!("[ID{}]匹配队列已耗尽，按信号不回复404", req.id())
                    }
                }
                return Ok(());
            }
        };

        self.state.set(DispatchState::Running);
        req.set_params(item.params().clone());
        debug!(
            "[ID{}]调用第{}个匹配项，参数：{:?}",
            req.id(),
            cursor,
            item.params()
        );

        let handler = item.handler().as_ref();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler(&mut *req, &mut *res, Next { dispatcher: self })
        }));
        let fault = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(Exception::HandlerPanicked),
        };

        if let Some(e) = fault {
            error!("[ID{}]第{}个处理器失败: {}", req.id(), cursor, e);
            if !res.is_finalized() {
                res.status(500).send("Internal Server Error")?;
            }
        }

        if res.is_finalized() && !self.not_found_sent.get() {
            self.state.set(DispatchState::Finalized);
        }
        Ok(())
    }
}

/// 默认的 404 响应：`Cannot <METHOD> <path>`
fn not_found(req: &RequestContext, res: &mut Response) -> Result<(), Exception> {
    debug!("[ID{}]没有更多匹配项，回复404", req.id());
    let body = format!("Cannot {} {}", req.method(), req.path());
    res.status(404).send(body)
}

/// 交给处理器的“继续”句柄。
///
/// 按值消耗，因此一个处理器最多只能继续一次。
pub struct Next<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Next<'a> {
    pub fn advance(self, req: &mut RequestContext, res: &mut Response) -> Result<(), Exception> {
        self.dispatcher.advance(req, res, Signal::Continue)
    }

    pub fn advance_with(
        self,
        req: &mut RequestContext,
        res: &mut Response,
        signal: Signal,
    ) -> Result<(), Exception> {
        self.dispatcher.advance(req, res, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::augment,
        pattern::{path_segments, PatternSpec},
        request::Request,
        router::{handler, RouteTable},
    };

    use std::sync::{Arc, Mutex};

    fn contexts(raw_path: &str) -> (RequestContext, Response) {
        let raw = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", raw_path);
        augment(Request::try_from(raw.as_bytes(), 1).unwrap(), false, 1)
    }

    fn dispatch(table: &RouteTable, path: &str) -> (Dispatcher, RequestContext, Response) {
        let (mut req, mut res) = contexts(path);
        let dispatcher = Dispatcher::new(table.build_queue(&path_segments(path)));
        dispatcher.run(&mut req, &mut res);
        (dispatcher, req, res)
    }

    fn body(res: &Response) -> String {
        String::from_utf8(res.body().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_empty_queue_is_exhausted_with_404() {
        let table = RouteTable::new();
        let (dispatcher, _req, res) = dispatch(&table, "/anything");
        assert_eq!(dispatcher.state(), DispatchState::Exhausted);
        assert_eq!(res.status_code(), 404);
        assert_eq!(body(&res), "Cannot GET /anything");
    }

    #[test]
    fn test_new_dispatcher_is_ready() {
        let dispatcher = Dispatcher::new(vec![]);
        assert_eq!(dispatcher.state(), DispatchState::Ready);
        assert_eq!(dispatcher.cursor(), None);
    }

    #[test]
    fn test_hello_name_scenario() {
        let mut table = RouteTable::new();
        table.register(
            PatternSpec::from("/hello/:name"),
            handler(|req, res, _next| {
                let name = req.param("name").unwrap_or("").to_string();
                res.send(format!("Hello {}!", name))
            }),
        );
        let (dispatcher, req, res) = dispatch(&table, "/hello/Ada");
        assert_eq!(dispatcher.state(), DispatchState::Finalized);
        assert_eq!(req.param("name"), Some("Ada"));
        assert_eq!(res.status_code(), 200);
        assert_eq!(body(&res), "Hello Ada!");
    }

    #[test]
    fn test_second_entry_runs_only_after_advance() {
        let calls = Arc::new(Mutex::new(vec![]));
        let mut table = RouteTable::new();
        let log = Arc::clone(&calls);
        table.register(
            PatternSpec::root(),
            handler(move |_req, res, _next| {
                log.lock().unwrap().push("A");
                res.send("A")
            }),
        );
        let log = Arc::clone(&calls);
        table.register(
            PatternSpec::root(),
            handler(move |_req, res, _next| {
                log.lock().unwrap().push("B");
                res.send("B")
            }),
        );

        let (_, _, res) = dispatch(&table, "/x");
        assert_eq!(*calls.lock().unwrap(), vec!["A"]);
        assert_eq!(body(&res), "A");
    }

    #[test]
    fn test_params_reflect_only_current_entry() {
        let seen = Arc::new(Mutex::new(vec![]));
        let mut table = RouteTable::new();
        let log = Arc::clone(&seen);
        table.register(
            PatternSpec::from("/:first"),
            handler(move |req, res, next| {
                log.lock().unwrap().push(req.params().clone());
                next.advance(req, res)
            }),
        );
        let log = Arc::clone(&seen);
        table.register(
            PatternSpec::from("/a/:second"),
            handler(move |req, res, _next| {
                log.lock().unwrap().push(req.params().clone());
                res.send("done")
            }),
        );

        let (dispatcher, _, _) = dispatch(&table, "/a/b");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[0].get("first").map(|s| s.as_str()), Some("a"));
        assert_eq!(seen[1].len(), 1);
        assert_eq!(seen[1].get("second").map(|s| s.as_str()), Some("b"));
        assert_eq!(dispatcher.state(), DispatchState::Finalized);
        assert_eq!(dispatcher.cursor(), Some(1));
    }

    #[test]
    fn test_advance_past_end_yields_404() {
        let mut table = RouteTable::new();
        table.register(PatternSpec::root(), handler(|req, res, next| next.advance(req, res)));
        let (dispatcher, _, res) = dispatch(&table, "/nowhere");
        assert_eq!(dispatcher.state(), DispatchState::Exhausted);
        assert_eq!(res.status_code(), 404);
        assert_eq!(body(&res), "Cannot GET /nowhere");
    }

    #[test]
    fn test_suppress_not_found_at_end_writes_nothing() {
        let mut table = RouteTable::new();
        table.register(
            PatternSpec::root(),
            handler(|req, res, next| next.advance_with(req, res, Signal::SuppressNotFound)),
        );
        let (dispatcher, _, res) = dispatch(&table, "/missing.txt");
        assert_eq!(dispatcher.state(), DispatchState::Exhausted);
        assert!(!res.is_finalized());
    }

    #[test]
    fn test_suppress_not_found_still_reaches_later_entries() {
        let mut table = RouteTable::new();
        table.register(
            PatternSpec::root(),
            handler(|req, res, next| next.advance_with(req, res, Signal::SuppressNotFound)),
        );
        table.register(PatternSpec::root(), handler(|_req, res, _next| res.send("fallback")));
        let (dispatcher, _, res) = dispatch(&table, "/missing.txt");
        assert_eq!(dispatcher.state(), DispatchState::Finalized);
        assert_eq!(body(&res), "fallback");
    }

    #[test]
    fn test_send_after_suppressed_exhaustion_is_finalized() {
        let mut table = RouteTable::new();
        table.register(
            PatternSpec::root(),
            handler(|req, res, next| {
                next.advance_with(req, res, Signal::SuppressNotFound)?;
                res.send("late")
            }),
        );
        let (dispatcher, _, res) = dispatch(&table, "/missing.txt");
        assert_eq!(dispatcher.state(), DispatchState::Finalized);
        assert_eq!(body(&res), "late");
    }

    #[test]
    fn test_dispatcher_404_stays_exhausted_through_outer_frames() {
        let mut table = RouteTable::new();
        table.register(PatternSpec::root(), handler(|req, res, next| next.advance(req, res)));
        table.register(PatternSpec::root(), handler(|req, res, next| next.advance(req, res)));
        let (dispatcher, _, res) = dispatch(&table, "/x");
        assert_eq!(dispatcher.state(), DispatchState::Exhausted);
        assert_eq!(res.status_code(), 404);
    }

    #[test]
    fn test_handler_that_stalls_leaves_response_open() {
        let mut table = RouteTable::new();
        table.register(PatternSpec::root(), handler(|_req, _res, _next| Ok(())));
        let (dispatcher, _, res) = dispatch(&table, "/");
        assert_eq!(dispatcher.state(), DispatchState::Running);
        assert!(!res.is_finalized());
    }

    #[test]
    fn test_advance_after_send_is_rejected() {
        let result = Arc::new(Mutex::new(None));
        let mut table = RouteTable::new();
        let slot = Arc::clone(&result);
        table.register(
            PatternSpec::root(),
            handler(move |req, res, next| {
                res.send("first")?;
                *slot.lock().unwrap() = Some(next.advance(req, res));
                Ok(())
            }),
        );
        table.register(PatternSpec::root(), handler(|_req, res, _next| res.send("second")));

        let (dispatcher, _, res) = dispatch(&table, "/");
        assert_eq!(
            *result.lock().unwrap(),
            Some(Err(Exception::AdvanceAfterSend))
        );
        assert_eq!(body(&res), "first");
        assert_eq!(dispatcher.state(), DispatchState::Finalized);
    }

    #[test]
    fn test_handler_error_becomes_500() {
        let mut table = RouteTable::new();
        table.register(
            PatternSpec::root(),
            handler(|_req, _res, _next| Err(Exception::Io(std::io::ErrorKind::PermissionDenied))),
        );
        let (dispatcher, _, res) = dispatch(&table, "/secret");
        assert_eq!(res.status_code(), 500);
        assert_eq!(body(&res), "Internal Server Error");
        assert_eq!(dispatcher.state(), DispatchState::Finalized);
    }

    #[test]
    fn test_handler_panic_becomes_500() {
        let mut table = RouteTable::new();
        table.register(PatternSpec::root(), handler(|_req, _res, _next| panic!("boom")));
        let (_, _, res) = dispatch(&table, "/");
        assert_eq!(res.status_code(), 500);
    }

    #[test]
    fn test_error_after_send_keeps_response() {
        let mut table = RouteTable::new();
        table.register(
            PatternSpec::root(),
            handler(|_req, res, _next| {
                res.send("ok")?;
                res.send("again")
            }),
        );
        let (_, _, res) = dispatch(&table, "/");
        assert_eq!(res.status_code(), 200);
        assert_eq!(body(&res), "ok");
    }

    #[test]
    fn test_run_twice_is_ignored() {
        let table = RouteTable::new();
        let (dispatcher, mut req, mut res) = dispatch(&table, "/x");
        assert_eq!(dispatcher.run(&mut req, &mut res), DispatchState::Exhausted);
    }
}
