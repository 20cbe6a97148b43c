pub mod app;
pub mod cache;
pub mod config;
pub mod context;
pub mod demo;
pub mod dispatcher;
pub mod exception;
pub mod logger;
pub mod param;
pub mod pattern;
pub mod request;
pub mod response;
pub mod router;
pub mod static_files;

pub use app::App;
pub use cache::FileCache;
pub use context::{Protocol, RequestContext};
pub use dispatcher::{DispatchState, Dispatcher, Next, Signal};
pub use exception::Exception;
pub use param::{HttpRequestMethod, HttpVersion};
pub use pattern::{Params, PatternSpec};
pub use request::Request;
pub use response::Response;
pub use router::{handler, Handler, RouteTable};
pub use static_files::{serve_static, StaticFiles};
