//! The gateway route table.
//!
//! Routes are an ordered list of (method, pattern) pairs, each pattern
//! carrying exactly one capture group for the repository identifier.
//! Matching walks the list top to bottom and halts at the first pattern
//! that matches the path, independent of method; only then is the method
//! checked. A path that matches with the wrong method is therefore
//! `WrongMethod`, never a fallthrough to a later route.
//!
//! The table is immutable and built once at startup.

use axum::http::Method;
use regex::Regex;

/// Which handler a route selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// `HEAD` symbolic ref, mutable text.
    Head,
    /// `info/refs`: smart advertisement or dumb listing.
    InfoRefs,
    /// `objects/info/alternates` and `http-alternates`, mutable text.
    TextFile,
    /// `objects/info/packs` listing, mutable UTF-8 text.
    InfoPacks,
    /// Content-addressed loose object, immutable.
    LooseObject,
    /// Pack file, immutable.
    PackFile,
    /// Pack index, immutable.
    IdxFile,
    /// Stateless-RPC fetch negotiation.
    UploadPack,
    /// Stateless-RPC push negotiation.
    ReceivePack,
}

/// One entry of the route table.
#[derive(Debug)]
struct Route {
    method: Method,
    pattern: Regex,
    kind: RouteKind,
}

impl Route {
    fn new(method: Method, pattern: &str, kind: RouteKind) -> Self {
        Self {
            method,
            pattern: Regex::new(pattern).expect("invalid route pattern"),
            kind,
        }
    }
}

/// Result of dispatching a request against the table.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch {
    /// A route matched path and method.
    Matched {
        /// Selected handler.
        kind: RouteKind,
        /// First capture group: the repository identifier.
        repo: String,
        /// Full matched path without its leading slash, usable as a path
        /// relative to the repository root.
        file_path: String,
    },
    /// A pattern matched the path but the method differs.
    WrongMethod,
    /// No pattern matched the path.
    NoMatch,
}

/// Ordered, immutable route table.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Builds the gateway's route table. Specific patterns come before the
    /// generic ones they would otherwise shadow.
    pub fn new() -> Self {
        use RouteKind::*;
        let routes = vec![
            Route::new(Method::GET, r"^/(.+)/HEAD$", Head),
            Route::new(Method::GET, r"^/(.+)/info/refs$", InfoRefs),
            Route::new(Method::GET, r"^/(.+)/objects/info/alternates$", TextFile),
            Route::new(
                Method::GET,
                r"^/(.+)/objects/info/http-alternates$",
                TextFile,
            ),
            Route::new(Method::GET, r"^/(.+)/objects/info/packs$", InfoPacks),
            Route::new(
                Method::GET,
                r"^/(.+)/objects/[0-9a-f]{2}/[0-9a-f]{38}$",
                LooseObject,
            ),
            Route::new(
                Method::GET,
                r"^/(.+)/objects/pack/pack-[0-9a-f]{40}\.pack$",
                PackFile,
            ),
            Route::new(
                Method::GET,
                r"^/(.+)/objects/pack/pack-[0-9a-f]{40}\.idx$",
                IdxFile,
            ),
            Route::new(Method::POST, r"^/(.+)/git-upload-pack$", UploadPack),
            Route::new(Method::POST, r"^/(.+)/git-receive-pack$", ReceivePack),
        ];
        Self { routes }
    }

    /// Dispatches (method, path) to the first structurally matching route.
    pub fn dispatch(&self, method: &Method, path: &str) -> RouteMatch {
        for route in &self.routes {
            let Some(captures) = route.pattern.captures(path) else {
                continue;
            };
            if route.method != *method {
                return RouteMatch::WrongMethod;
            }
            let repo = captures
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            return RouteMatch::Matched {
                kind: route.kind,
                repo,
                file_path: path.trim_start_matches('/').to_string(),
            };
        }
        RouteMatch::NoMatch
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}
