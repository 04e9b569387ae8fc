#![allow(dead_code)]

use std::io;

use rhyton::{Application, Config, Handler, Params, RequestContext, ResponseSink};

pub const HOST: &str = "a.example";

/// Sink remembering every call the dispatcher makes
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub statuses: Vec<(u8, String)>,
    pub body: Vec<u8>,
    pub body_writes: usize,
}

impl ResponseSink for RecordingSink {
    fn write_status(&mut self, status: u8, meta: &str) -> io::Result<()> {
        self.statuses.push((status, meta.to_string()));
        Ok(())
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        self.body_writes += 1;
        self.body.extend_from_slice(body);
        Ok(())
    }
}

/// Sink whose writes always fail
pub struct BrokenSink;

impl ResponseSink for BrokenSink {
    fn write_status(&mut self, _status: u8, _meta: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }

    fn write_body(&mut self, _body: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }
}

pub fn app() -> Application {
    Application::new(Config::new(HOST).unwrap())
}

pub fn hello(_ctx: &mut RequestContext<'_>, params: &Params) -> anyhow::Result<String> {
    Ok(format!("hi {}", params.get("name").unwrap_or("stranger")))
}

pub fn index(_ctx: &mut RequestContext<'_>, _params: &Params) -> anyhow::Result<&'static str> {
    Ok("# Welcome")
}

/// Application with `/` and `/hello/<name>` routed
pub fn hello_app() -> Application {
    let mut app = app();
    app.route("/", Handler::new(index)).unwrap();
    app.route("/hello/<name>", Handler::new(hello)).unwrap();
    app
}
