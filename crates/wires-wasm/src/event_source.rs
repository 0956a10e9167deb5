//! `EventSource` transport for the live activity overlay.
//!
//! Messages are collected by the `onmessage` closure and drained by
//! [`PushChannel::poll`] on the next frame.

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{EventSource, MessageEvent};
use wires_core::WiresError;
use wires_editor::PushChannel;

/// Append the session id to a server URL as a query parameter.
pub fn session_url(base: &str, session: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    let session: String = url::form_urlencoded::byte_serialize(session.as_bytes()).collect();
    format!("{base}{sep}session={session}")
}

pub struct EventSourceChannel {
    stream_url: String,
    logout_url: Option<String>,
    session: Option<String>,
    source: Option<EventSource>,
    inbox: Rc<RefCell<Vec<String>>>,
    // Kept alive for as long as the source is open.
    _on_message: Option<Closure<dyn Fn(MessageEvent)>>,
}

impl EventSourceChannel {
    pub fn new(stream_url: impl Into<String>, logout_url: Option<String>) -> Self {
        Self {
            stream_url: stream_url.into(),
            logout_url,
            session: None,
            source: None,
            inbox: Rc::new(RefCell::new(Vec::new())),
            _on_message: None,
        }
    }

    fn send_logout(&self, session: &str) {
        let Some(logout) = &self.logout_url else {
            return;
        };
        let Some(window) = web_sys::window() else {
            return;
        };
        // Fire and forget; the promise is dropped.
        let _ = window.fetch_with_str(&session_url(logout, session));
    }
}

impl PushChannel for EventSourceChannel {
    fn open(&mut self, session: &str) -> Result<(), WiresError> {
        if self.source.is_some() {
            return Ok(());
        }
        let url = session_url(&self.stream_url, session);
        let source = EventSource::new(&url)
            .map_err(|e| WiresError::ChannelUnavailable(format!("{e:?}")))?;

        let inbox = self.inbox.clone();
        let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
            if let Some(text) = e.data().as_string() {
                inbox.borrow_mut().push(text);
            }
        }) as Box<dyn Fn(MessageEvent)>);
        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        log::info!("live activity stream opened at {url}");
        self.source = Some(source);
        self.session = Some(session.to_string());
        self._on_message = Some(on_message);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(source) = self.source.take() {
            source.set_onmessage(None);
            source.close();
        }
        self._on_message = None;
        self.inbox.borrow_mut().clear();
        if let Some(session) = self.session.take() {
            self.send_logout(&session);
        }
    }

    fn is_open(&self) -> bool {
        self.source.is_some()
    }

    fn poll(&mut self) -> Vec<String> {
        std::mem::take(&mut *self.inbox.borrow_mut())
    }
}
