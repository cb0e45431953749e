use crate::{ComposedDocument, Error, PdfBytes, RenderProfile, Renderer, Result};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

enum Job {
    Fragment(String, RenderProfile),
    Document(ComposedDocument),
}

/// An async-friendly renderer backed by one worker thread per render.
///
/// The blocking pipeline runs on a dedicated thread that owns its own browser
/// instance, so concurrent renders never share an engine and async callers
/// never block the runtime. A deadline both bounds the engine on the worker
/// and limits how long the caller awaits.
#[derive(Clone)]
pub struct AsyncRenderer {
    renderer: Renderer,
}

impl AsyncRenderer {
    pub fn new(renderer: Renderer) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Render a fragment, optionally giving up after `deadline`.
    pub async fn render(&self, fragment: &str, profile: RenderProfile, deadline: Option<Duration>) -> Result<PdfBytes> {
        self.run(Job::Fragment(fragment.to_string(), profile), deadline).await
    }

    /// Print a previously previewed document.
    pub async fn render_document(&self, doc: ComposedDocument, deadline: Option<Duration>) -> Result<PdfBytes> {
        self.run(Job::Document(doc), deadline).await
    }

    async fn run(&self, job: Job, deadline: Option<Duration>) -> Result<PdfBytes> {
        let renderer = self.renderer.clone();
        let deadline_at = deadline.map(|d| Instant::now() + d);
        let (tx, rx) = oneshot::channel();

        thread::Builder::new()
            .name("nirnay-render".into())
            .spawn(move || {
                let res = match job {
                    Job::Fragment(fragment, profile) => {
                        renderer.render_using::<crate::cdp::CdpEngine>(&fragment, profile, deadline_at)
                    }
                    Job::Document(doc) => renderer.render_document_using::<crate::cdp::CdpEngine>(&doc, deadline_at),
                };
                // The receiver is gone when the caller stopped waiting.
                let _ = tx.send(res);
            })?;

        let result = async {
            match rx.await {
                Ok(res) => res,
                Err(e) => Err(Error::RenderEngine(format!("Render worker exited: {}", e))),
            }
        };

        match deadline {
            Some(limit) => tokio::time::timeout(limit, result)
                .await
                .map_err(|_| Error::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)))?,
            None => result.await,
        }
    }
}
