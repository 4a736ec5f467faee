use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, info, warn};

use super::authenticate::Classification;
use super::form::{FormBinder, FormSubmission, RenderTarget};
use super::http_client::AuthenticateClient;
use super::render::{render_callbacks, DefaultRenderer, PollingWait, RenderedForm, RenderedPage, Renderer};
use super::{AuthExchange, ForgeRockError, LoginConfig};

/// Hooks the embedding application can use to follow along.
/// Every method does nothing by default.
pub trait LoginHandler: Send + Sync {
    /// The server issued a token.
    fn on_success(&self, _exchange: &AuthExchange) {}

    /// The server rejected this attempt.
    /// The failed exchange stays around until the next round trip.
    fn on_failure(&self, _exchange: &AuthExchange) {}

    /// A fresh form has just been mounted.
    fn on_rendered(&self, _form: &RenderedForm) {}

    /// The `waitTime` of the polling callback at `index` has passed.
    /// Nothing is resubmitted on our end: call
    /// [`LoginSession::submit_callbacks`] from here if the flow should poll.
    fn on_wait_elapsed(&self, _index: usize) {}
}

/// A handler that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl LoginHandler for NoopHandler {}

/// How a round trip ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated {
        token_id: String,
        success_url: Option<String>,
    },
    Failed {
        code: Option<u16>,
        reason: Option<String>,
        message: Option<String>,
    },
    /// A form was mounted and we're waiting on the user.
    AwaitingInput,
    /// The target was sent elsewhere by a `RedirectCallback`.
    Redirected,
}

/// Drives a login from the first probe until a token or a failure.
///
/// Every operation takes `&mut self`, so only one round trip can ever be in
/// flight: each response replaces the exchange the next request is built from.
pub struct LoginSession<T: RenderTarget> {
    client: AuthenticateClient,
    renderer: Box<dyn Renderer>,
    handler: Arc<dyn LoginHandler>,
    target: T,
    exchange: AuthExchange,
    /// Bumped for every response we receive.
    round: u64,
    /// The round whose polling wait is still running, or 0 for none.
    waiting_on: Arc<AtomicU64>,
}

impl<T: RenderTarget> LoginSession<T> {
    pub fn new(config: LoginConfig, target: T) -> Result<Self, ForgeRockError> {
        Ok(Self {
            client: AuthenticateClient::new(config)?,
            renderer: Box::new(DefaultRenderer),
            handler: Arc::new(NoopHandler),
            target,
            exchange: AuthExchange::default(),
            round: 0,
            waiting_on: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn LoginHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// The exchange as last received from the server.
    pub fn exchange(&self) -> &AuthExchange {
        &self.exchange
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Whether a polling wait is still running.
    pub fn is_polling(&self) -> bool {
        self.waiting_on.load(Ordering::SeqCst) != 0
    }

    /// Begins authentication with an empty request.
    pub async fn start_login(&mut self) -> Result<LoginOutcome, ForgeRockError> {
        let response = self.client.start().await?;
        self.receive(response)
    }

    /// Sends the given exchange and handles whatever comes back.
    pub async fn submit_callbacks(
        &mut self,
        exchange: AuthExchange,
    ) -> Result<LoginOutcome, ForgeRockError> {
        self.exchange = exchange;
        let response = self.client.submit(&self.exchange).await?;
        self.receive(response)
    }

    /// Applies a submitted form to the current exchange, then sends it.
    pub async fn submit_form(
        &mut self,
        submission: &FormSubmission,
    ) -> Result<LoginOutcome, ForgeRockError> {
        let mut working_body = self.exchange.clone();
        let applied = FormBinder::apply(&mut working_body, submission);
        debug!(applied, "applied submitted fields");

        self.submit_callbacks(working_body).await
    }

    fn receive(&mut self, response: AuthExchange) -> Result<LoginOutcome, ForgeRockError> {
        self.exchange = response;

        // Whatever wait the previous round scheduled no longer applies.
        self.round += 1;
        self.waiting_on.store(0, Ordering::SeqCst);

        match self.exchange.classify() {
            Classification::Success => {
                info!("authentication succeeded");
                self.handler.on_success(&self.exchange);
                Ok(LoginOutcome::Authenticated {
                    token_id: self.exchange.token_id.clone().unwrap_or_default(),
                    success_url: self.exchange.success_url.clone(),
                })
            }
            Classification::Failure => {
                warn!(
                    reason = self.exchange.reason.as_deref().unwrap_or_default(),
                    message = self.exchange.message.as_deref().unwrap_or_default(),
                    "authentication failed"
                );
                self.handler.on_failure(&self.exchange);
                Ok(LoginOutcome::Failed {
                    code: self.exchange.code,
                    reason: self.exchange.reason.clone(),
                    message: self.exchange.message.clone(),
                })
            }
            Classification::Continuation => self.render(),
        }
    }

    fn render(&mut self) -> Result<LoginOutcome, ForgeRockError> {
        debug!(
            callbacks = self.exchange.callbacks.len(),
            stage = self.exchange.stage.as_deref().unwrap_or_default(),
            "rendering callbacks"
        );

        match render_callbacks(self.renderer.as_ref(), &self.exchange)? {
            RenderedPage::Redirect(redirect) => {
                info!(url = %redirect.url, method = %redirect.method, "redirecting");
                self.target.navigate(&redirect);
                Ok(LoginOutcome::Redirected)
            }
            RenderedPage::Form(form) => {
                FormBinder::bind(&mut self.target, &form);
                if let Some(wait) = form.polling {
                    self.schedule_wait(wait);
                }
                self.handler.on_rendered(&form);
                Ok(LoginOutcome::AwaitingInput)
            }
        }
    }

    /// Flags polling as in progress until the wait is over, then tells the handler.
    ///
    /// If another response arrives first, the wait is stale: it neither clears
    /// the flag nor reaches the handler.
    fn schedule_wait(&self, wait: PollingWait) {
        let round = self.round;
        let waiting_on = Arc::clone(&self.waiting_on);
        let handler = Arc::clone(&self.handler);
        waiting_on.store(round, Ordering::SeqCst);

        tokio::spawn(async move {
            tokio::time::sleep(wait.wait).await;
            if waiting_on
                .compare_exchange(round, 0, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                debug!(index = wait.index, round, "dropping stale polling wait");
                return;
            }
            debug!(index = wait.index, round, "polling wait elapsed");
            handler.on_wait_elapsed(wait.index);
        });
    }
}
