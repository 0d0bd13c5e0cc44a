//! Execution core: credential resolution, dispatch and notification.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::instrument;

use paysource_types::params::assembler;
use paysource_types::{
    ApiError, ApiRequest, ApiResponse, BankAccount, Card, PublishableKey, ResponseListener,
    Source, SourceParams, SourceTypeRegistry, Token, TokenParams, Transport,
};

use crate::config::{ClientConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT};
use crate::task::TaskHandle;
use crate::translate;
use crate::transport::HttpTransport;

pub const TOKENS_PATH: &str = "/v1/tokens";
pub const SOURCES_PATH: &str = "/v1/sources";

type Parser<T> = fn(&ApiResponse, &SourceTypeRegistry) -> Result<T, ApiError>;

fn token_parser(response: &ApiResponse, _: &SourceTypeRegistry) -> Result<Token, ApiError> {
    translate::parse_token(response)
}

/// Builder for [`PaysourceClient`].
pub struct ClientBuilder {
    api_base: String,
    timeout: Duration,
    default_key: Option<PublishableKey>,
    transport: Option<Arc<dyn Transport>>,
    listener: Option<Arc<dyn ResponseListener>>,
    registry: SourceTypeRegistry,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_key: None,
            transport: None,
            listener: None,
            registry: SourceTypeRegistry::default(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from loaded configuration. A configured key must be valid.
    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        let builder = Self::new().api_base(config.api_base).timeout(config.timeout);
        match config.publishable_key {
            Some(key) => builder.default_key(&key),
            None => Ok(builder),
        }
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the key used when a call supplies none.
    ///
    /// Empty keys and secret (`sk_`) keys are rejected here.
    pub fn default_key(mut self, key: &str) -> Result<Self, ApiError> {
        self.default_key = Some(PublishableKey::new(key)?);
        Ok(self)
    }

    /// Replaces the HTTP transport, e.g. with a test double.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn ResponseListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn source_type_registry(mut self, registry: SourceTypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Result<PaysourceClient, ApiError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.api_base, self.timeout)?),
        };
        Ok(PaysourceClient {
            inner: Arc::new(Inner {
                default_key: self.default_key,
                transport,
                listener: self.listener,
                registry: self.registry,
            }),
        })
    }
}

struct Inner {
    default_key: Option<PublishableKey>,
    transport: Arc<dyn Transport>,
    listener: Option<Arc<dyn ResponseListener>>,
    registry: SourceTypeRegistry,
}

/// Client for creating tokens and payment sources.
///
/// Immutable after construction and cheap to clone; clones share the
/// transport, listener and registry. Every operation comes in three forms:
///
/// - `async fn` for callers already on a runtime
/// - `*_blocking` for synchronous callers (not from inside an async task
///   unless you accept blocking that worker)
/// - `dispatch_*` / `spawn_*` to run on a given executor and deliver the
///   result exactly once
#[derive(Clone)]
pub struct PaysourceClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PaysourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaysourceClient")
            .field("default_key", &self.inner.default_key)
            .field("registry", &self.inner.registry)
            .field("listener", &self.inner.listener.is_some())
            .finish()
    }
}

impl PaysourceClient {
    /// Creates a client against the public API with a default key.
    pub fn new(publishable_key: &str) -> Result<Self, ApiError> {
        ClientBuilder::new().default_key(publishable_key)?.build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn default_key(&self) -> Option<&PublishableKey> {
        self.inner.default_key.as_ref()
    }

    /// Picks the key for one call: an explicit key wins over the default.
    pub fn resolve_key(&self, explicit: Option<&str>) -> Result<PublishableKey, ApiError> {
        match explicit {
            Some(key) => PublishableKey::new(key),
            None => match &self.inner.default_key {
                Some(key) => Ok(key.clone()),
                None => PublishableKey::from_option(None),
            },
        }
    }

    // --- async ---------------------------------------------------------

    /// Creates a single-use token from a card or bank account.
    #[instrument(skip(self, params, key), fields(token_type = %params.token_type()))]
    pub async fn create_token(
        &self,
        params: &TokenParams,
        key: Option<&str>,
    ) -> Result<Token, ApiError> {
        let request = self.prepare_token(params, key)?;
        self.execute(request, token_parser).await
    }

    pub async fn create_card_token(&self, card: &Card, key: Option<&str>) -> Result<Token, ApiError> {
        self.create_token(&TokenParams::Card(card.clone()), key).await
    }

    pub async fn create_bank_account_token(
        &self,
        account: &BankAccount,
        key: Option<&str>,
    ) -> Result<Token, ApiError> {
        self.create_token(&TokenParams::BankAccount(account.clone()), key)
            .await
    }

    /// Creates a payment source.
    #[instrument(skip(self, params, key), fields(source_type = %params.source_type().as_str()))]
    pub async fn create_source(
        &self,
        params: &SourceParams,
        key: Option<&str>,
    ) -> Result<Source, ApiError> {
        let request = self.prepare_source(params, key)?;
        self.execute(request, translate::parse_source).await
    }

    /// Retrieves a source; the client secret proves ownership.
    #[instrument(skip(self, client_secret, key))]
    pub async fn retrieve_source(
        &self,
        source_id: &str,
        client_secret: &str,
        key: Option<&str>,
    ) -> Result<Source, ApiError> {
        let request = self.prepare_retrieve(source_id, client_secret, key)?;
        self.execute(request, translate::parse_source).await
    }

    // --- blocking ------------------------------------------------------

    pub fn create_token_blocking(
        &self,
        params: &TokenParams,
        key: Option<&str>,
    ) -> Result<Token, ApiError> {
        block_on(self.create_token(params, key))?
    }

    pub fn create_source_blocking(
        &self,
        params: &SourceParams,
        key: Option<&str>,
    ) -> Result<Source, ApiError> {
        block_on(self.create_source(params, key))?
    }

    pub fn retrieve_source_blocking(
        &self,
        source_id: &str,
        client_secret: &str,
        key: Option<&str>,
    ) -> Result<Source, ApiError> {
        block_on(self.retrieve_source(source_id, client_secret, key))?
    }

    // --- callback dispatch ---------------------------------------------

    /// Runs token creation on `executor` and hands the result to `on_complete`.
    ///
    /// `on_complete` runs exactly once, on the executor, including when the
    /// call fails before any network I/O.
    pub fn dispatch_create_token<F>(
        &self,
        params: &TokenParams,
        key: Option<&str>,
        executor: &Handle,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<Token, ApiError>) + Send + 'static,
    {
        self.dispatch(self.prepare_token(params, key), token_parser, executor, on_complete)
    }

    pub fn dispatch_create_source<F>(
        &self,
        params: &SourceParams,
        key: Option<&str>,
        executor: &Handle,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<Source, ApiError>) + Send + 'static,
    {
        self.dispatch(
            self.prepare_source(params, key),
            translate::parse_source,
            executor,
            on_complete,
        )
    }

    pub fn dispatch_retrieve_source<F>(
        &self,
        source_id: &str,
        client_secret: &str,
        key: Option<&str>,
        executor: &Handle,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<Source, ApiError>) + Send + 'static,
    {
        self.dispatch(
            self.prepare_retrieve(source_id, client_secret, key),
            translate::parse_source,
            executor,
            on_complete,
        )
    }

    // --- awaitable handles ---------------------------------------------

    pub fn spawn_create_token(
        &self,
        params: &TokenParams,
        key: Option<&str>,
        executor: &Handle,
    ) -> TaskHandle<Token> {
        let (tx, rx) = oneshot::channel();
        self.dispatch_create_token(params, key, executor, move |result| {
            let _ = tx.send(result);
        });
        TaskHandle::new(rx)
    }

    pub fn spawn_create_source(
        &self,
        params: &SourceParams,
        key: Option<&str>,
        executor: &Handle,
    ) -> TaskHandle<Source> {
        let (tx, rx) = oneshot::channel();
        self.dispatch_create_source(params, key, executor, move |result| {
            let _ = tx.send(result);
        });
        TaskHandle::new(rx)
    }

    pub fn spawn_retrieve_source(
        &self,
        source_id: &str,
        client_secret: &str,
        key: Option<&str>,
        executor: &Handle,
    ) -> TaskHandle<Source> {
        let (tx, rx) = oneshot::channel();
        self.dispatch_retrieve_source(source_id, client_secret, key, executor, move |result| {
            let _ = tx.send(result);
        });
        TaskHandle::new(rx)
    }

    // --- internals -----------------------------------------------------

    fn prepare_token(
        &self,
        params: &TokenParams,
        key: Option<&str>,
    ) -> Result<ApiRequest, ApiError> {
        let key = self.resolve_key(key)?;
        let form = assembler::encode_form(&assembler::token_request(params))?;
        Ok(ApiRequest::post(TOKENS_PATH, form, key))
    }

    fn prepare_source(
        &self,
        params: &SourceParams,
        key: Option<&str>,
    ) -> Result<ApiRequest, ApiError> {
        let key = self.resolve_key(key)?;
        let form = assembler::encode_form(&assembler::source_request(params)?)?;
        Ok(ApiRequest::post(SOURCES_PATH, form, key))
    }

    fn prepare_retrieve(
        &self,
        source_id: &str,
        client_secret: &str,
        key: Option<&str>,
    ) -> Result<ApiRequest, ApiError> {
        let key = self.resolve_key(key)?;
        let source_id = source_id.trim();
        if source_id.is_empty() {
            return Err(local_invalid(
                "A source id is required to retrieve a source",
                "id",
            ));
        }
        if !source_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(local_invalid(
                format!("Invalid source id: '{}'", source_id),
                "id",
            ));
        }
        if client_secret.trim().is_empty() {
            return Err(local_invalid(
                "A client secret is required to retrieve a source",
                "client_secret",
            ));
        }
        Ok(
            ApiRequest::get(format!("{}/{}", SOURCES_PATH, source_id), key)
                .with_query(assembler::retrieve_source_query(client_secret)),
        )
    }

    fn dispatch<T, F>(
        &self,
        prepared: Result<ApiRequest, ApiError>,
        parse: Parser<T>,
        executor: &Handle,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: FnOnce(Result<T, ApiError>) + Send + 'static,
    {
        let client = self.clone();
        executor.spawn(async move {
            let result = match prepared {
                Ok(request) => client.execute(request, parse).await,
                Err(e) => Err(e),
            };
            on_complete(result);
        })
    }

    async fn execute<T>(&self, request: ApiRequest, parse: Parser<T>) -> Result<T, ApiError> {
        tracing::debug!(
            method = ?request.method,
            path = %request.path,
            test_mode = request.key.is_test_mode(),
            "Sending API request"
        );

        let response = match self.inner.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "API request did not complete");
                self.notify_error(&e);
                return Err(e);
            }
        };

        let result = if response.is_success() {
            parse(&response, &self.inner.registry)
        } else {
            Err(translate::classify_error(&response))
        };

        match &result {
            Ok(_) => {
                tracing::info!(status = response.status, "API request succeeded");
                self.notify_response(&response);
            }
            Err(e) => {
                tracing::warn!(status = response.status, kind = e.kind(), "API request failed");
                self.notify_error(e);
            }
        }
        result
    }

    fn notify_response(&self, response: &ApiResponse) {
        if let Some(listener) = &self.inner.listener {
            listener.on_response(response);
        }
    }

    fn notify_error(&self, error: &ApiError) {
        if let Some(listener) = &self.inner.listener {
            listener.on_error(error);
        }
    }
}

/// Parameter error raised before any network I/O.
fn local_invalid(message: impl Into<String>, param: &str) -> ApiError {
    ApiError::InvalidRequest {
        message: message.into(),
        param: Some(param.to_string()),
        status: 400,
        request_id: None,
    }
}

/// Drives a future to completion on a private current-thread runtime.
///
/// When called from inside a runtime, the private runtime runs on a scoped
/// thread so it does not nest inside the caller's.
fn block_on<F>(future: F) -> Result<F::Output, ApiError>
where
    F: Future + Send,
    F::Output: Send,
{
    let run = move || -> Result<F::Output, ApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::connection(format!("Unable to start I/O runtime: {}", e)))?;
        Ok(runtime.block_on(future))
    };

    if Handle::try_current().is_err() {
        return run();
    }
    std::thread::scope(|scope| {
        scope.spawn(run).join().unwrap_or_else(|_| {
            Err(ApiError::Api {
                message: "Blocking call panicked".into(),
                status: None,
                request_id: None,
            })
        })
    })
}
