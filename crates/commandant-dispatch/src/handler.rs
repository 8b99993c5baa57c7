//! Command handler types.
//!
//! A handler receives its decoded options record and a [`CommandContext`],
//! performs the command's work and returns serializable data. Formatting is
//! the render function's job, not the handler's.
//!
//! # Core Types
//!
//! - [`Handler`]: Trait for command handlers (`&mut self`), typed by the
//!   [`Options`] record it decodes
//! - [`FnHandler`]: Adapts a closure into a [`Handler`]
//! - [`CommandContext`]: Command path plus per-dispatch [`Extensions`]
//! - [`Output`]: What a handler produces (render data or silent)
//! - [`HandlerResult`]: The result type for handlers (`Result<Output<T>, Error>`)
//! - [`RunResult`]: The result of a whole dispatch

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use commandant_options::{
    decode_local, decode_with_shared, from_value, Container, LocalError, Options, Value,
};
use serde::Serialize;
use tracing::debug;

use crate::context::DispatchContext;
use crate::error::DispatchError;

/// Type-safe map of per-dispatch state, keyed by type.
///
/// Shared options promoted during decoding are stored here, and handlers read
/// them back by type.
///
/// # Example
///
/// ```rust
/// use commandant_dispatch::Extensions;
///
/// struct Verbosity(u8);
///
/// let mut ext = Extensions::new();
/// ext.insert(Verbosity(2));
///
/// let verbosity = ext.get_required::<Verbosity>()?;
/// assert_eq!(verbosity.0, 2);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert<T: 'static>(&mut self, val: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(val))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Gets a value of type `T`, or an error naming the missing type.
    pub fn get_required<T: 'static>(&self) -> Result<&T, anyhow::Error> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "Extension missing: type {} not found in context",
                std::any::type_name::<T>()
            )
        })
    }

}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

/// Context passed to command handlers.
#[derive(Debug, Default)]
pub struct CommandContext {
    /// Symbols from the program root to the running command, root excluded
    /// (e.g. `["db", "migrate"]`).
    pub command_path: Vec<String>,

    /// Per-dispatch state. Each dispatch gets a fresh instance.
    pub extensions: Extensions,
}

impl CommandContext {
    pub fn new(command_path: Vec<String>) -> Self {
        Self {
            command_path,
            extensions: Extensions::new(),
        }
    }

    /// The shared options record.
    ///
    /// Present whenever the commander declares shared options: promoted keys
    /// override the shared schema's defaults. `None` without a shared schema.
    pub fn shared<G: 'static>(&self) -> Option<&G> {
        self.extensions.get::<G>()
    }
}

/// What a handler produces.
#[derive(Debug)]
pub enum Output<T: Serialize> {
    /// Data for the render function.
    Render(T),
    /// Silent exit (no output produced)
    Silent,
}

/// The result type for command handlers.
///
/// Enables use of the `?` operator for error propagation.
pub type HandlerResult<T> = Result<Output<T>, anyhow::Error>;

/// Trait for types that can be converted into a [`HandlerResult`].
///
/// Handlers may return `Result<T, E>` directly (wrapped in
/// [`Output::Render`]) or a [`HandlerResult<T>`] when they need
/// [`Output::Silent`].
///
/// # Example
///
/// ```rust
/// use commandant_dispatch::{HandlerResult, Output, IntoHandlerResult};
///
/// fn simple() -> Result<String, anyhow::Error> {
///     Ok("hello".to_string())
/// }
/// let result: HandlerResult<String> = simple().into_handler_result();
/// assert!(matches!(result, Ok(Output::Render(_))));
///
/// fn explicit() -> HandlerResult<String> {
///     Ok(Output::Silent)
/// }
/// let result: HandlerResult<String> = explicit().into_handler_result();
/// assert!(matches!(result, Ok(Output::Silent)));
/// ```
pub trait IntoHandlerResult<T: Serialize> {
    fn into_handler_result(self) -> HandlerResult<T>;
}

impl<T, E> IntoHandlerResult<T> for Result<T, E>
where
    T: Serialize,
    E: Into<anyhow::Error>,
{
    fn into_handler_result(self) -> HandlerResult<T> {
        self.map(Output::Render).map_err(Into::into)
    }
}

impl<T: Serialize> IntoHandlerResult<T> for HandlerResult<T> {
    fn into_handler_result(self) -> HandlerResult<T> {
        self
    }
}

/// Result of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// Rendered output (handler data or help text).
    Handled(String),
    /// The handler completed without output.
    Silent,
}

impl RunResult {
    /// Returns the output if handled, or None otherwise.
    pub fn output(&self) -> Option<&str> {
        match self {
            RunResult::Handled(s) => Some(s),
            RunResult::Silent => None,
        }
    }
}

/// Trait for command handlers.
///
/// Handlers take `&mut self` allowing direct mutation of internal state.
///
/// # Example
///
/// ```rust
/// use commandant_dispatch::{CommandContext, Handler, HandlerResult, Output};
///
/// struct Counter { count: u32 }
///
/// impl Handler for Counter {
///     type Options = ();
///     type Output = u32;
///
///     fn handle(&mut self, _options: (), _ctx: &CommandContext) -> HandlerResult<u32> {
///         self.count += 1;
///         Ok(Output::Render(self.count))
///     }
/// }
/// ```
pub trait Handler {
    /// The options record decoded from the command's argv.
    type Options: Options;

    /// The output type produced by this handler (must be serializable)
    type Output: Serialize;

    fn handle(
        &mut self,
        options: Self::Options,
        ctx: &CommandContext,
    ) -> HandlerResult<Self::Output>;
}

/// A wrapper that implements [`Handler`] for `FnMut` closures.
///
/// # Example
///
/// ```rust
/// use commandant_dispatch::{CommandContext, FnHandler, Output};
///
/// // Result<T, E> is wrapped in Output::Render
/// let handler = FnHandler::new(|_options: (), _ctx: &CommandContext| {
///     Ok::<_, anyhow::Error>("hello".to_string())
/// });
///
/// // HandlerResult<T> passes through
/// let silent = FnHandler::new(|_options: (), _ctx: &CommandContext| {
///     Ok(Output::<()>::Silent)
/// });
/// ```
pub struct FnHandler<F, O, T, R = HandlerResult<T>>
where
    T: Serialize,
{
    f: F,
    _phantom: std::marker::PhantomData<fn(O) -> (T, R)>,
}

impl<F, O, T, R> FnHandler<F, O, T, R>
where
    F: FnMut(O, &CommandContext) -> R,
    O: Options,
    R: IntoHandlerResult<T>,
    T: Serialize,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, O, T, R> Handler for FnHandler<F, O, T, R>
where
    F: FnMut(O, &CommandContext) -> R,
    O: Options,
    R: IntoHandlerResult<T>,
    T: Serialize,
{
    type Options = O;
    type Output = T;

    fn handle(&mut self, options: O, ctx: &CommandContext) -> HandlerResult<T> {
        (self.f)(options, ctx).into_handler_result()
    }
}

/// Type-erased handler stored in a command node.
pub(crate) trait Entrypoint {
    /// Decodes `container` and runs the handler.
    ///
    /// Returns the handler data as JSON, or `None` for silent output.
    fn run(
        &mut self,
        ctx: &DispatchContext<'_>,
        container: &Container,
    ) -> Result<Option<serde_json::Value>, DispatchError>;
}

pub(crate) struct HandlerEntry<H>(pub(crate) H);

impl<H> HandlerEntry<H>
where
    H: Handler,
{
    /// Local decode first; unknown keys get one retry against the shared
    /// schema. The shared record, from promoted keys or from the shared
    /// defaults alone, is installed in the extensions.
    fn decode(
        ctx: &DispatchContext<'_>,
        container: &Container,
        command: &mut CommandContext,
    ) -> Result<H::Options, DispatchError> {
        let unrecognized = match decode_local::<H::Options>(container) {
            Ok(options) => {
                if let Some(shared) = ctx.shared() {
                    shared.install(Value::Dict(shared.schema().defaults()), &mut command.extensions)?;
                }
                return Ok(options);
            }
            Err(LocalError::Failed(err)) => return Err(err.into()),
            Err(LocalError::Unrecognized(unrecognized)) => unrecognized,
        };

        let Some(shared) = ctx.shared() else {
            return Err(LocalError::Unrecognized(unrecognized).into_error().into());
        };

        debug!(
            keys = ?unrecognized.keys,
            partial = unrecognized.partial.is_some(),
            "promoting unknown keys to shared options"
        );
        let local = H::Options::schema()?;
        let projection = decode_with_shared(container, &local, shared.schema())?;
        shared.install(projection.shared, &mut command.extensions)?;
        Ok(from_value(projection.local)?)
    }
}

impl<H> Entrypoint for HandlerEntry<H>
where
    H: Handler,
{
    fn run(
        &mut self,
        ctx: &DispatchContext<'_>,
        container: &Container,
    ) -> Result<Option<serde_json::Value>, DispatchError> {
        let mut command = CommandContext::new(ctx.command_path().to_vec());
        let options = Self::decode(ctx, container, &mut command)?;

        match self.0.handle(options, &command) {
            Ok(Output::Render(data)) => {
                let json = serde_json::to_value(data).map_err(crate::RenderError::from)?;
                Ok(Some(json))
            }
            Ok(Output::Silent) => Ok(None),
            Err(err) => Err(DispatchError::Handler(err)),
        }
    }
}
