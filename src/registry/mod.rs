//! Remote method registry.
//!
//! [`MethodRegistry`] maps action names to the server methods that may be
//! called from the peer. It is built once from the explicit table a
//! [`crate::RemoteServer`] fills in `methods` and is read-only
//! afterwards, so every connection shares the same instance.

pub mod slot;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::RemoteServer;
use crate::error::{RemoteError, Result};
use crate::proxy::ClientProxy;

pub use slot::{Argument, Arguments, Injected, Slot};

/// Type-erased method body.
///
/// Receives the server object and the resolved argument list. The return
/// value only signals failure; nothing is sent back to the caller.
pub type Handler<S> = Arc<
    dyn Fn(&S, Arguments<<S as RemoteServer>::Client>) -> anyhow::Result<()> + Send + Sync,
>;

/// Name and parameter layout of one remote method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: String,
    slots: Vec<Slot>,
}

impl MethodDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, slots: &[Slot]) -> Self {
        Self {
            name: name.into(),
            slots: slots.to_vec(),
        }
    }

    /// Action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter slots in declaration order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of data arguments the method consumes from the wire.
    #[must_use]
    pub fn positional_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Positional))
            .count()
    }

    /// Builds the argument list for one call in a single pass over the slots.
    ///
    /// Injected slots are filled from `client` and its connection; each
    /// positional slot takes the next unread element of `supplied`. Extra
    /// supplied values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MissingArgument`] if `supplied` runs out before
    /// the last positional slot.
    pub fn resolve<C: ClientProxy>(&self, supplied: Vec<Value>, client: &C) -> Result<Arguments<C>> {
        let mut supplied = supplied.into_iter();
        let mut cursor = 0usize;
        let mut values = Vec::with_capacity(self.slots.len());

        for slot in &self.slots {
            let argument = match slot {
                Slot::Injected(Injected::Client) => Argument::Client(client.clone()),
                Slot::Injected(Injected::Connection) => {
                    Argument::Connection(client.connection().clone())
                }
                Slot::Injected(Injected::Request) => {
                    Argument::Request(Arc::clone(client.connection().http_request()))
                }
                Slot::Positional => {
                    let value = supplied.next().ok_or_else(|| RemoteError::MissingArgument {
                        action: self.name.clone(),
                        index: cursor,
                    })?;
                    cursor += 1;
                    Argument::Value(value)
                }
            };
            values.push(argument);
        }

        Ok(Arguments::new(self.name.clone(), values))
    }
}

/// A registered method: descriptor plus handler.
pub struct RegisteredMethod<S: RemoteServer> {
    descriptor: MethodDescriptor,
    handler: Handler<S>,
}

impl<S: RemoteServer> RegisteredMethod<S> {
    /// Descriptor of this method.
    #[must_use]
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Runs the handler against `server`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Invocation`] wrapping the handler's error.
    pub fn invoke(&self, server: &S, args: Arguments<S::Client>) -> Result<()> {
        (self.handler)(server, args).map_err(|source| RemoteError::Invocation {
            action: self.descriptor.name.clone(),
            source,
        })
    }
}

impl<S: RemoteServer> fmt::Debug for RegisteredMethod<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredMethod")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Collects the method table of a server type.
///
/// ```
/// # use remote_ws::{RegistryBuilder, RemoteServer, Slot};
/// # remote_ws::remote_client! {
/// #     /// Capability.
/// #     pub struct Peer {
/// #         /// Reply.
/// #         fn reply(&self, text: &str);
/// #     }
/// # }
/// struct Greeter;
///
/// impl RemoteServer for Greeter {
///     type Client = Peer;
///
///     fn methods(table: RegistryBuilder<Self>) -> RegistryBuilder<Self> {
///         table.method("greet", &[Slot::CLIENT, Slot::Positional], |_, args| {
///             let peer = args.client(0)?;
///             let name: String = args.value(1)?;
///             peer.reply(&format!("hello {name}"))?;
///             Ok(())
///         })
///     }
/// }
///
/// let registry = Greeter::build_registry().ok();
/// assert!(registry.is_some_and(|r| r.contains("greet")));
/// ```
pub struct RegistryBuilder<S: RemoteServer> {
    methods: Vec<RegisteredMethod<S>>,
}

impl<S: RemoteServer> RegistryBuilder<S> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
        }
    }

    /// Adds a remote method named `name` with the given parameter layout.
    #[must_use]
    pub fn method<F>(mut self, name: &str, slots: &[Slot], handler: F) -> Self
    where
        F: Fn(&S, Arguments<S::Client>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.methods.push(RegisteredMethod {
            descriptor: MethodDescriptor::new(name, slots),
            handler: Arc::new(handler),
        });
        self
    }

    /// Validates the table and freezes it into a registry.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] if a name is empty or
    /// registered twice.
    pub fn build(self) -> Result<MethodRegistry<S>> {
        let mut methods = HashMap::with_capacity(self.methods.len());
        for method in self.methods {
            let name = method.descriptor.name.clone();
            if name.is_empty() {
                return Err(RemoteError::Configuration(
                    "remote method with an empty name".to_string(),
                ));
            }
            if methods.contains_key(&name) {
                return Err(RemoteError::Configuration(format!(
                    "remote method `{name}` registered more than once"
                )));
            }
            methods.insert(name, method);
        }
        Ok(MethodRegistry { methods })
    }
}

impl<S: RemoteServer> Default for RegistryBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RemoteServer> fmt::Debug for RegistryBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("methods", &self.methods)
            .finish()
    }
}

/// Immutable name → method table.
pub struct MethodRegistry<S: RemoteServer> {
    methods: HashMap<String, RegisteredMethod<S>>,
}

impl<S: RemoteServer> MethodRegistry<S> {
    /// Looks up the method registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&RegisteredMethod<S>> {
        self.methods.get(name)
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// All registered names, sorted.
    #[must_use]
    pub fn exported_names(&self) -> BTreeSet<String> {
        self.methods.keys().cloned().collect()
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<S: RemoteServer> fmt::Debug for MethodRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.exported_names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::OriginatingRequest;
    use crate::transport::{ChannelConnection, ConnectionHandle, Outbound};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    crate::remote_client! {
        /// Capability used by the registry tests.
        pub struct Peer {
            /// Notify the peer.
            fn notify(&self, text: &str);
        }
    }

    struct Counter;

    impl RemoteServer for Counter {
        type Client = Peer;

        fn methods(table: RegistryBuilder<Self>) -> RegistryBuilder<Self> {
            table
                .method("increment", &[Slot::Positional], |_, _| Ok(()))
                .method("reset", &[Slot::CLIENT, Slot::Positional], |_, args| {
                    let peer = args.client(0)?;
                    let reason: String = args.value(1)?;
                    peer.notify(&format!("reset: {reason}"))?;
                    Ok(())
                })
                .method("fail", &[], |_, _| Err(anyhow::anyhow!("boom")))
        }
    }

    fn connected_peer() -> (Peer, UnboundedReceiver<Outbound>) {
        let (conn, rx) = ChannelConnection::new(OriginatingRequest::default());
        (Peer::bind(ConnectionHandle::new(conn)), rx)
    }

    fn peer() -> Peer {
        connected_peer().0
    }

    fn registry() -> MethodRegistry<Counter> {
        let Ok(registry) = Counter::build_registry() else {
            panic!("valid table");
        };
        registry
    }

    #[test]
    fn exported_names_match_registered_methods() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        let names: Vec<String> = registry.exported_names().into_iter().collect();
        assert_eq!(names, vec!["fail", "increment", "reset"]);
        assert!(registry.contains("reset"));
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn duplicate_name_is_configuration_error() {
        let table = RegistryBuilder::<Counter>::new()
            .method("reset", &[], |_, _| Ok(()))
            .method("reset", &[Slot::CLIENT], |_, _| Ok(()));
        assert!(matches!(table.build(), Err(RemoteError::Configuration(_))));
    }

    #[test]
    fn empty_name_is_configuration_error() {
        let table = RegistryBuilder::<Counter>::new().method("", &[], |_, _| Ok(()));
        assert!(matches!(table.build(), Err(RemoteError::Configuration(_))));
    }

    #[test]
    fn injected_slots_do_not_consume_args() {
        let descriptor = MethodDescriptor::new(
            "greet",
            &[Slot::CLIENT, Slot::Positional, Slot::CONNECTION],
        );
        assert_eq!(descriptor.positional_count(), 1);

        let peer = peer();
        let Ok(args) = descriptor.resolve(vec![json!("hello")], &peer) else {
            panic!("resolvable");
        };
        assert_eq!(args.client(0).ok(), Some(&peer));
        assert_eq!(args.value::<String>(1).ok(), Some("hello".to_string()));
        let Ok(connection) = args.connection(2) else {
            panic!("connection slot");
        };
        assert!(connection.ptr_eq(peer.connection()));
    }

    #[test]
    fn request_slot_carries_upgrade_request() {
        let descriptor = MethodDescriptor::new("who", &[Slot::REQUEST, Slot::Positional]);
        let Ok(args) = descriptor.resolve(vec![json!(1)], &peer()) else {
            panic!("resolvable");
        };
        let Ok(request) = args.request(0) else {
            panic!("request slot");
        };
        assert_eq!(request.uri().path(), "/");
    }

    #[test]
    fn request_slot_shares_the_connection_request() {
        let peer = peer();
        let descriptor = MethodDescriptor::new("who", &[Slot::REQUEST]);
        let Ok(args) = descriptor.resolve(Vec::new(), &peer) else {
            panic!("resolvable");
        };
        let Ok(request) = args.request(0) else {
            panic!("request slot");
        };
        assert!(std::ptr::eq(request, peer.connection().http_request().as_ref()));
    }

    #[test]
    fn typed_handler_calls_back_through_client() {
        let registry = registry();
        let (peer, mut rx) = connected_peer();
        let Some(method) = registry.lookup("reset") else {
            panic!("registered");
        };
        let Ok(args) = method.descriptor().resolve(vec![json!("manual")], &peer) else {
            panic!("resolvable");
        };
        assert!(method.invoke(&Counter, args).is_ok());

        let Ok(Outbound::Text(text)) = rx.try_recv() else {
            panic!("expected a text frame");
        };
        assert_eq!(text, r#"{"action":"notify","args":["reset: manual"]}"#);
    }

    #[test]
    fn missing_data_argument_is_reported_with_position() {
        let descriptor =
            MethodDescriptor::new("pair", &[Slot::Positional, Slot::CLIENT, Slot::Positional]);
        let err = descriptor.resolve(vec![json!(1)], &peer());
        let Err(RemoteError::MissingArgument { action, index }) = err else {
            panic!("expected missing argument");
        };
        assert_eq!(action, "pair");
        assert_eq!(index, 1);
    }

    #[test]
    fn extra_data_arguments_are_ignored() {
        let descriptor = MethodDescriptor::new("one", &[Slot::Positional]);
        let Ok(args) = descriptor.resolve(vec![json!(1), json!(2), json!(3)], &peer()) else {
            panic!("resolvable");
        };
        assert_eq!(args.len(), 1);
        assert_eq!(args.value::<u32>(0).ok(), Some(1));
    }

    #[test]
    fn handler_error_becomes_invocation_error() {
        let registry = registry();
        let Some(method) = registry.lookup("fail") else {
            panic!("registered");
        };
        let Ok(args) = method.descriptor().resolve(Vec::new(), &peer()) else {
            panic!("resolvable");
        };
        let err = method.invoke(&Counter, args);
        assert!(matches!(err, Err(RemoteError::Invocation { ref action, .. }) if action == "fail"));
    }
}
