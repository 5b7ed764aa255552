//! Client proxies: local stand-ins for the remote peer.
//!
//! A capability interface is a type implementing [`ClientProxy`]. Each of
//! its methods turns into exactly one outbound [`crate::CallMessage`] on
//! the connection the proxy is bound to. The [`remote_client!`] macro
//! generates such a type from a list of method signatures.
//!
//! ```
//! remote_ws::remote_client! {
//!     /// What the server may ask a browser tab to do.
//!     pub struct TabClient {
//!         /// Shows a notification.
//!         fn notify(&self, title: &str, body: &str);
//!         /// Navigates to a page.
//!         fn open(&self, path: &str);
//!     }
//! }
//!
//! use remote_ws::ClientProxy;
//! assert_eq!(TabClient::METHODS, &["notify", "open"]);
//! ```

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use crate::error::{RemoteError, Result};
use crate::transport::ConnectionHandle;

/// Name of the accessor that returns the bound connection instead of
/// sending a call.
pub const CONNECTION_ACCESSOR: &str = "connection";

/// A capability interface implemented as a proxy over one connection.
///
/// Implementing this trait marks a type as remotely callable. The proxy
/// holds nothing but its connection; all calls are one-way.
pub trait ClientProxy: Clone + Send + Sync + fmt::Debug + 'static {
    /// Method names this capability can send, in declaration order.
    const METHODS: &'static [&'static str];

    /// Binds a new proxy to `connection`.
    fn bind(connection: ConnectionHandle) -> Self;

    /// Returns the connection this proxy sends on. Never sends a frame.
    fn connection(&self) -> &ConnectionHandle;

    /// Sends `{"action": action, "args": args}` on the bound connection.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Serialization`] if the message cannot be
    /// encoded, or the transport's send failure.
    fn invoke(&self, action: &str, args: Vec<Value>) -> Result<()> {
        self.connection().call(action, args)
    }
}

/// Checks the declared method list of a capability.
///
/// # Errors
///
/// Returns [`RemoteError::Configuration`] if a name is empty, repeated, or
/// shadows [`CONNECTION_ACCESSOR`].
pub fn validate_capability<C: ClientProxy>() -> Result<()> {
    let capability = std::any::type_name::<C>();
    let mut seen = HashSet::with_capacity(C::METHODS.len());
    for name in C::METHODS {
        if name.is_empty() {
            return Err(RemoteError::Configuration(format!(
                "{capability} declares a method with an empty name"
            )));
        }
        if *name == CONNECTION_ACCESSOR {
            return Err(RemoteError::Configuration(format!(
                "{capability} declares `{CONNECTION_ACCESSOR}`, which is reserved for the connection handle"
            )));
        }
        if !seen.insert(*name) {
            return Err(RemoteError::Configuration(format!(
                "{capability} declares `{name}` more than once"
            )));
        }
    }
    Ok(())
}

/// Generates a [`ClientProxy`] adapter for a capability interface.
///
/// Each declared method serialises its arguments in order and sends one
/// call message named after the method. Arguments must implement
/// `serde::Serialize`; encoding failures are returned to the caller as
/// [`RemoteError::Serialization`]. `Debug`, `Display`, equality and
/// hashing are forwarded to the bound connection.
#[macro_export]
macro_rules! remote_client {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident(&self $(, $arg:ident : $ty:ty)*);
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $name {
            connection: $crate::ConnectionHandle,
        }

        impl $name {
            $(
                $(#[$method_meta])*
                ///
                /// # Errors
                ///
                /// Fails if an argument cannot be encoded or the connection
                /// is closed.
                pub fn $method(&self $(, $arg: $ty)*) -> ::std::result::Result<(), $crate::RemoteError> {
                    let args: ::std::vec::Vec<$crate::__private::serde_json::Value> = ::std::vec![
                        $($crate::__private::serde_json::to_value(&$arg)?),*
                    ];
                    $crate::ClientProxy::invoke(self, ::std::stringify!($method), args)
                }
            )*
        }

        impl $crate::ClientProxy for $name {
            const METHODS: &'static [&'static str] = &[$(::std::stringify!($method)),*];

            fn bind(connection: $crate::ConnectionHandle) -> Self {
                Self { connection }
            }

            fn connection(&self) -> &$crate::ConnectionHandle {
                &self.connection
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_tuple(::std::stringify!($name))
                    .field(&self.connection)
                    .finish()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.connection, f)
            }
        }

        impl ::std::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.connection == other.connection
            }
        }

        impl ::std::cmp::Eq for $name {}

        impl ::std::hash::Hash for $name {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                ::std::hash::Hash::hash(&self.connection, state);
            }
        }
    };
}
