//! Chat room served by `main`.
//!
//! Browsers call `login`, `say` and `quit`; the room calls back `joined`,
//! `left` and `said` on every member.

use dashmap::DashMap;

use crate::dispatch::RemoteServer;
use crate::domain::ConnectionId;
use crate::error::Result;
use crate::proxy::ClientProxy;
use crate::registry::{RegistryBuilder, Slot};

crate::remote_client! {
    /// Callbacks a chat participant accepts.
    pub struct ChatClient {
        /// A participant logged in.
        fn joined(&self, name: &str);
        /// A participant went away.
        fn left(&self, name: &str);
        /// A participant posted a message.
        fn said(&self, name: &str, message: &str);
    }
}

#[derive(Debug)]
struct Member {
    client: ChatClient,
    name: Option<String>,
}

/// Chat room keyed by connection.
#[derive(Debug, Default)]
pub struct ChatRoom {
    members: DashMap<ConnectionId, Member>,
}

impl ChatRoom {
    /// Creates an empty room.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connected members, logged in or not.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Names of logged-in members, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .iter()
            .filter_map(|entry| entry.value().name.clone())
            .collect();
        names.sort();
        names
    }

    fn login(&self, client: &ChatClient, name: String, user_agent: Option<&str>) {
        let id = client.connection().id();
        if let Some(mut member) = self.members.get_mut(&id) {
            member.name = Some(name.clone());
        }
        tracing::info!(
            connection = %id,
            %name,
            user_agent = user_agent.unwrap_or("-"),
            "member logged in"
        );
        self.broadcast(|member| member.joined(&name));
    }

    fn say(&self, client: &ChatClient, message: &str) {
        let id = client.connection().id();
        let name = self
            .members
            .get(&id)
            .and_then(|member| member.name.clone());
        let Some(name) = name else {
            tracing::debug!(connection = %id, "message from anonymous member ignored");
            return;
        };
        self.broadcast(|member| member.said(&name, message));
    }

    fn broadcast<F>(&self, send: F)
    where
        F: Fn(&ChatClient) -> Result<()>,
    {
        let recipients: Vec<ChatClient> = self
            .members
            .iter()
            .filter(|entry| entry.value().name.is_some())
            .map(|entry| entry.value().client.clone())
            .collect();
        for recipient in &recipients {
            if let Err(err) = send(recipient) {
                tracing::warn!(
                    connection = %recipient.connection().id(),
                    error = %err,
                    "broadcast failed"
                );
            }
        }
    }
}

impl RemoteServer for ChatRoom {
    type Client = ChatClient;

    fn methods(table: RegistryBuilder<Self>) -> RegistryBuilder<Self> {
        table
            .method(
                "login",
                &[Slot::CLIENT, Slot::Positional, Slot::REQUEST],
                |room, args| {
                    let client = args.client(0)?;
                    let name: String = args.value(1)?;
                    let request = args.request(2)?;
                    if name.trim().is_empty() {
                        anyhow::bail!("name must not be blank");
                    }
                    room.login(client, name, request.header("user-agent"));
                    Ok(())
                },
            )
            .method("say", &[Slot::CLIENT, Slot::Positional], |room, args| {
                let client = args.client(0)?;
                let message: String = args.value(1)?;
                room.say(client, &message);
                Ok(())
            })
            .method("quit", &[Slot::CONNECTION], |_, args| {
                args.connection(0)?.close()?;
                Ok(())
            })
    }

    fn on_open(&self, client: &ChatClient) -> anyhow::Result<()> {
        self.members.insert(
            client.connection().id(),
            Member {
                client: client.clone(),
                name: None,
            },
        );
        Ok(())
    }

    fn on_close(&self, client: &ChatClient) -> anyhow::Result<()> {
        let removed = self.members.remove(&client.connection().id());
        if let Some((_, Member {
            name: Some(name), ..
        })) = removed
        {
            self.broadcast(|member| member.left(&name));
        }
        Ok(())
    }
}
