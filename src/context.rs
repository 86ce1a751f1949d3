use crate::{
    error::{Error, Result},
    types::Id,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    net::{SocketAddr, ToSocketAddrs},
};

/// Random 128-bit identifier, hex encoded.
pub fn random_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Identifiers of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskInfo {
    pub request_id: String,
    pub task_id: String,
    pub sub_task_id: String,
}

/// Network location of a party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub ip: String,
    pub port: u16,
    pub party_id: u32,
}

impl Node {
    pub fn addr(&self) -> Result<SocketAddr> {
        (self.ip.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::InvalidTaskRequest(format!("can not resolve {}", self.ip)))
    }
}

/// A task as handed to one party: who it is and how to reach everyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskRequest {
    pub task_info: TaskInfo,
    pub party_name: String,
    pub party_access_info: BTreeMap<String, Node>,
}

impl TaskRequest {
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(bincode::serialize(self)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<TaskRequest> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Check that exactly party 0 and party 1 are listed and that the local party is one of them.
    pub fn validate(&self) -> Result<()> {
        if self.party_name.is_empty() {
            return Err(Error::InvalidTaskRequest("party name is empty".to_string()));
        }
        if self.party_access_info.len() != 2 {
            return Err(Error::InvalidTaskRequest(format!(
                "expected 2 parties, got {}",
                self.party_access_info.len()
            )));
        }
        let mut ids = self
            .party_access_info
            .values()
            .map(|node| Id::try_from(node.party_id))
            .collect::<Result<Vec<Id>>>()?;
        ids.dedup();
        if ids.len() != 2 {
            return Err(Error::InvalidTaskRequest(
                "party ids are not distinct".to_string(),
            ));
        }
        self.node(&self.party_name)?;
        Ok(())
    }

    pub fn node(&self, name: &str) -> Result<&Node> {
        self.party_access_info
            .get(name)
            .ok_or_else(|| Error::UnknownParty(name.to_string()))
    }

    /// Name and [`Node`] of the party with `id`.
    pub fn node_of(&self, id: Id) -> Result<(&str, &Node)> {
        self.party_access_info
            .iter()
            .find(|(_, node)| node.party_id == u32::from(id))
            .map(|(name, node)| (name.as_str(), node))
            .ok_or(Error::InvalidPartyId(u32::from(id)))
    }

    /// Name and [`Node`] of the other party.
    pub fn peer(&self) -> Result<(&str, &Node)> {
        self.node_of(self.party_id()?.peer())
    }

    /// [`Id`] of the local party.
    pub fn party_id(&self) -> Result<Id> {
        Id::try_from(self.node(&self.party_name)?.party_id)
    }
}

/// Per-task context of the local party.
#[derive(Debug, Clone)]
pub struct Context {
    request: TaskRequest,
}

impl Context {
    pub fn new(request: TaskRequest) -> Result<Context> {
        request.validate()?;
        Ok(Context { request })
    }

    pub fn request_id(&self) -> &str {
        &self.request.task_info.request_id
    }

    pub fn party_name(&self) -> &str {
        &self.request.party_name
    }

    /// Serialized [`TaskRequest`], used to construct an [`MPCExecutor`].
    ///
    /// [`MPCExecutor`]: crate::MPCExecutor
    pub fn message(&self) -> Result<Bytes> {
        self.request.to_bytes()
    }

    pub fn request(&self) -> &TaskRequest {
        &self.request
    }
}
