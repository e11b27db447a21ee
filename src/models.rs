use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{LibError, Result};

macro_rules! serial_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }
    };
}

serial_id!(UserId);
serial_id!(ProjectId);
serial_id!(NodeId);
serial_id!(NodeTypeId);
serial_id!(CommentId);

/// Public view of a user. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    /// Username or email.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserToken {
    pub token: String,
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    pub public_view: bool,
    pub public_edit: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPayload {
    pub id: Option<ProjectId>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub public_view: bool,
    #[serde(default)]
    pub public_edit: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectDefinition {
    pub name: String,
    pub description: String,
    pub public_view: bool,
    pub public_edit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created<T> {
    pub id: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberInvite {
    /// Username or email of the user to add.
    #[serde(default)]
    pub member: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub id: NodeTypeId,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeTypePayload {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub project_id: ProjectId,
    pub label: String,
    pub status: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<NodeTypeId>,
    pub x: i32,
    pub y: i32,
}

/// Node body as sent by the client. Every field is optional on the wire so
/// that a missing field is reported as invalid input rather than a decode
/// failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodePayload {
    pub id: Option<NodeId>,
    pub label: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub project_id: Option<ProjectId>,
    pub description: Option<String>,
    pub type_id: Option<NodeTypeId>,
}

#[derive(Debug, Clone)]
pub struct NodeDefinition {
    pub id: Option<NodeId>,
    pub project_id: ProjectId,
    pub label: String,
    pub status: String,
    pub priority: String,
    pub description: Option<String>,
    pub type_id: Option<NodeTypeId>,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub project_id: ProjectId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EdgePayload {
    pub source_id: Option<NodeId>,
    pub target_id: Option<NodeId>,
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub node_id: NodeId,
    pub users_id: UserId,
    pub username: String,
    pub content: String,
    pub created: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentPayload {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentPayload {
    pub user_id: Option<UserId>,
}

impl RegistrationPayload {
    pub fn normalize(self) -> Result<NewUser> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(LibError::invalid(
                "Username is required",
                anyhow!("empty username"),
            ));
        }
        // Logins accept a username or an email; '@' keeps the two apart.
        if username.contains('@') {
            return Err(LibError::invalid(
                "Username cannot contain '@'",
                anyhow!("username {:?} looks like an email", username),
            ));
        }

        let email = self.email.trim().to_string();
        if !email.contains('@') {
            return Err(LibError::invalid(
                "A valid email is required",
                anyhow!("email {:?} has no '@'", email),
            ));
        }

        if self.password.is_empty() {
            return Err(LibError::invalid(
                "Password is required",
                anyhow!("empty password for {}", username),
            ));
        }

        Ok(NewUser {
            username,
            email,
            password: self.password,
        })
    }
}

impl ProjectPayload {
    pub fn normalize(self) -> Result<ProjectDefinition> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LibError::invalid(
                "Project name is required",
                anyhow!("empty project name"),
            ));
        }

        Ok(ProjectDefinition {
            name,
            description: self.description.unwrap_or_default(),
            public_view: self.public_view,
            public_edit: self.public_edit,
        })
    }
}

impl NodeTypePayload {
    pub fn normalize(self) -> Result<NodeTypePayload> {
        let label = self.label.trim().to_string();
        if label.is_empty() {
            return Err(LibError::invalid(
                "Node type label is required",
                anyhow!("empty node type label"),
            ));
        }

        let color = self.color.trim().to_string();
        if color.is_empty() {
            return Err(LibError::invalid(
                "Node type color is required",
                anyhow!("empty node type color for {}", label),
            ));
        }

        Ok(NodeTypePayload { label, color })
    }
}

impl NodePayload {
    /// Checks a node body for creation. `id` is ignored.
    pub fn normalize_new(self) -> Result<NodeDefinition> {
        let mut definition = self.normalize()?;
        definition.id = None;
        Ok(definition)
    }

    /// Checks a node body for replacement. `id` is required.
    pub fn normalize_update(self) -> Result<NodeDefinition> {
        let Some(id) = self.id else {
            return Err(LibError::invalid(
                "Invalid node",
                anyhow!("node update without id"),
            ));
        };
        let mut definition = self.normalize()?;
        definition.id = Some(id);
        Ok(definition)
    }

    fn normalize(self) -> Result<NodeDefinition> {
        let label = required_text(self.label, "label")?;
        let status = required_text(self.status, "status")?;
        let priority = required_text(self.priority, "priority")?;
        let x = coordinate(self.x, "x")?;
        let y = coordinate(self.y, "y")?;
        let Some(project_id) = self.project_id else {
            return Err(LibError::invalid(
                "Invalid node",
                anyhow!("node missing project_id"),
            ));
        };

        let description = self
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(NodeDefinition {
            id: self.id,
            project_id,
            label,
            status,
            priority,
            description,
            type_id: self.type_id,
            x,
            y,
        })
    }
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String> {
    let text = value.map(|text| text.trim().to_string()).unwrap_or_default();
    if text.is_empty() {
        return Err(LibError::invalid(
            "Invalid node",
            anyhow!("node missing {}", field),
        ));
    }
    Ok(text)
}

fn coordinate(value: Option<f64>, field: &'static str) -> Result<i32> {
    match value {
        Some(value) if value.is_finite() && value.abs() <= i32::MAX as f64 => {
            Ok(value.round() as i32)
        }
        Some(value) => Err(LibError::invalid(
            "Invalid node",
            anyhow!("node {} out of range: {}", field, value),
        )),
        None => Err(LibError::invalid(
            "Invalid node",
            anyhow!("node missing {}", field),
        )),
    }
}

impl EdgePayload {
    pub fn normalize(self) -> Result<Edge> {
        match (self.source_id, self.target_id, self.project_id) {
            (Some(source_id), Some(target_id), Some(project_id)) => Ok(Edge {
                source_id,
                target_id,
                project_id,
            }),
            _ => Err(LibError::invalid(
                "Edge requires source_id, target_id and project_id",
                anyhow!("incomplete edge payload {:?}", self),
            )),
        }
    }
}

impl CommentPayload {
    pub fn normalize(self) -> Result<String> {
        let content = self.content.trim().to_string();
        if content.is_empty() {
            return Err(LibError::invalid(
                "Comment content is required",
                anyhow!("empty comment"),
            ));
        }
        Ok(content)
    }
}

impl MemberInvite {
    pub fn normalize(self) -> Result<String> {
        let member = self.member.trim().to_string();
        if member.is_empty() {
            return Err(LibError::invalid(
                "Member username or email is required",
                anyhow!("empty member invite"),
            ));
        }
        Ok(member)
    }
}
