#[cfg(feature = "api")]
pub mod api;
pub mod auth;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod permissions;

pub mod prelude {
    #[cfg(feature = "api")]
    pub use crate::api::{AuthenticatedUser, BoardApp, HasAuth, HasPool, MaybeUser};
    pub use crate::auth::AuthConfig;
    pub use crate::config::ServerConfig;
    #[cfg(feature = "sqlx")]
    pub use crate::db::{
        authorize_node, authorize_node_type, authorize_project, create_board_tables,
        project_permissions, reset_public_schema,
    };
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::models::{
        Comment, CommentId, Edge, Node, NodeId, NodeType, NodeTypeId, Project, ProjectId,
        UserData, UserId,
    };
    pub use crate::permissions::{Access, Permissions, ProjectAccess};
}
