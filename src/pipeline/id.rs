//! Identity types for the pipeline graph.
//!
//! All IDs are string newtypes so that documents produced by other tools
//! (or hand-edited JSON) keep their identifiers verbatim. Freshly minted
//! IDs use random v4 UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a node instance, unique within one pipeline.
    NodeId
);

string_id!(
    /// Identifier of a connection, unique within one pipeline.
    ConnectionId
);

string_id!(
    /// Identifier of a pipeline; also the key of its save slot.
    PipelineId
);

string_id!(
    /// Identifier of an uploaded file.
    FileId
);

impl NodeId {
    /// Mint a node id prefixed with the spec it was created from,
    /// e.g. `image-resize-6f1c…`.
    pub fn generate(spec_id: &str) -> Self {
        Self(format!("{}-{}", spec_id, Uuid::new_v4().simple()))
    }
}

impl ConnectionId {
    pub fn generate() -> Self {
        Self(format!("conn-{}", Uuid::new_v4().simple()))
    }
}

impl PipelineId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl FileId {
    pub fn generate() -> Self {
        Self(format!("file-{}", Uuid::new_v4().simple()))
    }
}
