//! Post document schema
//!
//! The record exchanged with clients as JSON and persisted as a BSON
//! document. `title` is the natural key and carries a unique index.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Default collection name for posts
pub const POST_COLLECTION: &str = "posts";

/// A blog post
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Post {
    /// Store-assigned identifier, never chosen by the caller
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        with = "post_id"
    )]
    pub id: Option<ObjectId>,

    /// Author name
    pub name: String,

    /// Unique title
    pub title: String,

    /// Post body
    pub content: String,
}

impl Post {
    /// Create a post without an identifier
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// Content equality: every field except the store-assigned `id` matches.
    ///
    /// Use `==` for full structural equality.
    pub fn is_equal(&self, other: &Post) -> bool {
        self.name == other.name && self.title == other.title && self.content == other.content
    }
}

impl IntoIndexes for Post {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "title": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("title_unique".to_string())
                    .build(),
            ),
        )]
    }
}

/// Serde form of the post identifier.
///
/// JSON carries the id as a plain hex string; BSON keeps a native ObjectId.
/// Decoding accepts a hex string, `{"$oid": ...}`, a native ObjectId, `null`
/// or `""`. The last two mean no id.
mod post_id {
    use bson::{oid::ObjectId, Bson};
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id {
            Some(oid) if serializer.is_human_readable() => serializer.serialize_str(&oid.to_hex()),
            Some(oid) => oid.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ObjectId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Bson>::deserialize(deserializer)? {
            None | Some(Bson::Null) => Ok(None),
            Some(Bson::ObjectId(oid)) => Ok(Some(oid)),
            Some(Bson::String(hex)) if hex.is_empty() => Ok(None),
            Some(Bson::String(hex)) => ObjectId::parse_str(&hex).map(Some).map_err(D::Error::custom),
            Some(other) => Err(D::Error::custom(format!(
                "expected a post id, found {:?}",
                other.element_type()
            ))),
        }
    }
}
