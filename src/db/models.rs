//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Account role. Only `admin` may mutate content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Admin account row. The hash is never serialized.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminAccount {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
}

impl AdminAccount {
    /// Unknown role strings degrade to `viewer`.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Viewer)
    }
}

/// Portfolio project
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub category: Option<String>,
    pub year: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
    pub tags: Vec<String>,
    pub client: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Every writable project column, ready for insert or full-row update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDraft {
    pub title: String,
    pub category: Option<String>,
    pub year: Option<String>,
    pub image: Option<String>,
    pub kind: Option<String>,
    pub tags: Vec<String>,
    pub client: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
}

impl Project {
    /// Current column values as a draft, the base for a partial update.
    pub fn to_draft(&self) -> ProjectDraft {
        ProjectDraft {
            title: self.title.clone(),
            category: self.category.clone(),
            year: self.year.clone(),
            image: self.image.clone(),
            kind: self.kind.clone(),
            tags: self.tags.clone(),
            client: self.client.clone(),
            role: self.role.clone(),
            description: self.description.clone(),
        }
    }
}

/// Blog post author card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Author {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.avatar.is_none()
    }

    /// Collapses an all-empty author into `None`.
    pub fn from_parts(
        name: Option<String>,
        role: Option<String>,
        avatar: Option<String>,
    ) -> Option<Self> {
        let author = Self { name, role, avatar };
        (!author.is_empty()).then_some(author)
    }
}

/// Blog post model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    pub read_time: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub views: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    pub created_at: DateTime<Utc>,
}

/// Flat `blog_posts` row as stored in PostgreSQL.
#[derive(Debug, Clone, FromRow)]
pub struct BlogPostRow {
    pub id: i64,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    pub read_time: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub views: i32,
    pub author_name: Option<String>,
    pub author_role: Option<String>,
    pub author_avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            excerpt: row.excerpt,
            content: row.content,
            date: row.date,
            read_time: row.read_time,
            image: row.image,
            category: row.category,
            tags: row.tags,
            views: row.views,
            author: Author::from_parts(row.author_name, row.author_role, row.author_avatar),
            created_at: row.created_at,
        }
    }
}

/// Every writable blog post column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogPostDraft {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    pub read_time: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<Author>,
}

impl BlogPost {
    pub fn to_draft(&self) -> BlogPostDraft {
        BlogPostDraft {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            content: self.content.clone(),
            date: self.date.clone(),
            read_time: self.read_time.clone(),
            image: self.image.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            author: self.author.clone(),
        }
    }
}

/// Contact-form submission (`proposals` table)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub service: Option<String>,
    pub budget: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// New message for insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub service: Option<String>,
    pub budget: Option<String>,
    pub message: String,
}
