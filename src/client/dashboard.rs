//! Admin dashboard state: the active tab, the search box and what the
//! signed-in role may do.

use serde::{Deserialize, Serialize};

use super::view::ContentCache;
use crate::db::models::{BlogPost, Message, Project, Role};
use crate::stats::VisitStats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Overview,
    Projects,
    Blog,
    Messages,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Overview, Tab::Projects, Tab::Blog, Tab::Messages];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Projects => "Projects",
            Tab::Blog => "Blog",
            Tab::Messages => "Messages",
        }
    }
}

/// Numbers shown on the overview tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub projects: usize,
    pub posts: usize,
    pub messages: usize,
    pub stats: Option<VisitStats>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    role: Role,
    tab: Tab,
    query: String,
}

fn matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Dashboard {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            tab: Tab::default(),
            query: String::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Switching tabs clears the search box.
    pub fn select_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.query.clear();
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Viewers see everything but every create, edit and delete control is off.
    pub fn can_mutate(&self) -> bool {
        self.role == Role::Admin
    }

    fn needle(&self) -> String {
        self.query.trim().to_lowercase()
    }

    /// Title or category match.
    pub fn filter_projects<'a>(&self, projects: &'a [Project]) -> Vec<&'a Project> {
        let needle = self.needle();
        projects
            .iter()
            .filter(|p| {
                matches(&p.title, &needle)
                    || p.category.as_deref().is_some_and(|c| matches(c, &needle))
            })
            .collect()
    }

    pub fn filter_posts<'a>(&self, posts: &'a [BlogPost]) -> Vec<&'a BlogPost> {
        let needle = self.needle();
        posts.iter().filter(|p| matches(&p.title, &needle)).collect()
    }

    /// Sender name or email match.
    pub fn filter_messages<'a>(&self, messages: &'a [Message]) -> Vec<&'a Message> {
        let needle = self.needle();
        messages
            .iter()
            .filter(|m| matches(&m.name, &needle) || matches(&m.email, &needle))
            .collect()
    }

    pub fn overview(&self, cache: &ContentCache, stats: Option<&VisitStats>) -> Overview {
        Overview {
            projects: cache.projects().len(),
            posts: cache.posts().len(),
            messages: cache.messages().len(),
            stats: stats.cloned(),
        }
    }
}
