//! In-memory data behind the mock API.
//!
//! Passwords are kept in plain text; the store never leaves the process.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::api::models::{Blog, BlogQuery, BlogUpdate, NewBlog, Registration, TokenResponse, User};
use crate::http::error::MockApiError;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Live tokens kept per user. Issuing one more revokes the oldest.
pub const MAX_TOKENS_PER_USER: usize = 5;

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password: String,
}

#[derive(Debug, Clone)]
struct IssuedToken {
    user_id: String,
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredBlog {
    seq: u64,
    blog: Blog,
}

/// Users, blogs and issued tokens.
#[derive(Debug, Default)]
pub struct MockStore {
    users: DashMap<String, StoredUser>,
    blogs: DashMap<String, StoredBlog>,
    tokens: DashMap<String, IssuedToken>,
    seq: AtomicU64,
    // Uniqueness checks span the whole user map.
    registration: Mutex<()>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and create an account.
    pub fn register(&self, registration: &Registration) -> Result<User, MockApiError> {
        validate_registration(registration)?;

        let _guard = self.registration.lock().unwrap_or_else(|e| e.into_inner());
        if self.users.iter().any(|u| u.user.email == registration.email) {
            return Err(MockApiError::BadRequest("Email already registered".into()));
        }
        if self.users.iter().any(|u| u.user.username == registration.username) {
            return Err(MockApiError::BadRequest("Username already taken".into()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: registration.username.clone(),
            email: registration.email.clone(),
            created_at: Some(Utc::now()),
        };
        self.users.insert(
            user.id.clone(),
            StoredUser {
                user: user.clone(),
                password: registration.password.clone(),
            },
        );
        tracing::debug!(username = %user.username, "Mock user registered");
        Ok(user)
    }

    /// Check credentials; `identifier` is an email or a username.
    pub fn login(&self, identifier: &str, password: &str) -> Result<TokenResponse, MockApiError> {
        let found = self
            .users
            .iter()
            .find(|u| u.user.email == identifier)
            .or_else(|| self.users.iter().find(|u| u.user.username == identifier))
            .map(|u| u.value().clone());

        match found {
            Some(stored) if stored.password == password => {
                let token = Uuid::new_v4().to_string();
                self.bind_token(token.clone(), &stored.user.id);
                Ok(TokenResponse {
                    access_token: token,
                    token_type: "bearer".to_string(),
                })
            }
            _ => Err(MockApiError::Unauthorized("Invalid credentials".into())),
        }
    }

    /// Bind an explicit token to a user.
    pub fn issue_token(&self, token: &str, user_id: &str) {
        self.bind_token(token.to_string(), user_id);
    }

    fn bind_token(&self, token: String, user_id: &str) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.tokens.insert(
            token,
            IssuedToken {
                user_id: user_id.to_string(),
                seq,
            },
        );

        let mut held: Vec<(u64, String)> = self
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| (t.seq, t.key().clone()))
            .collect();
        if held.len() > MAX_TOKENS_PER_USER {
            held.sort_unstable();
            let excess = held.len() - MAX_TOKENS_PER_USER;
            for (_, revoked) in held.into_iter().take(excess) {
                self.tokens.remove(&revoked);
            }
            tracing::debug!(user_id, revoked = excess, "Oldest mock tokens revoked");
        }
    }

    pub fn user_for_token(&self, token: &str) -> Option<User> {
        let user_id = self.tokens.get(token)?.user_id.clone();
        self.users.get(&user_id).map(|u| u.user.clone())
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|u| u.user.clone())
    }

    pub fn list_users(&self, username: Option<&str>, skip: u32, limit: u32) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| username.map_or(true, |name| u.user.username == name))
            .map(|u| u.user.clone())
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        users
            .into_iter()
            .skip(skip as usize)
            .take(clamp_limit(Some(limit)) as usize)
            .collect()
    }

    pub fn create_blog(&self, author: &User, new_blog: &NewBlog) -> Result<Blog, MockApiError> {
        validate_title(&new_blog.title)?;
        validate_content(&new_blog.content)?;

        let now = Utc::now();
        let blog = Blog {
            id: Uuid::new_v4().to_string(),
            title: new_blog.title.clone(),
            content: new_blog.content.clone(),
            tags: new_blog.tags.clone(),
            author_id: author.id.clone(),
            author_username: author.username.clone(),
            created_at: now,
            updated_at: now,
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.blogs.insert(blog.id.clone(), StoredBlog { seq, blog: blog.clone() });
        Ok(blog)
    }

    /// Newest first, filtered, then paged.
    pub fn list_blogs(&self, query: &BlogQuery) -> Vec<Blog> {
        let mut matches: Vec<StoredBlog> = self
            .blogs
            .iter()
            .filter(|b| query.author_id.as_ref().map_or(true, |a| &b.blog.author_id == a))
            .filter(|b| query.tag.as_ref().map_or(true, |t| b.blog.tags.contains(t)))
            .map(|b| b.value().clone())
            .collect();
        matches.sort_by(|a, b| {
            b.blog
                .created_at
                .cmp(&a.blog.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        matches
            .into_iter()
            .skip(query.skip.unwrap_or(0) as usize)
            .take(clamp_limit(query.limit) as usize)
            .map(|b| self.with_author(b.blog))
            .collect()
    }

    pub fn get_blog(&self, id: &str) -> Result<Blog, MockApiError> {
        self.blogs
            .get(id)
            .map(|b| self.with_author(b.blog.clone()))
            .ok_or_else(blog_not_found)
    }

    /// Apply the provided fields. Only the author may update.
    pub fn update_blog(&self, user: &User, id: &str, update: &BlogUpdate) -> Result<Blog, MockApiError> {
        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        if let Some(content) = &update.content {
            validate_content(content)?;
        }

        let mut entry = self.blogs.get_mut(id).ok_or_else(blog_not_found)?;
        if entry.blog.author_id != user.id {
            return Err(MockApiError::Forbidden("You can only update your own blogs".into()));
        }
        if !update.is_empty() {
            let blog = &mut entry.blog;
            if let Some(title) = &update.title {
                blog.title = title.clone();
            }
            if let Some(content) = &update.content {
                blog.content = content.clone();
            }
            if let Some(tags) = &update.tags {
                blog.tags = tags.clone();
            }
            blog.updated_at = Utc::now();
        }
        let blog = entry.blog.clone();
        drop(entry);
        Ok(self.with_author(blog))
    }

    pub fn delete_blog(&self, user: &User, id: &str) -> Result<(), MockApiError> {
        let author_id = self
            .blogs
            .get(id)
            .map(|b| b.blog.author_id.clone())
            .ok_or_else(blog_not_found)?;
        if author_id != user.id {
            return Err(MockApiError::Forbidden("You can only delete your own blogs".into()));
        }
        self.blogs.remove(id).ok_or_else(blog_not_found)?;
        Ok(())
    }

    pub fn blog_count(&self) -> usize {
        self.blogs.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn with_author(&self, mut blog: Blog) -> Blog {
        blog.author_username = self
            .users
            .get(&blog.author_id)
            .map(|u| u.user.username.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        blog
    }
}

fn blog_not_found() -> MockApiError {
    MockApiError::NotFound("Blog not found".into())
}

/// Default 10, clamped to 1..=100.
pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn validate_title(title: &str) -> Result<(), MockApiError> {
    let len = title.chars().count();
    if !(3..=100).contains(&len) {
        return Err(MockApiError::BadRequest(
            "Title must be between 3 and 100 characters".into(),
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), MockApiError> {
    if content.chars().count() < 10 {
        return Err(MockApiError::BadRequest(
            "Content must be at least 10 characters".into(),
        ));
    }
    Ok(())
}

fn validate_registration(registration: &Registration) -> Result<(), MockApiError> {
    let username = &registration.username;
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(MockApiError::BadRequest(
            "Username must be between 3 and 50 characters".into(),
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(MockApiError::BadRequest(
            "Username may only contain letters, digits and underscores".into(),
        ));
    }
    if !registration.email.contains('@') {
        return Err(MockApiError::BadRequest("Invalid email address".into()));
    }
    if registration.password.chars().count() < 6 {
        return Err(MockApiError::BadRequest(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}
