//! In-process identity cache.
//!
//! Resolving a bearer token hits the users table; within a token's lifetime
//! that lookup repeats on every request. The cache short-circuits it for a
//! configurable TTL. It is advisory only and is invalidated by TTL, never by
//! event: a revoked or role-changed user may be served stale for up to the
//! TTL, which is an accepted staleness window, not a security boundary.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::domain::model::User;

struct Entry {
    user: User,
    inserted_at: Instant,
}

pub struct IdentityCache {
    ttl: Duration,
    entries: RwLock<HashMap<i64, Entry>>,
}

impl IdentityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, user_id: i64) -> Option<User> {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(&user_id) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.user.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop the entry so the map does not grow unbounded.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&user_id);
        None
    }

    pub fn insert(&self, user: User) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            user.id,
            Entry {
                user,
                inserted_at: Instant::now(),
            },
        );
    }
}
