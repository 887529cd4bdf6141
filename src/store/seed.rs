//! Initial data for empty stores.

use crate::auth::CredentialHasher;
use crate::store::TodoStore;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Credentials for the first administrator, taken from configuration.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// Create the configured administrator if the store has no users yet.
///
/// Returns `true` when an account was created.
pub fn bootstrap_admin(
    store: &TodoStore,
    hasher: &dyn CredentialHasher,
    admin: &BootstrapAdmin,
) -> Result<bool> {
    if store.count_users()? > 0 {
        return Ok(false);
    }

    let password_hash = hasher.hash(&admin.password)?;
    store
        .create_user(&admin.name, &admin.username, &password_hash, true)
        .context("Failed to insert bootstrap admin")?;

    info!("Bootstrap admin created (username: {})", admin.username);
    Ok(true)
}

const DEMO_PASSWORD: &str = "password123";

const DEMO_USERS: [(&str, &str, bool); 3] = [
    ("Alice Johnson", "alice", true),
    ("Bob Smith", "bob", false),
    ("Carol Davis", "carol", false),
];

/// (owner index into `DEMO_USERS`, list name, items)
const DEMO_LISTS: [(usize, &str, [&str; 3]); 4] = [
    (
        0,
        "Personal Tasks",
        ["Review monthly budget", "Schedule dentist appointment", "Update resume"],
    ),
    (
        0,
        "Work Projects",
        ["Prepare quarterly report", "Review team performance", "Plan next sprint"],
    ),
    (
        1,
        "Shopping List",
        ["Buy groceries", "Pick up dry cleaning", "Get new phone charger"],
    ),
    (
        2,
        "Home Improvement",
        ["Paint living room", "Fix kitchen faucet", "Install new light fixtures"],
    ),
];

/// Populate an empty store with demo users, lists and items.
///
/// Does nothing (and returns `false`) if any user already exists.
pub fn seed_demo_data(store: &TodoStore, hasher: &dyn CredentialHasher) -> Result<bool> {
    let existing = store.count_users()?;
    if existing > 0 {
        info!("Store already contains {} users, skipping demo seed", existing);
        return Ok(false);
    }

    let password_hash = hasher.hash(DEMO_PASSWORD)?;

    let mut user_ids = Vec::with_capacity(DEMO_USERS.len());
    for (name, username, is_admin) in DEMO_USERS {
        let user = store.create_user(name, username, &password_hash, is_admin)?;
        user_ids.push(user.id);
    }

    let mut item_count = 0;
    for (owner, list_name, items) in DEMO_LISTS {
        let list = store.create_list(list_name, user_ids[owner])?;
        for item in items {
            store.create_item(item, list.id)?;
            item_count += 1;
        }
    }

    info!(
        "Seeded demo data: {} users, {} lists, {} items",
        DEMO_USERS.len(),
        DEMO_LISTS.len(),
        item_count
    );
    warn!("Demo users share the password '{}'. Do not seed production stores!", DEMO_PASSWORD);

    Ok(true)
}
