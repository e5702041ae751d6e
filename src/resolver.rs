// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use jellyfin_client::{models::UserSummary, Api};

use crate::{
    error::{Error, Result},
    logger::Logger,
};

/// The account being limited. Resolved once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
}

/// First entry whose name matches exactly, case included.
pub fn find_account(users: Vec<UserSummary>, name: &str) -> Option<Account> {
    users
        .into_iter()
        .find(|user| user.name == name)
        .map(|user| Account {
            id: user.id,
            name: user.name,
        })
}

pub fn resolve(api: &Api, logger: &Logger, name: &str) -> Result<Account> {
    let account = find_account(api.users()?, name)
        .ok_or_else(|| Error::UserNotFound(name.to_string()))?;
    logger.info(format_args!("User '{}' has ID {}", account.name, account.id));
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str) -> UserSummary {
        UserSummary {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn exact_case_sensitive_match() {
        let users = vec![user("1", "Kodi"), user("2", "kodi"), user("3", "kodi")];
        assert_eq!(
            find_account(users.clone(), "kodi"),
            Some(Account {
                id: "2".to_string(),
                name: "kodi".to_string()
            })
        );
        assert_eq!(find_account(users, "KODI"), None);
        assert_eq!(find_account(Vec::new(), "kodi"), None);
    }
}
