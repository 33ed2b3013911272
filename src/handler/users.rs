use crate::{
    error::BotResult,
    service::{
        dialogue::model::{Action, StateTag},
        language::{role_label, Language},
        session::DEFAULT_ROLE,
    },
    storage::model::Role,
    transport::OutgoingMessage,
    utils::{is_valid_username, preprocess_username},
};

use super::{
    dispatch::{Outcome, Turn},
    keyboard::{get_back_keyboard, get_role_choice_keyboard, get_users_handle_keyboard, get_users_view_keyboard},
};

/// A role the actor may hand out: strictly below their own, never the default one.
fn is_grantable(role: &Role, actor: &Role) -> bool {
    role.name != DEFAULT_ROLE && role.is_below(actor)
}

pub async fn handle_callback_handle_users(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    turn.session.scratch.role_to_grant = None;
    let anchor = turn
        .present(
            t!("users.handle.mode_choice", locale = locale),
            Some(get_users_handle_keyboard(locale)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::HandleUsers,
        anchor,
    })
}

pub async fn handle_callback_add_user_role(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let roles: Vec<Role> = turn
        .app
        .records
        .list_roles()
        .await?
        .into_iter()
        .filter(|role| is_grantable(role, &turn.session.role))
        .collect();

    let anchor = if roles.is_empty() {
        turn.present(
            t!("users.handle.no_roles_warning", locale = locale),
            Some(get_back_keyboard(locale, Action::HandleUsers)),
        )
        .await
    } else {
        turn.present(
            t!("users.handle.role_choice", locale = locale),
            Some(get_role_choice_keyboard(locale, &roles)),
        )
        .await
    };
    Ok(Outcome::Present {
        tag: StateTag::AddUserRole,
        anchor,
    })
}

pub async fn handle_callback_chose_role(turn: &mut Turn<'_>, role_name: &str) -> BotResult<Outcome> {
    let locale = turn.locale();
    let grantable = match turn.app.records.find_role(role_name).await? {
        Some(role) => is_grantable(&role, &turn.session.role),
        None => false,
    };
    if !grantable {
        turn.present(
            t!("users.message.role_not_grantable_warning", locale = locale, role = role_label(role_name, locale)),
            None,
        )
        .await;
        return Ok(Outcome::FinishBelow);
    }

    turn.session.scratch.role_to_grant = Some(role_name.to_string());
    let anchor = turn
        .present(
            t!(
                "users.handle.input_username_to_add_suggestion",
                locale = locale,
                role = role_label(role_name, locale)
            ),
            Some(get_back_keyboard(locale, Action::HandleUsers)),
        )
        .await;
    Ok(Outcome::Await {
        tag: StateTag::ChoseUserToAddRole,
        anchor,
    })
}

pub async fn handle_message_grant(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    let Some(role_name) = turn.session.scratch.role_to_grant.take() else {
        return Ok(Outcome::Finish);
    };
    let locale = turn.locale();
    let username = preprocess_username(text);

    if !is_valid_username(&username) {
        turn.notify(t!("users.message.invalid_username_warning", locale = locale, username = username))
            .await;
        return Ok(Outcome::Finish);
    }

    // the actor's own role may have changed since the role was picked
    let role = match turn.app.records.find_role(&role_name).await? {
        Some(role) if is_grantable(&role, &turn.session.role) => role,
        _ => {
            turn.notify(t!(
                "users.message.role_not_grantable_warning",
                locale = locale,
                role = role_label(&role_name, locale)
            ))
            .await;
            return Ok(Outcome::Finish);
        }
    };

    if let Some(existing) = turn.app.records.find_user(&username).await? {
        let outranked = match turn.app.records.find_role(&existing.role).await? {
            Some(current) => current.is_below(&turn.session.role),
            None => false,
        };
        if !outranked {
            turn.notify(t!("users.message.cant_remove_role_warning", locale = locale, username = username))
                .await;
            return Ok(Outcome::Finish);
        }
    }

    turn.app.records.upsert_user_role(&username, &role.name).await?;
    info!("{} granted {} to {}", turn.session.identity, role.name, username);

    turn.notify(t!(
        "users.message.role_added_confirmation",
        locale = locale,
        username = username,
        role = role_label(&role.name, locale)
    ))
    .await;
    Ok(Outcome::Finish)
}

pub async fn handle_callback_remove_user_role(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("users.handle.input_username_to_remove_suggestion", locale = locale),
            Some(get_back_keyboard(locale, Action::HandleUsers)),
        )
        .await;
    Ok(Outcome::Await {
        tag: StateTag::RemoveUserRole,
        anchor,
    })
}

/// Deletes the directory entry of a lower-ranked identity and tells them about it.
pub async fn handle_message_revoke(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    let locale = turn.locale();
    let username = preprocess_username(text);

    let Some(record) = turn.app.records.find_user(&username).await? else {
        turn.notify(t!("users.message.dont_have_role_warning", locale = locale, username = username))
            .await;
        return Ok(Outcome::Finish);
    };

    let outranked = match turn.app.records.find_role(&record.role).await? {
        Some(current) => current.is_below(&turn.session.role),
        None => false,
    };
    if !outranked {
        turn.notify(t!("users.message.cant_remove_role_warning", locale = locale, username = username))
            .await;
        return Ok(Outcome::Finish);
    }

    turn.app.records.delete_user(&username).await?;
    info!("{} revoked {} from {}", turn.session.identity, record.role, username);

    if let Some(chat_id) = record.chat_id {
        let target_locale = record
            .language
            .as_deref()
            .and_then(|code| code.parse::<Language>().ok())
            .unwrap_or_default()
            .code();
        let message = OutgoingMessage::text(chat_id, t!("users.message.role_lost_notification", locale = target_locale));
        if let Err(e) = turn.transport.send(message).await {
            warn!("Failed to tell {} about the lost role: {}", username, e);
        }
    }

    turn.notify(t!("users.message.role_removed_confirmation", locale = locale, username = username))
        .await;
    Ok(Outcome::Finish)
}

pub async fn handle_callback_view_users(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("users.view.mode_choice", locale = locale),
            Some(get_users_view_keyboard(locale)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::ViewUsers,
        anchor,
    })
}

pub async fn handle_callback_view_users_list(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let users = turn.app.records.list_users().await?;

    let text = if users.is_empty() {
        t!("users.view.list_empty", locale = locale).to_string()
    } else {
        users
            .iter()
            .map(|(username, role)| format!("@{} - {}", username, role_label(role, locale)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let anchor = turn
        .present(text, Some(get_back_keyboard(locale, Action::ViewUsers)))
        .await;
    Ok(Outcome::Present {
        tag: StateTag::ViewUsersList,
        anchor,
    })
}

pub async fn handle_callback_view_users_statistics(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let stats = turn.app.records.moderator_stats().await?;

    let text = if stats.is_empty() {
        t!("users.view.statistics_empty", locale = locale).to_string()
    } else {
        let mut lines = vec![t!("users.view.statistics_header", locale = locale).to_string()];
        lines.extend(stats.iter().map(|stat| format!("@{}: {}", stat.username, stat.answered)));
        lines.join("\n")
    };

    let anchor = turn
        .present(text, Some(get_back_keyboard(locale, Action::ViewUsers)))
        .await;
    Ok(Outcome::Present {
        tag: StateTag::ViewUsersStatistics,
        anchor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::model::Abilities;

    fn role(name: &str, level: i64) -> Role {
        Role {
            name: name.to_string(),
            level,
            abilities: Abilities::default(),
        }
    }

    #[test]
    fn test_only_lower_roles_are_grantable() {
        let admin = role("administrator", 2);
        assert!(is_grantable(&role("moderator", 1), &admin));
        assert!(!is_grantable(&role("administrator", 2), &admin));
        assert!(!is_grantable(&role("developer", 3), &admin));
        assert!(!is_grantable(&role(DEFAULT_ROLE, 0), &admin));
    }
}
