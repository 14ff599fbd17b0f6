use lanxpert_database::{ChatDetail, ChatRepository, ChatType, Message, PlanRepository, User, UserRepository};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use super::error::{ServiceError, ServiceResult};

/// Open (or reuse) a one-to-one chat. Requires a paid plan.
pub async fn open_direct_chat(pool: &SqlitePool, user: &User, target_user_id: &str) -> ServiceResult<ChatDetail> {
    let has_paid_plan = match user.plan_id.as_deref() {
        Some(plan_id) => PlanRepository::new(pool.clone())
            .find_by_id(plan_id)
            .await?
            .is_some_and(|plan| plan.is_paid()),
        None => false,
    };
    if !has_paid_plan {
        return Err(ServiceError::forbidden("Direct messaging requires a paid plan."));
    }

    let target_user_id = target_user_id.trim();
    if target_user_id.is_empty() {
        return Err(ServiceError::bad_request("Target user required for direct chat."));
    }
    if target_user_id == user.id {
        return Err(ServiceError::bad_request("Cannot chat with yourself."));
    }
    match UserRepository::new(pool.clone()).find_by_id(target_user_id).await? {
        Some(target) if !target.is_deleted() => {}
        _ => return Err(ServiceError::not_found("User not found")),
    }

    let mut tx = pool.begin().await?;
    if ChatRepository::is_blocked_between_in(&mut tx, &user.id, target_user_id).await? {
        return Err(ServiceError::forbidden("Cannot start chat with this user."));
    }

    let chat_id = match ChatRepository::find_direct_between_in(&mut tx, &user.id, target_user_id).await? {
        Some(existing) => existing,
        None => {
            let chat = ChatRepository::create_in(&mut tx, ChatType::Direct).await?;
            ChatRepository::add_participant_in(&mut tx, &chat.id, &user.id).await?;
            ChatRepository::add_participant_in(&mut tx, &chat.id, target_user_id).await?;
            info!(user_id = %user.id, target_user_id, chat_id = %chat.id, "direct chat opened");
            chat.id
        }
    };

    let detail = ChatRepository::detail_in(&mut tx, &chat_id).await?;
    tx.commit().await?;
    Ok(detail)
}

pub async fn list_messages(
    pool: &SqlitePool,
    user: &User,
    chat_id: &str,
    skip: i64,
    limit: i64,
) -> ServiceResult<Vec<Message>> {
    let chats = ChatRepository::new(pool.clone());
    if !chats.is_participant(chat_id, &user.id).await? {
        return Err(ServiceError::forbidden("Not a participant"));
    }
    Ok(chats.messages(chat_id, skip, limit).await?)
}

pub async fn send_message(pool: &SqlitePool, user: &User, chat_id: &str, content: &str) -> ServiceResult<Message> {
    let mut tx = pool.begin().await?;

    let chat = ChatRepository::find_by_id_in(&mut tx, chat_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Chat not found"))?;
    if !ChatRepository::is_participant_in(&mut tx, chat_id, &user.id).await? {
        return Err(ServiceError::forbidden("Not a participant"));
    }
    if content.trim().is_empty() {
        return Err(ServiceError::bad_request("Message content cannot be empty"));
    }
    if chat.chat_type == ChatType::Terminated {
        return Err(ServiceError::bad_request("This conversation has ended"));
    }

    let message = ChatRepository::insert_message_in(&mut tx, chat_id, Some(&user.id), content).await?;
    tx.commit().await?;
    Ok(message)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaveOutcome {
    ChatDeleted,
    ChatLeft,
}

/// Leave a chat. The last participant out deletes it; otherwise the chat is
/// terminated for whoever remains.
pub async fn leave_chat(pool: &SqlitePool, user: &User, chat_id: &str) -> ServiceResult<LeaveOutcome> {
    let mut tx = pool.begin().await?;

    if !ChatRepository::is_participant_in(&mut tx, chat_id, &user.id).await? {
        return Err(ServiceError::forbidden("Not a participant of this chat"));
    }
    if ChatRepository::find_by_id_in(&mut tx, chat_id).await?.is_none() {
        return Err(ServiceError::not_found("Chat not found"));
    }

    let others = ChatRepository::participants_in(&mut tx, chat_id)
        .await?
        .into_iter()
        .filter(|participant| participant.user_id != user.id)
        .count();

    let outcome = if others == 0 {
        ChatRepository::delete_in(&mut tx, chat_id).await?;
        LeaveOutcome::ChatDeleted
    } else {
        let notice = format!("{} has left the chat. Conversation ended.", user.username);
        ChatRepository::insert_message_in(&mut tx, chat_id, None, &notice).await?;
        ChatRepository::set_type_in(&mut tx, chat_id, ChatType::Terminated).await?;
        ChatRepository::remove_participant_in(&mut tx, chat_id, &user.id).await?;
        LeaveOutcome::ChatLeft
    };

    tx.commit().await?;
    info!(user_id = %user.id, chat_id, ?outcome, "left chat");
    Ok(outcome)
}
