mod common;

use std::sync::Arc;

use common::{GatedReplies, InstantReplies, ScriptedDialogs, chat_harness, harness};
use triqai::events::{ConversationRole, Route, SessionAction};
use triqai::storage::{CURRENT_CHAT_KEY, KeyValueStore, PENDING_MESSAGE_KEY};

#[tokio::test]
async fn send_appends_user_then_assistant() {
    let h = chat_harness();

    let action = h.session.send("  Hello TriqAI  ").await.unwrap();
    assert_eq!(action, SessionAction::None);

    let id = h.session.active_id().expect("active conversation");
    let transcript = h.session.store().get_transcript(&id).unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, ConversationRole::User);
    assert_eq!(transcript[0].content, "Hello TriqAI");
    assert_eq!(transcript[1].role, ConversationRole::Assistant);
    assert_eq!(transcript[1].content, "**Hi** there");

    let log = h.surface.log();
    assert_eq!(log.messages.len(), 2);
    assert!(log.messages[1].1.contains("<strong>Hi</strong>"));
    assert!(!log.typing);
    assert!(log.input.is_empty());
    assert_eq!(log.history.len(), 1);
    assert_eq!(log.history[0].title, "Hello TriqAI");
}

#[tokio::test]
async fn blank_send_touches_nothing() {
    let h = chat_harness();

    for text in ["", "   ", "\n\t "] {
        assert_eq!(h.session.send(text).await.unwrap(), SessionAction::None);
    }

    assert_eq!(h.persistent.write_count(), 0);
    assert_eq!(h.transient.write_count(), 0);
    assert!(h.surface.log().messages.is_empty());
    assert!(h.session.active_id().is_none());
}

#[tokio::test]
async fn active_id_is_created_once() {
    let h = chat_harness();
    let first = h.session.get_or_create_active_id().unwrap();
    let second = h.session.get_or_create_active_id().unwrap();
    assert_eq!(first, second);
    assert_eq!(h.transient.get(CURRENT_CHAT_KEY).as_deref(), Some(first.as_str()));
}

#[tokio::test]
async fn user_markup_is_escaped_on_the_surface() {
    let h = chat_harness();
    h.session.send("<img src=x onerror=alert(1)>").await.unwrap();

    let log = h.surface.log();
    let markup = &log.messages[0].1;
    assert!(markup.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(!markup.contains("<img"));
}

#[tokio::test]
async fn home_page_stashes_and_chat_page_replays_once() {
    let h = harness(
        Route::Home,
        Arc::new(ScriptedDialogs::default()),
        Arc::new(InstantReplies("ok")),
    );

    let action = h.session.send("build me a castle").await.unwrap();
    assert_eq!(action, SessionAction::Navigate(Route::Chat));
    assert_eq!(
        h.transient.get(PENDING_MESSAGE_KEY).as_deref(),
        Some("build me a castle")
    );
    assert!(h.session.history().is_empty());

    let chat = common::RecordingSurface::new(Route::Chat);
    let action = h.session.enter_chat_view(Box::new(chat.clone())).await.unwrap();
    assert_eq!(action, SessionAction::None);
    assert_eq!(h.transient.get(PENDING_MESSAGE_KEY), None);

    let id = h.session.active_id().unwrap();
    assert_eq!(h.session.store().get_transcript(&id).unwrap().len(), 2);
    assert_eq!(chat.log().messages.len(), 2);

    h.session.resume_pending().await.unwrap();
    assert_eq!(h.session.store().get_transcript(&id).unwrap().len(), 2);
}

#[tokio::test]
async fn resume_without_stash_is_a_no_op() {
    let h = chat_harness();
    assert_eq!(h.session.resume_pending().await.unwrap(), SessionAction::None);
    assert_eq!(h.persistent.write_count(), 0);
}

#[tokio::test]
async fn submit_sends_the_applied_suggestion() {
    let h = chat_harness();
    h.session.apply_suggestion("Explain redstone comparators");
    assert_eq!(h.surface.log().input, "Explain redstone comparators");

    h.session.submit().await.unwrap();
    let id = h.session.active_id().unwrap();
    let transcript = h.session.store().get_transcript(&id).unwrap();
    assert_eq!(transcript[0].content, "Explain redstone comparators");
    assert!(h.surface.log().input.is_empty());
}

#[tokio::test]
async fn switch_redisplays_or_asks_for_navigation() {
    let h = chat_harness();
    h.session.send("first").await.unwrap();
    let first = h.session.active_id().unwrap();
    h.session.create_new().unwrap();
    h.session.send("second").await.unwrap();
    let second = h.session.active_id().unwrap();
    assert_ne!(first, second);

    assert_eq!(h.session.switch_to(&first).unwrap(), SessionAction::None);
    {
        let log = h.surface.log();
        assert_eq!(log.messages.len(), 2);
        assert_eq!(log.messages[0].0.content, "first");
    }
    assert_eq!(h.session.active_id(), Some(first.clone()));

    h.session
        .attach_surface(Box::new(common::RecordingSurface::new(Route::Home)));
    assert_eq!(
        h.session.switch_to(&second).unwrap(),
        SessionAction::Navigate(Route::Chat)
    );
    assert_eq!(h.session.active_id(), Some(second));
}

#[tokio::test]
async fn history_lists_newest_first() {
    let h = chat_harness();
    for text in ["one", "two", "three"] {
        h.session.create_new().unwrap();
        h.session.send(text).await.unwrap();
    }

    let titles: Vec<String> = h.session.history().into_iter().map(|s| s.title).collect();
    assert_eq!(titles, vec!["three", "two", "one"]);
}

#[tokio::test]
async fn create_new_clears_active_and_stash() {
    let h = chat_harness();
    h.session.send("hello").await.unwrap();
    h.transient.set(PENDING_MESSAGE_KEY, "left over").unwrap();

    assert_eq!(h.session.create_new().unwrap(), SessionAction::Navigate(Route::Home));
    assert!(h.session.active_id().is_none());
    assert_eq!(h.transient.get(PENDING_MESSAGE_KEY), None);
    assert_eq!(h.session.history().len(), 1);
}

#[tokio::test]
async fn declined_delete_keeps_conversation() {
    let h = harness(
        Route::Chat,
        Arc::new(ScriptedDialogs::confirming(false)),
        Arc::new(InstantReplies("ok")),
    );
    h.session.send("keep me").await.unwrap();
    let id = h.session.active_id().unwrap();

    assert_eq!(h.session.delete(&id).await.unwrap(), SessionAction::None);
    assert!(h.session.store().contains(&id));
    assert_eq!(h.session.active_id(), Some(id));
}

#[tokio::test]
async fn deleting_active_conversation_resets_session() {
    let h = harness(
        Route::Chat,
        Arc::new(ScriptedDialogs::confirming(true)),
        Arc::new(InstantReplies("ok")),
    );
    h.session.send("delete me").await.unwrap();
    let id = h.session.active_id().unwrap();
    h.session.rename_to(&id, "Doomed").unwrap();

    let action = h.session.delete(&id).await.unwrap();
    assert_eq!(action, SessionAction::Navigate(Route::Home));
    assert!(h.session.active_id().is_none());
    assert!(h.session.history().is_empty());
    assert!(h.surface.log().history.is_empty());
    assert!(!h.persistent.get("chatTitles").unwrap_or_default().contains(id.as_str()));
}

#[tokio::test]
async fn deleting_other_conversation_keeps_active() {
    let h = harness(
        Route::Chat,
        Arc::new(ScriptedDialogs::confirming(true)),
        Arc::new(InstantReplies("ok")),
    );
    h.session.send("old").await.unwrap();
    let old = h.session.active_id().unwrap();
    h.session.create_new().unwrap();
    h.session.send("current").await.unwrap();
    let current = h.session.active_id().unwrap();

    assert_eq!(h.session.delete(&old).await.unwrap(), SessionAction::None);
    assert_eq!(h.session.active_id(), Some(current));
    assert_eq!(h.session.history().len(), 1);
}

#[tokio::test]
async fn rename_through_prompt() {
    let dialogs = Arc::new(ScriptedDialogs::prompting(Some("  Castle plans  ")));
    let h = harness(Route::Chat, dialogs.clone(), Arc::new(InstantReplies("ok")));
    h.session.send("Design a medieval castle").await.unwrap();
    let id = h.session.active_id().unwrap();

    assert!(h.session.rename(&id).await.unwrap());
    assert_eq!(h.session.store().get_title(&id), "Castle plans");
    assert_eq!(h.surface.log().history[0].title, "Castle plans");
    assert_eq!(
        dialogs.asked.lock().unwrap()[0],
        "New conversation title [Design a medieval castle]"
    );
}

#[tokio::test]
async fn blank_or_cancelled_rename_keeps_title() {
    for answer in [None, Some("   ")] {
        let h = harness(
            Route::Chat,
            Arc::new(ScriptedDialogs::prompting(answer)),
            Arc::new(InstantReplies("ok")),
        );
        h.session.send("original title").await.unwrap();
        let id = h.session.active_id().unwrap();

        assert!(!h.session.rename(&id).await.unwrap());
        assert_eq!(h.session.store().get_title(&id), "original title");
    }
}

#[tokio::test]
async fn copy_text_returns_plain_content() {
    let h = chat_harness();
    h.session.send("copy me").await.unwrap();
    assert_eq!(h.session.copy_text(0).as_deref(), Some("copy me"));
    assert_eq!(h.session.copy_text(1).as_deref(), Some("**Hi** there"));
    assert_eq!(h.session.copy_text(2), None);
}

#[tokio::test]
async fn reply_lands_in_its_conversation_after_navigation() {
    let replies = Arc::new(GatedReplies::default());
    let h = harness(
        Route::Chat,
        Arc::new(ScriptedDialogs::default()),
        replies.clone(),
    );
    let id = h.session.get_or_create_active_id().unwrap();

    let session = h.session.clone();
    let pending = tokio::spawn(async move { session.send("slow question").await });

    while h.session.store().get_transcript(&id).is_none() {
        tokio::task::yield_now().await;
    }
    assert!(h.surface.log().typing);

    h.session.create_new().unwrap();
    replies.gate.notify_one();
    pending.await.unwrap().unwrap();

    let transcript = h.session.store().get_transcript(&id).unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].content, "gated reply");
    assert!(h.surface.log().messages.is_empty());
    assert!(!h.surface.log().typing);
}

#[tokio::test]
async fn reply_for_deleted_conversation_is_dropped() {
    let replies = Arc::new(GatedReplies::default());
    let h = harness(
        Route::Chat,
        Arc::new(ScriptedDialogs::confirming(true)),
        replies.clone(),
    );
    let id = h.session.get_or_create_active_id().unwrap();

    let session = h.session.clone();
    let pending = tokio::spawn(async move { session.send("never mind").await });

    while h.session.store().get_transcript(&id).is_none() {
        tokio::task::yield_now().await;
    }

    let action = h.session.delete(&id).await.unwrap();
    assert_eq!(action, SessionAction::Navigate(Route::Home));
    replies.gate.notify_one();
    assert_eq!(pending.await.unwrap().unwrap(), SessionAction::None);

    assert!(h.session.history().is_empty());
    assert!(!h.session.store().contains(&id));
    assert!(h.surface.log().history.is_empty());
    assert!(!h.surface.log().typing);
}

#[tokio::test]
async fn switching_during_reply_clears_typing_indicator() {
    let replies = Arc::new(GatedReplies::default());
    let h = harness(
        Route::Chat,
        Arc::new(ScriptedDialogs::default()),
        replies.clone(),
    );

    replies.gate.notify_one();
    h.session.send("older").await.unwrap();
    let older = h.session.active_id().unwrap();
    h.session.create_new().unwrap();
    let current = h.session.get_or_create_active_id().unwrap();
    assert_ne!(older, current);

    let session = h.session.clone();
    let pending = tokio::spawn(async move { session.send("slow one").await });

    while h.session.store().get_transcript(&current).is_none() {
        tokio::task::yield_now().await;
    }
    assert!(h.surface.log().typing);

    h.session.switch_to(&older).unwrap();
    replies.gate.notify_one();
    pending.await.unwrap().unwrap();

    let log = h.surface.log();
    assert!(!log.typing);
    assert_eq!(log.messages.len(), 2);
    assert_eq!(log.messages[0].0.content, "older");
    assert_eq!(log.messages[1].0.content, "gated reply");
    drop(log);

    let transcript = h.session.store().get_transcript(&current).unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].content, "gated reply");
}
