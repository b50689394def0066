//! Integration tests per i flussi del ConversationController

mod common;

#[cfg(test)]
mod conversation_tests {
    use super::common::{
        create_controller_with_delivery, create_test_controller, create_test_state, test_config,
        test_seed,
    };
    use chatcore::core::Config;
    use chatcore::dtos::MediaFile;
    use chatcore::entities::{MessageStatus, MessageType};
    use chatcore::repositories::{Read, ReadAll};
    use chatcore::services::CANNED_REPLIES;
    use chatcore::{ChatEvent, ConversationController};
    use std::time::Duration;

    fn photo() -> MediaFile {
        MediaFile {
            name: "sunset.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            url: "blob:sunset".to_string(),
        }
    }

    // ============================================================
    // send_message / send_media
    // ============================================================

    #[tokio::test]
    async fn test_send_message_updates_last_message() {
        let ctl = create_test_controller();
        let state = ctl.state();

        let sent = ctl.send_message("c1", "1", "See you at 8").await.unwrap();
        assert_eq!(sent.status, MessageStatus::Sent);
        assert_eq!(sent.message_type, MessageType::Text);

        let chat = state.chat.get_by_id("c1").await.unwrap();
        let last = chat.last_message.unwrap();
        assert_eq!(last.id, sent.id);
        assert_eq!(last.content, "See you at 8");
        assert_eq!(last.sender_id, "1");

        let messages = state.msg.get_by_chat_id("c1").await.unwrap();
        assert!(messages.iter().all(|m| m.timestamp <= last.timestamp));
    }

    #[tokio::test]
    async fn test_concurrent_sends_keep_latest_snapshot() {
        let ctl = create_test_controller();
        let (a, b) = tokio::join!(
            ctl.send_message("c2", "1", "one"),
            ctl.send_message("c2", "3", "two"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        let latest = if b.timestamp >= a.timestamp { &b } else { &a };

        let chat = ctl.state().chat.get_by_id("c2").await.unwrap();
        let last = chat.last_message.unwrap();
        assert_eq!(last.timestamp, latest.timestamp);
    }

    #[tokio::test]
    async fn test_send_to_missing_chat_keeps_message() {
        let ctl = create_test_controller();
        let err = ctl.send_message("ghost", "1", "hello?").await.unwrap_err();
        assert!(err.is_not_found());

        // nessun rollback: il messaggio resta salvato
        let orphans = ctl.state().msg.get_by_chat_id("ghost").await.unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].content, "hello?");
    }

    #[tokio::test]
    async fn test_send_media_uses_preview_in_chat() {
        let ctl = create_test_controller();
        let sent = ctl.send_media("c1", "1", &photo()).await.unwrap();
        assert_eq!(sent.message_type, MessageType::Image);
        assert_eq!(sent.content, "sunset.jpg");
        assert_eq!(sent.media_url.as_deref(), Some("blob:sunset"));

        let chat = ctl.state().chat.get_by_id("c1").await.unwrap();
        assert_eq!(chat.last_message.unwrap().content, "Photo");

        let doc = MediaFile {
            name: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            url: "blob:notes".to_string(),
        };
        let sent = ctl.send_media("g1", "1", &doc).await.unwrap();
        assert_eq!(sent.message_type, MessageType::File);
        let chat = ctl.state().chat.get_by_id("g1").await.unwrap();
        assert_eq!(chat.last_message.unwrap().content, "File");
    }

    // ============================================================
    // mark_chat_read
    // ============================================================

    #[tokio::test]
    async fn test_mark_chat_read_scenario() {
        let ctl = create_test_controller();
        let receipt = ctl.mark_chat_read("c1", "1").await.unwrap();
        assert_eq!(receipt.messages_read, 3);
        assert_eq!(receipt.chat.unread_count, 0);

        let messages = ctl.state().msg.get_by_chat_id("c1").await.unwrap();
        for m in &messages {
            if m.sender_id == "2" {
                assert_eq!(m.status, MessageStatus::Read, "message {}", m.id);
            } else {
                assert_eq!(m.status, MessageStatus::Delivered, "message {}", m.id);
            }
        }
        let chat = ctl.state().chat.get_by_id("c1").await.unwrap();
        assert_eq!(chat.unread_count, 0);
        assert_eq!(chat.last_message.unwrap().status, MessageStatus::Read);
    }

    #[tokio::test]
    async fn test_mark_chat_read_is_idempotent() {
        let ctl = create_test_controller();
        ctl.mark_chat_read("c1", "1").await.unwrap();
        let chat_once = ctl.state().chat.get_by_id("c1").await.unwrap();
        let messages_once = ctl.state().msg.get_all().await.unwrap();

        let receipt = ctl.mark_chat_read("c1", "1").await.unwrap();
        assert_eq!(receipt.messages_read, 0);
        assert_eq!(ctl.state().chat.get_by_id("c1").await.unwrap(), chat_once);
        assert_eq!(ctl.state().msg.get_all().await.unwrap(), messages_once);
    }

    #[tokio::test]
    async fn test_mark_chat_read_missing_chat() {
        let ctl = create_test_controller();
        assert!(ctl.mark_chat_read("ghost", "1").await.unwrap_err().is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_before_delivery_cancels_delivery() {
        let ctl = create_controller_with_delivery(Duration::from_millis(1000));
        let incoming = ctl.send_message("c1", "2", "are you there?").await.unwrap();
        assert!(ctl.state().msg.delivery_handle(&incoming.id).is_some());

        ctl.mark_chat_read("c1", "1").await.unwrap();
        assert!(ctl.state().msg.delivery_handle(&incoming.id).is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let stored = ctl.state().msg.get_by_id(&incoming.id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Read);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sent_then_delivered_then_read() {
        let ctl = create_controller_with_delivery(Duration::from_millis(1000));
        let incoming = ctl.send_message("c2", "3", "lunch?").await.unwrap();
        assert_eq!(incoming.status, MessageStatus::Sent);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let delivered = ctl.state().msg.get_by_id(&incoming.id).await.unwrap();
        assert_eq!(delivered.status, MessageStatus::Delivered);

        ctl.mark_chat_read("c2", "1").await.unwrap();
        let read = ctl.state().msg.get_by_id(&incoming.id).await.unwrap();
        assert_eq!(read.status, MessageStatus::Read);
    }

    // ============================================================
    // Simulazioni
    // ============================================================

    fn always_simulating() -> ConversationController {
        let config = Config {
            reply_probability: 1.0,
            typing_probability: 1.0,
            reply_delay_min: Duration::from_millis(2000),
            reply_delay_max: Duration::from_millis(5000),
            typing_duration: Duration::from_millis(3000),
            ..test_config()
        };
        ConversationController::new(create_test_state(config, test_seed()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_reply_syncs_chat() {
        let ctl = always_simulating();
        let chat = ctl.state().chat.get_by_id("c1").await.unwrap();

        let reply = ctl
            .simulate_incoming_reply(&chat)
            .expect("reply should be scheduled")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.sender_id, "2");
        assert!(CANNED_REPLIES.contains(&reply.content.as_str()));

        let chat = ctl.state().chat.get_by_id("c1").await.unwrap();
        assert_eq!(chat.last_message.unwrap().id, reply.id);
        assert_eq!(chat.unread_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_reply_waits_for_delay() {
        let ctl = always_simulating();
        let chat = ctl.state().chat.get_by_id("c2").await.unwrap();
        let handle = ctl.simulate_incoming_reply(&chat).unwrap();

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert!(ctl.state().msg.get_by_chat_id("c2").await.unwrap().is_empty());

        handle.await.unwrap().unwrap();
        assert_eq!(ctl.state().msg.get_by_chat_id("c2").await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_indicator_turns_off() {
        let ctl = always_simulating();
        let mut events = ctl.state().events.subscribe();
        let chat = ctl.state().chat.get_by_id("c1").await.unwrap();

        let handle = ctl.simulate_typing(&chat).unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            ChatEvent::Typing {
                chat_id: "c1".to_string(),
                user_id: "2".to_string(),
                active: true,
            }
        );

        handle.await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            ChatEvent::Typing {
                chat_id: "c1".to_string(),
                user_id: "2".to_string(),
                active: false,
            }
        );
    }

    #[tokio::test]
    async fn test_send_publishes_events_in_order() {
        let ctl = create_test_controller();
        let mut events = ctl.state().events.subscribe();

        let sent = ctl.send_message("c1", "1", "hi").await.unwrap();
        match events.recv().await.unwrap() {
            ChatEvent::MessageCreated(m) => assert_eq!(m.id, sent.id),
            other => panic!("unexpected event {other:?}"),
        }
        match events.recv().await.unwrap() {
            ChatEvent::ChatUpdated(chat) => {
                assert_eq!(chat.last_message.unwrap().id, sent.id)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    // ============================================================
    // Navigazione
    // ============================================================

    #[tokio::test]
    async fn test_open_chat_loads_everything() {
        let ctl = create_test_controller();
        let view = ctl.open_chat("g1").await.unwrap();
        assert_eq!(view.chat.id, "g1");
        assert_eq!(view.messages.len(), 1);
        let mut ids: Vec<&str> = view.participants.iter().map(|u| u.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "4"]);

        assert!(ctl.open_chat("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_start_individual_chat_reuses_existing() {
        let ctl = create_test_controller();
        let existing = ctl.start_individual_chat("1", "2").await.unwrap();
        assert_eq!(existing.id, "c1");

        let created = ctl.start_individual_chat("1", "4").await.unwrap();
        assert!(created.is_individual());
        assert_eq!(created.unread_count, 0);
        assert!(created.last_message.is_none());
        assert_eq!(ctl.state().chat.get_all().await.unwrap().len(), 4);

        let again = ctl.start_individual_chat("1", "4").await.unwrap();
        assert_eq!(again.id, created.id);

        assert!(ctl.start_individual_chat("1", "99").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_search_chats() {
        let ctl = create_test_controller();
        let found = ctl.search_chats("1", "mike").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c2");

        let found = ctl.search_chats("1", "book").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "g1");

        assert_eq!(ctl.search_chats("1", "").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_touch_presence_makes_user_online() {
        let ctl = create_test_controller();
        let state = ctl.state();
        let before = state.user.get_by_id("2").await.unwrap();
        assert!(!state.user.is_online(&before));

        let after = ctl.touch_presence("2").await.unwrap();
        assert!(state.user.is_online(&after));
        assert!(ctl.touch_presence("99").await.unwrap_err().is_not_found());
    }
}
