//! Gateway integration tests
//!
//! Exercise the frame router, handlers, and dispatcher against in-memory
//! repositories and an in-memory event bus. No PostgreSQL or Redis needed.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::Arc;
use std::time::Duration;

use integration_tests::{expect_frame, frame_code, try_frame, TestHarness};

use huddle_cache::{PubSubChannel, PubSubEvent};
use huddle_common::AppError;
use huddle_core::{PresenceStatus, RoomKey, Snowflake};
use huddle_gateway::dispatch::EventDispatcher;
use huddle_gateway::voice::VoiceCoordinator;

// ============================================================================
// Session and protocol
// ============================================================================

#[tokio::test]
async fn test_heartbeat_is_acknowledged() {
    let harness = TestHarness::new();
    let (conn, mut rx) = harness.connect(1);

    harness.route(&conn, r#"{"t":"heartbeat"}"#).await;

    expect_frame(&mut rx, "heartbeat.ack");
}

#[tokio::test]
async fn test_unknown_event_gets_error_frame() {
    let harness = TestHarness::new();
    let (conn, mut rx) = harness.connect(1);

    harness.route(&conn, r#"{"t":"no.such.event","d":{}}"#).await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("INVALID_PAYLOAD"));
}

#[tokio::test]
async fn test_ambiguous_room_target_rejected() {
    let harness = TestHarness::new();
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(
            &conn,
            r#"{"t":"channel.join","d":{"channelId":"1","threadId":"2"},"nonce":"n-1"}"#,
        )
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("INVALID_PAYLOAD"));
    assert_eq!(frame.nonce.as_deref(), Some("n-1"));
}

#[tokio::test]
async fn test_handshake_rejects_malformed_token() {
    let harness = TestHarness::new();

    let result = harness
        .state
        .authenticator()
        .authenticate("not-a-jwt")
        .await;

    assert!(matches!(result, Err(AppError::InvalidToken)));
}

// ============================================================================
// Text rooms
// ============================================================================

#[tokio::test]
async fn test_join_subscribes_room_topic_and_acks() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"channel.join","d":{"channelId":"10"},"nonce":"j-1"}"#)
        .await;

    let ack = expect_frame(&mut rx, "ack");
    assert_eq!(ack.nonce.as_deref(), Some("j-1"));
    assert_eq!(ack.d.unwrap()["room"], "channel:10");

    assert!(harness.bus.is_subscribed("channel:10"));
    assert!(conn.in_room(RoomKey::channel(Snowflake::new(10))).await);
}

#[tokio::test]
async fn test_join_requires_membership() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    // user 2 is not a member of server 1
    let (conn, mut rx) = harness.connect(2);

    harness
        .route(&conn, r#"{"t":"channel.join","d":{"channelId":"10"}}"#)
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("NOT_SERVER_MEMBER"));
    assert!(!harness.bus.is_subscribed("channel:10"));
}

#[tokio::test]
async fn test_join_unknown_channel() {
    let harness = TestHarness::new();
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"channel.join","d":{"channelId":"999"}}"#)
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("UNKNOWN_CHANNEL"));
}

#[tokio::test]
async fn test_thread_join_requires_participation() {
    let harness = TestHarness::new();
    harness.seed_thread(50, &[1, 2]);

    let (participant, mut p_rx) = harness.connect(1);
    harness
        .route(&participant, r#"{"t":"channel.join","d":{"threadId":"50"},"nonce":"t-1"}"#)
        .await;
    expect_frame(&mut p_rx, "ack");

    let (outsider, mut o_rx) = harness.connect(3);
    harness
        .route(&outsider, r#"{"t":"channel.join","d":{"threadId":"50"}}"#)
        .await;
    let frame = expect_frame(&mut o_rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("NOT_THREAD_PARTICIPANT"));
}

#[tokio::test]
async fn test_last_leave_unsubscribes_room_topic() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    harness.seed_member(1, 2);

    let (alice, _a_rx) = harness.connect(1);
    let (bob, _b_rx) = harness.connect(2);

    harness
        .route(&alice, r#"{"t":"channel.join","d":{"channelId":"10"}}"#)
        .await;
    harness
        .route(&bob, r#"{"t":"channel.join","d":{"channelId":"10"}}"#)
        .await;
    assert!(harness.bus.is_subscribed("channel:10"));

    harness
        .route(&alice, r#"{"t":"channel.leave","d":{"channelId":"10"}}"#)
        .await;
    assert!(
        harness.bus.is_subscribed("channel:10"),
        "topic stays while a local member remains"
    );

    harness
        .route(&bob, r#"{"t":"channel.leave","d":{"channelId":"10"}}"#)
        .await;
    assert!(!harness.bus.is_subscribed("channel:10"));
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_message_create_broadcasts_and_acks() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(
            &conn,
            r#"{"t":"message.create","d":{"channelId":"10","content":"hello"},"nonce":"m-1"}"#,
        )
        .await;

    let published = harness.bus.published_of("message.created");
    assert_eq!(published.len(), 1);
    assert_eq!(
        published[0].channel,
        PubSubChannel::room(RoomKey::channel(Snowflake::new(10)))
    );
    assert_eq!(published[0].event.data["content"], "hello");
    assert_eq!(published[0].event.data["authorId"], "1");
    assert!(published[0].event.exclude_user.is_none());

    let ack = expect_frame(&mut rx, "ack");
    assert_eq!(ack.nonce.as_deref(), Some("m-1"));
    let data = ack.d.unwrap();
    assert_eq!(data["content"], "hello");

    // The row landed in the store under the acked id
    let id: i64 = data["id"].as_str().unwrap().parse().unwrap();
    let stored = harness.messages.get(Snowflake::new(id)).unwrap();
    assert_eq!(stored.content.as_deref(), Some("hello"));
    assert!(!stored.is_deleted());
}

#[tokio::test]
async fn test_message_create_requires_content_or_attachments() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"message.create","d":{"channelId":"10"},"nonce":"m-2"}"#)
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("EMPTY_MESSAGE"));
    assert_eq!(frame.nonce.as_deref(), Some("m-2"));
    assert!(harness.messages.is_empty());
}

#[tokio::test]
async fn test_message_create_whitespace_only_is_empty() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"message.create","d":{"channelId":"10","content":"   "}}"#)
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("EMPTY_MESSAGE"));
}

#[tokio::test]
async fn test_message_create_rejects_overlong_content() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    let content = "x".repeat(4001);
    let frame_json = format!(
        r#"{{"t":"message.create","d":{{"channelId":"10","content":"{content}"}}}}"#
    );
    harness.route(&conn, &frame_json).await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("CONTENT_TOO_LONG"));
    assert!(harness.messages.is_empty());
}

#[tokio::test]
async fn test_message_create_requires_membership() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    let (conn, mut rx) = harness.connect(7);

    harness
        .route(&conn, r#"{"t":"message.create","d":{"channelId":"10","content":"hi"}}"#)
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("NOT_SERVER_MEMBER"));
    assert!(harness.messages.is_empty());
    assert!(harness.bus.published_of("message.created").is_empty());
}

#[tokio::test]
async fn test_thread_message_by_participant() {
    let harness = TestHarness::new();
    harness.seed_thread(50, &[1, 2]);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(
            &conn,
            r#"{"t":"message.create","d":{"threadId":"50","content":"dm"},"nonce":"m-3"}"#,
        )
        .await;

    expect_frame(&mut rx, "ack");
    let published = harness.bus.published_of("message.created");
    assert_eq!(published.len(), 1);
    assert_eq!(
        published[0].channel,
        PubSubChannel::room(RoomKey::thread(Snowflake::new(50)))
    );
    assert_eq!(published[0].event.data["threadId"], "50");
}

#[tokio::test]
async fn test_message_edit_by_author() {
    let harness = TestHarness::new();
    let id = harness.seed_message(500, 10, 1, "original");
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(
            &conn,
            r#"{"t":"message.edit","d":{"messageId":"500","content":"revised"}}"#,
        )
        .await;

    assert!(try_frame(&mut rx).is_none(), "no error expected");

    let stored = harness.messages.get(id).unwrap();
    assert_eq!(stored.content.as_deref(), Some("revised"));
    assert!(stored.is_edited());

    let published = harness.bus.published_of("message.updated");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].event.data["content"], "revised");
}

#[tokio::test]
async fn test_message_edit_by_non_author_is_silent() {
    let harness = TestHarness::new();
    let id = harness.seed_message(500, 10, 1, "original");
    let (conn, mut rx) = harness.connect(2);

    harness
        .route(
            &conn,
            r#"{"t":"message.edit","d":{"messageId":"500","content":"hijack"}}"#,
        )
        .await;

    assert!(try_frame(&mut rx).is_none(), "silent no-op, no error frame");
    assert_eq!(
        harness.messages.get(id).unwrap().content.as_deref(),
        Some("original")
    );
    assert!(harness.bus.published_of("message.updated").is_empty());
}

#[tokio::test]
async fn test_message_edit_empty_content_rejected() {
    let harness = TestHarness::new();
    harness.seed_message(500, 10, 1, "original");
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"message.edit","d":{"messageId":"500","content":"  "}}"#)
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("EMPTY_MESSAGE"));
}

#[tokio::test]
async fn test_message_delete_by_author() {
    let harness = TestHarness::new();
    let id = harness.seed_message(500, 10, 1, "bye");
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"message.delete","d":{"messageId":"500"}}"#)
        .await;

    assert!(try_frame(&mut rx).is_none());

    let stored = harness.messages.get(id).unwrap();
    assert!(stored.is_deleted());
    assert!(stored.content.is_none(), "soft delete clears content");

    let published = harness.bus.published_of("message.deleted");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].event.data["messageId"], "500");
    assert_eq!(published[0].event.data["channelId"], "10");
}

#[tokio::test]
async fn test_message_delete_by_non_author_is_silent() {
    let harness = TestHarness::new();
    let id = harness.seed_message(500, 10, 1, "keep");
    let (conn, mut rx) = harness.connect(2);

    harness
        .route(&conn, r#"{"t":"message.delete","d":{"messageId":"500"}}"#)
        .await;

    assert!(try_frame(&mut rx).is_none());
    assert!(!harness.messages.get(id).unwrap().is_deleted());
    assert!(harness.bus.published_of("message.deleted").is_empty());
}

#[tokio::test]
async fn test_message_edit_after_delete_is_silent() {
    let harness = TestHarness::new();
    harness.seed_message(500, 10, 1, "gone");
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"message.delete","d":{"messageId":"500"}}"#)
        .await;
    harness
        .route(
            &conn,
            r#"{"t":"message.edit","d":{"messageId":"500","content":"resurrect"}}"#,
        )
        .await;

    assert!(try_frame(&mut rx).is_none());
    assert!(harness.bus.published_of("message.updated").is_empty());
}

// ============================================================================
// Reactions
// ============================================================================

#[tokio::test]
async fn test_reaction_count_converges() {
    let harness = TestHarness::new();
    harness.seed_message(500, 10, 1, "react to me");
    let (alice, _a_rx) = harness.connect(1);
    let (bob, _b_rx) = harness.connect(2);

    harness
        .route(&alice, r#"{"t":"reaction.add","d":{"messageId":"500","emoji":"👍"}}"#)
        .await;
    harness
        .route(&bob, r#"{"t":"reaction.add","d":{"messageId":"500","emoji":"👍"}}"#)
        .await;
    // Re-adding the same reaction is idempotent
    harness
        .route(&alice, r#"{"t":"reaction.add","d":{"messageId":"500","emoji":"👍"}}"#)
        .await;

    let published = harness.bus.published_of("reaction.updated");
    assert_eq!(published.len(), 3);
    assert_eq!(published[0].channel, PubSubChannel::broadcast());
    assert_eq!(published[0].event.data["count"], 1);
    assert_eq!(published[1].event.data["count"], 2);
    assert_eq!(published[2].event.data["count"], 2);
}

#[tokio::test]
async fn test_reaction_remove_updates_count() {
    let harness = TestHarness::new();
    harness.seed_message(500, 10, 1, "react to me");
    let (conn, _rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"reaction.add","d":{"messageId":"500","emoji":"🎉"}}"#)
        .await;
    harness
        .route(&conn, r#"{"t":"reaction.remove","d":{"messageId":"500","emoji":"🎉"}}"#)
        .await;

    let published = harness.bus.published_of("reaction.updated");
    assert_eq!(published.len(), 2);
    assert_eq!(published[1].event.data["count"], 0);
    assert_eq!(published[1].event.data["emoji"], "🎉");
}

#[tokio::test]
async fn test_reaction_on_missing_message_is_silent() {
    let harness = TestHarness::new();
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"reaction.add","d":{"messageId":"404","emoji":"👍"}}"#)
        .await;

    assert!(try_frame(&mut rx).is_none());
    assert!(harness.bus.published_of("reaction.updated").is_empty());
}

#[tokio::test]
async fn test_reaction_on_deleted_message_is_silent() {
    let harness = TestHarness::new();
    harness.seed_message(500, 10, 1, "doomed");
    let (author, _a_rx) = harness.connect(1);
    harness
        .route(&author, r#"{"t":"message.delete","d":{"messageId":"500"}}"#)
        .await;

    let (conn, mut rx) = harness.connect(2);
    harness
        .route(&conn, r#"{"t":"reaction.add","d":{"messageId":"500","emoji":"👍"}}"#)
        .await;

    assert!(try_frame(&mut rx).is_none());
    assert!(harness.bus.published_of("reaction.updated").is_empty());
}

// ============================================================================
// Typing and presence
// ============================================================================

#[tokio::test]
async fn test_typing_broadcast_excludes_sender() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    let (conn, _rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"channel.join","d":{"channelId":"10"}}"#)
        .await;
    harness
        .route(&conn, r#"{"t":"typing.start","d":{"channelId":"10"}}"#)
        .await;

    let published = harness.bus.published_of("typing");
    assert_eq!(published.len(), 1);
    assert_eq!(
        published[0].channel,
        PubSubChannel::room(RoomKey::channel(Snowflake::new(10)))
    );
    assert_eq!(published[0].event.data["userId"], "1");
    assert_eq!(published[0].event.exclude_user, Some(Snowflake::new(1)));
}

#[tokio::test]
async fn test_typing_outside_joined_room_is_dropped() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    // Never joined channel 10
    harness
        .route(&conn, r#"{"t":"typing.start","d":{"channelId":"10"}}"#)
        .await;

    assert!(try_frame(&mut rx).is_none());
    assert!(harness.bus.published_of("typing").is_empty());
}

#[tokio::test]
async fn test_presence_update_persists_and_broadcasts() {
    let harness = TestHarness::new();
    let (conn, _rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"presence.update","d":{"status":"idle"}}"#)
        .await;

    assert_eq!(harness.presence_of(1), Some(PresenceStatus::Idle));

    let published = harness.bus.published_of("presence.state");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].channel, PubSubChannel::broadcast());
    assert_eq!(published[0].event.data["status"], "idle");
    assert_eq!(published[0].event.data["userId"], "1");
    assert!(published[0].event.exclude_user.is_none());
}

// ============================================================================
// Voice rooms
// ============================================================================

#[tokio::test]
async fn test_voice_join_returns_roster_and_notifies() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    harness.seed_member(1, 2);

    let (alice, mut a_rx) = harness.connect(1);
    harness
        .route(&alice, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;

    let roster = expect_frame(&mut a_rx, "rtc.participants");
    let data = roster.d.unwrap();
    assert_eq!(data["room"], "channel:20");
    assert!(data["participants"].as_array().unwrap().is_empty());

    let (bob, mut b_rx) = harness.connect(2);
    harness
        .route(&bob, r#"{"t":"rtc.join","d":{"channelId":"20","enableVideo":true}}"#)
        .await;

    let roster = expect_frame(&mut b_rx, "rtc.participants");
    let participants = roster.d.unwrap()["participants"].as_array().unwrap().clone();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["userId"], "1");

    let joined = harness.bus.published_of("rtc.participant-joined");
    assert_eq!(joined.len(), 2);
    assert_eq!(joined[1].event.data["userId"], "2");
    assert_eq!(joined[1].event.data["videoEnabled"], true);
    assert_eq!(joined[1].event.exclude_user, Some(Snowflake::new(2)));

    assert!(harness.bus.is_subscribed("voice:channel:20"));
}

#[tokio::test]
async fn test_voice_join_rejects_text_channel() {
    let harness = TestHarness::new();
    harness.seed_text_channel(10, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"rtc.join","d":{"channelId":"10"}}"#)
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("NOT_VOICE_CHANNEL"));
    assert_eq!(harness.state.voice_rooms().room_count(), 0);
}

#[tokio::test]
async fn test_voice_join_requires_membership() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    let (conn, mut rx) = harness.connect(9);

    harness
        .route(&conn, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("NOT_SERVER_MEMBER"));
}

#[tokio::test]
async fn test_voice_rejoin_renotifies_with_refreshed_flag() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;
    harness
        .route(&conn, r#"{"t":"rtc.join","d":{"channelId":"20","enableVideo":true}}"#)
        .await;

    // Both joins answer with a roster
    expect_frame(&mut rx, "rtc.participants");
    expect_frame(&mut rx, "rtc.participants");

    // The room hears about the rejoin too, carrying the refreshed flag
    let joined = harness.bus.published_of("rtc.participant-joined");
    assert_eq!(joined.len(), 2);
    assert_eq!(joined[0].event.data["videoEnabled"], false);
    assert_eq!(joined[1].event.data["videoEnabled"], true);
    assert_eq!(joined[1].event.exclude_user, Some(Snowflake::new(1)));

    let room = RoomKey::channel(Snowflake::new(20));
    let roster = harness
        .state
        .voice_rooms()
        .participants_excluding(room, Snowflake::new(999));
    assert_eq!(roster.len(), 1, "rejoin holds a single membership");
    assert!(roster[0].video_enabled, "rejoin refreshed the video flag");
}

#[tokio::test]
async fn test_voice_leave_notifies_and_reaps_room() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    harness.seed_member(1, 2);
    let room = RoomKey::channel(Snowflake::new(20));

    let (alice, _a_rx) = harness.connect(1);
    let (bob, _b_rx) = harness.connect(2);
    harness
        .route(&alice, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;
    harness
        .route(&bob, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;

    harness
        .route(&alice, r#"{"t":"rtc.leave","d":{"channelId":"20"}}"#)
        .await;

    let left = harness.bus.published_of("rtc.participant-left");
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].event.data["userId"], "1");
    assert_eq!(left[0].event.exclude_user, Some(Snowflake::new(1)));

    assert!(harness.state.voice_rooms().contains(room, Snowflake::new(2)));
    assert!(
        harness.bus.is_subscribed("voice:channel:20"),
        "topic stays while a local participant remains"
    );

    harness
        .route(&bob, r#"{"t":"rtc.leave","d":{"channelId":"20"}}"#)
        .await;

    assert_eq!(harness.state.voice_rooms().room_count(), 0);
    assert!(!harness.bus.is_subscribed("voice:channel:20"));
}

#[tokio::test]
async fn test_voice_leave_without_membership_is_silent() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"rtc.leave","d":{"channelId":"20"}}"#)
        .await;

    assert!(try_frame(&mut rx).is_none());
    assert!(harness.bus.published_of("rtc.participant-left").is_empty());
}

#[tokio::test]
async fn test_voice_signal_relayed_to_target_user() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    harness.seed_member(1, 2);

    let (alice, _a_rx) = harness.connect(1);
    let (bob, _b_rx) = harness.connect(2);
    harness
        .route(&alice, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;
    harness
        .route(&bob, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;

    harness
        .route(
            &alice,
            r#"{"t":"rtc.signal","d":{"channelId":"20","targetUserId":"2","payload":{"type":"offer","sdp":"v=0"}}}"#,
        )
        .await;

    let signals = harness.bus.published_of("rtc.signal");
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].channel, PubSubChannel::user(Snowflake::new(2)));
    assert_eq!(signals[0].event.data["fromUserId"], "1");
    assert_eq!(signals[0].event.data["payload"]["sdp"], "v=0");
}

#[tokio::test]
async fn test_voice_signal_to_non_participant_dropped() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    let (alice, mut rx) = harness.connect(1);

    harness
        .route(&alice, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;
    expect_frame(&mut rx, "rtc.participants");

    // User 2 never joined the voice room
    harness
        .route(
            &alice,
            r#"{"t":"rtc.signal","d":{"channelId":"20","targetUserId":"2","payload":{"type":"offer","sdp":"v=0"}}}"#,
        )
        .await;

    assert!(try_frame(&mut rx).is_none());
    assert!(harness.bus.published_of("rtc.signal").is_empty());
}

#[tokio::test]
async fn test_voice_signal_with_malformed_body_rejected() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    let (alice, mut rx) = harness.connect(1);

    harness
        .route(&alice, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;
    expect_frame(&mut rx, "rtc.participants");

    // Not one of offer / answer / ice-candidate
    harness
        .route(
            &alice,
            r#"{"t":"rtc.signal","d":{"channelId":"20","targetUserId":"1","payload":{"type":"renegotiate"}}}"#,
        )
        .await;

    let frame = expect_frame(&mut rx, "error");
    assert_eq!(frame_code(&frame).as_deref(), Some("INVALID_PAYLOAD"));
    assert!(harness.bus.published_of("rtc.signal").is_empty());
}

#[tokio::test]
async fn test_voice_media_update_notifies_room() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    let (conn, _rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;
    harness
        .route(
            &conn,
            r#"{"t":"rtc.media-update","d":{"channelId":"20","videoEnabled":true}}"#,
        )
        .await;

    let updates = harness.bus.published_of("rtc.media-updated");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].event.data["videoEnabled"], true);
    assert_eq!(updates[0].event.exclude_user, Some(Snowflake::new(1)));
}

#[tokio::test]
async fn test_voice_media_update_by_non_participant_is_silent() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    let (conn, mut rx) = harness.connect(1);

    harness
        .route(
            &conn,
            r#"{"t":"rtc.media-update","d":{"channelId":"20","videoEnabled":true}}"#,
        )
        .await;

    assert!(try_frame(&mut rx).is_none());
    assert!(harness.bus.published_of("rtc.media-updated").is_empty());
}

#[tokio::test]
async fn test_disconnect_reaps_voice_membership_once() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_member(1, 1);
    let (conn, _rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;

    VoiceCoordinator::reap(&harness.state, &conn).await;
    assert_eq!(harness.bus.published_of("rtc.participant-left").len(), 1);
    assert_eq!(harness.state.voice_rooms().room_count(), 0);
    assert!(!harness.bus.is_subscribed("voice:channel:20"));

    // Re-entering cleanup must not emit a second departure
    VoiceCoordinator::reap(&harness.state, &conn).await;
    assert_eq!(harness.bus.published_of("rtc.participant-left").len(), 1);
}

#[tokio::test]
async fn test_disconnect_reaps_every_joined_voice_room() {
    let harness = TestHarness::new();
    harness.seed_voice_channel(20, 1);
    harness.seed_voice_channel(21, 1);
    harness.seed_member(1, 1);
    let (conn, _rx) = harness.connect(1);

    harness
        .route(&conn, r#"{"t":"rtc.join","d":{"channelId":"20"}}"#)
        .await;
    harness
        .route(&conn, r#"{"t":"rtc.join","d":{"channelId":"21","enableVideo":true}}"#)
        .await;

    VoiceCoordinator::reap(&harness.state, &conn).await;

    // Exactly one departure per joined room
    let left = harness.bus.published_of("rtc.participant-left");
    assert_eq!(left.len(), 2);
    let rooms: Vec<&str> = left
        .iter()
        .map(|p| p.event.data["room"].as_str().unwrap())
        .collect();
    assert!(rooms.contains(&"channel:20"));
    assert!(rooms.contains(&"channel:21"));

    assert_eq!(harness.state.voice_rooms().room_count(), 0);
    assert!(!harness.bus.is_subscribed("voice:channel:20"));
    assert!(!harness.bus.is_subscribed("voice:channel:21"));
}

// ============================================================================
// Dispatcher fan-out
// ============================================================================

#[tokio::test]
async fn test_dispatcher_routes_room_events_with_exclusion() {
    let harness = TestHarness::new();
    let manager = harness.state.connection_manager().clone();
    let room = RoomKey::channel(Snowflake::new(10));

    let (alice, mut a_rx) = harness.connect(1);
    let (bob, mut b_rx) = harness.connect(2);
    manager.join_room(&alice, room).await;
    manager.join_room(&bob, room).await;

    let dispatcher = Arc::new(EventDispatcher::new(harness.bus.clone(), manager));
    dispatcher.start();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let event = PubSubEvent::new("message.created", serde_json::json!({"content": "hi"}))
        .excluding(Snowflake::new(1));
    harness
        .state
        .bus()
        .publish(&PubSubChannel::room(room), &event)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let frame = expect_frame(&mut b_rx, "message.created");
    assert_eq!(frame.d.unwrap()["content"], "hi");
    assert!(try_frame(&mut a_rx).is_none(), "sender is excluded");
}

#[tokio::test]
async fn test_dispatcher_routes_user_and_broadcast_events() {
    let harness = TestHarness::new();
    let manager = harness.state.connection_manager().clone();

    let (_alice, mut a_rx) = harness.connect(1);
    let (_bob, mut b_rx) = harness.connect(2);

    let dispatcher = Arc::new(EventDispatcher::new(harness.bus.clone(), manager));
    dispatcher.start();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let signal = PubSubEvent::new("rtc.signal", serde_json::json!({"fromUserId": "2"}));
    harness
        .state
        .bus()
        .publish(&PubSubChannel::user(Snowflake::new(1)), &signal)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    expect_frame(&mut a_rx, "rtc.signal");
    assert!(try_frame(&mut b_rx).is_none(), "user events stay private");

    let presence = PubSubEvent::new("presence.state", serde_json::json!({"status": "online"}));
    harness
        .state
        .bus()
        .publish(&PubSubChannel::broadcast(), &presence)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    expect_frame(&mut a_rx, "presence.state");
    expect_frame(&mut b_rx, "presence.state");
}
