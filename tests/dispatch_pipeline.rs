//! End-to-end dispatch tests against a recording platform
//! Run with: cargo test --test dispatch_pipeline

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Call, FailingSource, FixedSource, RecordingPlatform, GUILD, OWNER};
use genesis_bot::application::errors::{CommandError, RegistryError};
use genesis_bot::application::messaging::classifier::{HANDLER_FAULT_MESSAGE, UNKNOWN_COMMAND_MESSAGE};
use genesis_bot::application::messaging::dispatcher::COMPLETED_MESSAGE;
use genesis_bot::application::messaging::preconditions::NOT_OWNER_REASON;
use genesis_bot::application::messaging::{
    DispatchSettings, FailureKind, GuildOnly, LogSeverity, Precondition, PreconditionResult,
};
use genesis_bot::commands::admin::OUT_OF_RANGE_MESSAGE;
use genesis_bot::commands::genesis::NOT_FOUND_MESSAGE;
use genesis_bot::domain::entities::{
    handler_fn, CommandDescriptor, CommandRegistry, InitialResponse, Interaction, InteractionEvent, InteractionKind,
    OptionKind, OptionSpec, ReplyPayload, RouteKind, Severity,
};
use genesis_bot::domain::traits::{BalanceStore, CommandScope, BALANCE_FIELD};

const STRANGER: u64 = 42;

#[tokio::test]
async fn test_unknown_command_gets_one_generic_error() {
    let bot = common::bot(None).await;

    let outcome = bot
        .dispatcher
        .dispatch(InteractionEvent::command(1, STRANGER, &["nonexistent"]))
        .await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::UnknownCommand));
    let messages = bot.platform.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, UNKNOWN_COMMAND_MESSAGE);
    assert_eq!(messages[0].severity, Severity::Error);
    assert!(messages[0].ephemeral);
}

#[tokio::test]
async fn test_non_owner_grant_is_refused_without_side_effects() {
    let bot = common::bot(None).await;

    let event = InteractionEvent::command(2, STRANGER, &["admin", "grant"])
        .with_guild(GUILD)
        .with_arg("user", STRANGER.to_string())
        .with_arg("amount", 100);
    let outcome = bot.dispatcher.dispatch(event).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::UnmetPrecondition));
    let messages = bot.platform.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, NOT_OWNER_REASON);
    assert!(messages[0].ephemeral);
    assert_eq!(bot.store.read_field(STRANGER, BALANCE_FIELD).await.unwrap(), 0);

    let log = outcome.log().unwrap();
    assert_eq!(log.severity, LogSeverity::Warning);
    assert_eq!(log.source, "ApplicationCommand");
    assert_eq!(
        log.message,
        format!("{}'s `/admin grant` command failed: UnmetPrecondition: {}", STRANGER, NOT_OWNER_REASON)
    );
}

#[tokio::test]
async fn test_owner_grant_updates_balance() {
    let bot = common::bot(None).await;

    let grant = InteractionEvent::command(3, OWNER, &["admin", "grant"])
        .with_arg("user", STRANGER.to_string())
        .with_arg("amount", 25);
    assert!(bot.dispatcher.dispatch(grant).await.is_success());

    let messages = bot.platform.messages();
    assert_eq!(messages[0].content, format!("Granted +25 to {}. New balance: 25.", STRANGER));
    assert_eq!(messages[0].severity, Severity::Success);

    let balance = InteractionEvent::command(4, STRANGER, &["balance"]);
    assert!(bot.dispatcher.dispatch(balance).await.is_success());
    assert_eq!(bot.platform.messages()[1].content, "25");
}

#[tokio::test]
async fn test_balance_without_document_is_zero() {
    let bot = common::bot(None).await;

    let outcome = bot.dispatcher.dispatch(InteractionEvent::command(5, 77, &["balance"])).await;

    assert!(outcome.is_success());
    assert_eq!(
        bot.platform.initial_responses(),
        vec![InitialResponse::Message(ReplyPayload::new("0", Severity::Neutral, false))]
    );
}

#[tokio::test]
async fn test_grant_past_the_limit_keeps_balance() {
    let bot = common::bot(None).await;

    let grant = |id: u64| {
        InteractionEvent::command(id, OWNER, &["admin", "grant"])
            .with_arg("user", STRANGER.to_string())
            .with_arg("amount", i64::MAX)
    };
    assert!(bot.dispatcher.dispatch(grant(30)).await.is_success());

    let outcome = bot.dispatcher.dispatch(grant(31)).await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::MalformedInput));
    assert_eq!(bot.platform.messages()[1].content, OUT_OF_RANGE_MESSAGE);
    assert_eq!(bot.store.read_field(STRANGER, BALANCE_FIELD).await.unwrap(), i64::MAX);
}

#[tokio::test]
async fn test_missing_option_is_malformed_input() {
    let bot = common::bot(None).await;

    let event = InteractionEvent::command(6, OWNER, &["admin", "grant"]).with_arg("user", "42");
    let outcome = bot.dispatcher.dispatch(event).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::MalformedInput));
    let messages = bot.platform.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].content.contains("amount"));
}

#[tokio::test]
async fn test_zero_grant_is_reported_as_malformed_input() {
    let bot = common::bot(None).await;

    let event = InteractionEvent::command(7, OWNER, &["admin", "grant"])
        .with_arg("user", "42")
        .with_arg("amount", 0);
    let outcome = bot.dispatcher.dispatch(event).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::MalformedInput));
    assert_eq!(bot.platform.messages()[0].content, "`amount` must not be zero.");
}

#[tokio::test]
async fn test_genesis_upstream_failure_cleans_up_deferral() {
    let bot = common::bot(Some(Arc::new(FailingSource))).await;

    let event = InteractionEvent::command(8, STRANGER, &["genesis"]).with_arg("token_id", 7);
    let outcome = bot.dispatcher.dispatch(event).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::HandlerFault));
    let calls = bot.platform.calls();
    assert!(matches!(calls[1], Call::Initial(InitialResponse::Deferred { .. })));
    assert_eq!(calls[2], Call::Delete(8));
    match &calls[3] {
        Call::Followup(payload) => {
            assert_eq!(payload.content, HANDLER_FAULT_MESSAGE);
            assert!(!payload.content.contains("503"));
        }
        other => panic!("expected followup, got {:?}", other),
    }
    assert_eq!(calls.len(), 4);

    let log = outcome.log().unwrap();
    assert_eq!(log.severity, LogSeverity::Error);
    assert!(log.message.contains("`/genesis`"));
    assert!(log.message.contains("503"));
}

#[tokio::test]
async fn test_genesis_replies_as_followup_after_deferral() {
    let bot = common::bot(Some(Arc::new(FixedSource))).await;

    let found = InteractionEvent::command(9, STRANGER, &["genesis"]).with_arg("token_id", 7);
    assert!(bot.dispatcher.dispatch(found).await.is_success());

    let missing = InteractionEvent::command(10, STRANGER, &["genesis"]).with_arg("token_id", 8);
    assert!(bot.dispatcher.dispatch(missing).await.is_success());

    let followups = bot.platform.followups();
    assert_eq!(followups.len(), 2);
    assert!(followups[0].content.contains("GENE_SIS #7"));
    assert!(followups[0].content.ends_with("https://img.example/7.png\nhttps://opensea.io/assets/7"));
    assert_eq!(followups[1].content, NOT_FOUND_MESSAGE);
    assert!(!bot.platform.calls().iter().any(|c| matches!(c, Call::Delete(_))));
}

#[tokio::test]
async fn test_silent_deferred_command_gets_closing_followup() {
    let (dispatcher, platform) = common::custom(vec![CommandDescriptor::slash(
        &["sync"],
        handler_fn(|_ctx| async move { Ok(()) }),
    )
    .deferred()])
    .await;

    let outcome = dispatcher.dispatch(InteractionEvent::command(22, STRANGER, &["sync"])).await;

    assert!(outcome.is_success());
    assert_eq!(platform.initial_responses(), vec![InitialResponse::Deferred { ephemeral: false }]);
    let followups = platform.followups();
    assert_eq!(followups.len(), 1);
    assert_eq!(followups[0].content, COMPLETED_MESSAGE);
    assert_eq!(followups[0].severity, Severity::Neutral);
}

#[tokio::test]
async fn test_reply_then_failure_sends_single_initial_response() {
    let (dispatcher, platform) = common::custom(vec![CommandDescriptor::slash(
        &["flaky"],
        handler_fn(|ctx| async move {
            ctx.send_success("partial result").await;
            Err(CommandError::ExecutionFailed("second step broke".to_string()))
        }),
    )])
    .await;

    let outcome = dispatcher.dispatch(InteractionEvent::command(11, STRANGER, &["flaky"])).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::HandlerFault));
    assert_eq!(platform.initial_responses().len(), 1);
    let followups = platform.followups();
    assert_eq!(followups.len(), 1);
    assert_eq!(followups[0].content, HANDLER_FAULT_MESSAGE);
    assert!(!platform.calls().iter().any(|c| matches!(c, Call::Delete(_))));
}

#[tokio::test]
async fn test_panicking_handler_is_a_handler_fault() {
    let (dispatcher, platform) = common::custom(vec![CommandDescriptor::slash(
        &["boom"],
        handler_fn(|_ctx| async move {
            if true {
                panic!("kaboom");
            }
            Ok(())
        }),
    )])
    .await;

    let outcome = dispatcher.dispatch(InteractionEvent::command(12, STRANGER, &["boom"])).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::HandlerFault));
    let messages = platform.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, HANDLER_FAULT_MESSAGE);
}

#[tokio::test]
async fn test_silent_slow_handler_misses_deadline() {
    let (dispatcher, platform) = common::custom(vec![CommandDescriptor::slash(
        &["slow"],
        handler_fn(|_ctx| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        }),
    )])
    .await;
    let dispatcher = Arc::try_unwrap(dispatcher).ok().unwrap().with_settings(DispatchSettings {
        ack_deadline: Some(Duration::from_millis(10)),
        ephemeral_defer: false,
    });

    let outcome = dispatcher.dispatch(InteractionEvent::command(13, STRANGER, &["slow"])).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::HandlerFault));
    assert_eq!(platform.messages().len(), 1);
}

/// Allows everything, but only after blocking for a while
struct SlowCheck;

impl Precondition for SlowCheck {
    fn name(&self) -> &'static str {
        "SlowCheck"
    }

    fn evaluate(&self, _interaction: &Interaction) -> PreconditionResult {
        std::thread::sleep(Duration::from_millis(30));
        PreconditionResult::Allow
    }
}

#[tokio::test]
async fn test_deadline_counts_time_before_the_handler() {
    let (dispatcher, platform) = common::custom(vec![CommandDescriptor::slash(
        &["quiet"],
        handler_fn(|_ctx| async move { Ok(()) }),
    )
    .with_precondition(Arc::new(SlowCheck))])
    .await;
    let dispatcher = Arc::try_unwrap(dispatcher).ok().unwrap().with_settings(DispatchSettings {
        ack_deadline: Some(Duration::from_millis(10)),
        ephemeral_defer: false,
    });

    let outcome = dispatcher.dispatch(InteractionEvent::command(21, STRANGER, &["quiet"])).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::HandlerFault));
    assert_eq!(platform.messages()[0].content, HANDLER_FAULT_MESSAGE);
}

#[tokio::test]
async fn test_guild_only_denies_direct_messages() {
    let (dispatcher, platform) = common::custom(vec![CommandDescriptor::slash(
        &["server"],
        handler_fn(|ctx| async move {
            ctx.send_neutral("hello guild").await;
            Ok(())
        }),
    )
    .with_precondition(Arc::new(GuildOnly))])
    .await;

    let dm = dispatcher.dispatch(InteractionEvent::command(14, STRANGER, &["server"])).await;
    assert_eq!(dm.failure_kind(), Some(FailureKind::UnmetPrecondition));

    let in_guild = InteractionEvent::command(15, STRANGER, &["server"]).with_guild(GUILD);
    assert!(dispatcher.dispatch(in_guild).await.is_success());
    assert_eq!(platform.messages()[1].content, "hello guild");
}

#[tokio::test]
async fn test_component_route_is_separate_from_slash() {
    let (dispatcher, platform) = common::custom(vec![CommandDescriptor::component(
        &["confirm"],
        handler_fn(|ctx| async move {
            ctx.send_success("confirmed").await;
            Ok(())
        }),
    )])
    .await;

    let click = InteractionEvent::command(16, STRANGER, &["confirm"]).with_kind(InteractionKind::ComponentAction);
    assert!(dispatcher.dispatch(click).await.is_success());

    let slash = InteractionEvent::command(17, STRANGER, &["confirm"]);
    assert_eq!(
        dispatcher.dispatch(slash).await.failure_kind(),
        Some(FailureKind::UnknownCommand)
    );
    assert_eq!(platform.messages()[0].content, "confirmed");
}

#[tokio::test]
async fn test_autocomplete_failure_sends_no_message() {
    let bot = common::bot(None).await;

    let event = InteractionEvent::command(18, STRANGER, &["balance"]).with_kind(InteractionKind::Autocomplete);
    let outcome = bot.dispatcher.dispatch(event).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::UnknownCommand));
    assert!(bot.platform.messages().is_empty());
}

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    let bot = common::bot(None).await;

    let event = InteractionEvent::command(19, STRANGER, &[]).with_kind(InteractionKind::Ping);
    assert!(bot.dispatcher.dispatch(event).await.is_success());
    assert_eq!(bot.platform.initial_responses(), vec![InitialResponse::Pong]);
}

#[tokio::test]
async fn test_concurrent_grants_are_not_lost() {
    let bot = common::bot(None).await;

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let dispatcher = Arc::clone(&bot.dispatcher);
            tokio::spawn(async move {
                let event = InteractionEvent::command(100 + i, OWNER, &["admin", "grant"])
                    .with_arg("user", STRANGER.to_string())
                    .with_arg("amount", 1);
                dispatcher.dispatch(event).await
            })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().is_success());
    }

    assert_eq!(bot.store.read_field(STRANGER, BALANCE_FIELD).await.unwrap(), 20);
}

#[tokio::test]
async fn test_dispatch_loop_drains_channel() {
    let bot = common::bot(None).await;
    let (tx, rx) = tokio::sync::mpsc::channel(8);

    let runner = tokio::spawn(Arc::clone(&bot.dispatcher).run(rx));
    tx.send(InteractionEvent::command(20, STRANGER, &["balance"])).await.unwrap();
    drop(tx);
    runner.await.unwrap();

    // handlers run on their own tasks; give them a moment to finish
    for _ in 0..50 {
        if !bot.platform.messages().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(bot.platform.messages()[0].content, "0");
}

#[tokio::test]
async fn test_resolution_is_exact_and_repeatable() {
    let registry = CommandRegistry::build(vec![
        CommandDescriptor::slash(&["admin", "grant"], handler_fn(|_ctx| async { Ok(()) })),
        CommandDescriptor::slash(&["balance"], handler_fn(|_ctx| async { Ok(()) })),
    ])
    .unwrap();
    let path = vec!["admin".to_string(), "grant".to_string()];

    let first = registry.resolve(RouteKind::SlashCommand, &path).unwrap();
    let second = registry.resolve(RouteKind::SlashCommand, &path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    assert!(registry.resolve(RouteKind::SlashCommand, &["admin".to_string()]).is_none());
    assert!(registry.resolve(RouteKind::Component, &path).is_none());
}

#[tokio::test]
async fn test_duplicate_path_fails_registration() {
    let result = CommandRegistry::build(vec![
        CommandDescriptor::slash(&["admin", "ban"], handler_fn(|_ctx| async { Ok(()) })),
        CommandDescriptor::slash(&["admin", "ban"], handler_fn(|_ctx| async { Ok(()) }))
            .with_option(OptionSpec::required("user", OptionKind::User, "")),
    ]);

    assert!(matches!(result, Err(RegistryError::DuplicatePath(path)) if path.to_string() == "admin ban"));
}

#[tokio::test]
async fn test_publish_failure_is_fatal() {
    let platform = RecordingPlatform::rejecting_registration();
    let registry = CommandRegistry::build(vec![CommandDescriptor::slash(
        &["balance"],
        handler_fn(|_ctx| async { Ok(()) }),
    )])
    .unwrap();

    let result = registry.publish(&platform, CommandScope::Guild(GUILD)).await;
    assert!(matches!(result, Err(RegistryError::Publish(_))));
}

#[tokio::test]
async fn test_publish_registers_once_per_scope() {
    let bot = common::bot(None).await;
    assert_eq!(bot.platform.calls()[0], Call::Register(CommandScope::Guild(GUILD), 3));
}
