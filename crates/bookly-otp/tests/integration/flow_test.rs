use std::time::Duration;

use bookly_domain::destination::Destination;
use bookly_otp::{Notice, OtpError, OtpFlow, Outcome, Phase};

use crate::helpers::{
    MockCredentialStore, MockSessions, RecordingNavigator, RecordingNotifier, test_email,
};

type TestFlow = OtpFlow<MockCredentialStore, MockSessions, RecordingNavigator, RecordingNotifier>;

struct Harness {
    flow: TestFlow,
    store: MockCredentialStore,
    sessions: MockSessions,
    navigator: RecordingNavigator,
    notifier: RecordingNotifier,
}

fn harness_with(store: MockCredentialStore, destination: Destination) -> Harness {
    let sessions = MockSessions::new(destination);
    let navigator = RecordingNavigator::default();
    let notifier = RecordingNotifier::default();
    let flow = OtpFlow::new(
        store.clone(),
        sessions.clone(),
        navigator.clone(),
        notifier.clone(),
    );
    Harness {
        flow,
        store,
        sessions,
        navigator,
        notifier,
    }
}

fn harness() -> Harness {
    harness_with(MockCredentialStore::new(), Destination::Dashboard)
}

async fn code_sent() -> Harness {
    let h = harness();
    let outcome = h.flow.request_code(test_email()).await;
    assert_eq!(outcome, Ok(Outcome::CodeSent));
    h
}

#[tokio::test(start_paused = true)]
async fn should_sign_in_with_the_emailed_code() {
    let h = code_sent().await;
    assert_eq!(h.flow.snapshot().phase, Phase::CodeSent);
    assert_eq!(h.notifier.notices(), vec![Notice::CodeSent]);

    let code = h.store.latest_code().unwrap();
    let outcome = h.flow.input(&code).await;

    assert_eq!(outcome, Ok(Outcome::Verified(Destination::Dashboard)));
    assert_eq!(h.store.redeem_calls(), 1);
    assert_eq!(h.sessions.calls(), 1);
    assert_eq!(h.navigator.visits(), vec![Destination::Dashboard]);
    assert_eq!(
        h.notifier.notices(),
        vec![Notice::CodeSent, Notice::Verified]
    );
    assert_eq!(h.flow.snapshot().phase, Phase::Verified);
}

#[tokio::test(start_paused = true)]
async fn should_route_new_users_to_onboarding() {
    let h = harness_with(MockCredentialStore::new(), Destination::Onboarding);
    h.flow.request_code(test_email()).await.unwrap();

    let code = h.store.latest_code().unwrap();
    let outcome = h.flow.input(&code).await;

    assert_eq!(outcome, Ok(Outcome::Verified(Destination::Onboarding)));
    assert_eq!(h.navigator.visits(), vec![Destination::Onboarding]);
}

#[tokio::test(start_paused = true)]
async fn should_wait_for_all_six_digits_before_submitting() {
    let h = code_sent().await;

    assert_eq!(h.flow.input("12a3").await, Ok(Outcome::Pending));
    assert_eq!(h.flow.snapshot().digits, "123");
    assert_eq!(h.flow.verify().await, Ok(Outcome::Ignored));
    assert_eq!(h.store.redeem_calls(), 0);

    let code = h.store.latest_code().unwrap();
    let mut digits = code.chars();
    h.flow.input("").await.unwrap();
    for _ in 0..5 {
        let outcome = h.flow.push_digit(digits.next().unwrap()).await;
        assert_eq!(outcome, Ok(Outcome::Pending));
    }
    let outcome = h.flow.push_digit(digits.next().unwrap()).await;
    assert_eq!(outcome, Ok(Outcome::Verified(Destination::Dashboard)));
    assert_eq!(h.store.redeem_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn should_redeem_once_when_auto_submit_and_manual_submit_race() {
    let (store, gate) = MockCredentialStore::gated();
    let h = harness_with(store, Destination::Dashboard);

    let (sent, ()) = tokio::join!(h.flow.request_code(test_email()), async {
        gate.notify_one();
    });
    assert_eq!(sent, Ok(Outcome::CodeSent));

    let code = h.store.latest_code().unwrap();
    let (auto, manual) = tokio::join!(h.flow.input(&code), async {
        let manual = h.flow.verify().await;
        gate.notify_one();
        manual
    });

    assert_eq!(auto, Ok(Outcome::Verified(Destination::Dashboard)));
    assert_eq!(manual, Ok(Outcome::Ignored));
    assert_eq!(h.store.redeem_calls(), 1);
    assert_eq!(h.navigator.visits().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn should_clear_digits_and_keep_cooldown_on_wrong_code() {
    let h = code_sent().await;
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let outcome = h.flow.input("999999").await;

    assert_eq!(outcome, Err(OtpError::VerifyFailed));
    let state = h.flow.snapshot();
    assert_eq!(state.phase, Phase::CodeSent);
    assert_eq!(state.digits, "");
    assert_eq!(state.seconds_until_resend_allowed, 55);
    assert!(h.navigator.visits().is_empty());
    assert_eq!(
        h.notifier.notices(),
        vec![Notice::CodeSent, Notice::VerifyFailed]
    );

    // Retrying with the right code still works.
    let code = h.store.latest_code().unwrap();
    assert_eq!(
        h.flow.input(&code).await,
        Ok(Outcome::Verified(Destination::Dashboard))
    );
}

#[tokio::test(start_paused = true)]
async fn should_return_to_code_entry_when_session_cannot_be_established() {
    let h = code_sent().await;
    h.sessions.fail_establish(true);

    let code = h.store.latest_code().unwrap();
    let outcome = h.flow.input(&code).await;

    assert_eq!(outcome, Err(OtpError::VerifyFailed));
    let state = h.flow.snapshot();
    assert_eq!(state.phase, Phase::CodeSent);
    assert_eq!(state.digits, "");
    assert_eq!(h.sessions.calls(), 1);
    assert!(h.navigator.visits().is_empty());
    assert_eq!(
        h.notifier.notices(),
        vec![Notice::CodeSent, Notice::VerifyFailed]
    );

    // The redeemed code is spent; entering it again fails at the store.
    h.sessions.fail_establish(false);
    assert_eq!(h.flow.input(&code).await, Err(OtpError::VerifyFailed));
    assert_eq!(h.store.redeem_calls(), 2);
    assert_eq!(h.sessions.calls(), 1);
    assert!(h.navigator.visits().is_empty());
}

#[tokio::test(start_paused = true)]
async fn should_keep_counting_down_while_submitting() {
    let (store, gate) = MockCredentialStore::gated();
    let h = harness_with(store, Destination::Dashboard);

    let (sent, ()) = tokio::join!(h.flow.request_code(test_email()), async {
        gate.notify_one();
    });
    assert_eq!(sent, Ok(Outcome::CodeSent));

    let (submitted, ()) = tokio::join!(h.flow.input("999999"), async {
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let state = h.flow.snapshot();
        assert_eq!(state.phase, Phase::Submitting);
        assert_eq!(state.seconds_until_resend_allowed, 57);
        assert_eq!(h.flow.resend().await, Ok(Outcome::Ignored));
        gate.notify_one();
    });

    assert_eq!(submitted, Err(OtpError::VerifyFailed));
    let state = h.flow.snapshot();
    assert_eq!(state.phase, Phase::CodeSent);
    assert_eq!(state.seconds_until_resend_allowed, 57);
    assert_eq!(h.store.issue_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn should_ignore_resend_until_cooldown_elapses() {
    let h = code_sent().await;

    tokio::time::sleep(Duration::from_millis(15_500)).await;
    let state = h.flow.snapshot();
    assert_eq!(state.seconds_until_resend_allowed, 45);
    assert!(!state.can_resend);

    assert_eq!(h.flow.resend().await, Ok(Outcome::Ignored));
    assert_eq!(h.store.issue_calls(), 1);

    tokio::time::sleep(Duration::from_secs(45)).await;
    let state = h.flow.snapshot();
    assert_eq!(state.seconds_until_resend_allowed, 0);
    assert!(state.can_resend);

    let first_code = h.store.latest_code().unwrap();
    assert_eq!(h.flow.resend().await, Ok(Outcome::CodeSent));
    assert_eq!(h.store.issue_calls(), 2);

    let state = h.flow.snapshot();
    assert_eq!(state.seconds_until_resend_allowed, 60);
    assert!(!state.can_resend);
    assert_eq!(h.notifier.notices().last(), Some(&Notice::CodeResent));

    // The earlier code was superseded by the resend.
    assert_eq!(h.flow.input(&first_code).await, Err(OtpError::VerifyFailed));
    let second_code = h.store.latest_code().unwrap();
    assert_eq!(
        h.flow.input(&second_code).await,
        Ok(Outcome::Verified(Destination::Dashboard))
    );
}

#[tokio::test(start_paused = true)]
async fn should_keep_state_when_resend_fails() {
    let h = code_sent().await;
    tokio::time::sleep(Duration::from_secs(61)).await;
    h.flow.input("12").await.unwrap();

    h.store.fail_issue(true);
    let outcome = h.flow.resend().await;

    assert_eq!(outcome, Err(OtpError::SendFailed));
    let state = h.flow.snapshot();
    assert_eq!(state.phase, Phase::CodeSent);
    assert_eq!(state.digits, "12");
    assert!(state.can_resend);
    assert_eq!(h.notifier.notices().last(), Some(&Notice::ResendFailed));
}

#[tokio::test(start_paused = true)]
async fn should_return_to_email_entry_when_first_send_fails() {
    let h = harness();
    h.store.fail_issue(true);

    let outcome = h.flow.request_code(test_email()).await;

    assert_eq!(outcome, Err(OtpError::SendFailed));
    assert_eq!(h.flow.snapshot().phase, Phase::AwaitingEmail);
    assert_eq!(h.notifier.notices(), vec![Notice::SendFailed]);

    h.store.fail_issue(false);
    assert_eq!(
        h.flow.request_code(test_email()).await,
        Ok(Outcome::CodeSent)
    );
}

#[tokio::test(start_paused = true)]
async fn should_reject_code_actions_before_a_code_is_sent() {
    let h = harness();

    assert_eq!(h.flow.input("123456").await, Err(OtpError::Unauthenticated));
    assert_eq!(h.flow.verify().await, Err(OtpError::Unauthenticated));
    assert_eq!(h.flow.resend().await, Err(OtpError::Unauthenticated));
    assert_eq!(h.store.issue_calls(), 0);
    assert_eq!(h.store.redeem_calls(), 0);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn should_drop_issue_result_after_teardown() {
    let (store, gate) = MockCredentialStore::gated();
    let h = harness_with(store, Destination::Dashboard);

    let (outcome, ()) = tokio::join!(h.flow.request_code(test_email()), async {
        let state = h.flow.snapshot();
        assert_eq!(state.phase, Phase::Requesting);
        assert!(state.pending);
        h.flow.teardown();
        gate.notify_one();
    });

    assert_eq!(outcome, Ok(Outcome::Cancelled));
    assert!(h.flow.is_torn_down());
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn should_not_navigate_when_torn_down_during_redemption() {
    let (store, gate) = MockCredentialStore::gated();
    let h = harness_with(store, Destination::Dashboard);
    let (sent, ()) = tokio::join!(h.flow.request_code(test_email()), async {
        gate.notify_one();
    });
    assert_eq!(sent, Ok(Outcome::CodeSent));

    let code = h.store.latest_code().unwrap();
    let (outcome, ()) = tokio::join!(h.flow.input(&code), async {
        h.flow.teardown();
        gate.notify_one();
    });

    assert_eq!(outcome, Ok(Outcome::Cancelled));
    assert_eq!(h.store.redeem_calls(), 1);
    assert_eq!(h.sessions.calls(), 0);
    assert!(h.navigator.visits().is_empty());
    assert_eq!(h.notifier.notices(), vec![Notice::CodeSent]);
}

#[tokio::test(start_paused = true)]
async fn should_stop_cooldown_after_teardown() {
    let h = code_sent().await;
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(h.flow.snapshot().seconds_until_resend_allowed, 57);

    h.flow.teardown();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(h.flow.snapshot().seconds_until_resend_allowed, 57);
}

#[tokio::test(start_paused = true)]
async fn should_ignore_input_after_verification() {
    let h = code_sent().await;
    let code = h.store.latest_code().unwrap();
    h.flow.input(&code).await.unwrap();

    assert_eq!(h.flow.input(&code).await, Ok(Outcome::Ignored));
    assert_eq!(h.flow.resend().await, Ok(Outcome::Ignored));
    assert_eq!(h.store.redeem_calls(), 1);
    assert_eq!(h.navigator.visits().len(), 1);
}
