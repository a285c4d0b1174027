use crate::core::errors::DivvyError;
use crate::core::models::settlement::SettlementStatus;
use crate::infrastructure::storage::{CasOutcome, SettlementFilter, Storage};
use crate::tests::{create_test_context, setup_pair, shares};

#[tokio::test]
async fn non_positive_amounts_are_rejected_before_persisting() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    for amount in [0.0, -5.0] {
        let result = ctx
            .service
            .record_settlement(&group.id, &bob.id, &alice.id, amount, None)
            .await;
        assert!(matches!(result, Err(DivvyError::InvalidAmount)));
    }

    let persisted = ctx
        .storage
        .list_settlements(SettlementFilter::default())
        .await
        .unwrap();
    assert!(persisted.is_empty());
}

#[tokio::test]
async fn self_settlement_and_non_members_are_rejected() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;
    let outsider = ctx
        .service
        .create_user("Mallory".to_string(), "mallory@example.com".to_string())
        .await
        .unwrap();

    let result = ctx
        .service
        .record_settlement(&group.id, &bob.id, &bob.id, 10.0, None)
        .await;
    assert!(matches!(result, Err(DivvyError::SelfSettlement)));

    let result = ctx
        .service
        .record_settlement(&group.id, &bob.id, &outsider.id, 10.0, None)
        .await;
    assert!(matches!(result, Err(DivvyError::NotGroupMember(_))));

    let result = ctx
        .service
        .record_settlement(&group.id, &outsider.id, &alice.id, 10.0, None)
        .await;
    assert!(matches!(result, Err(DivvyError::NotGroupMember(_))));
}

#[tokio::test]
async fn only_the_recipient_resolves_a_settlement() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    let settlement = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 25.0, Some("thanks".to_string()))
        .await
        .unwrap();
    assert_eq!(settlement.status, SettlementStatus::Pending);

    // The sender cannot accept their own proposal.
    let result = ctx.service.accept_settlement(&settlement.id, &bob.id).await;
    assert!(matches!(result, Err(DivvyError::NotAuthorized { .. })));

    let accepted = ctx.service.accept_settlement(&settlement.id, &alice.id).await.unwrap();
    assert_eq!(accepted.status, SettlementStatus::Accepted);
}

#[tokio::test]
async fn terminal_settlements_cannot_transition_again() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    let settlement = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 25.0, None)
        .await
        .unwrap();
    ctx.service.accept_settlement(&settlement.id, &alice.id).await.unwrap();

    let again = ctx.service.accept_settlement(&settlement.id, &alice.id).await;
    match again {
        Err(DivvyError::InvalidSettlementState(status)) => assert_eq!(status, "accepted"),
        other => panic!("expected InvalidSettlementState, got {:?}", other),
    }
    let reject = ctx
        .service
        .reject_settlement(&settlement.id, &alice.id, None)
        .await;
    assert!(matches!(reject, Err(DivvyError::InvalidSettlementState(_))));
}

#[tokio::test]
async fn rejection_records_the_reason() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    let settlement = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 25.0, None)
        .await
        .unwrap();
    let rejected = ctx
        .service
        .reject_settlement(&settlement.id, &alice.id, Some("paid in cash".to_string()))
        .await
        .unwrap();
    assert_eq!(rejected.status, SettlementStatus::Rejected);
    assert_eq!(rejected.rejected_reason.as_deref(), Some("paid in cash"));
}

#[tokio::test]
async fn losing_a_cas_race_surfaces_a_conflict() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    let settlement = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 25.0, None)
        .await
        .unwrap();

    let first = ctx
        .storage
        .cas_update_settlement_status(&settlement.id, SettlementStatus::Pending, SettlementStatus::Accepted, None)
        .await
        .unwrap();
    assert!(matches!(first, CasOutcome::Applied(_)));

    // A racer that read `pending` before the first write landed.
    let second = ctx
        .storage
        .cas_update_settlement_status(&settlement.id, SettlementStatus::Pending, SettlementStatus::Rejected, None)
        .await
        .unwrap();
    match second {
        CasOutcome::Conflict(current) => assert_eq!(current.status, SettlementStatus::Accepted),
        CasOutcome::Applied(_) => panic!("second transition should have lost the race"),
    }
}

#[tokio::test]
async fn resend_creates_a_new_pending_settlement() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    let original = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 25.0, Some("round 1".to_string()))
        .await
        .unwrap();

    // Only a rejected settlement can be resent.
    let early = ctx
        .service
        .resend_settlement(&original.id, &bob.id, None, None)
        .await;
    assert!(matches!(early, Err(DivvyError::NotRejected(_))));

    ctx.service
        .reject_settlement(&original.id, &alice.id, Some("wrong amount".to_string()))
        .await
        .unwrap();

    // Only the original sender may resend.
    let wrong_actor = ctx
        .service
        .resend_settlement(&original.id, &alice.id, Some(30.0), None)
        .await;
    assert!(matches!(wrong_actor, Err(DivvyError::NotAuthorized { .. })));

    let resent = ctx
        .service
        .resend_settlement(&original.id, &bob.id, Some(30.0), Some("round 2".to_string()))
        .await
        .unwrap();
    assert_ne!(resent.id, original.id);
    assert_eq!(resent.status, SettlementStatus::Pending);
    assert_eq!(resent.amount, 30.0);
    assert_eq!(resent.resend_of.as_deref(), Some(original.id.as_str()));

    // The rejected original is untouched.
    let stored = ctx.storage.get_settlement(&original.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SettlementStatus::Rejected);
    assert_eq!(stored.rejected_reason.as_deref(), Some("wrong amount"));
}

#[tokio::test]
async fn history_filters_by_involvement_and_status() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;
    let carol = ctx
        .service
        .create_user("Carol".to_string(), "carol@example.com".to_string())
        .await
        .unwrap();
    ctx.service
        .add_member_to_group(&group.id, &carol.id, &alice.id)
        .await
        .unwrap();

    let first = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 10.0, None)
        .await
        .unwrap();
    ctx.service.accept_settlement(&first.id, &alice.id).await.unwrap();
    ctx.service
        .record_settlement(&group.id, &carol.id, &alice.id, 5.0, None)
        .await
        .unwrap();

    let bob_history = ctx
        .service
        .get_settlement_history(&group.id, &bob.id, None)
        .await
        .unwrap();
    assert_eq!(bob_history.len(), 1);
    assert_eq!(bob_history[0].id, first.id);

    let alice_pending = ctx
        .service
        .get_settlement_history(&group.id, &alice.id, Some(SettlementStatus::Pending))
        .await
        .unwrap();
    assert_eq!(alice_pending.len(), 1);
    assert_eq!(alice_pending[0].from_user_id, carol.id);
}

#[tokio::test]
async fn transitions_publish_to_the_counterparty() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    let settlement = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 25.0, None)
        .await
        .unwrap();
    ctx.service.accept_settlement(&settlement.id, &alice.id).await.unwrap();

    let published = ctx.notifier.published().await;
    assert_eq!(published.len(), 2);
    // Proposal goes to the recipient, resolution back to the sender.
    assert_eq!(published[0].0, alice.id);
    assert_eq!(published[0].1.kind, "settlement_proposed");
    assert_eq!(published[1].0, bob.id);
    assert_eq!(published[1].1.kind, "settlement_resolved");
}

#[tokio::test]
async fn expense_shares_pay_down_through_accepted_settlements_only() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    ctx.service
        .add_expense(
            &group.id,
            &alice.id,
            80.0,
            "USD".to_string(),
            "food".to_string(),
            String::new(),
            shares(&[(&alice.id, 40.0), (&bob.id, 40.0)]),
            &alice.id,
        )
        .await
        .unwrap();

    let partial = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 15.0, None)
        .await
        .unwrap();
    ctx.service.accept_settlement(&partial.id, &alice.id).await.unwrap();

    let balances = ctx.service.get_group_balances(&group.id).await.unwrap();
    let bob_balance = balances.iter().find(|b| b.user_id == bob.id).unwrap();
    assert_eq!(bob_balance.paid_settlements, 15.0);
    assert_eq!(bob_balance.net, -25.0);
}
